//! Scripted session client shared by this crate's test modules.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use signet_application::{
    ControllerOptions, LogoutOptions, PopupConfig, PopupLoginOptions, RedirectLoginOptions,
    RedirectOutcome, SessionClient, SessionController, TokenEndpointResponse,
    TokenExchangeOptions, TokenGrant, TokenOptions,
};
use signet_domain::{ClientResult, IdTokenClaims, Principal};
use url::Url;

/// Minimal client double: a fixed identity, a scripted authorization
/// answer, and call recording where tests assert on it.
pub(crate) struct StubClient {
    pub user: Mutex<Option<Principal>>,
    pub authorized: Mutex<bool>,
    pub calls: Arc<Mutex<Vec<&'static str>>>,
    pub token_requests: Mutex<Vec<TokenOptions>>,
    pub redirect_logins: Mutex<Vec<RedirectLoginOptions>>,
}

impl StubClient {
    pub fn anonymous() -> Self {
        Self {
            user: Mutex::new(None),
            authorized: Mutex::new(false),
            calls: Arc::new(Mutex::new(Vec::new())),
            token_requests: Mutex::new(Vec::new()),
            redirect_logins: Mutex::new(Vec::new()),
        }
    }

    pub fn signed_in(subject: &str) -> Self {
        let client = Self::anonymous();
        *client.user.lock().expect("lock poisoned") = Some(Principal::new(subject));
        *client.authorized.lock().expect("lock poisoned") = true;
        client
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().expect("lock poisoned").push(call);
    }
}

#[async_trait]
impl SessionClient for StubClient {
    async fn check_session(&self) -> ClientResult<()> {
        self.record("check_session");
        Ok(())
    }

    async fn handle_redirect_callback(&self, _url: Option<Url>) -> ClientResult<RedirectOutcome> {
        self.record("handle_redirect_callback");
        Ok(RedirectOutcome::default())
    }

    fn current_user(&self) -> Option<Principal> {
        self.user.lock().expect("lock poisoned").clone()
    }

    fn is_authorized(&self, _audience: &str, _scope: &str) -> bool {
        *self.authorized.lock().expect("lock poisoned")
    }

    fn id_token_claims(&self) -> Option<IdTokenClaims> {
        None
    }

    async fn login_with_popup(
        &self,
        _options: PopupLoginOptions,
        _config: PopupConfig,
    ) -> ClientResult<()> {
        self.record("login_with_popup");
        Ok(())
    }

    async fn login_with_redirect(&self, options: RedirectLoginOptions) -> ClientResult<()> {
        self.record("login_with_redirect");
        self.redirect_logins.lock().expect("lock poisoned").push(options);
        Ok(())
    }

    async fn logout(&self, _options: LogoutOptions) -> ClientResult<()> {
        self.record("logout");
        Ok(())
    }

    async fn get_token_silently(&self, options: TokenOptions) -> ClientResult<TokenGrant> {
        self.record("get_token_silently");
        self.token_requests.lock().expect("lock poisoned").push(options);
        Ok(TokenGrant::Plain("stub-token".into()))
    }

    async fn get_token_with_popup(
        &self,
        _options: PopupLoginOptions,
        _config: PopupConfig,
    ) -> ClientResult<String> {
        self.record("get_token_with_popup");
        Ok("stub-popup-token".into())
    }

    async fn exchange_token(
        &self,
        _options: TokenExchangeOptions,
    ) -> ClientResult<TokenEndpointResponse> {
        self.record("exchange_token");
        Ok(TokenEndpointResponse {
            access_token: "stub-exchanged".into(),
            expires_in: 3600,
            ..TokenEndpointResponse::default()
        })
    }
}

/// Controller over the given stub, with default options.
pub(crate) fn controller_for(client: Arc<StubClient>) -> Arc<SessionController> {
    Arc::new(SessionController::new(client, ControllerOptions::default()))
}
