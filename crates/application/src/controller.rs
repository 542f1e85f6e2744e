//! The session controller: drives the external client and keeps the
//! shared snapshot in sync.
//!
//! Every operation follows the same discipline: call the client, read the
//! resulting identity back out of its cache, dispatch the matching event,
//! and only then surface any error to the caller. State consumers learn
//! about identity changes even when the operation itself failed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signet_domain::{
    ClientResult, ErrorFallback, IdTokenClaims, Principal, SessionError, SessionEvent,
    SessionResult, SessionSnapshot,
};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::AuthorizationParams;
use crate::ports::{
    DetachedEnvironment, HostEnvironment, LogoutOptions, PopupConfig, PopupLoginOptions,
    RedirectLoginOptions, RedirectOutcome, SessionClient, TokenEndpointResponse,
    TokenExchangeOptions, TokenGrant, TokenOptions,
};
use crate::redirect::{RedirectHook, default_redirect_hook, has_auth_params};
use crate::store::SessionStore;

/// Construction options for [`SessionController`].
#[derive(Clone)]
pub struct ControllerOptions {
    /// Whether the host can complete interactive flows. Non-interactive
    /// hosts start settled instead of loading.
    pub interactive: bool,
    /// Leave authorization responses in the location untouched, for hosts
    /// that route callbacks to their own handler.
    pub skip_redirect_callback: bool,
    /// Replaces the default post-callback location cleanup.
    pub on_redirect_callback: Option<RedirectHook>,
    /// The host environment the session runs in.
    pub environment: Arc<dyn HostEnvironment>,
    /// Defaults merged into token exchange requests.
    pub default_authorization_params: AuthorizationParams,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            interactive: true,
            skip_redirect_callback: false,
            on_redirect_callback: None,
            environment: Arc::new(DetachedEnvironment),
            default_authorization_params: AuthorizationParams::default(),
        }
    }
}

impl ControllerOptions {
    /// Options for a host that cannot run interactive flows.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            interactive: false,
            ..Self::default()
        }
    }

    /// Sets the host environment.
    #[must_use]
    pub fn with_environment(mut self, environment: Arc<dyn HostEnvironment>) -> Self {
        self.environment = environment;
        self
    }

    /// Leaves authorization responses in the location untouched.
    #[must_use]
    pub const fn skipping_redirect_callback(mut self) -> Self {
        self.skip_redirect_callback = true;
        self
    }

    /// Replaces the default post-callback location cleanup.
    #[must_use]
    pub fn with_redirect_hook(mut self, hook: RedirectHook) -> Self {
        self.on_redirect_callback = Some(hook);
        self
    }

    /// Sets the defaults merged into token exchange requests.
    #[must_use]
    pub fn with_default_authorization_params(mut self, params: AuthorizationParams) -> Self {
        self.default_authorization_params = params;
        self
    }
}

/// Owns the session state for one mounted scope and mediates every call
/// to the external client.
pub struct SessionController {
    client: Arc<dyn SessionClient>,
    store: SessionStore,
    init_started: AtomicBool,
    skip_redirect_callback: bool,
    on_redirect_callback: RedirectHook,
    environment: Arc<dyn HostEnvironment>,
    default_authorization_params: AuthorizationParams,
}

impl SessionController {
    /// Creates a controller over the given client.
    #[must_use]
    pub fn new(client: Arc<dyn SessionClient>, options: ControllerOptions) -> Self {
        let on_redirect_callback = options
            .on_redirect_callback
            .unwrap_or_else(|| default_redirect_hook(options.environment.clone()));
        Self {
            client,
            store: SessionStore::new(SessionSnapshot::initial(options.interactive)),
            init_started: AtomicBool::new(false),
            skip_redirect_callback: options.skip_redirect_callback,
            on_redirect_callback,
            environment: options.environment,
            default_authorization_params: options.default_authorization_params,
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.store.snapshot()
    }

    /// Subscribes to snapshot updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionSnapshot>> {
        self.store.subscribe()
    }

    /// The signed-in principal from the client's cache.
    #[must_use]
    pub fn current_user(&self) -> Option<Principal> {
        self.client.current_user()
    }

    /// Whether the cached session satisfies the given audience and scopes.
    #[must_use]
    pub fn is_authorized(&self, audience: &str, scope: &str) -> bool {
        self.client.is_authorized(audience, scope)
    }

    /// The raw and decoded claims of the cached identity token.
    #[must_use]
    pub fn id_token_claims(&self) -> Option<IdTokenClaims> {
        self.client.id_token_claims()
    }

    /// Restores the session once: processes a pending redirect callback if
    /// the location carries one, otherwise checks for an existing session.
    ///
    /// Repeated calls are absorbed by a latch, so remounting scopes cannot
    /// re-enter the flow. All outcomes land in the snapshot; a
    /// `login_required` answer settles the session as signed out rather
    /// than failed.
    pub async fn initialize(&self) {
        if self.init_started.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("initializing session");

        match self.restore_session().await {
            Ok(user) => {
                info!(authenticated = user.is_some(), "session initialized");
                self.store.dispatch(SessionEvent::Initialised { user });
            }
            Err(source) if source.is_login_required() => {
                debug!("no session to restore");
                self.store.dispatch(SessionEvent::Initialised { user: None });
            }
            Err(source) => {
                let err = SessionError::from_client(source, ErrorFallback::Login);
                error!(error = %err, "session initialization failed");
                self.store.dispatch(SessionEvent::Error { error: err });
            }
        }
    }

    async fn restore_session(&self) -> ClientResult<Option<Principal>> {
        let query = self
            .environment
            .current_location()
            .and_then(|location| location.query().map(|q| format!("?{q}")));

        if !self.skip_redirect_callback && has_auth_params(query.as_deref().unwrap_or("")) {
            let outcome = self.client.handle_redirect_callback(None).await?;
            let user = self.client.current_user();
            (self.on_redirect_callback)(outcome.app_state, user.as_ref());
            Ok(user)
        } else {
            self.client.check_session().await?;
            Ok(self.client.current_user())
        }
    }

    /// Authenticates through a popup window, marking the session loading
    /// for the popup's lifetime.
    ///
    /// # Errors
    ///
    /// Returns the normalized error after recording it in the snapshot.
    pub async fn login_with_popup(
        &self,
        options: PopupLoginOptions,
        config: PopupConfig,
    ) -> SessionResult<()> {
        self.store.dispatch(SessionEvent::LoginPopupStarted);

        match self.client.login_with_popup(options, config).await {
            Ok(()) => {
                let user = self.client.current_user();
                self.store
                    .dispatch(SessionEvent::LoginPopupComplete { user });
                Ok(())
            }
            Err(source) => {
                let err = SessionError::from_client(source, ErrorFallback::Login);
                warn!(error = %err, "popup login failed");
                self.store.dispatch(SessionEvent::Error { error: err.clone() });
                Err(err)
            }
        }
    }

    /// Starts a redirect-based login. The host navigates away, so no
    /// state transition is recorded here; the redirect callback on return
    /// completes the flow.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot start the flow. The
    /// snapshot is left untouched.
    pub async fn login_with_redirect(&self, options: RedirectLoginOptions) -> SessionResult<()> {
        self.client
            .login_with_redirect(options)
            .await
            .map_err(|source| SessionError::from_client(source, ErrorFallback::Login))
    }

    /// Ends the session. The snapshot is cleared only when the caller
    /// keeps the page: with the default full navigation, the host unload
    /// resets state anyway, and clearing early would flash a signed-out
    /// frame first.
    ///
    /// # Errors
    ///
    /// Returns an error when the client rejects the logout; the snapshot
    /// is left untouched in that case.
    pub async fn logout(&self, options: LogoutOptions) -> SessionResult<()> {
        let stays_on_page = options.stays_on_page();
        self.client
            .logout(options)
            .await
            .map_err(|source| SessionError::from_client(source, ErrorFallback::Login))?;

        if stays_on_page {
            debug!("session ended locally");
            self.store.dispatch(SessionEvent::Logout);
        }
        Ok(())
    }

    /// Fetches an access token without user interaction.
    ///
    /// The identity sync runs whether or not the fetch succeeded: a failed
    /// refresh can invalidate the session, and consumers find out through
    /// the snapshot rather than by polling.
    ///
    /// # Errors
    ///
    /// Returns the normalized error after the identity sync.
    pub async fn get_token_silently(&self, options: TokenOptions) -> SessionResult<TokenGrant> {
        let result = self.client.get_token_silently(options).await;
        self.sync_identity_after_token_call(&result);
        result.map_err(|source| SessionError::from_client(source, ErrorFallback::Token))
    }

    /// Fetches an access token through a popup window.
    ///
    /// # Errors
    ///
    /// Returns the normalized error after the identity sync.
    pub async fn get_token_with_popup(
        &self,
        options: PopupLoginOptions,
        config: PopupConfig,
    ) -> SessionResult<String> {
        let result = self.client.get_token_with_popup(options, config).await;
        self.sync_identity_after_token_call(&result);
        result.map_err(|source| SessionError::from_client(source, ErrorFallback::Token))
    }

    /// Exchanges an external token for session tokens. The session's
    /// configured audience and scope fill in whatever the request leaves
    /// unset.
    ///
    /// # Errors
    ///
    /// Returns the normalized error after the identity sync.
    pub async fn exchange_token(
        &self,
        mut options: TokenExchangeOptions,
    ) -> SessionResult<TokenEndpointResponse> {
        if options.audience.is_none() {
            options.audience = self.default_authorization_params.audience.clone();
        }
        if options.scope.is_none() {
            options.scope = self.default_authorization_params.scope.clone();
        }

        let result = self.client.exchange_token(options).await;
        self.sync_identity_after_token_call(&result);
        result.map_err(|source| SessionError::from_client(source, ErrorFallback::Token))
    }

    /// Completes a redirect-based login from an explicit callback URL, for
    /// hosts that route the callback themselves.
    ///
    /// # Errors
    ///
    /// Returns the normalized error after the identity sync.
    pub async fn handle_redirect_callback(
        &self,
        url: Option<Url>,
    ) -> SessionResult<RedirectOutcome> {
        let result = self.client.handle_redirect_callback(url).await;
        let user = self.client.current_user();
        self.store
            .dispatch(SessionEvent::RedirectCallbackComplete { user });
        result.map_err(|source| SessionError::from_client(source, ErrorFallback::Token))
    }

    fn sync_identity_after_token_call<T>(&self, result: &ClientResult<T>) {
        if let Err(source) = result {
            warn!(error = %source, "token request failed");
        }
        let user = self.client.current_user();
        self.store
            .dispatch(SessionEvent::TokenRefreshComplete { user });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use signet_domain::{AppState, ClientError};

    use super::*;
    use crate::ports::{OpenUrl, StaticEnvironment};

    /// Scripted client that records every call it receives.
    #[derive(Default)]
    struct RecordingClient {
        user: Mutex<Option<Principal>>,
        check_session_error: Mutex<Option<ClientError>>,
        callback_error: Mutex<Option<ClientError>>,
        callback_app_state: Mutex<Option<AppState>>,
        popup_error: Mutex<Option<ClientError>>,
        token_error: Mutex<Option<ClientError>>,
        exchange_requests: Mutex<Vec<TokenExchangeOptions>>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl RecordingClient {
        fn with_user(subject: &str) -> Self {
            let client = Self::default();
            *client.user.lock().unwrap() = Some(Principal::new(subject));
            client
        }

        fn set_user(&self, user: Option<Principal>) {
            *self.user.lock().unwrap() = user;
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SessionClient for RecordingClient {
        async fn check_session(&self) -> ClientResult<()> {
            self.record("check_session");
            match self.check_session_error.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        async fn handle_redirect_callback(
            &self,
            _url: Option<Url>,
        ) -> ClientResult<RedirectOutcome> {
            self.record("handle_redirect_callback");
            match self.callback_error.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(RedirectOutcome {
                    app_state: self.callback_app_state.lock().unwrap().take(),
                }),
            }
        }

        fn current_user(&self) -> Option<Principal> {
            self.user.lock().unwrap().clone()
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
            match self.popup_error.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        async fn login_with_redirect(&self, _options: RedirectLoginOptions) -> ClientResult<()> {
            self.record("login_with_redirect");
            Ok(())
        }

        async fn logout(&self, _options: LogoutOptions) -> ClientResult<()> {
            self.record("logout");
            Ok(())
        }

        async fn get_token_silently(&self, _options: TokenOptions) -> ClientResult<TokenGrant> {
            self.record("get_token_silently");
            match self.token_error.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(TokenGrant::Plain("token-123".into())),
            }
        }

        async fn get_token_with_popup(
            &self,
            _options: PopupLoginOptions,
            _config: PopupConfig,
        ) -> ClientResult<String> {
            self.record("get_token_with_popup");
            match self.token_error.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok("token-456".into()),
            }
        }

        async fn exchange_token(
            &self,
            options: TokenExchangeOptions,
        ) -> ClientResult<TokenEndpointResponse> {
            self.record("exchange_token");
            self.exchange_requests.lock().unwrap().push(options);
            match self.token_error.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(TokenEndpointResponse {
                    access_token: "exchanged".into(),
                    expires_in: 3600,
                    ..TokenEndpointResponse::default()
                }),
            }
        }
    }

    fn controller_over(client: RecordingClient) -> (Arc<RecordingClient>, SessionController) {
        let client = Arc::new(client);
        let controller = SessionController::new(client.clone(), ControllerOptions::default());
        (client, controller)
    }

    fn interactive_at(url: &str) -> ControllerOptions {
        let location = Url::parse(url).expect("valid test url");
        ControllerOptions::default().with_environment(Arc::new(StaticEnvironment::new(location)))
    }

    #[tokio::test]
    async fn test_initialize_restores_session_from_cache() {
        let (client, controller) = controller_over(RecordingClient::with_user("user-1"));

        controller.initialize().await;

        let snapshot = controller.snapshot();
        assert!(snapshot.is_authenticated);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.error, None);
        assert_eq!(client.calls(), vec!["check_session"]);
    }

    #[tokio::test]
    async fn test_initialize_runs_once() {
        let (client, controller) = controller_over(RecordingClient::with_user("user-1"));

        controller.initialize().await;
        controller.initialize().await;

        assert_eq!(client.calls(), vec!["check_session"]);
    }

    #[tokio::test]
    async fn test_initialize_treats_login_required_as_signed_out() {
        let client = RecordingClient::default();
        *client.check_session_error.lock().unwrap() = Some(ClientError::oauth("login_required"));
        let (_client, controller) = controller_over(client);

        controller.initialize().await;

        let snapshot = controller.snapshot();
        assert!(!snapshot.is_authenticated);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.error, None);
    }

    #[tokio::test]
    async fn test_initialize_reports_real_failures() {
        let client = RecordingClient::default();
        *client.check_session_error.lock().unwrap() = Some(ClientError::oauth_described(
            "invalid_grant",
            "Unknown or invalid refresh token.",
        ));
        let (_client, controller) = controller_over(client);

        controller.initialize().await;

        let snapshot = controller.snapshot();
        assert!(!snapshot.is_loading);
        let message = snapshot.error.as_ref().map(ToString::to_string);
        assert_eq!(message, Some("Unknown or invalid refresh token.".into()));
    }

    #[tokio::test]
    async fn test_initialize_processes_redirect_callback() {
        let client = RecordingClient::with_user("user-1");
        *client.callback_app_state.lock().unwrap() = Some(AppState::returning_to("/inbox"));
        let client = Arc::new(client);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_hook = seen.clone();
        let options = interactive_at("https://app.example.com/callback?code=abc&state=xyz")
            .with_redirect_hook(Arc::new(move |app_state, user| {
                seen_by_hook
                    .lock()
                    .unwrap()
                    .push((app_state, user.cloned()));
            }));
        let controller = SessionController::new(client.clone(), options);

        controller.initialize().await;

        assert_eq!(client.calls(), vec!["handle_redirect_callback"]);
        assert!(controller.snapshot().is_authenticated);
        let invocations = seen.lock().unwrap();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].0, Some(AppState::returning_to("/inbox")));
        assert_eq!(
            invocations[0].1.as_ref().map(|user| user.subject.clone()),
            Some("user-1".into())
        );
    }

    #[tokio::test]
    async fn test_initialize_skips_callback_when_configured() {
        let client = Arc::new(RecordingClient::with_user("user-1"));
        let options = interactive_at("https://app.example.com/callback?code=abc&state=xyz")
            .skipping_redirect_callback();
        let controller = SessionController::new(client.clone(), options);

        controller.initialize().await;

        assert_eq!(client.calls(), vec!["check_session"]);
    }

    #[tokio::test]
    async fn test_initialize_ignores_unrelated_queries() {
        let client = Arc::new(RecordingClient::with_user("user-1"));
        let options = interactive_at("https://app.example.com/inbox?tab=starred");
        let controller = SessionController::new(client.clone(), options);

        controller.initialize().await;

        assert_eq!(client.calls(), vec!["check_session"]);
    }

    #[tokio::test]
    async fn test_popup_login_completes_into_authenticated_state() {
        let (client, controller) = controller_over(RecordingClient::default());
        client.set_user(Some(Principal::new("user-1")));

        let result = controller
            .login_with_popup(PopupLoginOptions::default(), PopupConfig::default())
            .await;

        assert_eq!(result, Ok(()));
        let snapshot = controller.snapshot();
        assert!(snapshot.is_authenticated);
        assert!(!snapshot.is_loading);
    }

    #[tokio::test]
    async fn test_popup_login_failure_lands_in_state_and_returns() {
        let client = RecordingClient::default();
        *client.popup_error.lock().unwrap() = Some(ClientError::oauth_described(
            "access_denied",
            "User closed the popup.",
        ));
        let (_client, controller) = controller_over(client);

        let result = controller
            .login_with_popup(PopupLoginOptions::default(), PopupConfig::default())
            .await;

        let err = result.expect_err("popup failure must surface");
        assert_eq!(err.to_string(), "User closed the popup.");
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.error, Some(err));
        assert!(!snapshot.is_loading);
    }

    #[tokio::test]
    async fn test_popup_login_transport_failure_uses_the_login_fallback() {
        let client = RecordingClient::default();
        *client.popup_error.lock().unwrap() = Some(ClientError::opaque());
        let (_client, controller) = controller_over(client);

        let result = controller
            .login_with_popup(PopupLoginOptions::default(), PopupConfig::default())
            .await;

        let err = result.expect_err("popup failure must surface");
        assert_eq!(err.to_string(), "Login failed");
        let snapshot = controller.snapshot();
        assert!(!snapshot.is_authenticated);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.error, Some(err));
    }

    #[tokio::test]
    async fn test_redirect_login_leaves_the_snapshot_alone() {
        let (client, controller) = controller_over(RecordingClient::default());
        let before = controller.snapshot();

        let result = controller
            .login_with_redirect(RedirectLoginOptions::default())
            .await;

        assert_eq!(result, Ok(()));
        assert!(Arc::ptr_eq(&before, &controller.snapshot()));
        assert_eq!(client.calls(), vec!["login_with_redirect"]);
    }

    #[tokio::test]
    async fn test_logout_keeps_state_when_navigating_away() {
        let (client, controller) = controller_over(RecordingClient::with_user("user-1"));
        controller.initialize().await;

        let result = controller.logout(LogoutOptions::default()).await;

        assert_eq!(result, Ok(()));
        assert!(controller.snapshot().is_authenticated);
        assert!(client.calls().contains(&"logout"));
    }

    #[tokio::test]
    async fn test_logout_clears_state_when_staying_on_page() {
        let (_client, controller) = controller_over(RecordingClient::with_user("user-1"));
        controller.initialize().await;

        let options = LogoutOptions::default().with_open_url(OpenUrl::Suppress);
        let result = controller.logout(options).await;

        assert_eq!(result, Ok(()));
        let snapshot = controller.snapshot();
        assert!(!snapshot.is_authenticated);
        assert_eq!(snapshot.user, None);
    }

    #[tokio::test]
    async fn test_token_refresh_returns_the_grant_and_syncs_identity() {
        let (client, controller) = controller_over(RecordingClient::with_user("user-1"));
        controller.initialize().await;
        client.set_user(Some(Principal::new("user-2")));

        let grant = controller
            .get_token_silently(TokenOptions::default())
            .await
            .expect("token fetch succeeds");

        assert_eq!(grant.access_token(), "token-123");
        let snapshot = controller.snapshot();
        assert_eq!(
            snapshot.user.as_ref().map(|user| user.subject.clone()),
            Some("user-2".into())
        );
    }

    #[tokio::test]
    async fn test_failed_token_refresh_still_syncs_identity() {
        let (client, controller) = controller_over(RecordingClient::with_user("user-1"));
        controller.initialize().await;
        assert!(controller.snapshot().is_authenticated);

        *client.token_error.lock().unwrap() = Some(ClientError::opaque());
        client.set_user(None);

        let result = controller.get_token_silently(TokenOptions::default()).await;

        let err = result.expect_err("token failure must surface");
        assert_eq!(err.to_string(), "Get access token failed");
        assert!(!controller.snapshot().is_authenticated);
    }

    #[tokio::test]
    async fn test_popup_token_fetch_syncs_identity() {
        let (client, controller) = controller_over(RecordingClient::default());
        client.set_user(Some(Principal::new("user-1")));

        let token = controller
            .get_token_with_popup(PopupLoginOptions::default(), PopupConfig::default())
            .await
            .expect("popup token fetch succeeds");

        assert_eq!(token, "token-456");
        assert!(controller.snapshot().is_authenticated);
    }

    #[tokio::test]
    async fn test_exchange_token_fills_session_defaults() {
        let client = Arc::new(RecordingClient::with_user("user-1"));
        let params = AuthorizationParams::default()
            .with_audience("https://api.example.com")
            .with_scope("openid read:things");
        let options = ControllerOptions::default().with_default_authorization_params(params);
        let controller = SessionController::new(client.clone(), options);

        let request = TokenExchangeOptions::new(
            "external-token",
            "urn:ietf:params:oauth:token-type:access_token",
        );
        controller
            .exchange_token(request)
            .await
            .expect("exchange succeeds");

        let recorded = client.exchange_requests.lock().unwrap();
        assert_eq!(recorded[0].audience, Some("https://api.example.com".into()));
        assert_eq!(recorded[0].scope, Some("openid read:things".into()));
    }

    #[tokio::test]
    async fn test_exchange_token_keeps_explicit_parameters() {
        let client = Arc::new(RecordingClient::with_user("user-1"));
        let params = AuthorizationParams::default().with_audience("https://api.example.com");
        let options = ControllerOptions::default().with_default_authorization_params(params);
        let controller = SessionController::new(client.clone(), options);

        let request = TokenExchangeOptions::new(
            "external-token",
            "urn:ietf:params:oauth:token-type:access_token",
        )
        .with_audience("https://other.example.com");
        controller
            .exchange_token(request)
            .await
            .expect("exchange succeeds");

        let recorded = client.exchange_requests.lock().unwrap();
        assert_eq!(
            recorded[0].audience,
            Some("https://other.example.com".into())
        );
        assert_eq!(recorded[0].scope, None);
    }

    #[tokio::test]
    async fn test_failed_exchange_still_syncs_identity() {
        let (client, controller) = controller_over(RecordingClient::with_user("user-1"));
        controller.initialize().await;
        assert!(controller.snapshot().is_authenticated);

        *client.token_error.lock().unwrap() = Some(ClientError::opaque());
        client.set_user(None);

        let request = TokenExchangeOptions::new(
            "external-token",
            "urn:ietf:params:oauth:token-type:access_token",
        );
        let result = controller.exchange_token(request).await;

        let err = result.expect_err("exchange failure must surface");
        assert_eq!(err.to_string(), "Get access token failed");
        assert!(!controller.snapshot().is_authenticated);
    }

    #[tokio::test]
    async fn test_manual_redirect_callback_syncs_identity() {
        let (client, controller) = controller_over(RecordingClient::default());
        *client.callback_app_state.lock().unwrap() = Some(AppState::returning_to("/dashboard"));
        client.set_user(Some(Principal::new("user-1")));

        let outcome = controller
            .handle_redirect_callback(None)
            .await
            .expect("callback succeeds");

        assert_eq!(outcome.app_state, Some(AppState::returning_to("/dashboard")));
        assert!(controller.snapshot().is_authenticated);
    }
}
