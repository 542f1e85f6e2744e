//! Consumer-side handle to a resolved session channel.

use std::fmt;
use std::sync::Arc;

use signet_application::{
    LogoutOptions, PopupConfig, PopupLoginOptions, RedirectLoginOptions, RedirectOutcome,
    SessionController, TokenEndpointResponse, TokenExchangeOptions, TokenGrant, TokenOptions,
};
use signet_domain::{IdTokenClaims, Principal, SessionError, SessionResult, SessionSnapshot};
use tokio::sync::watch;
use url::Url;

/// Defaults a scoped handle fills into token requests that leave them unset.
#[derive(Debug, Clone)]
struct TokenDefaults {
    audience: Option<String>,
    scope: Option<String>,
}

#[derive(Clone)]
enum HandleInner {
    Bound(Arc<SessionController>),
    /// No scope was mounted for the channel when this handle was
    /// resolved. Reads answer from the frozen snapshot; operations fail.
    Unbound(Arc<SessionSnapshot>),
}

/// What a consumer gets back from resolving a channel token.
///
/// A bound handle observes and drives the scope's controller. An unbound
/// handle is a deliberate tripwire: reads return the detached snapshot so
/// rendering code keeps working, but every operation fails with
/// [`SessionError::MissingScope`] before reaching any client, making the
/// missing scope impossible to miss.
#[derive(Clone)]
pub struct SessionHandle {
    inner: HandleInner,
    token_defaults: Option<TokenDefaults>,
}

impl SessionHandle {
    pub(crate) fn bound(controller: Arc<SessionController>) -> Self {
        Self {
            inner: HandleInner::Bound(controller),
            token_defaults: None,
        }
    }

    pub(crate) fn unbound() -> Self {
        Self {
            inner: HandleInner::Unbound(Arc::new(SessionSnapshot::detached())),
            token_defaults: None,
        }
    }

    /// Whether a live scope backs this handle.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        matches!(self.inner, HandleInner::Bound(_))
    }

    /// Whether two handles observe the same mounted scope.
    #[must_use]
    pub fn is_same_scope(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (HandleInner::Bound(a), HandleInner::Bound(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// A handle over the same scope whose token requests carry the given
    /// audience and scopes unless the request says otherwise.
    #[must_use]
    pub fn with_token_defaults(&self, audience: Option<String>, scope: Option<String>) -> Self {
        Self {
            inner: self.inner.clone(),
            token_defaults: Some(TokenDefaults { audience, scope }),
        }
    }

    /// The current snapshot; the frozen detached snapshot when unbound.
    #[must_use]
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        match &self.inner {
            HandleInner::Bound(controller) => controller.snapshot(),
            HandleInner::Unbound(detached) => detached.clone(),
        }
    }

    /// Subscribes to snapshot updates. An unbound handle's receiver holds
    /// the detached snapshot and never updates.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Arc<SessionSnapshot>> {
        match &self.inner {
            HandleInner::Bound(controller) => controller.subscribe(),
            HandleInner::Unbound(detached) => {
                let (_tx, rx) = watch::channel(detached.clone());
                rx
            }
        }
    }

    /// The signed-in principal, per the scope's client cache.
    #[must_use]
    pub fn current_user(&self) -> Option<Principal> {
        match &self.inner {
            HandleInner::Bound(controller) => controller.current_user(),
            HandleInner::Unbound(_) => None,
        }
    }

    /// Whether the session satisfies the given audience and scopes.
    #[must_use]
    pub fn is_authorized(&self, audience: &str, scope: &str) -> bool {
        match &self.inner {
            HandleInner::Bound(controller) => controller.is_authorized(audience, scope),
            HandleInner::Unbound(_) => false,
        }
    }

    /// The raw and decoded claims of the cached identity token.
    #[must_use]
    pub fn id_token_claims(&self) -> Option<IdTokenClaims> {
        match &self.inner {
            HandleInner::Bound(controller) => controller.id_token_claims(),
            HandleInner::Unbound(_) => None,
        }
    }

    fn controller(&self) -> SessionResult<&Arc<SessionController>> {
        match &self.inner {
            HandleInner::Bound(controller) => Ok(controller),
            HandleInner::Unbound(_) => Err(SessionError::MissingScope),
        }
    }

    fn apply_token_defaults(&self, mut options: TokenOptions) -> TokenOptions {
        let Some(defaults) = &self.token_defaults else {
            return options;
        };
        let params = &mut options.authorization_params;
        if params.audience.is_none() {
            params.audience.clone_from(&defaults.audience);
        }
        if params.scope.is_none() {
            params.scope.clone_from(&defaults.scope);
        }
        options
    }

    /// Authenticates through a popup window.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::MissingScope`] when no scope is mounted,
    /// otherwise as the controller does.
    pub async fn login_with_popup(
        &self,
        options: PopupLoginOptions,
        config: PopupConfig,
    ) -> SessionResult<()> {
        self.controller()?.login_with_popup(options, config).await
    }

    /// Starts a redirect-based login.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::MissingScope`] when no scope is mounted,
    /// otherwise as the controller does.
    pub async fn login_with_redirect(&self, options: RedirectLoginOptions) -> SessionResult<()> {
        self.controller()?.login_with_redirect(options).await
    }

    /// Ends the session.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::MissingScope`] when no scope is mounted,
    /// otherwise as the controller does.
    pub async fn logout(&self, options: LogoutOptions) -> SessionResult<()> {
        self.controller()?.logout(options).await
    }

    /// Fetches an access token without user interaction, folding in this
    /// handle's token defaults.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::MissingScope`] when no scope is mounted,
    /// otherwise as the controller does.
    pub async fn get_token_silently(&self, options: TokenOptions) -> SessionResult<TokenGrant> {
        let controller = self.controller()?;
        controller
            .get_token_silently(self.apply_token_defaults(options))
            .await
    }

    /// Fetches an access token through a popup window.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::MissingScope`] when no scope is mounted,
    /// otherwise as the controller does.
    pub async fn get_token_with_popup(
        &self,
        options: PopupLoginOptions,
        config: PopupConfig,
    ) -> SessionResult<String> {
        self.controller()?.get_token_with_popup(options, config).await
    }

    /// Exchanges an external token for session tokens.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::MissingScope`] when no scope is mounted,
    /// otherwise as the controller does.
    pub async fn exchange_token(
        &self,
        options: TokenExchangeOptions,
    ) -> SessionResult<TokenEndpointResponse> {
        self.controller()?.exchange_token(options).await
    }

    /// Completes a redirect-based login from an explicit callback URL.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::MissingScope`] when no scope is mounted,
    /// otherwise as the controller does.
    pub async fn handle_redirect_callback(
        &self,
        url: Option<Url>,
    ) -> SessionResult<RedirectOutcome> {
        self.controller()?.handle_redirect_callback(url).await
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            HandleInner::Bound(_) => f.write_str("SessionHandle::Bound"),
            HandleInner::Unbound(_) => f.write_str("SessionHandle::Unbound"),
        }
    }
}
