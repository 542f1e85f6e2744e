//! Port for the external authentication client.
//!
//! The controller drives everything through this trait and never looks
//! inside the client: tokens, cache state, and transport live on the other
//! side of the boundary. The vocabulary types in this module mirror the
//! client's own request and response shapes so calls pass through without
//! translation loss.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use signet_domain::{AppState, ClientResult, IdTokenClaims, Principal};
use url::Url;

use crate::config::AuthorizationParams;

/// Options for a redirect-based login.
#[derive(Debug, Clone, Default)]
pub struct RedirectLoginOptions {
    /// Parameters forwarded to the authorization request.
    pub authorization_params: AuthorizationParams,
    /// Caller state returned verbatim by the redirect callback.
    pub app_state: Option<AppState>,
    /// Deliver the response in the URL fragment instead of the query.
    pub fragment: Option<String>,
}

impl RedirectLoginOptions {
    /// Sets the caller state carried through the round trip.
    #[must_use]
    pub fn with_app_state(mut self, app_state: AppState) -> Self {
        self.app_state = Some(app_state);
        self
    }

    /// Sets the parameters forwarded to the authorization request.
    #[must_use]
    pub fn with_authorization_params(mut self, params: AuthorizationParams) -> Self {
        self.authorization_params = params;
        self
    }
}

/// Options for a popup-based login or token request.
#[derive(Debug, Clone, Default)]
pub struct PopupLoginOptions {
    /// Parameters forwarded to the authorization request.
    pub authorization_params: AuthorizationParams,
}

/// Popup window configuration, separate from the authorization options.
#[derive(Debug, Clone, Copy, Default)]
pub struct PopupConfig {
    /// Seconds before an unanswered popup counts as failed.
    pub timeout_secs: Option<u64>,
}

/// How a token request may interact with the client's cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheUsage {
    /// Use a cached token when valid, otherwise fetch.
    #[default]
    On,
    /// Always fetch, ignoring the cache.
    Off,
    /// Only consult the cache; never hit the network.
    CacheOnly,
}

/// Options for a background token request.
#[derive(Debug, Clone, Default)]
pub struct TokenOptions {
    /// Parameters forwarded to the token request.
    pub authorization_params: AuthorizationParams,
    /// Cache interaction mode.
    pub cache_usage: CacheUsage,
    /// Return the full token endpoint response instead of the bare token.
    pub detailed_response: bool,
    /// Seconds before the request times out.
    pub timeout_secs: Option<u64>,
}

impl TokenOptions {
    /// Sets the parameters forwarded to the token request.
    #[must_use]
    pub fn with_authorization_params(mut self, params: AuthorizationParams) -> Self {
        self.authorization_params = params;
        self
    }

    /// Requests the full token endpoint response.
    #[must_use]
    pub const fn detailed(mut self) -> Self {
        self.detailed_response = true;
        self
    }
}

/// Options for an RFC 8693 token exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenExchangeOptions {
    /// The token being exchanged.
    pub subject_token: String,
    /// Type URI describing the subject token.
    pub subject_token_type: String,
    /// Requested scopes; the session default applies when unset.
    pub scope: Option<String>,
    /// Requested audience; the session default applies when unset.
    pub audience: Option<String>,
}

impl TokenExchangeOptions {
    /// Creates exchange options for the given subject token.
    #[must_use]
    pub fn new(subject_token: impl Into<String>, subject_token_type: impl Into<String>) -> Self {
        Self {
            subject_token: subject_token.into(),
            subject_token_type: subject_token_type.into(),
            scope: None,
            audience: None,
        }
    }

    /// Sets the requested scopes.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Sets the requested audience.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }
}

/// How a logout leaves the current page, if at all.
#[derive(Clone)]
pub enum OpenUrl {
    /// Do not navigate anywhere; the caller stays on the page.
    Suppress,
    /// Caller-provided navigation, such as a client-side router push.
    Handler(Arc<dyn Fn(Url) + Send + Sync>),
}

impl fmt::Debug for OpenUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Suppress => f.write_str("OpenUrl::Suppress"),
            Self::Handler(_) => f.write_str("OpenUrl::Handler(..)"),
        }
    }
}

/// Parameters forwarded to the logout endpoint.
#[derive(Debug, Clone, Default)]
pub struct LogoutParams {
    /// Where the authorization server sends the caller afterwards.
    pub return_to: Option<String>,
    /// Also log out of the upstream identity provider.
    pub federated: bool,
}

/// Options for ending the session.
#[derive(Debug, Clone, Default)]
pub struct LogoutOptions {
    /// Parameters forwarded to the logout endpoint.
    pub logout_params: LogoutParams,
    /// Overrides how the logout URL is opened. When set, the caller keeps
    /// control of the page and local state must be cleared eagerly.
    pub open_url: Option<OpenUrl>,
}

impl LogoutOptions {
    /// Sets where the authorization server sends the caller afterwards.
    #[must_use]
    pub fn with_return_to(mut self, return_to: impl Into<String>) -> Self {
        self.logout_params.return_to = Some(return_to.into());
        self
    }

    /// Sets how the logout URL is opened.
    #[must_use]
    pub fn with_open_url(mut self, open_url: OpenUrl) -> Self {
        self.open_url = Some(open_url);
        self
    }

    /// Whether the caller keeps the page after logout. When true the
    /// session state must be cleared locally because no full page unload
    /// will do it.
    #[must_use]
    pub const fn stays_on_page(&self) -> bool {
        self.open_url.is_some()
    }
}

/// Result of processing a redirect callback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedirectOutcome {
    /// Caller state from the matching login request, if any survived the
    /// round trip.
    pub app_state: Option<AppState>,
}

/// Response from the token endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEndpointResponse {
    /// The access token.
    pub access_token: String,
    /// Identity token, present on authentication grants.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Refresh token, present when offline access was granted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires.
    pub expires_in: u64,
    /// Scopes actually granted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// A granted token, bare or with the full endpoint response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenGrant {
    /// Just the access token.
    Plain(String),
    /// The full token endpoint response.
    Detailed(TokenEndpointResponse),
}

impl TokenGrant {
    /// The access token regardless of response shape.
    #[must_use]
    pub fn access_token(&self) -> &str {
        match self {
            Self::Plain(token) => token,
            Self::Detailed(response) => &response.access_token,
        }
    }
}

/// External authentication client driven by the session controller.
///
/// Implementations own the protocol work: building authorization URLs,
/// exchanging codes, caching tokens, and verifying identity tokens. The
/// cache-reading methods are synchronous because implementations answer
/// them from local state.
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Restores a session from the client's cache or a silent
    /// authentication round trip.
    ///
    /// # Errors
    ///
    /// Returns an error when silent authentication fails; a
    /// `login_required` error here means nobody is signed in, which is an
    /// answer rather than a failure.
    async fn check_session(&self) -> ClientResult<()>;

    /// Completes a redirect-based login from the callback URL, exchanging
    /// the authorization code for tokens.
    ///
    /// # Arguments
    ///
    /// * `url` - The callback URL to process; the current host location
    ///   when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error when the callback carries an error response or the
    /// code exchange fails.
    async fn handle_redirect_callback(&self, url: Option<Url>) -> ClientResult<RedirectOutcome>;

    /// The signed-in principal from the client's cache, if any.
    fn current_user(&self) -> Option<Principal>;

    /// Whether a principal is signed in, per the client's cache.
    fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// Whether the cached session satisfies the given audience and scopes.
    ///
    /// The default implementation only checks that somebody is signed in;
    /// clients that track granted scopes per audience should override it.
    fn is_authorized(&self, audience: &str, scope: &str) -> bool {
        let _ = (audience, scope);
        self.is_authenticated()
    }

    /// The raw and decoded claims of the cached identity token, if any.
    fn id_token_claims(&self) -> Option<IdTokenClaims>;

    /// Authenticates through a popup window.
    ///
    /// # Errors
    ///
    /// Returns an error when the popup is blocked, times out, or the
    /// authorization fails.
    async fn login_with_popup(
        &self,
        options: PopupLoginOptions,
        config: PopupConfig,
    ) -> ClientResult<()>;

    /// Starts a redirect-based login by navigating to the authorization
    /// server.
    ///
    /// # Errors
    ///
    /// Returns an error when the authorization URL cannot be built or the
    /// navigation fails.
    async fn login_with_redirect(&self, options: RedirectLoginOptions) -> ClientResult<()>;

    /// Ends the session, clearing the client's cache and, unless
    /// suppressed, navigating to the logout endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error when the logout navigation fails.
    async fn logout(&self, options: LogoutOptions) -> ClientResult<()>;

    /// Fetches an access token without user interaction, from cache or a
    /// silent authentication round trip.
    ///
    /// # Errors
    ///
    /// Returns an error when no cached token fits and silent
    /// authentication fails or is unavailable.
    async fn get_token_silently(&self, options: TokenOptions) -> ClientResult<TokenGrant>;

    /// Fetches an access token through a popup window, for when silent
    /// authentication cannot satisfy the request.
    ///
    /// # Errors
    ///
    /// Returns an error when the popup is blocked, times out, or the
    /// authorization fails.
    async fn get_token_with_popup(
        &self,
        options: PopupLoginOptions,
        config: PopupConfig,
    ) -> ClientResult<String>;

    /// Exchanges an external token for session tokens per RFC 8693.
    ///
    /// # Errors
    ///
    /// Returns an error when the exchange is rejected or the transport
    /// fails.
    async fn exchange_token(
        &self,
        options: TokenExchangeOptions,
    ) -> ClientResult<TokenEndpointResponse>;
}
