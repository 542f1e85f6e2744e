//! Signet - Session state synchronization for OAuth/OIDC hosts
//!
//! Signet keeps one honest answer to "who is signed in right now" and
//! distributes it through the host application. The actual protocol work
//! lives in an external client behind the [`SessionClient`] port; this
//! crate mounts that client as a [`SessionScope`], publishes every
//! identity change as an immutable [`SessionSnapshot`], and hands
//! consumers [`SessionHandle`]s resolved through [`ChannelToken`]s.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use signet::{
//!     ChannelToken, ClientOptions, ScopeRegistry, SessionClient, SessionScope,
//!     SessionScopeOptions,
//! };
//!
//! # async fn demo(client: Arc<dyn SessionClient>) {
//! let registry = ScopeRegistry::new();
//! let options = SessionScopeOptions::new(ClientOptions::new("example.auth.com", "client-1"));
//! let _scope = SessionScope::mount(&registry, options, client);
//!
//! let handle = registry.resolve(ChannelToken::shared());
//! let snapshot = handle.snapshot();
//! println!("authenticated: {}", snapshot.is_authenticated);
//! # }
//! ```

pub use signet_application::{
    AuthorizationParams, CacheLocation, CacheUsage, ClientOptions, ClientTag, ControllerOptions,
    DetachedEnvironment, HostEnvironment, LogoutOptions, LogoutParams, OpenUrl, PopupConfig,
    PopupLoginOptions, RedirectHook, RedirectLoginOptions, RedirectOutcome, SessionClient,
    SessionController, StaticEnvironment, TokenEndpointResponse, TokenExchangeOptions, TokenGrant,
    TokenOptions, has_auth_params,
};
pub use signet_context::{
    AuthenticationGate, AuthorizationRequirement, AuthorizedSession, AuthorizedSnapshot,
    BeforeAuthenticationHook, BoundSession, ChannelToken, ClaimCheck, GateDecision, GateOptions,
    ReturnTo, ScopeBinding, ScopeRegistry, SessionHandle, SessionScope, SessionScopeOptions,
};
pub use signet_domain::{
    AppState, ClientError, ClientResult, IdTokenClaims, Principal, SessionError, SessionEvent,
    SessionResult, SessionSnapshot,
};
