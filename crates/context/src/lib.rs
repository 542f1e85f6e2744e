//! Signet Context - Session distribution
//!
//! This crate carries sessions from the scope that owns them to the code
//! that consumes them. Scopes publish a session under a channel token;
//! handles resolve the token to the nearest live scope, or to a stub that
//! fails loudly when nothing is mounted. Gates and authorized views sit
//! on top for surfaces that require an authenticated or authorized
//! session.

pub mod authorized;
pub mod channel;
pub mod gate;
pub mod handle;
pub mod inject;
pub mod registry;
pub mod scope;

#[cfg(test)]
mod test_support;

pub use authorized::{AuthorizationRequirement, AuthorizedSession, AuthorizedSnapshot};
pub use channel::ChannelToken;
pub use gate::{
    AuthenticationGate, BeforeAuthenticationHook, ClaimCheck, GateDecision, GateOptions, ReturnTo,
};
pub use handle::SessionHandle;
pub use inject::BoundSession;
pub use registry::{ScopeBinding, ScopeRegistry};
pub use scope::{SessionScope, SessionScopeOptions};
