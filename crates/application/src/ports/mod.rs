//! Ports (interfaces) for external dependencies.
//!
//! The session core stays pure by depending on these traits instead of
//! concrete clients or hosts. Implementations live with the integrator.

mod client;
mod environment;

pub use client::{
    CacheUsage, LogoutOptions, LogoutParams, OpenUrl, PopupConfig, PopupLoginOptions,
    RedirectLoginOptions, RedirectOutcome, SessionClient, TokenEndpointResponse,
    TokenExchangeOptions, TokenGrant, TokenOptions,
};
pub use environment::{DetachedEnvironment, HostEnvironment, StaticEnvironment};
