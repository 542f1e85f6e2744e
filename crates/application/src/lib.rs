//! Signet Application - Session orchestration
//!
//! This crate drives the external authentication client and publishes the
//! resulting session state. It owns no protocol work: the client behind
//! the [`SessionClient`] port does the authenticating, and this crate
//! keeps the shared [`signet_domain::SessionSnapshot`] honest about it.

pub mod config;
pub mod controller;
pub mod ports;
pub mod redirect;
pub mod store;

pub use config::{AuthorizationParams, CacheLocation, ClientOptions, ClientTag};
pub use controller::{ControllerOptions, SessionController};
pub use ports::{
    CacheUsage, DetachedEnvironment, HostEnvironment, LogoutOptions, LogoutParams, OpenUrl,
    PopupConfig, PopupLoginOptions, RedirectLoginOptions, RedirectOutcome, SessionClient,
    StaticEnvironment, TokenEndpointResponse, TokenExchangeOptions, TokenGrant, TokenOptions,
};
pub use redirect::{RedirectHook, default_redirect_hook, has_auth_params};
pub use store::SessionStore;
