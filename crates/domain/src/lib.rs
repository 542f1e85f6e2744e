//! Signet Domain - Core session types
//!
//! This crate defines the session model for the Signet binding core.
//! All types here are pure Rust with no I/O dependencies.

pub mod app_state;
pub mod error;
pub mod event;
pub mod principal;
pub mod reducer;
pub mod snapshot;

pub use app_state::AppState;
pub use error::{ClientError, ClientResult, ErrorFallback, SessionError, SessionResult};
pub use event::SessionEvent;
pub use principal::{IdTokenClaims, Principal};
pub use reducer::reduce;
pub use snapshot::SessionSnapshot;
