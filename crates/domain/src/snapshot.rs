//! The published session state record.

use crate::error::SessionError;
use crate::principal::Principal;

/// Immutable view of the session at one point in time.
///
/// Snapshots are replaced wholesale on every transition and shared behind
/// `Arc`, so readers never observe a partially-updated state. Whenever
/// `is_authenticated` is true, `user` is present.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Whether a principal is currently resolved.
    pub is_authenticated: bool,
    /// Whether an operation that can change the principal is in flight.
    pub is_loading: bool,
    /// The resolved principal, if any.
    pub user: Option<Principal>,
    /// The last failed operation's error, until a later success clears it.
    pub error: Option<SessionError>,
}

impl SessionSnapshot {
    /// State before the first initialization event in an interactive
    /// context: unauthenticated and loading.
    #[must_use]
    pub const fn interactive() -> Self {
        Self {
            is_authenticated: false,
            is_loading: true,
            user: None,
            error: None,
        }
    }

    /// State for contexts where no session check can run (prerendering,
    /// detached tooling). Never reports loading.
    #[must_use]
    pub const fn detached() -> Self {
        Self {
            is_authenticated: false,
            is_loading: false,
            user: None,
            error: None,
        }
    }

    /// Initial state for a scope, depending on whether the host context is
    /// interactive.
    #[must_use]
    pub const fn initial(interactive: bool) -> Self {
        if interactive {
            Self::interactive()
        } else {
            Self::detached()
        }
    }

    /// Returns true if the last recorded operation failed.
    #[must_use]
    pub const fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Returns true once the session has settled (nothing in flight).
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !self.is_loading
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::interactive()
    }
}
