//! Session view scoped to an audience and set of scopes.

use std::sync::Arc;

use signet_domain::{SessionError, SessionSnapshot};
use tokio::sync::watch;

use crate::handle::SessionHandle;

/// The audience and scopes a protected surface needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequirement {
    /// API audience the surface calls.
    pub audience: String,
    /// Scopes the surface needs, space-separated.
    pub scope: String,
}

impl AuthorizationRequirement {
    /// Creates a requirement for the given audience and scopes.
    #[must_use]
    pub fn new(audience: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            audience: audience.into(),
            scope: scope.into(),
        }
    }
}

/// Session state as seen through a requirement.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizedSnapshot {
    /// Whether the underlying session is still resolving.
    pub is_loading: bool,
    /// Whether the session is signed in and satisfies the requirement.
    pub is_authorized: bool,
    /// Whatever error the underlying session carries.
    pub error: Option<SessionError>,
}

/// Watches a session through the lens of one requirement.
///
/// Authorization is derived per read: signed in and holding the
/// requirement's audience and scopes. When the session signs out or its
/// grants change, the next read reflects it; nothing is cached here.
pub struct AuthorizedSession {
    handle: SessionHandle,
    requirement: AuthorizationRequirement,
    rx: watch::Receiver<Arc<SessionSnapshot>>,
}

impl AuthorizedSession {
    /// Creates a view of the handle's session through the requirement.
    ///
    /// The view's own handle folds the requirement into token requests as
    /// defaults, so a consumer that passed the authorization check fetches
    /// tokens that actually satisfy it.
    #[must_use]
    pub fn over(handle: &SessionHandle, requirement: AuthorizationRequirement) -> Self {
        let scoped = handle.with_token_defaults(
            Some(requirement.audience.clone()),
            Some(requirement.scope.clone()),
        );
        Self {
            rx: handle.watch(),
            handle: scoped,
            requirement,
        }
    }

    /// The handle scoped to this view's requirement.
    #[must_use]
    pub const fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// The requirement this view checks against.
    #[must_use]
    pub const fn requirement(&self) -> &AuthorizationRequirement {
        &self.requirement
    }

    /// The current state through the requirement.
    #[must_use]
    pub fn snapshot(&self) -> AuthorizedSnapshot {
        let base = self.handle.snapshot();
        AuthorizedSnapshot {
            is_loading: base.is_loading,
            is_authorized: base.is_authenticated
                && self
                    .handle
                    .is_authorized(&self.requirement.audience, &self.requirement.scope),
            error: base.error.clone(),
        }
    }

    /// Waits for the next underlying update. Returns `false` once the
    /// scope is gone and no further updates can arrive.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Waits until the underlying session settles, then reads through the
    /// requirement.
    pub async fn wait_until_settled(&mut self) -> AuthorizedSnapshot {
        let _ = self.rx.wait_for(|snapshot| !snapshot.is_loading).await;
        self.snapshot()
    }
}
