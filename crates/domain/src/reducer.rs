//! Pure state transitions for the session snapshot.

use std::sync::Arc;

use crate::event::SessionEvent;
use crate::principal::Principal;
use crate::snapshot::SessionSnapshot;

/// Applies one event to the current snapshot.
///
/// Total over the event union and never panics. Token and redirect
/// completions that carry the same identity as the current snapshot return
/// a pointer-equal `Arc`, so callers can skip publication entirely and
/// downstream subscribers are never woken for nothing.
#[must_use]
pub fn reduce(current: &Arc<SessionSnapshot>, event: SessionEvent) -> Arc<SessionSnapshot> {
    match event {
        SessionEvent::Initialised { user } | SessionEvent::LoginPopupComplete { user } => {
            Arc::new(SessionSnapshot {
                is_authenticated: user.is_some(),
                is_loading: false,
                user,
                error: None,
            })
        }
        SessionEvent::LoginPopupStarted => Arc::new(SessionSnapshot {
            is_loading: true,
            ..(**current).clone()
        }),
        SessionEvent::TokenRefreshComplete { user }
        | SessionEvent::RedirectCallbackComplete { user } => {
            if same_identity(current.user.as_ref(), user.as_ref()) {
                return Arc::clone(current);
            }
            Arc::new(SessionSnapshot {
                is_authenticated: user.is_some(),
                user,
                ..(**current).clone()
            })
        }
        SessionEvent::Logout => Arc::new(SessionSnapshot {
            is_authenticated: false,
            user: None,
            ..(**current).clone()
        }),
        SessionEvent::Error { error } => Arc::new(SessionSnapshot {
            is_loading: false,
            error: Some(error),
            ..(**current).clone()
        }),
    }
}

fn same_identity(current: Option<&Principal>, incoming: Option<&Principal>) -> bool {
    match (current, incoming) {
        (None, None) => true,
        (Some(current), Some(incoming)) => current.same_identity(incoming),
        _ => false,
    }
}
