//! Shared session state, published over a watch channel.

use std::sync::Arc;

use signet_domain::{SessionEvent, SessionSnapshot, reduce};
use tokio::sync::watch;

/// Holds the current [`SessionSnapshot`] and fans updates out to
/// subscribers.
///
/// Dispatch runs the reducer under the channel's write lock, so
/// concurrent events serialize into some total order and every subscriber
/// observes snapshots from that order. Events the reducer absorbs (the
/// snapshot comes back pointer-identical) are dropped without waking
/// anybody.
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<Arc<SessionSnapshot>>,
}

impl SessionStore {
    /// Creates a store holding the given initial snapshot.
    #[must_use]
    pub fn new(initial: SessionSnapshot) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx }
    }

    /// Applies an event to the current snapshot and publishes the result.
    pub fn dispatch(&self, event: SessionEvent) {
        self.tx.send_if_modified(|current| {
            let next = reduce(current, event);
            if Arc::ptr_eq(&next, current) {
                return false;
            }
            *current = next;
            true
        });
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.tx.borrow().clone()
    }

    /// Subscribes to snapshot updates. The receiver starts with the
    /// current snapshot already seen.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionSnapshot>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use signet_domain::Principal;

    use super::*;

    #[test]
    fn test_dispatch_publishes_the_reduced_snapshot() {
        let store = SessionStore::new(SessionSnapshot::interactive());
        let mut rx = store.subscribe();

        store.dispatch(SessionEvent::Initialised {
            user: Some(Principal::new("user-1")),
        });

        assert!(rx.has_changed().unwrap_or(false));
        let snapshot = rx.borrow_and_update().clone();
        assert!(snapshot.is_authenticated);
        assert!(!snapshot.is_loading);
    }

    #[test]
    fn test_absorbed_events_do_not_wake_subscribers() {
        let store = SessionStore::new(SessionSnapshot::interactive());
        store.dispatch(SessionEvent::Initialised {
            user: Some(Principal::new("user-1")),
        });

        let mut rx = store.subscribe();
        let before = rx.borrow_and_update().clone();

        store.dispatch(SessionEvent::TokenRefreshComplete {
            user: Some(Principal::new("user-1")),
        });

        assert!(!rx.has_changed().unwrap_or(true));
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_snapshot_tracks_the_latest_dispatch() {
        let store = SessionStore::new(SessionSnapshot::interactive());
        store.dispatch(SessionEvent::Initialised {
            user: Some(Principal::new("user-1")),
        });
        store.dispatch(SessionEvent::Logout);

        let snapshot = store.snapshot();
        assert!(!snapshot.is_authenticated);
        assert_eq!(snapshot.user, None);
    }
}
