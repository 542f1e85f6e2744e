//! Port for the host environment's location, for redirect handling.

use std::sync::RwLock;

use url::Url;

/// Host environment the session runs in.
///
/// Interactive hosts expose their current location so the controller can
/// detect redirect callbacks and restore the pre-login path. Detached
/// hosts, such as server-side renderers, report no location at all.
pub trait HostEnvironment: Send + Sync {
    /// The host's current location, or `None` when the host has none.
    fn current_location(&self) -> Option<Url>;

    /// Replaces the current location without adding a history entry.
    fn replace_location(&self, location: &str);
}

/// An environment pinned to an explicit location, updated in place by
/// [`HostEnvironment::replace_location`].
#[derive(Debug)]
pub struct StaticEnvironment {
    location: RwLock<Option<Url>>,
}

impl StaticEnvironment {
    /// Creates an environment reporting the given location.
    #[must_use]
    pub const fn new(location: Url) -> Self {
        Self {
            location: RwLock::new(Some(location)),
        }
    }
}

impl HostEnvironment for StaticEnvironment {
    fn current_location(&self) -> Option<Url> {
        self.location.read().ok().and_then(|guard| guard.clone())
    }

    fn replace_location(&self, location: &str) {
        let Ok(mut guard) = self.location.write() else {
            return;
        };
        let resolved = match guard.as_ref() {
            Some(current) => current.join(location).ok(),
            None => Url::parse(location).ok(),
        };
        if let Some(resolved) = resolved {
            *guard = Some(resolved);
        }
    }
}

/// An environment with no location, for hosts that render without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedEnvironment;

impl HostEnvironment for DetachedEnvironment {
    fn current_location(&self) -> Option<Url> {
        None
    }

    fn replace_location(&self, _location: &str) {}
}
