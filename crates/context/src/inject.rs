//! Late-binding adapter for code that outlives any one scope.

use std::future::Future;

use crate::channel::ChannelToken;
use crate::handle::SessionHandle;
use crate::registry::ScopeRegistry;

/// Resolves the channel's live scope at call time instead of capturing a
/// handle once.
///
/// A handle resolved eagerly is pinned to whatever scope was mounted at
/// resolution time, or to the unbound stub if none was. Long-lived
/// callers, built before their scope mounts or surviving a remount, hold
/// one of these instead and get the current scope on every call.
#[derive(Clone)]
pub struct BoundSession {
    registry: ScopeRegistry,
    token: ChannelToken,
}

impl BoundSession {
    /// Binds to the given channel on the given registry.
    #[must_use]
    pub fn new(registry: &ScopeRegistry, token: ChannelToken) -> Self {
        Self {
            registry: registry.clone(),
            token,
        }
    }

    /// The channel this session binds to.
    #[must_use]
    pub const fn token(&self) -> ChannelToken {
        self.token
    }

    /// Resolves the channel's current scope.
    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        self.registry.resolve(self.token)
    }

    /// Runs the operation against the channel's current scope.
    pub async fn run<F, Fut, T>(&self, operation: F) -> T
    where
        F: FnOnce(SessionHandle) -> Fut,
        Fut: Future<Output = T>,
    {
        operation(self.handle()).await
    }
}
