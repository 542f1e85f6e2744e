//! Maps channel tokens to the scopes currently mounted under them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use signet_application::SessionController;

use crate::channel::ChannelToken;
use crate::handle::SessionHandle;

struct BindingEntry {
    id: u64,
    controller: Arc<SessionController>,
}

#[derive(Default)]
struct RegistryInner {
    bindings: RwLock<HashMap<ChannelToken, Vec<BindingEntry>>>,
    next_id: AtomicU64,
}

/// Resolution table from channel tokens to mounted scopes.
///
/// Each token holds a stack of bindings: mounting a scope under an
/// already-bound token shadows the earlier scope, and unmounting it
/// uncovers the earlier one again. Resolution always answers with the
/// newest live binding, so nesting behaves the way lexical scoping does.
///
/// The registry is plain shared data with no global instance; callers
/// decide how widely to share it by cloning.
#[derive(Clone, Default)]
pub struct ScopeRegistry {
    inner: Arc<RegistryInner>,
}

impl ScopeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a controller under the token until the returned guard drops.
    pub(crate) fn bind(
        &self,
        token: ChannelToken,
        controller: Arc<SessionController>,
    ) -> ScopeBinding {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut bindings = self
            .inner
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        bindings
            .entry(token)
            .or_default()
            .push(BindingEntry { id, controller });

        ScopeBinding {
            registry: Arc::downgrade(&self.inner),
            token,
            id,
        }
    }

    /// Resolves the token to the newest live scope, or to an unbound
    /// handle when nothing is mounted under it.
    #[must_use]
    pub fn resolve(&self, token: ChannelToken) -> SessionHandle {
        let bindings = self
            .inner
            .bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        bindings
            .get(&token)
            .and_then(|stack| stack.last())
            .map_or_else(SessionHandle::unbound, |entry| {
                SessionHandle::bound(entry.controller.clone())
            })
    }
}

/// Guard keeping one scope resolvable; dropping it unbinds the scope and
/// uncovers whatever it was shadowing.
pub struct ScopeBinding {
    registry: Weak<RegistryInner>,
    token: ChannelToken,
    id: u64,
}

impl Drop for ScopeBinding {
    fn drop(&mut self) {
        let Some(inner) = self.registry.upgrade() else {
            return;
        };
        let mut bindings = inner
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(stack) = bindings.get_mut(&self.token) {
            stack.retain(|entry| entry.id != self.id);
            if stack.is_empty() {
                bindings.remove(&self.token);
            }
        }
    }
}
