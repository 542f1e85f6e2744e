//! Mounts a session under a channel token for its lifetime.

use std::sync::Arc;

use signet_application::{
    ClientOptions, ControllerOptions, DetachedEnvironment, HostEnvironment, RedirectHook,
    SessionClient, SessionController,
};
use tracing::debug;

use crate::channel::ChannelToken;
use crate::handle::SessionHandle;
use crate::registry::{ScopeBinding, ScopeRegistry};

/// Construction options for [`SessionScope`].
#[derive(Clone)]
pub struct SessionScopeOptions {
    /// The channel the scope publishes under.
    pub token: ChannelToken,
    /// Configuration handed to the external client.
    pub client_options: ClientOptions,
    /// Whether the host can complete interactive flows. Interactive
    /// scopes initialize themselves on mount; detached ones never do.
    pub interactive: bool,
    /// Leave authorization responses in the location untouched.
    pub skip_redirect_callback: bool,
    /// Replaces the default post-callback location cleanup.
    pub on_redirect_callback: Option<RedirectHook>,
    /// The host environment the session runs in.
    pub environment: Arc<dyn HostEnvironment>,
}

impl SessionScopeOptions {
    /// Options publishing under the shared token, interactive, with a
    /// detached environment.
    #[must_use]
    pub fn new(client_options: ClientOptions) -> Self {
        Self {
            token: ChannelToken::shared(),
            client_options,
            interactive: true,
            skip_redirect_callback: false,
            on_redirect_callback: None,
            environment: Arc::new(DetachedEnvironment),
        }
    }

    /// Publishes under the given token instead of the shared one.
    #[must_use]
    pub const fn on_token(mut self, token: ChannelToken) -> Self {
        self.token = token;
        self
    }

    /// Marks the host unable to run interactive flows.
    #[must_use]
    pub const fn detached(mut self) -> Self {
        self.interactive = false;
        self
    }

    /// Leaves authorization responses in the location untouched.
    #[must_use]
    pub const fn skipping_redirect_callback(mut self) -> Self {
        self.skip_redirect_callback = true;
        self
    }

    /// Replaces the default post-callback location cleanup.
    #[must_use]
    pub fn with_redirect_hook(mut self, hook: RedirectHook) -> Self {
        self.on_redirect_callback = Some(hook);
        self
    }

    /// Sets the host environment.
    #[must_use]
    pub fn with_environment(mut self, environment: Arc<dyn HostEnvironment>) -> Self {
        self.environment = environment;
        self
    }
}

/// A mounted session: one controller bound under one channel token.
///
/// Mounting publishes the session for every handle resolved through the
/// token; dropping the scope unbinds it, uncovering any scope it was
/// shadowing. Interactive scopes start restoring their session in the
/// background immediately.
pub struct SessionScope {
    token: ChannelToken,
    controller: Arc<SessionController>,
    _binding: ScopeBinding,
}

impl SessionScope {
    /// Mounts a scope over an already-built client.
    ///
    /// # Panics
    ///
    /// Panics when `options.interactive` is set and no Tokio runtime is
    /// running, because initialization is spawned onto the runtime.
    #[must_use]
    pub fn mount(
        registry: &ScopeRegistry,
        options: SessionScopeOptions,
        client: Arc<dyn SessionClient>,
    ) -> Self {
        Self::mounted(registry, options, client)
    }

    /// Mounts a scope, building the client from the scope's finalized
    /// options. The factory receives the options with the telemetry tag
    /// stamped, identifying this binding to the client.
    ///
    /// # Panics
    ///
    /// Panics when `options.interactive` is set and no Tokio runtime is
    /// running, because initialization is spawned onto the runtime.
    #[must_use]
    pub fn mount_with<F>(registry: &ScopeRegistry, options: SessionScopeOptions, factory: F) -> Self
    where
        F: FnOnce(ClientOptions) -> Arc<dyn SessionClient>,
    {
        let client = factory(options.client_options.clone().finalized());
        Self::mounted(registry, options, client)
    }

    fn mounted(
        registry: &ScopeRegistry,
        options: SessionScopeOptions,
        client: Arc<dyn SessionClient>,
    ) -> Self {
        let SessionScopeOptions {
            token,
            client_options,
            interactive,
            skip_redirect_callback,
            on_redirect_callback,
            environment,
        } = options;

        let controller = Arc::new(SessionController::new(
            client,
            ControllerOptions {
                interactive,
                skip_redirect_callback,
                on_redirect_callback,
                environment,
                default_authorization_params: client_options.authorization_params,
            },
        ));
        let binding = registry.bind(token, controller.clone());
        debug!(token = ?token, interactive, "session scope mounted");

        if interactive {
            let init = controller.clone();
            tokio::spawn(async move { init.initialize().await });
        }

        Self {
            token,
            controller,
            _binding: binding,
        }
    }

    /// The channel token this scope publishes under.
    #[must_use]
    pub const fn token(&self) -> ChannelToken {
        self.token
    }

    /// A handle over this scope, regardless of what currently shadows it.
    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::bound(self.controller.clone())
    }

    /// Restores the session now instead of in the background. Repeated
    /// calls, including after the mount-time initialization, are absorbed.
    pub async fn initialize(&self) {
        self.controller.initialize().await;
    }
}

impl Drop for SessionScope {
    fn drop(&mut self) {
        debug!(token = ?self.token, "session scope unmounted");
    }
}
