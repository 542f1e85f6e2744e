//! Entry gate for surfaces that require an authenticated session.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use signet_application::{HostEnvironment, RedirectLoginOptions};
use signet_domain::{Principal, SessionResult};
use tracing::debug;

use crate::authorized::AuthorizationRequirement;
use crate::handle::SessionHandle;

/// Hook run right before an anonymous caller is sent to log in, for
/// stashing state that must survive the round trip.
pub type BeforeAuthenticationHook =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Predicate over the signed-in principal's claims; failing it treats the
/// caller as not signed in at all.
pub type ClaimCheck = Arc<dyn Fn(Option<&Principal>) -> bool + Send + Sync>;

/// Where the caller lands after completing the login round trip.
#[derive(Clone)]
pub enum ReturnTo {
    /// The location the caller was gated at, path and query.
    Current,
    /// A fixed target.
    Fixed(String),
    /// Computed at redirect time.
    Computed(Arc<dyn Fn() -> String + Send + Sync>),
}

/// Construction options for [`AuthenticationGate`].
#[derive(Clone)]
pub struct GateOptions {
    /// Where the caller lands after logging in.
    pub return_to: ReturnTo,
    /// Forwarded to the login redirect; its caller state is kept, with
    /// the computed return target folded in.
    pub login_options: RedirectLoginOptions,
    /// When set, being signed in is not enough: the session must also
    /// hold this audience and these scopes.
    pub requirement: Option<AuthorizationRequirement>,
    /// Extra predicate over the principal; failing callers are sent to
    /// log in again.
    pub claim_check: Option<ClaimCheck>,
    /// Runs before an anonymous caller is redirected.
    pub on_before_authentication: Option<BeforeAuthenticationHook>,
    /// Environment used to compute [`ReturnTo::Current`].
    pub environment: Arc<dyn HostEnvironment>,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            return_to: ReturnTo::Current,
            login_options: RedirectLoginOptions::default(),
            requirement: None,
            claim_check: None,
            on_before_authentication: None,
            environment: Arc::new(signet_application::DetachedEnvironment),
        }
    }
}

impl GateOptions {
    /// Sets where the caller lands after logging in.
    #[must_use]
    pub fn with_return_to(mut self, return_to: ReturnTo) -> Self {
        self.return_to = return_to;
        self
    }

    /// Sets the options forwarded to the login redirect.
    #[must_use]
    pub fn with_login_options(mut self, options: RedirectLoginOptions) -> Self {
        self.login_options = options;
        self
    }

    /// Requires the session to hold the given audience and scopes.
    #[must_use]
    pub fn requiring(mut self, requirement: AuthorizationRequirement) -> Self {
        self.requirement = Some(requirement);
        self
    }

    /// Adds a predicate over the signed-in principal.
    #[must_use]
    pub fn with_claim_check(mut self, check: ClaimCheck) -> Self {
        self.claim_check = Some(check);
        self
    }

    /// Runs the hook before anonymous callers are redirected.
    #[must_use]
    pub fn with_before_authentication(mut self, hook: BeforeAuthenticationHook) -> Self {
        self.on_before_authentication = Some(hook);
        self
    }

    /// Sets the environment used to compute [`ReturnTo::Current`].
    #[must_use]
    pub fn with_environment(mut self, environment: Arc<dyn HostEnvironment>) -> Self {
        self.environment = environment;
        self
    }
}

/// What the gate decided for this caller.
#[derive(Debug)]
pub enum GateDecision {
    /// Signed in and cleared; proceed with a handle scoped to the gate's
    /// requirement, when one was set.
    Proceed(SessionHandle),
    /// Anonymous; a login redirect has been started. Show the
    /// interstitial until the host navigates.
    Redirecting,
    /// Signed in but missing the required audience or scopes.
    Denied,
}

/// Decides whether a caller may pass into a protected surface.
///
/// The decision waits for the session to settle first, so a caller
/// arriving mid-initialization is neither bounced to login nor let
/// through early.
pub struct AuthenticationGate {
    handle: SessionHandle,
    options: GateOptions,
}

impl AuthenticationGate {
    /// Creates a gate in front of the given session.
    #[must_use]
    pub fn new(handle: SessionHandle, options: GateOptions) -> Self {
        Self { handle, options }
    }

    /// Decides for the current caller: proceed, redirect to login, or
    /// deny. Anonymous callers have a redirect login started before this
    /// returns, carrying the computed return target in its caller state.
    ///
    /// # Errors
    ///
    /// Fails with [`signet_domain::SessionError::MissingScope`] when the
    /// gate guards an unbound handle, or as the login redirect does.
    pub async fn decide(&self) -> SessionResult<GateDecision> {
        let mut rx = self.handle.watch();
        let _ = rx.wait_for(|snapshot| !snapshot.is_loading).await;
        let snapshot = self.handle.snapshot();

        let claims_pass = self
            .options
            .claim_check
            .as_ref()
            .is_none_or(|check| check(self.handle.current_user().as_ref()));

        if !(snapshot.is_authenticated && claims_pass) {
            debug!("gate redirecting anonymous caller to login");
            if let Some(hook) = &self.options.on_before_authentication {
                hook().await;
            }
            self.handle.login_with_redirect(self.login_options()).await?;
            return Ok(GateDecision::Redirecting);
        }

        match &self.options.requirement {
            Some(requirement) => {
                if self
                    .handle
                    .is_authorized(&requirement.audience, &requirement.scope)
                {
                    Ok(GateDecision::Proceed(self.handle.with_token_defaults(
                        Some(requirement.audience.clone()),
                        Some(requirement.scope.clone()),
                    )))
                } else {
                    debug!(audience = %requirement.audience, "gate denied under-authorized caller");
                    Ok(GateDecision::Denied)
                }
            }
            None => Ok(GateDecision::Proceed(self.handle.clone())),
        }
    }

    fn login_options(&self) -> RedirectLoginOptions {
        let mut options = self.options.login_options.clone();
        let mut app_state = options.app_state.take().unwrap_or_default();
        app_state.return_to = Some(self.resolved_return_to());
        options.app_state = Some(app_state);
        options
    }

    fn resolved_return_to(&self) -> String {
        match &self.options.return_to {
            ReturnTo::Fixed(target) => target.clone(),
            ReturnTo::Computed(compute) => compute(),
            ReturnTo::Current => self.options.environment.current_location().map_or_else(
                || "/".to_owned(),
                |location| match location.query() {
                    Some(query) => format!("{}?{query}", location.path()),
                    None => location.path().to_owned(),
                },
            ),
        }
    }
}
