//! Construction-time configuration passed through to the external client.
//!
//! Everything here is opaque pass-through from the integrator's point of
//! view; the core itself only touches two things: it injects the telemetry
//! tag, and it reads the default authorization parameters when merging
//! per-call options.

use std::collections::BTreeMap;

use serde::Serialize;
use url::Url;

/// Identifies this binding to the external client for telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClientTag {
    /// Binding name.
    pub name: &'static str,
    /// Binding version.
    pub version: &'static str,
}

impl ClientTag {
    /// The tag for this build of the binding.
    #[must_use]
    pub const fn current() -> Self {
        Self {
            name: "signet",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Where the external client keeps its token cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheLocation {
    /// Process memory; dropped when the host reloads.
    #[default]
    Memory,
    /// Host-provided persistent storage.
    LocalStorage,
}

/// Parameters forwarded to the authorization server on login and token
/// requests. Unset fields fall back to the client's configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthorizationParams {
    /// Requested scopes, space-separated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Audience for API access.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    /// Organization to log in to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Invitation ticket to accept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation: Option<String>,
    /// Maximum allowable seconds since the last authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age_secs: Option<u64>,
    /// Callback the authorization result is delivered to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<Url>,
    /// Custom parameters, forwarded under their original names.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl AuthorizationParams {
    /// Sets the requested scopes.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Sets the API audience.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Sets the callback the authorization result is delivered to.
    #[must_use]
    pub fn with_redirect_uri(mut self, redirect_uri: Url) -> Self {
        self.redirect_uri = Some(redirect_uri);
        self
    }

    /// Adds a custom parameter under its original wire name.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

/// Configuration bag handed to the external client at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientOptions {
    /// Authorization server domain, such as `example.auth.com`.
    pub domain: String,
    /// Issuer used for token validation; defaults to the domain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// Application client identifier.
    pub client_id: String,
    /// Default callback for authentication results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<Url>,
    /// Allowed clock skew in seconds for token expiry checks.
    pub leeway_secs: u64,
    /// Where the client keeps its token cache.
    pub cache_location: CacheLocation,
    /// Use refresh tokens instead of iframe-based silent authentication.
    pub use_refresh_tokens: bool,
    /// Seconds before background authorization calls time out.
    pub authorize_timeout_secs: u64,
    /// Defaults merged into every authorization request.
    pub authorization_params: AuthorizationParams,
    /// Telemetry tag. Injected by [`ClientOptions::finalized`], never
    /// caller-supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_tag: Option<ClientTag>,
}

impl ClientOptions {
    /// Creates options for the given tenant domain and client identifier,
    /// with the standard defaults for everything else.
    #[must_use]
    pub fn new(domain: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            issuer: None,
            client_id: client_id.into(),
            redirect_uri: None,
            leeway_secs: 60,
            cache_location: CacheLocation::default(),
            use_refresh_tokens: false,
            authorize_timeout_secs: 60,
            authorization_params: AuthorizationParams::default(),
            client_tag: None,
        }
    }

    /// Sets the issuer used for token validation.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Sets the default callback for authentication results.
    #[must_use]
    pub fn with_redirect_uri(mut self, redirect_uri: Url) -> Self {
        self.redirect_uri = Some(redirect_uri);
        self
    }

    /// Sets where the client keeps its token cache.
    #[must_use]
    pub const fn with_cache_location(mut self, cache_location: CacheLocation) -> Self {
        self.cache_location = cache_location;
        self
    }

    /// Enables refresh-token based silent authentication.
    #[must_use]
    pub const fn with_refresh_tokens(mut self) -> Self {
        self.use_refresh_tokens = true;
        self
    }

    /// Sets the defaults merged into every authorization request.
    #[must_use]
    pub fn with_authorization_params(mut self, params: AuthorizationParams) -> Self {
        self.authorization_params = params;
        self
    }

    /// Stamps the telemetry tag. The scope calls this once, right before
    /// handing the options to the client factory.
    #[must_use]
    pub const fn finalized(mut self) -> Self {
        self.client_tag = Some(ClientTag::current());
        self
    }
}
