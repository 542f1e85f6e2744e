//! Error vocabulary shared across the session core.
//!
//! The external client reports failures in three raw shapes
//! ([`ClientError`]); the core normalizes them into the single surfaced
//! shape ([`SessionError`]) before recording or returning them.

use thiserror::Error;

/// Raw failure shapes produced by the external authentication client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Structured error payload from the authorization server.
    #[error("{}", description.as_deref().unwrap_or(code.as_str()))]
    OAuth {
        /// Error code (`error` in the wire payload).
        code: String,
        /// Human-readable description (`error_description`), when present.
        description: Option<String>,
    },

    /// Transport or host failure, possibly without any payload at all.
    #[error("{}", message.as_deref().unwrap_or("transport failure"))]
    Transport {
        /// Whatever the transport layer could say about the failure.
        message: Option<String>,
    },

    /// Any other failure the client already described.
    #[error("{message}")]
    Other {
        /// The client's own message, passed through untouched.
        message: String,
    },
}

impl ClientError {
    /// Creates a structured authorization-server error.
    #[must_use]
    pub fn oauth(code: impl Into<String>) -> Self {
        Self::OAuth {
            code: code.into(),
            description: None,
        }
    }

    /// Creates a structured error with a human-readable description.
    #[must_use]
    pub fn oauth_described(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::OAuth {
            code: code.into(),
            description: Some(description.into()),
        }
    }

    /// Creates a payload-free transport failure.
    #[must_use]
    pub const fn opaque() -> Self {
        Self::Transport { message: None }
    }

    /// Creates a described failure that should pass through unchanged.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Whether this is the authorization-server code that merely means no
    /// session is available during a silent check.
    #[must_use]
    pub fn is_login_required(&self) -> bool {
        matches!(self, Self::OAuth { code, .. } if code == "login_required")
    }
}

/// Call-site family used to pick the fallback message for payload-free
/// transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorFallback {
    /// Login and initialization paths.
    Login,
    /// Token and redirect-callback paths.
    Token,
}

impl ErrorFallback {
    /// The fixed message used when the underlying failure carries none.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Login => "Login failed",
            Self::Token => "Get access token failed",
        }
    }
}

/// Normalized failures surfaced to consumers and recorded in snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Structured authorization-server error, both fields preserved.
    #[error("{}", description.as_deref().unwrap_or(code.as_str()))]
    OAuth {
        /// Error code (`error` in the wire payload).
        code: String,
        /// Human-readable description (`error_description`), when present.
        description: Option<String>,
    },

    /// An operation failed without a structured payload.
    #[error("{message}")]
    Operation {
        /// Normalized human-readable message.
        message: String,
    },

    /// An operation was invoked through a handle with no live scope.
    #[error(
        "no session scope is mounted for this channel; wrap the caller in a session scope or pass its channel token"
    )]
    MissingScope,
}

impl SessionError {
    /// Normalizes a raw client failure for the given call-site family.
    ///
    /// Structured payloads map field-for-field, described failures pass
    /// through, and payload-free transport failures collapse to the
    /// family's fixed message.
    #[must_use]
    pub fn from_client(source: ClientError, fallback: ErrorFallback) -> Self {
        match source {
            ClientError::OAuth { code, description } => Self::OAuth { code, description },
            ClientError::Transport {
                message: Some(message),
            }
            | ClientError::Other { message } => Self::Operation { message },
            ClientError::Transport { message: None } => Self::Operation {
                message: fallback.message().to_owned(),
            },
        }
    }
}

/// Result type alias for operations surfaced to consumers.
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type alias for raw client calls.
pub type ClientResult<T> = Result<T, ClientError>;
