//! Identity records resolved by the external authentication client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An authenticated identity as reported by the external client.
///
/// Profile claims are carried opaquely; the session core only compares
/// principals to decide whether a published snapshot actually changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable subject identifier (OIDC `sub`).
    #[serde(rename = "sub")]
    pub subject: String,
    /// Display name claim, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email claim, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Profile update timestamp (OIDC `updated_at`), when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Remaining claims, untouched by the core.
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

impl Principal {
    /// Creates a principal with the given subject and no other claims.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            name: None,
            email: None,
            updated_at: None,
            claims: Map::new(),
        }
    }

    /// Sets the display name claim.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the email claim.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the profile update timestamp.
    #[must_use]
    pub const fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Adds an opaque claim.
    #[must_use]
    pub fn with_claim(mut self, name: impl Into<String>, value: Value) -> Self {
        self.claims.insert(name.into(), value);
        self
    }

    /// Whether `other` describes the same identity state as `self`.
    ///
    /// Subjects must match. When both sides carry `updated_at` the
    /// timestamps decide; when neither does, the remaining profile fields
    /// and claims are compared structurally. A presence mismatch on
    /// `updated_at` counts as a different identity.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        if self.subject != other.subject {
            return false;
        }
        match (self.updated_at, other.updated_at) {
            (Some(a), Some(b)) => a == b,
            (None, None) => {
                self.name == other.name && self.email == other.email && self.claims == other.claims
            }
            _ => false,
        }
    }
}

/// Raw identity-token claims as returned by the external client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// The compact-encoded token the claims were decoded from.
    pub raw: String,
    /// Decoded claims, carried opaquely.
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

impl IdTokenClaims {
    /// Creates a claims record from the raw token and its decoded claims.
    #[must_use]
    pub const fn new(raw: String, claims: Map<String, Value>) -> Self {
        Self { raw, claims }
    }

    /// Looks up a single claim by name.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }
}
