//! Application state carried across a redirect round-trip.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Caller-defined state preserved through the authorization redirect.
///
/// The core reads only `return_to`; every other field is carried opaquely
/// to the redirect-completion hook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    /// Path to restore once the round-trip completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_to: Option<String>,
    /// Additional caller-defined fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppState {
    /// Creates a state that restores the given path.
    #[must_use]
    pub fn returning_to(path: impl Into<String>) -> Self {
        Self {
            return_to: Some(path.into()),
            extra: Map::new(),
        }
    }

    /// Adds a caller-defined field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}
