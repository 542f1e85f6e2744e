//! Channel tokens naming independent session distribution channels.

use std::sync::OnceLock;

use uuid::Uuid;

/// Names one session distribution channel.
///
/// Scopes publish under a token and handles resolve through the same
/// token, so two sessions against different tenants can coexist in one
/// process by using distinct tokens. The token is plain data; it carries
/// no reference to any registry or scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelToken(Uuid);

impl ChannelToken {
    /// The process-wide default token, for the single-session case where
    /// threading an explicit token around buys nothing.
    #[must_use]
    pub fn shared() -> Self {
        static SHARED: OnceLock<ChannelToken> = OnceLock::new();
        *SHARED.get_or_init(Self::unique)
    }

    /// A fresh token no other channel uses.
    #[must_use]
    pub fn unique() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ChannelToken {
    fn default() -> Self {
        Self::shared()
    }
}
