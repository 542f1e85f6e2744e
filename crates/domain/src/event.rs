//! Events produced by the session controller and folded by the reducer.

use crate::error::SessionError;
use crate::principal::Principal;

/// State transition triggers for the session reducer.
///
/// Variants that carry a `user` hold the principal resolved right after the
/// corresponding client call; `None` means the client reported no
/// authenticated user.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The one-time initialization pass finished, whichever branch ran.
    Initialised {
        /// Principal resolved after the check, if any.
        user: Option<Principal>,
    },

    /// A popup login began; the session is busy until it settles.
    LoginPopupStarted,

    /// A popup login settled successfully.
    LoginPopupComplete {
        /// Principal resolved after the login, if any.
        user: Option<Principal>,
    },

    /// A token-family operation settled (silent fetch, popup fetch,
    /// exchange), on either its success or its failure path.
    TokenRefreshComplete {
        /// Principal resolved after the operation, if any.
        user: Option<Principal>,
    },

    /// Redirect-callback handling settled, on either path.
    RedirectCallbackComplete {
        /// Principal resolved after the callback, if any.
        user: Option<Principal>,
    },

    /// The local session was cleared without leaving the page.
    Logout,

    /// An operation failed with a normalized error.
    Error {
        /// The normalized failure to record.
        error: SessionError,
    },
}
