//! Redirect callback detection and the post-callback cleanup hook.

use std::sync::Arc;

use regex::Regex;
use signet_domain::{AppState, Principal};

use crate::ports::HostEnvironment;

/// Hook invoked after a redirect callback has been processed, with the
/// caller state from the matching login request and the signed-in
/// principal.
pub type RedirectHook = Arc<dyn Fn(Option<AppState>, Option<&Principal>) + Send + Sync>;

/// Whether a query string looks like an authorization response.
///
/// True when a `code` or `error` parameter is present together with the
/// `state` parameter. Matching both keeps unrelated pages that happen to
/// carry a bare `code` or `state` from being swallowed by callback
/// processing.
#[must_use]
pub fn has_auth_params(query: &str) -> bool {
    #[allow(clippy::expect_used)]
    let code = Regex::new(r"[?&]code=[^&]+").expect("valid regex");
    #[allow(clippy::expect_used)]
    let error = Regex::new(r"[?&]error=[^&]+").expect("valid regex");
    #[allow(clippy::expect_used)]
    let state = Regex::new(r"[?&]state=[^&]+").expect("valid regex");

    (code.is_match(query) || error.is_match(query)) && state.is_match(query)
}

/// The default redirect hook: strips the authorization response from the
/// location by replacing it with the caller state's `return_to`, or with
/// the bare current path when no `return_to` was carried.
#[must_use]
pub fn default_redirect_hook(environment: Arc<dyn HostEnvironment>) -> RedirectHook {
    Arc::new(move |app_state: Option<AppState>, _user: Option<&Principal>| {
        let return_to = app_state.and_then(|state| state.return_to);
        match return_to {
            Some(target) => environment.replace_location(&target),
            None => {
                if let Some(current) = environment.current_location() {
                    environment.replace_location(current.path());
                }
            }
        }
    })
}
