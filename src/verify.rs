//! Response-driven login verification.
//!
//! Navigation URL alone is a spoofable, racy success signal; the
//! intercepted profile payload is the authoritative one, cross-checked
//! against the expected identity so that "navigation landed but no real
//! session exists" is caught.

use crate::intercept::ProfileSnapshot;
use tracing::debug;

/// Pure success predicate for one login attempt.
#[derive(Debug, Clone)]
pub struct LoginVerifier {
    landing_url: String,
    expected_username: String,
}

impl LoginVerifier {
    pub fn new(landing_url: impl Into<String>, expected_username: impl Into<String>) -> Self {
        Self {
            landing_url: landing_url.into(),
            expected_username: expected_username.into(),
        }
    }

    /// True iff the page landed on the post-login URL, a profile was
    /// captured during this attempt, and its username matches exactly.
    /// Any missing piece is a plain `false`, never an error.
    pub fn verify(&self, current_url: &str, profile: Option<&ProfileSnapshot>) -> bool {
        let on_landing_page = current_url == self.landing_url;
        let identity_matches = profile
            .map(|p| p.username == self.expected_username)
            .unwrap_or(false);

        debug!(
            "Verification: url match = {}, profile captured = {}, identity match = {}",
            on_landing_page,
            profile.is_some(),
            identity_matches
        );

        on_landing_page && identity_matches
    }
}
