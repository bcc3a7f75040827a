//! Two-tier login state machine.
//!
//! A run first replays the persisted session artifact and reloads the
//! landing page; when that attempt cannot be verified it falls back to a
//! credential + one-time-code login, exactly once. Reusing the cached
//! session avoids repeated credential submission (and one-time-code
//! consumption) on the happy path, while the fresh tier guarantees
//! forward progress once the session has expired server-side.

use crate::browser::{BrowserPage, BrowserSession};
use crate::config::Config;
use crate::constants::{
    NOTIFY_SUBJECT_PREFIX, OTP_CODE_SELECTOR, PASSWORD_SELECTOR, SUBMIT_SELECTOR,
    USERNAME_SELECTOR,
};
use crate::error::{CheckInError, PageError, StoreError};
use crate::intercept::{ProfileCapture, ProfileSnapshot};
use crate::notify::Notifier;
use crate::otp;
use crate::session::SessionStore;
use crate::verify::LoginVerifier;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{error, info, instrument, warn};

/// Terminal state of one login attempt tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    CachedSessionSuccess(ProfileSnapshot),
    FreshLoginSuccess(ProfileSnapshot),
    CachedSessionFailed(String),
    FreshLoginFailed(String),
}

impl fmt::Display for LoginOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginOutcome::CachedSessionSuccess(_) => write!(f, "logged in via cached session"),
            LoginOutcome::FreshLoginSuccess(_) => write!(f, "logged in with credentials"),
            LoginOutcome::CachedSessionFailed(reason) => {
                write!(f, "cached session attempt failed: {reason}")
            }
            LoginOutcome::FreshLoginFailed(reason) => {
                write!(f, "credential login attempt failed: {reason}")
            }
        }
    }
}

/// Owns the session store and response interception for the duration of
/// a run and decides persistence and notification outcomes.
pub struct CheckInEngine<B, N> {
    config: Config,
    browser: B,
    notifier: N,
    store: SessionStore,
    verifier: LoginVerifier,
}

impl<B: BrowserSession, N: Notifier> CheckInEngine<B, N> {
    pub fn new(config: Config, browser: B, notifier: N) -> Self {
        let store = SessionStore::new(config.storage.artifact_path.clone());
        let verifier = LoginVerifier::new(
            config.site.landing_url.clone(),
            config.credentials.username.clone(),
        );
        Self {
            config,
            browser,
            notifier,
            store,
            verifier,
        }
    }

    /// Executes one full check-in run. The page is released on every
    /// exit path; exactly one notification is emitted per run outcome.
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> Result<LoginOutcome, CheckInError> {
        info!("Starting check-in run for '{}'", self.config.credentials.username);

        let page = match self.browser.open().await {
            Ok(page) => page,
            Err(e) => {
                let reason = format!("browser session could not be opened: {e}");
                self.report_failure(&reason).await;
                return Err(CheckInError::FreshLogin(reason));
            }
        };

        let result = self.run_with_page(&page).await;

        if let Err(e) = self.browser.close(page).await {
            warn!("Failed to close browser session: {}", e);
        }
        result
    }

    async fn run_with_page(&self, page: &B::Page) -> Result<LoginOutcome, CheckInError> {
        let nav_timeout = self.nav_timeout();
        // Faults here only mean the cached tier starts from a bad page;
        // the fresh tier navigates to the login surface itself.
        if let Err(e) = page.goto(&self.config.site.base_url, nav_timeout).await {
            warn!("Initial navigation failed: {}", e);
        }
        if let Err(e) = page.wait_for_idle(nav_timeout).await {
            warn!("Initial page never settled: {}", e);
        }

        match self.try_cached_session(page).await {
            Ok(profile) => {
                let outcome = LoginOutcome::CachedSessionSuccess(profile);
                info!("{outcome}");
                self.report_success(&outcome).await;
                return Ok(outcome);
            }
            Err(e) => {
                let reason = match e {
                    CheckInError::CachedSessionLogin(reason) => reason,
                    other => other.to_string(),
                };
                let interim = LoginOutcome::CachedSessionFailed(reason);
                info!("{interim}; falling back to credential login");
            }
        }

        match self.try_fresh_login(page).await {
            Ok(profile) => {
                let outcome = LoginOutcome::FreshLoginSuccess(profile);
                info!("{outcome}");
                self.report_success(&outcome).await;
                Ok(outcome)
            }
            Err(e) => {
                let reason = match e {
                    CheckInError::FreshLogin(reason) => reason,
                    other => other.to_string(),
                };
                let outcome = LoginOutcome::FreshLoginFailed(reason.clone());
                error!("{outcome}");
                self.report_failure(&outcome.to_string()).await;
                Err(CheckInError::FreshLogin(reason))
            }
        }
    }

    /// Cached tier: replay the persisted artifact and reload. Every
    /// failure mode maps to `CachedSessionLogin`, which the caller
    /// converts into the fresh-login fallback.
    #[instrument(skip(self, page))]
    async fn try_cached_session(&self, page: &B::Page) -> Result<ProfileSnapshot, CheckInError> {
        let artifact = match self.store.load() {
            Ok(artifact) => artifact,
            Err(StoreError::NotFound) => {
                return Err(CheckInError::CachedSessionLogin(
                    "no persisted session artifact".to_string(),
                ))
            }
            Err(e) => {
                warn!("Session artifact unusable, treating as absent: {}", e);
                return Err(CheckInError::CachedSessionLogin(e.to_string()));
            }
        };

        let capture = Arc::new(ProfileCapture::new(self.config.site.profile_api_url.clone()));
        let attempt = self.cached_attempt(page, &artifact, Arc::clone(&capture)).await;
        self.deregister(page).await;

        attempt.map_err(|e| CheckInError::CachedSessionLogin(e.to_string()))?;

        match self.evaluate(page, capture.take()).await {
            Some(profile) => {
                self.persist_session(page).await;
                Ok(profile)
            }
            None => Err(CheckInError::CachedSessionLogin(
                "verification failed".to_string(),
            )),
        }
    }

    async fn cached_attempt(
        &self,
        page: &B::Page,
        artifact: &crate::session::SessionArtifact,
        capture: Arc<ProfileCapture>,
    ) -> Result<(), PageError> {
        let nav_timeout = self.nav_timeout();
        page.observe_responses(&self.config.site.profile_api_url, capture)
            .await?;
        self.store.apply(artifact, page).await;
        page.reload(nav_timeout).await?;
        page.wait_for_idle(nav_timeout).await?;
        Ok(())
    }

    /// Fresh tier: credential + one-time-code login. Failure here is
    /// terminal for the run; there is no further fallback.
    #[instrument(skip(self, page))]
    async fn try_fresh_login(&self, page: &B::Page) -> Result<ProfileSnapshot, CheckInError> {
        let capture = Arc::new(ProfileCapture::new(self.config.site.profile_api_url.clone()));
        let attempt = self.fresh_attempt(page, Arc::clone(&capture)).await;
        self.deregister(page).await;

        attempt.map_err(|e| CheckInError::FreshLogin(e.to_string()))?;

        match self.evaluate(page, capture.take()).await {
            Some(profile) => {
                // A fresh login supersedes the old artifact entirely;
                // delete before writing so no stale key can merge in.
                if let Err(e) = self.store.delete() {
                    warn!("Failed to delete stale session artifact: {}", e);
                }
                self.persist_session(page).await;
                Ok(profile)
            }
            None => Err(CheckInError::FreshLogin(
                "verification failed after credential login".to_string(),
            )),
        }
    }

    async fn fresh_attempt(
        &self,
        page: &B::Page,
        capture: Arc<ProfileCapture>,
    ) -> Result<(), PageError> {
        let nav_timeout = self.nav_timeout();
        page.observe_responses(&self.config.site.profile_api_url, capture)
            .await?;

        if page.current_url().await != self.config.site.login_url {
            page.goto(&self.config.site.login_url, nav_timeout).await?;
        }
        page.wait_for_idle(nav_timeout).await?;

        page.wait_for_selector(SUBMIT_SELECTOR, nav_timeout).await?;
        page.fill(USERNAME_SELECTOR, &self.config.credentials.username)
            .await?;
        page.fill(PASSWORD_SELECTOR, &self.config.credentials.password)
            .await?;
        page.click(SUBMIT_SELECTOR).await?;

        if let Err(e) = self.submit_one_time_code(page).await {
            // The code may have been accepted before the failure fired;
            // verification decides the attempt, not this step.
            warn!(
                "One-time-code step did not complete: {}; proceeding to verification",
                e
            );
        }
        Ok(())
    }

    async fn submit_one_time_code(&self, page: &B::Page) -> Result<(), PageError> {
        let otp_wait = Duration::from_secs(self.config.site.otp_wait_secs);

        page.wait_for_selector(OTP_CODE_SELECTOR, otp_wait).await?;

        let code = otp::code(&self.config.credentials.totp_secret, SystemTime::now())
            .map_err(|e| PageError::Engine(e.to_string()))?;
        page.fill(OTP_CODE_SELECTOR, &code).await?;
        page.click(SUBMIT_SELECTOR).await?;

        page.wait_for_idle(self.nav_timeout()).await?;
        if self.config.site.settle_secs > 0 {
            tokio::time::sleep(Duration::from_secs(self.config.site.settle_secs)).await;
        }
        Ok(())
    }

    /// Runs the verifier against the page's current location and the
    /// snapshot captured during this attempt, returning the profile only
    /// on a verified success.
    async fn evaluate(
        &self,
        page: &B::Page,
        profile: Option<ProfileSnapshot>,
    ) -> Option<ProfileSnapshot> {
        let current_url = page.current_url().await;
        if self.verifier.verify(&current_url, profile.as_ref()) {
            profile
        } else {
            None
        }
    }

    /// Captures the live session state and persists it. Runs only after
    /// a verified success; persistence faults degrade to warnings since
    /// the login itself already succeeded.
    async fn persist_session(&self, page: &B::Page) {
        match self.store.capture(page).await {
            Ok(artifact) => match self.store.save(&artifact) {
                Ok(()) => info!("Persisted session artifact ({} keys)", artifact.len()),
                Err(e) => warn!("Failed to persist session artifact: {}", e),
            },
            Err(e) => warn!("Failed to capture session state: {}", e),
        }
    }

    async fn deregister(&self, page: &B::Page) {
        if let Err(e) = page.clear_observer(&self.config.site.profile_api_url).await {
            warn!("Failed to deregister response observer: {}", e);
        }
    }

    async fn report_success(&self, outcome: &LoginOutcome) {
        let summary = match outcome {
            LoginOutcome::CachedSessionSuccess(profile)
            | LoginOutcome::FreshLoginSuccess(profile) => profile.summary(),
            _ => String::new(),
        };
        self.notifier
            .notify(
                &format!("{NOTIFY_SUBJECT_PREFIX}login succeeded"),
                &format!("{outcome}\n\n{summary}"),
            )
            .await;
    }

    async fn report_failure(&self, reason: &str) {
        self.notifier
            .notify(&format!("{NOTIFY_SUBJECT_PREFIX}login failed"), reason)
            .await;
    }

    fn nav_timeout(&self) -> Duration {
        Duration::from_secs(self.config.site.nav_timeout_secs)
    }
}
