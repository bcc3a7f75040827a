//! Seam to the external browser automation engine.
//!
//! The crate never talks to a real browser directly; the embedder
//! supplies an implementation of these traits over whatever automation
//! stack it runs. Every network-facing method carries its own timeout
//! and reports failure as a step-local [`PageError`], which the engine
//! folds into its state-machine transitions.

use crate::error::PageError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Observe-and-pass-through hook for responses the page produces.
///
/// Implementations must be strictly observational: the engine-side
/// contract is that the original response always reaches the page
/// unmodified, whatever the observer does with its copy.
pub trait ResponseObserver: Send + Sync {
    fn on_response(&self, url: &str, body: &str);
}

/// One live page inside a browser session.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), PageError>;

    async fn reload(&self, timeout: Duration) -> Result<(), PageError>;

    /// Waits until the page has settled (no in-flight network activity).
    async fn wait_for_idle(&self, timeout: Duration) -> Result<(), PageError>;

    async fn current_url(&self) -> String;

    /// Waits for an element to be present before interacting with it.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
        -> Result<(), PageError>;

    async fn fill(&self, selector: &str, value: &str) -> Result<(), PageError>;

    async fn click(&self, selector: &str) -> Result<(), PageError>;

    /// Sets one key in the page's local storage.
    async fn storage_set(&self, key: &str, value: &str) -> Result<(), PageError>;

    /// Reads back the full local storage of the page.
    async fn storage_snapshot(&self) -> Result<BTreeMap<String, String>, PageError>;

    /// Registers `observer` for responses whose request URL equals `url`.
    /// At most one observer per URL; registering again replaces it.
    async fn observe_responses(
        &self,
        url: &str,
        observer: Arc<dyn ResponseObserver>,
    ) -> Result<(), PageError>;

    /// Drops the observer for `url`. Must succeed even when none is
    /// registered, so the engine can deregister unconditionally.
    async fn clear_observer(&self, url: &str) -> Result<(), PageError>;
}

/// Factory for run-scoped pages. The engine opens exactly one page per
/// run and hands it back on every exit path, success or failure.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Page: BrowserPage;

    async fn open(&self) -> Result<Self::Page, PageError>;

    async fn close(&self, page: Self::Page) -> Result<(), PageError>;
}
