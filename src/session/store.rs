use crate::browser::BrowserPage;
use crate::error::{PageError, StoreError};
use crate::session::artifact::SessionArtifact;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Durable persistence for the session artifact, plus the glue that
/// moves it in and out of a live page's local storage.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted artifact. `NotFound` is the normal first-run
    /// case; `Corrupt` means the file exists but is not a JSON object of
    /// strings.
    pub fn load(&self) -> Result<SessionArtifact, StoreError> {
        let raw = fs::read_to_string(&self.path)?;
        let artifact: SessionArtifact = serde_json::from_str(&raw)?;
        debug!(
            "Loaded session artifact with {} keys from {}",
            artifact.len(),
            self.path.display()
        );
        Ok(artifact)
    }

    /// Persists the artifact with a write-then-rename so a crash
    /// mid-write never leaves a truncated file behind.
    pub fn save(&self, artifact: &SessionArtifact) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(artifact)
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(StoreError::Io)?;
        fs::rename(&tmp, &self.path).map_err(StoreError::Io)?;

        debug!(
            "Saved session artifact with {} keys to {}",
            artifact.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Removes the persisted artifact. An already-absent file is fine:
    /// the caller only cares that nothing stale survives.
    pub fn delete(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Deleted session artifact at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Injects every key/value pair into the live page's local storage.
    /// A failing key is logged and skipped; one bad key must not block
    /// restoring the rest of the session. Returns how many keys applied.
    pub async fn apply<P: BrowserPage + ?Sized>(
        &self,
        artifact: &SessionArtifact,
        page: &P,
    ) -> usize {
        let mut applied = 0;
        for (key, value) in artifact.iter() {
            match page.storage_set(key, value).await {
                Ok(()) => applied += 1,
                Err(e) => warn!("Failed to restore storage key '{}': {}", key, e),
            }
        }
        debug!("Restored {}/{} storage keys", applied, artifact.len());
        applied
    }

    /// Reads the page's full local storage back as a fresh artifact.
    pub async fn capture<P: BrowserPage + ?Sized>(
        &self,
        page: &P,
    ) -> Result<SessionArtifact, PageError> {
        let snapshot = page.storage_snapshot().await?;
        Ok(SessionArtifact::from(snapshot))
    }
}
