use std::fmt::{self, Display, Formatter};
use std::io;

/// One-time-password generation failures.
#[derive(Debug)]
pub enum OtpError {
    InvalidSecret,
}

impl Display for OtpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OtpError::InvalidSecret => write!(f, "shared secret is not valid base32"),
        }
    }
}

impl std::error::Error for OtpError {}

/// Session artifact persistence failures.
///
/// `NotFound` and `Corrupt` are both absorbed by the engine as "no cached
/// session"; only `Io` on the save path is worth surfacing in logs as a
/// real fault.
#[derive(Debug)]
pub enum StoreError {
    NotFound,
    Corrupt(serde_json::Error),
    Io(io::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "no persisted session artifact"),
            StoreError::Corrupt(e) => write!(f, "session artifact is not valid JSON: {e}"),
            StoreError::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound,
            _ => StoreError::Io(e),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupt(e)
    }
}

/// Failures reported by the browser boundary. A timeout on a single
/// navigation step is step-local: it feeds the engine's failure
/// transitions instead of aborting the process.
#[derive(Debug)]
pub enum PageError {
    Timeout(String),
    Engine(String),
}

impl Display for PageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PageError::Timeout(step) => write!(f, "timed out: {step}"),
            PageError::Engine(msg) => write!(f, "browser engine error: {msg}"),
        }
    }
}

impl std::error::Error for PageError {}

/// Run-level error taxonomy.
///
/// Only `Configuration` and `FreshLogin` may end a run in a failed state.
/// `CachedSessionLogin` is recoverable: the engine converts it into the
/// fresh-login fallback within the same run and it never reaches the
/// caller of `run_once`.
#[derive(Debug)]
pub enum CheckInError {
    Configuration(String),
    CachedSessionLogin(String),
    FreshLogin(String),
}

impl Display for CheckInError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CheckInError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            CheckInError::CachedSessionLogin(msg) => {
                write!(f, "cached session login failed: {msg}")
            }
            CheckInError::FreshLogin(msg) => write!(f, "credential login failed: {msg}"),
        }
    }
}

impl std::error::Error for CheckInError {}
