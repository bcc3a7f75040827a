//! Unattended check-in client for M-Team.
//!
//! The engine replays a persisted browser session when it is still
//! valid and falls back to a credential + TOTP login when it is not,
//! confirming success against the member profile API response rather
//! than trusting page navigation alone. The browser automation stack is
//! supplied by the embedder through the traits in [`browser`].

pub mod browser;

pub mod config;

pub mod constants;

pub mod engine;

pub mod error;

pub mod intercept;

pub mod notify;

pub mod otp;

pub mod schedule;

pub mod session;

pub mod utils;

pub mod verify;
