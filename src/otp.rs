//! RFC 6238 time-based one-time passwords over the shared secret the
//! login form's 2FA prompt expects.

use crate::error::OtpError;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};

pub const STEP_SECS: u64 = 30;
const DIGITS: u32 = 6;

/// Generates the 6-digit code for the window containing `now`.
///
/// Deterministic within a 30-second step, no side effects. The secret is
/// RFC 4648 base32, case-insensitive; whitespace and `=` padding are
/// tolerated since authenticator exports differ on both.
pub fn code(secret: &str, now: SystemTime) -> Result<String, OtpError> {
    let key = decode_secret(secret)?;
    let counter = now
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        / STEP_SECS;
    hotp(&key, counter)
}

/// Checks that a secret will be usable at login time, without generating
/// a code. Called at configuration load so a bad secret fails at startup.
pub fn validate_secret(secret: &str) -> Result<(), OtpError> {
    decode_secret(secret).map(|_| ())
}

fn decode_secret(secret: &str) -> Result<Vec<u8>, OtpError> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if normalized.is_empty() {
        return Err(OtpError::InvalidSecret);
    }

    base32::decode(base32::Alphabet::Rfc4648 { padding: false }, &normalized)
        .ok_or(OtpError::InvalidSecret)
}

fn hotp(key: &[u8], counter: u64) -> Result<String, OtpError> {
    let mut mac =
        Hmac::<Sha1>::new_from_slice(key).map_err(|_| OtpError::InvalidSecret)?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // Dynamic truncation per RFC 4226 §5.3.
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let bin = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    Ok(format!("{:0width$}", bin % 10u32.pow(DIGITS), width = DIGITS as usize))
}
