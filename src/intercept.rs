//! Out-of-band capture of the member profile API response.
//!
//! The engine registers a fresh [`ProfileCapture`] on the page for each
//! login attempt and takes the snapshot out of it when the attempt ends,
//! so nothing captured during one attempt can leak into the next.

use crate::browser::ResponseObserver;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Fields of the profile endpoint's `data` object used for verification
/// and reporting. Transient: lives for one verification plus one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub ip: String,
    pub created_date: String,
    pub last_modified_date: String,
}

impl ProfileSnapshot {
    /// Human-readable block for the notification body.
    pub fn summary(&self) -> String {
        format!(
            "User ID: {}\nUsername: {}\nEmail: {}\nLogin IP: {}\nCreated: {}\nLast login: {}",
            self.id, self.username, self.email, self.ip, self.created_date,
            self.last_modified_date
        )
    }
}

// The API is not consistent about numeric identifiers; accept both.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    data: ProfileSnapshot,
}

/// Response observer for exactly one endpoint URL. Decodes matching
/// bodies into a [`ProfileSnapshot`] candidate; when the endpoint is hit
/// more than once within an attempt, the last capture wins. Decode
/// failures are logged and suppressed: the page's own request has
/// already been served by the time the observer runs, so a bad body can
/// only ever degrade to "no profile captured".
#[derive(Debug)]
pub struct ProfileCapture {
    endpoint: String,
    slot: Mutex<Option<ProfileSnapshot>>,
}

impl ProfileCapture {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            slot: Mutex::new(None),
        }
    }

    /// Takes the captured snapshot out, leaving the capture empty.
    pub fn take(&self) -> Option<ProfileSnapshot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

impl ResponseObserver for ProfileCapture {
    fn on_response(&self, url: &str, body: &str) {
        if url != self.endpoint {
            return;
        }
        match serde_json::from_str::<ProfileEnvelope>(body) {
            Ok(envelope) => {
                debug!("Captured profile response for '{}'", envelope.data.username);
                *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(envelope.data);
            }
            Err(e) => warn!("Failed to decode profile response: {}", e),
        }
    }
}
