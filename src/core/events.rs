use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const FALLBACK_DIGEST_TEXT: &str =
    "Could not load current events. Try TimeOut Tokyo or Japan Guide for up-to-date listings.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDigest {
    pub text: String,
    pub fetched_at: DateTime<Utc>,
    /// Set only on the canned digest shown when no real one was ever fetched.
    pub is_fallback: bool,
}

impl EventDigest {
    pub fn new(text: String, fetched_at: DateTime<Utc>) -> Self {
        Self {
            text,
            fetched_at,
            is_fallback: false,
        }
    }

    pub fn fallback(at: DateTime<Utc>) -> Self {
        Self {
            text: FALLBACK_DIGEST_TEXT.to_string(),
            fetched_at: at,
            is_fallback: true,
        }
    }
}
