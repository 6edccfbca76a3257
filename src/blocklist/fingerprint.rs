//! Content fingerprints for change detection.
//!
//! One combined fingerprint covers the concatenation of all successfully
//! fetched sources; it is committed to the settings store only after the
//! rule file write has durably completed, so a failed write reprocesses the
//! same content next cycle.

use crate::error::Result;
use crate::settings::{keys, SettingsStore, SettingValue};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::fetch::FetchResult;

/// SHA-256 hex digest of raw content.
pub fn digest(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Concatenate the bodies of all successful fetches, newline after each,
/// preserving fetch order.
pub fn combine(results: &[FetchResult]) -> String {
    let mut combined = String::new();
    for result in results {
        if let Some(content) = &result.content {
            combined.push_str(content);
            combined.push('\n');
        }
    }
    combined
}

pub struct FingerprintStore {
    settings: Arc<dyn SettingsStore>,
}

impl FingerprintStore {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    /// Compare against the last recorded digest. An absent or empty record
    /// always counts as changed.
    pub async fn has_changed(&self, new_digest: &str) -> bool {
        match self.settings.get(keys::LAST_KNOWN_HASH).await {
            Some(value) => value.as_text() != Some(new_digest),
            None => true,
        }
    }

    /// Persist the new digest. The only state mutation in the refresh
    /// pipeline; must happen after the rule file write succeeded.
    pub async fn commit(&self, new_digest: &str) -> Result<()> {
        self.settings
            .set(keys::LAST_KNOWN_HASH, SettingValue::Text(new_digest.to_string()))
            .await
    }
}
