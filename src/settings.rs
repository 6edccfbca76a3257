//! Narrow interface over the external settings store.
//!
//! All persisted state (blocklist URLs, overrides, toggles, fingerprints)
//! lives behind [`SettingsStore`]; the core never talks to a transport
//! directly. `FileStore` persists to a JSON document, `MemoryStore` backs
//! tests.

use crate::error::{Error, Result};
use crate::fsutil;
use crate::net::NetworkParameters;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::info;

/// Semantic keys understood by the daemon.
pub mod keys {
    pub const BLOCKLIST_URLS: &str = "AdBlock/BlocklistURLs";
    pub const WHITELIST: &str = "AdBlock/Whitelist";
    pub const BLACKLIST: &str = "AdBlock/Blacklist";
    pub const UPDATE_INTERVAL: &str = "AdBlock/UpdateInterval";
    pub const ENABLED: &str = "AdBlock/Enabled";
    pub const DHCP_ENABLED: &str = "AdBlock/DHCPEnabled";
    pub const IPV6_ENABLED: &str = "AdBlock/IPv6Enabled";
    pub const DEFAULT_GATEWAY: &str = "AdBlock/DefaultGateway";
    pub const DNS_SERVER: &str = "AdBlock/DNSServer";
    pub const IP_RANGE_START: &str = "AdBlock/IPRangeStart";
    pub const IP_RANGE_END: &str = "AdBlock/IPRangeEnd";
    pub const LAST_KNOWN_HASH: &str = "AdBlock/LastKnownHash";
}

const DEFAULT_BLOCKLIST_URL: &str =
    "https://raw.githubusercontent.com/StevenBlack/hosts/master/hosts";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Text(String),
    List(Vec<String>),
}

impl SettingValue {
    pub fn as_bool(&self) -> bool {
        matches!(self, SettingValue::Bool(true))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            SettingValue::List(l) => Some(l.as_slice()),
            _ => None,
        }
    }

    /// Unset-equivalent values are eligible for default application.
    pub fn is_empty(&self) -> bool {
        match self {
            SettingValue::Bool(_) => false,
            SettingValue::Text(s) => s.is_empty(),
            SettingValue::List(l) => l.is_empty(),
        }
    }
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read a setting. Read failures are treated as "value absent".
    async fn get(&self, key: &str) -> Option<SettingValue>;

    async fn set(&self, key: &str, value: SettingValue) -> Result<()>;
}

/// In-memory store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, SettingValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<SettingValue> {
        self.values.read().unwrap().get(key).cloned()
    }

    async fn set(&self, key: &str, value: SettingValue) -> Result<()> {
        self.values.write().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON-file-backed store. The whole document is rewritten atomically on
/// every set; reads are served from the in-memory copy.
pub struct FileStore {
    path: PathBuf,
    values: RwLock<HashMap<String, SettingValue>>,
}

impl FileStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| Error::Store(format!("failed to parse {}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(Error::Store(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    async fn persist(&self) -> Result<()> {
        let serialized = {
            let values = self.values.read().unwrap();
            serde_json::to_string_pretty(&*values)
                .map_err(|e| Error::Store(format!("failed to serialize settings: {}", e)))?
        };
        fsutil::write_atomic(&self.path, &serialized)
            .await
            .map_err(|e| Error::Store(format!("failed to persist settings: {}", e)))
    }
}

#[async_trait]
impl SettingsStore for FileStore {
    async fn get(&self, key: &str) -> Option<SettingValue> {
        self.values.read().unwrap().get(key).cloned()
    }

    async fn set(&self, key: &str, value: SettingValue) -> Result<()> {
        self.values
            .write()
            .unwrap()
            .insert(key.to_string(), value);
        self.persist().await
    }
}

/// Seed defaults for every known key whose current value is unset or empty.
/// Existing non-empty values are never overwritten.
pub async fn apply_defaults(store: &dyn SettingsStore, net: &NetworkParameters) -> Result<()> {
    let defaults: Vec<(&str, SettingValue)> = vec![
        (
            keys::BLOCKLIST_URLS,
            SettingValue::List(vec![DEFAULT_BLOCKLIST_URL.to_string()]),
        ),
        (keys::WHITELIST, SettingValue::List(vec![])),
        (keys::BLACKLIST, SettingValue::List(vec![])),
        (
            keys::UPDATE_INTERVAL,
            SettingValue::Text("weekly".to_string()),
        ),
        (keys::ENABLED, SettingValue::Bool(false)),
        (keys::DHCP_ENABLED, SettingValue::Bool(false)),
        (keys::IPV6_ENABLED, SettingValue::Bool(false)),
        (
            keys::DEFAULT_GATEWAY,
            SettingValue::Text(net.default_gateway.clone()),
        ),
        (keys::DNS_SERVER, SettingValue::Text(net.dns_server.clone())),
        (
            keys::IP_RANGE_START,
            SettingValue::Text(net.ip_range_start.clone()),
        ),
        (
            keys::IP_RANGE_END,
            SettingValue::Text(net.ip_range_end.clone()),
        ),
        (keys::LAST_KNOWN_HASH, SettingValue::Text(String::new())),
    ];

    for (key, default) in defaults {
        let current = store.get(key).await;
        if current.map_or(true, |v| v.is_empty()) {
            info!("Applying default for {}", key);
            store.set(key, default).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_params() -> NetworkParameters {
        NetworkParameters {
            default_gateway: "192.168.1.1".to_string(),
            dns_server: "192.168.1.2".to_string(),
            ip_range_start: "192.168.1.100".to_string(),
            ip_range_end: "192.168.1.200".to_string(),
        }
    }

    #[tokio::test]
    async fn test_defaults_fill_unset_keys() {
        let store = MemoryStore::new();
        apply_defaults(&store, &test_params()).await.unwrap();

        assert_eq!(
            store.get(keys::UPDATE_INTERVAL).await,
            Some(SettingValue::Text("weekly".to_string()))
        );
        assert_eq!(
            store.get(keys::DEFAULT_GATEWAY).await,
            Some(SettingValue::Text("192.168.1.1".to_string()))
        );
        assert_eq!(store.get(keys::ENABLED).await, Some(SettingValue::Bool(false)));
    }

    #[tokio::test]
    async fn test_defaults_never_overwrite_existing() {
        let store = MemoryStore::new();
        store
            .set(
                keys::BLOCKLIST_URLS,
                SettingValue::List(vec!["https://example.com/hosts.txt".to_string()]),
            )
            .await
            .unwrap();
        store
            .set(keys::DNS_SERVER, SettingValue::Text("10.0.0.53".to_string()))
            .await
            .unwrap();

        apply_defaults(&store, &test_params()).await.unwrap();

        assert_eq!(
            store.get(keys::BLOCKLIST_URLS).await.unwrap().as_list().unwrap(),
            &["https://example.com/hosts.txt".to_string()]
        );
        assert_eq!(
            store.get(keys::DNS_SERVER).await.unwrap().as_text().unwrap(),
            "10.0.0.53"
        );
    }

    #[tokio::test]
    async fn test_empty_values_count_as_unset() {
        let store = MemoryStore::new();
        store
            .set(keys::BLOCKLIST_URLS, SettingValue::List(vec![]))
            .await
            .unwrap();

        apply_defaults(&store, &test_params()).await.unwrap();

        let urls = store.get(keys::BLOCKLIST_URLS).await.unwrap();
        assert_eq!(urls.as_list().unwrap(), &[DEFAULT_BLOCKLIST_URL.to_string()]);
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        {
            let store = FileStore::open(&path).await.unwrap();
            store
                .set(keys::LAST_KNOWN_HASH, SettingValue::Text("abc123".to_string()))
                .await
                .unwrap();
        }

        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.get(keys::LAST_KNOWN_HASH).await.unwrap().as_text().unwrap(),
            "abc123"
        );
    }
}
