//! Update/configure coordination.
//!
//! Owns the mutual-exclusion state for the two pipelines and is the single
//! writer of fingerprints back to the settings store. A second trigger of an
//! operation already in flight is dropped, not queued.

use crate::blocklist::{fingerprint, merge, Fetcher, FingerprintStore, OverrideSet};
use crate::config::Config;
use crate::dnsmasq::{render, FeatureToggles, ServiceReloader};
use crate::error::{Error, Result};
use crate::fsutil;
use crate::net::{self, NetworkParameters};
use crate::settings::{keys, SettingsStore};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Observable operation state. True exactly while the corresponding
/// pipeline is running.
#[derive(Debug, Clone, Default)]
pub struct StatusFlags {
    downloading: Arc<AtomicBool>,
    configuring: Arc<AtomicBool>,
}

impl StatusFlags {
    pub fn downloading(&self) -> bool {
        self.downloading.load(Ordering::SeqCst)
    }

    pub fn configuring(&self) -> bool {
        self.configuring.load(Ordering::SeqCst)
    }
}

/// Raises a status flag for the duration of a scope. Dropping clears the
/// flag on every exit path, so observers never see a stuck `true`.
struct FlagGuard {
    flag: Arc<AtomicBool>,
}

impl FlagGuard {
    fn raise(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag: flag.clone() }
    }
}

impl Drop for FlagGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New content was merged and the rule file rewritten.
    Updated { domains: usize },
    /// Upstream content fingerprint unchanged; nothing written.
    Unchanged,
    /// Another refresh was already running; this trigger was dropped.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigureOutcome {
    Applied,
    /// Another configure was already running; this trigger was dropped.
    Skipped,
}

pub struct UpdateCoordinator {
    config: Config,
    settings: Arc<dyn SettingsStore>,
    fetcher: Arc<dyn Fetcher>,
    reloader: Arc<dyn ServiceReloader>,
    fingerprints: FingerprintStore,
    download_lock: Mutex<()>,
    configure_lock: Mutex<()>,
    status: StatusFlags,
}

impl UpdateCoordinator {
    pub fn new(
        config: Config,
        settings: Arc<dyn SettingsStore>,
        fetcher: Arc<dyn Fetcher>,
        reloader: Arc<dyn ServiceReloader>,
    ) -> Self {
        let fingerprints = FingerprintStore::new(settings.clone());
        Self {
            config,
            settings,
            fetcher,
            reloader,
            fingerprints,
            download_lock: Mutex::new(()),
            configure_lock: Mutex::new(()),
            status: StatusFlags::default(),
        }
    }

    pub fn status(&self) -> StatusFlags {
        self.status.clone()
    }

    /// Fetch all configured sources, merge with overrides, and rewrite the
    /// rule file if the combined content changed. At most one refresh runs
    /// at a time; a concurrent trigger returns `Skipped` immediately.
    pub async fn refresh_blocklist(&self) -> Result<RefreshOutcome> {
        let Ok(_guard) = self.download_lock.try_lock() else {
            info!("Blocklist refresh already running, dropping trigger");
            return Ok(RefreshOutcome::Skipped);
        };
        let _flag = FlagGuard::raise(&self.status.downloading);
        self.run_refresh().await
    }

    /// Regenerate the dnsmasq config and reload the service. By default the
    /// blocklist is refreshed first; pass `refresh_first = false` for a
    /// config-only reload. Waits for an in-flight scheduled refresh rather
    /// than interleaving with it.
    pub async fn apply_configuration(&self, refresh_first: bool) -> Result<ConfigureOutcome> {
        let Ok(_guard) = self.configure_lock.try_lock() else {
            info!("Configuration apply already running, dropping trigger");
            return Ok(ConfigureOutcome::Skipped);
        };
        let _flag = FlagGuard::raise(&self.status.configuring);

        if refresh_first {
            let _download_guard = self.download_lock.lock().await;
            let _download_flag = FlagGuard::raise(&self.status.downloading);
            if let Err(e) = self.run_refresh().await {
                // A stale rule file is not a reason to skip the config
                // write; it retries on the next cycle.
                error!("Blocklist refresh failed during apply: {}", e);
            }
        }

        self.run_configure().await?;
        Ok(ConfigureOutcome::Applied)
    }

    async fn run_refresh(&self) -> Result<RefreshOutcome> {
        let urls = match self.settings.get(keys::BLOCKLIST_URLS).await {
            Some(value) => value.as_list().unwrap_or_default().to_vec(),
            None => vec![],
        };
        if urls.is_empty() {
            return Err(Error::Store("no blocklist URLs configured".to_string()));
        }

        let allow = self.override_list(keys::WHITELIST).await;
        let deny = self.override_list(keys::BLACKLIST).await;

        let results = self.fetcher.fetch_all(&urls).await;
        if results.iter().all(|r| r.content.is_none()) {
            return Err(Error::Fetch {
                url: urls.join(", "),
                reason: "every source failed".to_string(),
            });
        }

        let combined = fingerprint::combine(&results);
        let digest = fingerprint::digest(&combined);
        if !self.fingerprints.has_changed(&digest).await {
            info!("Blocklist content unchanged, skipping rule file write");
            return Ok(RefreshOutcome::Unchanged);
        }

        let overrides = OverrideSet::new(&allow, &deny);
        let domains = merge::merge(&results, &overrides);
        let rules = merge::render_rules(&domains);

        fsutil::write_atomic(Path::new(&self.config.rule_file_path), &rules).await?;
        // Commit only after the write landed; a failed write retries with
        // the same content next cycle.
        self.fingerprints.commit(&digest).await?;

        info!("Rule file updated with {} domains", domains.len());
        Ok(RefreshOutcome::Updated {
            domains: domains.len(),
        })
    }

    async fn run_configure(&self) -> Result<()> {
        let toggles = FeatureToggles {
            ad_block_enabled: self.setting_bool(keys::ENABLED).await,
            dhcp_enabled: self.setting_bool(keys::DHCP_ENABLED).await,
            ipv6_enabled: self.setting_bool(keys::IPV6_ENABLED).await,
        };
        let params = self.network_parameters().await;

        let rendered = render::render(
            &toggles,
            &params,
            &self.config.static_config_path,
            &self.config.rule_file_path,
        );

        let config_path = Path::new(&self.config.dnsmasq_config_path);
        fsutil::backup_once(config_path).await?;
        fsutil::write_atomic(config_path, &rendered).await?;
        info!("dnsmasq configuration written to {}", config_path.display());

        // A failed reload leaves a valid config on disk for the next retry;
        // it is reported, not propagated.
        if let Err(e) = self.reloader.reload().await {
            warn!("dnsmasq reload failed: {}", e);
        }
        Ok(())
    }

    async fn setting_bool(&self, key: &str) -> bool {
        self.settings
            .get(key)
            .await
            .map(|v| v.as_bool())
            .unwrap_or(false)
    }

    async fn setting_text(&self, key: &str) -> Option<String> {
        self.settings
            .get(key)
            .await
            .and_then(|v| v.as_text().map(str::to_string))
            .filter(|s| !s.is_empty())
    }

    async fn override_list(&self, key: &str) -> Vec<String> {
        self.settings
            .get(key)
            .await
            .and_then(|v| v.as_list().map(<[String]>::to_vec))
            .unwrap_or_default()
    }

    /// A fresh snapshot per apply; values missing from the store fall back
    /// to a live probe.
    async fn network_parameters(&self) -> NetworkParameters {
        let gateway = self.setting_text(keys::DEFAULT_GATEWAY).await;
        let dns = self.setting_text(keys::DNS_SERVER).await;
        let start = self.setting_text(keys::IP_RANGE_START).await;
        let end = self.setting_text(keys::IP_RANGE_END).await;

        match (gateway, dns, start, end) {
            (Some(default_gateway), Some(dns_server), Some(ip_range_start), Some(ip_range_end)) => {
                NetworkParameters {
                    default_gateway,
                    dns_server,
                    ip_range_start,
                    ip_range_end,
                }
            }
            _ => {
                warn!("Network parameters incomplete in settings store, probing");
                net::probe().await
            }
        }
    }
}
