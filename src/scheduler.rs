//! Periodic blocklist refresh.
//!
//! A single loop with an explicit next-due time: sleep until due, re-check
//! the enabled flag, invoke the guarded refresh, recompute. No self-rearming
//! timers.

use crate::coordinator::UpdateCoordinator;
use crate::settings::{keys, SettingsStore};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateInterval {
    Daily,
    Weekly,
    Monthly,
}

impl UpdateInterval {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }

    pub fn period(self) -> Duration {
        const DAY: u64 = 24 * 60 * 60;
        match self {
            Self::Daily => Duration::from_secs(DAY),
            Self::Weekly => Duration::from_secs(7 * DAY),
            Self::Monthly => Duration::from_secs(30 * DAY),
        }
    }
}

/// Next due time after a completed (or skipped) check at `now`.
pub fn next_due(now: SystemTime, interval: UpdateInterval) -> SystemTime {
    now + interval.period()
}

async fn current_interval(settings: &dyn SettingsStore) -> UpdateInterval {
    match settings.get(keys::UPDATE_INTERVAL).await {
        Some(value) => match value.as_text().and_then(UpdateInterval::parse) {
            Some(interval) => interval,
            None => {
                warn!("Unrecognized update interval {:?}, defaulting to weekly", value);
                UpdateInterval::Weekly
            }
        },
        None => UpdateInterval::Weekly,
    }
}

/// Runs forever; spawn as a background task.
pub async fn run(coordinator: Arc<UpdateCoordinator>, settings: Arc<dyn SettingsStore>) {
    let mut due = next_due(SystemTime::now(), current_interval(settings.as_ref()).await);

    loop {
        if let Ok(wait) = due.duration_since(SystemTime::now()) {
            tokio::time::sleep(wait).await;
        }

        let enabled = settings
            .get(keys::ENABLED)
            .await
            .map(|v| v.as_bool())
            .unwrap_or(false);

        if enabled {
            info!("Scheduled blocklist refresh due");
            if let Err(e) = coordinator.refresh_blocklist().await {
                error!("Scheduled refresh failed: {}", e);
            }
        }

        // Interval changes take effect from the next cycle.
        due = next_due(SystemTime::now(), current_interval(settings.as_ref()).await);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    #[test]
    fn test_parse_intervals() {
        assert_eq!(UpdateInterval::parse("daily"), Some(UpdateInterval::Daily));
        assert_eq!(UpdateInterval::parse(" Weekly "), Some(UpdateInterval::Weekly));
        assert_eq!(UpdateInterval::parse("MONTHLY"), Some(UpdateInterval::Monthly));
        assert_eq!(UpdateInterval::parse("hourly"), None);
        assert_eq!(UpdateInterval::parse(""), None);
    }

    #[test]
    fn test_next_due_adds_fixed_period() {
        let now = UNIX_EPOCH + Duration::from_secs(1_000_000);
        assert_eq!(
            next_due(now, UpdateInterval::Daily),
            now + Duration::from_secs(86_400)
        );
        assert_eq!(
            next_due(now, UpdateInterval::Weekly),
            now + Duration::from_secs(7 * 86_400)
        );
        assert_eq!(
            next_due(now, UpdateInterval::Monthly),
            now + Duration::from_secs(30 * 86_400)
        );
    }
}
