//! Background job that deletes expired groups.

use chrono::Utc;

use super::scheduler::{Job, JobFrequency};
use crate::services::SessionCoordinator;

/// Purges groups past their expiry together with their members, messages
/// and pings, and closes their live connections.
pub struct ExpiredGroupSweepJob {
    sessions: SessionCoordinator,
    interval_minutes: u64,
}

impl ExpiredGroupSweepJob {
    pub fn new(sessions: SessionCoordinator, interval_minutes: u64) -> Self {
        Self {
            sessions,
            interval_minutes,
        }
    }
}

#[async_trait::async_trait]
impl Job for ExpiredGroupSweepJob {
    fn name(&self) -> &'static str {
        "sweep_expired_groups"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    /// Groups that expired while the process was down are removed on boot.
    fn run_at_start(&self) -> bool {
        true
    }

    async fn execute(&self) -> Result<(), String> {
        let swept = self
            .sessions
            .sweep_expired(Utc::now())
            .await
            .map_err(|e| format!("Failed to sweep expired groups: {}", e))?;

        if swept > 0 {
            tracing::info!(groups = swept, "Expired groups swept");
        }
        Ok(())
    }
}
