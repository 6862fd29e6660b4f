//! Focus statistics
//!
//! Two persisted counters:
//! - total focus time in milliseconds, added to when a focus session ends
//! - distractions blocked, bumped each time a navigation hits a block rule
//!
//! Both only grow until an explicit reset. No personal data is recorded.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::Result;
use crate::store::{keys, load_or_default, save, KeyValueStore};

/// Aggregated focus statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusStats {
    /// Total focus time in milliseconds
    #[serde(rename = "totalFocusTime")]
    pub total_focus_time_ms: u64,
    pub distractions_blocked: u64,
}

impl FocusStats {
    /// Total focus time as (hours, minutes)
    pub fn total_time(&self) -> (u64, u64) {
        let minutes = self.total_focus_time_ms / 60_000;
        (minutes / 60, minutes % 60)
    }
}

/// Reads and updates the persisted counters
pub struct Analytics {
    store: Arc<dyn KeyValueStore>,
    /// Serializes read-modify-write of the counters
    write: Mutex<()>,
}

impl Analytics {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write: Mutex::new(()),
        }
    }

    pub async fn stats(&self) -> Result<FocusStats> {
        Ok(FocusStats {
            total_focus_time_ms: load_or_default(self.store.as_ref(), keys::TOTAL_FOCUS_TIME).await?,
            distractions_blocked: load_or_default(self.store.as_ref(), keys::DISTRACTIONS_BLOCKED).await?,
        })
    }

    /// Add a finished session's duration to the running total
    pub async fn add_focus_time(&self, elapsed_ms: u64) -> Result<u64> {
        let _write = self.write.lock().await;
        let total: u64 = load_or_default(self.store.as_ref(), keys::TOTAL_FOCUS_TIME).await?;
        let total = total.saturating_add(elapsed_ms);
        save(self.store.as_ref(), keys::TOTAL_FOCUS_TIME, &total).await?;
        info!("Focus session ended. Duration: {}", focusmind_core::format::minutes(elapsed_ms as i64));
        Ok(total)
    }

    /// Count one blocked navigation
    pub async fn record_distraction(&self) -> Result<u64> {
        let _write = self.write.lock().await;
        let count: u64 = load_or_default(self.store.as_ref(), keys::DISTRACTIONS_BLOCKED).await?;
        let count = count.saturating_add(1);
        save(self.store.as_ref(), keys::DISTRACTIONS_BLOCKED, &count).await?;
        Ok(count)
    }

    /// Reset both counters to zero in one write
    pub async fn reset(&self) -> Result<()> {
        let _write = self.write.lock().await;
        let mut items = Map::new();
        items.insert(keys::TOTAL_FOCUS_TIME.to_string(), Value::from(0u64));
        items.insert(keys::DISTRACTIONS_BLOCKED.to_string(), Value::from(0u64));
        self.store.set(items).await?;
        info!("Focus stats have been reset");
        Ok(())
    }
}
