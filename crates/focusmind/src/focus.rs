//! Focus mode state machine
//!
//! Two states, OFF and ON. The persisted `focusModeActive` flag is only
//! written after the rule engine has reached the matching condition, so the
//! flag never claims blocking that is not installed (or the reverse).
//!
//! The session start is stored in the same write as the flag, so focus time
//! adds up even when ON and OFF happen in different processes.
//!
//! Transitions, blocked-site edits and startup restore all run under one
//! async mutex: each read-modify-write of the focus keys completes before
//! the next one reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::Result;
use crate::rules::{ResourceType, RuleEngine};
use crate::stats::Analytics;
use crate::store::{keys, load, load_or_default, save, KeyValueStore};

/// Wall-clock source for timing focus sessions
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Snapshot of focus mode for UI surfaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusStatus {
    #[serde(rename = "focusModeActive")]
    pub active: bool,
    pub blocked_sites: Vec<String>,
}

/// Owns the focus flag and drives the rule engine
pub struct FocusModeController {
    store: Arc<dyn KeyValueStore>,
    engine: RuleEngine,
    analytics: Arc<Analytics>,
    clock: Clock,
    transition: Mutex<()>,
}

impl FocusModeController {
    pub fn new(store: Arc<dyn KeyValueStore>, engine: RuleEngine, analytics: Arc<Analytics>) -> Self {
        Self {
            store,
            engine,
            analytics,
            clock: Arc::new(Utc::now),
            transition: Mutex::new(()),
        }
    }

    /// Time sessions with `clock` instead of the system clock
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    async fn persisted_active(&self) -> Result<bool> {
        load_or_default(self.store.as_ref(), keys::FOCUS_MODE_ACTIVE).await
    }

    async fn persisted_sites(&self) -> Result<Vec<String>> {
        load_or_default(self.store.as_ref(), keys::BLOCKED_SITES).await
    }

    async fn session_start(&self) -> Result<Option<DateTime<Utc>>> {
        load(self.store.as_ref(), keys::FOCUS_SESSION_START).await
    }

    /// Write the flag and the session start as one store update
    async fn persist_state(&self, active: bool, started: Option<DateTime<Utc>>) -> Result<()> {
        let mut items = Map::new();
        items.insert(keys::FOCUS_MODE_ACTIVE.to_string(), Value::Bool(active));
        items.insert(keys::FOCUS_SESSION_START.to_string(), serde_json::to_value(started)?);
        self.store.set(items).await
    }

    pub async fn is_active(&self) -> Result<bool> {
        self.persisted_active().await
    }

    pub async fn blocked_sites(&self) -> Result<Vec<String>> {
        self.persisted_sites().await
    }

    pub async fn status(&self) -> Result<FocusStatus> {
        Ok(FocusStatus {
            active: self.persisted_active().await?,
            blocked_sites: self.persisted_sites().await?,
        })
    }

    /// Bring the rule platform in line with the persisted flag after a restart.
    ///
    /// If the rules for an ON state cannot be installed, the flag is reset
    /// to OFF and the failure returned. A running session keeps its start.
    pub async fn restore(&self) -> Result<bool> {
        let _transition = self.transition.lock().await;

        if !self.persisted_active().await? {
            self.engine.clear().await?;
            return Ok(false);
        }

        let sites = self.persisted_sites().await?;
        if let Err(e) = self.engine.apply(&sites).await {
            warn!("Could not restore blocking, turning focus mode off: {}", e);
            // While the flag still says ON, whatever rules are installed stay
            self.persist_state(false, None).await?;
            if let Err(clear_err) = self.engine.clear().await {
                warn!("Failed to clear leftover rules: {}", clear_err);
            }
            return Err(e);
        }

        if self.session_start().await?.is_none() {
            self.persist_state(true, Some((self.clock)())).await?;
        }
        info!(sites = sites.len(), "Focus mode restored ON");
        Ok(true)
    }

    /// Flip focus mode and return the new state
    pub async fn toggle(&self) -> Result<bool> {
        let _transition = self.transition.lock().await;
        let active = self.persisted_active().await?;

        if active {
            let started = self.session_start().await.unwrap_or_else(|e| {
                warn!("Unreadable session start, not counting this session: {}", e);
                None
            });
            self.turn_off().await?;
            if let Some(started) = started {
                let elapsed_ms = ((self.clock)() - started).num_milliseconds().max(0) as u64;
                if let Err(e) = self.analytics.add_focus_time(elapsed_ms).await {
                    warn!("Failed to record focus time: {}", e);
                }
            }
        } else {
            self.turn_on().await?;
        }

        let now_active = !active;
        info!("Focus mode is now {}", if now_active { "ON" } else { "OFF" });
        Ok(now_active)
    }

    async fn turn_on(&self) -> Result<()> {
        let sites = self.persisted_sites().await?;
        self.engine.apply(&sites).await?;

        if let Err(e) = self.persist_state(true, Some((self.clock)())).await {
            // The flag still says OFF, so the rules must go too
            if let Err(clear_err) = self.engine.clear().await {
                warn!("Failed to roll back blocking rules: {}", clear_err);
            }
            return Err(e);
        }
        Ok(())
    }

    async fn turn_off(&self) -> Result<()> {
        self.engine.clear().await?;

        if let Err(e) = self.persist_state(false, None).await {
            // The flag still says ON, so put the rules back
            match self.persisted_sites().await {
                Ok(sites) => {
                    if let Err(apply_err) = self.engine.apply(&sites).await {
                        warn!("Failed to roll back blocking rules: {}", apply_err);
                    }
                }
                Err(read_err) => warn!("Failed to roll back blocking rules: {}", read_err),
            }
            return Err(e);
        }
        Ok(())
    }

    /// Replace the blocked-site list, re-applying rules at once when ON.
    ///
    /// The list is stored as given; validation belongs to the input surface.
    pub async fn update_blocked_sites(&self, domains: Vec<String>) -> Result<()> {
        let _transition = self.transition.lock().await;
        save(self.store.as_ref(), keys::BLOCKED_SITES, &domains).await?;
        info!(count = domains.len(), "Blocked sites updated");

        if self.persisted_active().await? {
            self.engine.apply(&domains).await?;
        }
        Ok(())
    }

    /// Check a top-level navigation against the installed rules.
    ///
    /// A blocked navigation counts as one distraction.
    pub async fn check_navigation(&self, url: &str) -> Result<bool> {
        let hit = self
            .engine
            .platform()
            .matching_rule(url, ResourceType::MainFrame)
            .await?;

        match hit {
            Some(rule) => {
                info!(rule = rule.id, url = %url, "Navigation blocked");
                self.analytics.record_distraction().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
