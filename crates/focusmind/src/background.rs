//! Background process wiring
//!
//! Builds every component over one store and one set of host
//! collaborators, and runs the install and startup hooks.

use focusmind_core::Config;
use std::sync::Arc;
use tracing::{info, warn};

use crate::browser::Browser;
use crate::error::Result;
use crate::focus::FocusModeController;
use crate::menu::ContextMenu;
use crate::notes::NotesManager;
use crate::router::CommandRouter;
use crate::rules::{RuleEngine, RulePlatform};
use crate::stats::Analytics;
use crate::store::{keys, save, KeyValueStore};
use crate::text::{TextCapabilityProvider, TextWorkflow};

/// Host capabilities the background logic runs against
pub struct Collaborators {
    pub store: Arc<dyn KeyValueStore>,
    pub platform: Arc<dyn RulePlatform>,
    pub provider: Arc<dyn TextCapabilityProvider>,
    pub browser: Arc<dyn Browser>,
}

pub struct Background {
    store: Arc<dyn KeyValueStore>,
    default_blocked_sites: Vec<String>,
    pub focus: Arc<FocusModeController>,
    pub notes: Arc<NotesManager>,
    pub analytics: Arc<Analytics>,
    pub router: Arc<CommandRouter>,
    pub menu: ContextMenu,
}

impl Background {
    pub fn new(collaborators: Collaborators, config: &Config) -> Self {
        let Collaborators {
            store,
            platform,
            provider,
            browser,
        } = collaborators;

        let analytics = Arc::new(Analytics::new(store.clone()));
        let focus = Arc::new(FocusModeController::new(
            store.clone(),
            RuleEngine::new(platform),
            analytics.clone(),
        ));
        let notes = Arc::new(NotesManager::new(store.clone()));
        let text = Arc::new(TextWorkflow::new(provider, config));

        let router = Arc::new(CommandRouter::new(
            focus.clone(),
            notes.clone(),
            analytics.clone(),
            text.clone(),
            browser.clone(),
        ));

        Self {
            store,
            default_blocked_sites: config.default_blocked_sites.clone(),
            focus,
            notes,
            analytics,
            router,
            menu: ContextMenu::new(text, browser),
        }
    }

    /// First-install hook: seed the blocked-site list when none is stored.
    ///
    /// Returns whether the defaults were written.
    pub async fn on_installed(&self) -> Result<bool> {
        if self.store.get(keys::BLOCKED_SITES).await?.is_some() {
            return Ok(false);
        }
        save(self.store.as_ref(), keys::BLOCKED_SITES, &self.default_blocked_sites).await?;
        info!(count = self.default_blocked_sites.len(), "Seeded default blocked sites");
        Ok(true)
    }

    /// Process start: install hook, then reconcile rules with the focus flag.
    ///
    /// A restore failure leaves focus mode OFF and is logged, not returned;
    /// the process keeps serving.
    pub async fn start(&self) -> Result<()> {
        self.on_installed().await?;
        match self.focus.restore().await {
            Ok(active) => info!("Focus mode restored {}", if active { "ON" } else { "OFF" }),
            Err(e) => warn!("Focus mode could not be restored: {}", e),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::InMemoryRulePlatform;
    use crate::store::MemoryStore;
    use crate::testing::{FakeBrowser, FakeProvider};
    use serde_json::json;

    fn background(store: Arc<MemoryStore>, platform: Arc<InMemoryRulePlatform>) -> Background {
        Background::new(
            Collaborators {
                store,
                platform,
                provider: Arc::new(FakeProvider::readily()),
                browser: Arc::new(FakeBrowser::new()),
            },
            &Config::default(),
        )
    }

    #[tokio::test]
    async fn test_install_seeds_defaults() {
        let store = Arc::new(MemoryStore::new());
        let bg = background(store.clone(), Arc::new(InMemoryRulePlatform::new()));

        assert!(bg.on_installed().await.unwrap());
        let sites = bg.focus.blocked_sites().await.unwrap();
        assert_eq!(sites.len(), 7);
        assert_eq!(sites[0], "youtube.com");
        assert_eq!(sites[6], "netflix.com");
    }

    #[tokio::test]
    async fn test_install_keeps_existing_list() {
        let store = Arc::new(MemoryStore::with_entries([(
            keys::BLOCKED_SITES.to_string(),
            json!(["example.org"]),
        )]));
        let bg = background(store, Arc::new(InMemoryRulePlatform::new()));

        assert!(!bg.on_installed().await.unwrap());
        assert_eq!(bg.focus.blocked_sites().await.unwrap(), vec!["example.org"]);
    }

    #[tokio::test]
    async fn test_start_restores_blocking() {
        let store = Arc::new(MemoryStore::with_entries([
            (keys::FOCUS_MODE_ACTIVE.to_string(), json!(true)),
            (keys::BLOCKED_SITES.to_string(), json!(["reddit.com"])),
        ]));
        let platform = Arc::new(InMemoryRulePlatform::new());
        let bg = background(store, platform.clone());

        bg.start().await.unwrap();
        assert_eq!(bg.focus.engine().installed_domains().await.unwrap(), vec!["reddit.com"]);
    }

    #[tokio::test]
    async fn test_components_share_store() {
        let bg = background(Arc::new(MemoryStore::new()), Arc::new(InMemoryRulePlatform::new()));
        bg.router.dispatch(&json!({"action": "saveNote", "content": "shared"})).await;
        assert_eq!(bg.notes.list().await.unwrap()[0].content, "shared");
    }
}
