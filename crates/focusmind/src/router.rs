//! Command router
//!
//! Routes commands from UI surfaces to the component that owns them and
//! normalizes every outcome into a response object. Handlers only forward;
//! the router holds no state of its own and takes no locks, so dispatches
//! run independently of each other.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::browser::Browser;
use crate::command::{Command, CommandResult};
use crate::error::Result;
use crate::focus::FocusModeController;
use crate::notes::NotesManager;
use crate::stats::Analytics;
use crate::text::{TextOperation, TextWorkflow};

pub struct CommandRouter {
    focus: Arc<FocusModeController>,
    notes: Arc<NotesManager>,
    analytics: Arc<Analytics>,
    text: Arc<TextWorkflow>,
    browser: Arc<dyn Browser>,
}

impl CommandRouter {
    pub fn new(
        focus: Arc<FocusModeController>,
        notes: Arc<NotesManager>,
        analytics: Arc<Analytics>,
        text: Arc<TextWorkflow>,
        browser: Arc<dyn Browser>,
    ) -> Self {
        Self {
            focus,
            notes,
            analytics,
            text,
            browser,
        }
    }

    /// Handle one raw request. Never fails: errors come back as `{ error }`.
    pub async fn dispatch(&self, request: &Value) -> CommandResult {
        let command = match Command::parse(request) {
            Ok(command) => command,
            Err(e) => {
                warn!("Rejected request (action {:?}): {}", request.get("action"), e);
                return CommandResult::error(e.to_string());
            }
        };

        let action = command.action();
        debug!("Dispatching {}", action);

        match self.execute(command).await {
            Ok(data) => CommandResult::Data(data),
            Err(e) => {
                error!("Error handling action \"{}\": {}", action, e);
                CommandResult::error(e.to_string())
            }
        }
    }

    /// Run a parsed command against its owning component
    pub async fn execute(&self, command: Command) -> Result<Value> {
        match command {
            // =================================================================
            // Focus mode
            // =================================================================
            Command::ToggleFocusMode => {
                let active = self.focus.toggle().await?;
                Ok(json!({ "success": true, "focusModeActive": active }))
            }
            Command::UpdateBlockedSites { sites } => {
                self.focus.update_blocked_sites(sites).await?;
                Ok(json!({ "success": true }))
            }
            Command::GetFocusStatus => Ok(serde_json::to_value(self.focus.status().await?)?),
            Command::CheckNavigation { url } => {
                let blocked = self.focus.check_navigation(&url).await?;
                Ok(json!({ "blocked": blocked }))
            }

            // =================================================================
            // Notes
            // =================================================================
            Command::SaveNote { content } => {
                self.notes.save(content).await?;
                Ok(json!({ "success": true }))
            }
            Command::GetNotes => Ok(json!({ "notes": self.notes.list().await? })),
            Command::DeleteNote { id } => {
                self.notes.delete(&id).await?;
                Ok(json!({ "success": true }))
            }
            Command::ClearAllNotes => {
                self.notes.clear().await?;
                Ok(json!({ "success": true }))
            }

            // =================================================================
            // Stats
            // =================================================================
            Command::GetFocusStats => Ok(json!({ "stats": self.analytics.stats().await? })),
            Command::ResetFocusStats => {
                self.analytics.reset().await?;
                Ok(json!({ "success": true }))
            }

            // =================================================================
            // Text operations
            // =================================================================
            Command::SummarizePage => {
                let summary = self.text.summarize_page(self.browser.as_ref()).await?;
                Ok(json!({ "summary": summary }))
            }
            Command::SummarizeText { text } => self.run_text(TextOperation::Summarize, &text).await,
            Command::RewriteText { text, tone } => self.run_text(self.text.rewrite(tone), &text).await,
            Command::TranslateText { text, target_language } => {
                self.run_text(self.text.translate(target_language), &text).await
            }
            Command::ProofreadText { text } => self.run_text(TextOperation::Proofread, &text).await,

            // =================================================================
            // Surfaces
            // =================================================================
            Command::OpenOptionsPage { section } => {
                self.browser.open_options_page(section.as_deref()).await?;
                Ok(json!({ "success": true }))
            }
        }
    }

    async fn run_text(&self, operation: TextOperation, text: &str) -> Result<Value> {
        let result = self.text.run(&operation, text).await?;
        Ok(json!({ "result": result }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{InMemoryRulePlatform, RuleEngine, RulePlatform};
    use crate::store::MemoryStore;
    use crate::testing::{FakeBrowser, FakeProvider};
    use crate::text::Availability;
    use focusmind_core::Config;

    struct Harness {
        router: Arc<CommandRouter>,
        platform: Arc<InMemoryRulePlatform>,
        browser: Arc<FakeBrowser>,
    }

    fn harness_with(provider: FakeProvider, browser: FakeBrowser) -> Harness {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let platform = Arc::new(InMemoryRulePlatform::new());
        let browser = Arc::new(browser);
        let analytics = Arc::new(Analytics::new(store.clone()));
        let focus = Arc::new(FocusModeController::new(
            store.clone(),
            RuleEngine::new(platform.clone()),
            analytics.clone(),
        ));
        let router = CommandRouter::new(
            focus,
            Arc::new(NotesManager::new(store.clone())),
            analytics,
            Arc::new(TextWorkflow::new(Arc::new(provider), &Config::default())),
            browser.clone(),
        );
        Harness {
            router: Arc::new(router),
            platform,
            browser,
        }
    }

    fn harness() -> Harness {
        harness_with(FakeProvider::readily(), FakeBrowser::with_page("Some article text."))
    }

    async fn send(h: &Harness, request: Value) -> Value {
        h.router.dispatch(&request).await.into_value()
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let h = harness();
        assert_eq!(send(&h, json!({"action": "doesNotExist"})).await, json!({"error": "Unknown action"}));
        assert_eq!(send(&h, json!({})).await, json!({"error": "Unknown action"}));
    }

    #[tokio::test]
    async fn test_save_then_get_notes() {
        let h = harness();
        assert_eq!(send(&h, json!({"action": "saveNote", "content": "x"})).await, json!({"success": true}));

        let response = send(&h, json!({"action": "getNotes"})).await;
        assert_eq!(response["notes"][0]["content"], "x");
    }

    #[tokio::test]
    async fn test_clear_all_notes() {
        let h = harness();
        send(&h, json!({"action": "saveNote", "content": "a"})).await;
        send(&h, json!({"action": "clearAllNotes"})).await;
        assert_eq!(send(&h, json!({"action": "getNotes"})).await, json!({"notes": []}));
    }

    #[tokio::test]
    async fn test_delete_note() {
        let h = harness();
        send(&h, json!({"action": "saveNote", "content": "a"})).await;
        let notes = send(&h, json!({"action": "getNotes"})).await;
        let id = notes["notes"][0]["id"].as_str().unwrap().to_string();

        send(&h, json!({"action": "deleteNote", "id": id})).await;
        assert_eq!(send(&h, json!({"action": "getNotes"})).await, json!({"notes": []}));
    }

    #[tokio::test]
    async fn test_toggle_and_sites_flow() {
        let h = harness();
        send(&h, json!({"action": "updateBlockedSites", "sites": ["a.com", "b.com"]})).await;

        let response = send(&h, json!({"action": "toggleFocusMode"})).await;
        assert_eq!(response, json!({"success": true, "focusModeActive": true}));
        assert_eq!(h.platform.dynamic_rules().await.unwrap().len(), 2);

        let status = send(&h, json!({"action": "getFocusStatus"})).await;
        assert_eq!(status, json!({"focusModeActive": true, "blockedSites": ["a.com", "b.com"]}));

        let blocked = send(&h, json!({"action": "checkNavigation", "url": "https://b.com/x"})).await;
        assert_eq!(blocked, json!({"blocked": true}));

        let stats = send(&h, json!({"action": "getFocusStats"})).await;
        assert_eq!(stats["stats"]["distractionsBlocked"], 1);

        let response = send(&h, json!({"action": "toggleFocusMode"})).await;
        assert_eq!(response["focusModeActive"], false);
        assert!(h.platform.dynamic_rules().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_stats() {
        let h = harness();
        send(&h, json!({"action": "resetFocusStats"})).await;
        let stats = send(&h, json!({"action": "getFocusStats"})).await;
        assert_eq!(stats, json!({"stats": {"totalFocusTime": 0, "distractionsBlocked": 0}}));
    }

    #[tokio::test]
    async fn test_summarize_page() {
        let h = harness();
        let response = send(&h, json!({"action": "summarizePage"})).await;
        assert!(response["summary"].as_str().unwrap().starts_with("Mocked AI response"));
    }

    #[tokio::test]
    async fn test_model_unavailable_is_error_response() {
        let h = harness_with(
            FakeProvider::with_availability(Availability::No),
            FakeBrowser::with_page("text"),
        );
        let response = send(&h, json!({"action": "summarizePage"})).await;
        assert_eq!(response, json!({"error": crate::text::MODEL_UNAVAILABLE}));
    }

    #[tokio::test]
    async fn test_no_active_tab() {
        let h = harness_with(FakeProvider::readily(), FakeBrowser::new());
        let response = send(&h, json!({"action": "summarizePage"})).await;
        assert_eq!(response, json!({"error": "No active tab found."}));
    }

    #[tokio::test]
    async fn test_text_actions() {
        let h = harness();
        for request in [
            json!({"action": "summarizeText", "text": "t"}),
            json!({"action": "rewriteText", "text": "t", "tone": "casual"}),
            json!({"action": "translateText", "text": "t"}),
            json!({"action": "proofreadText", "text": "t"}),
        ] {
            let response = send(&h, request).await;
            assert!(response["result"].is_string(), "{}", response);
        }
    }

    #[tokio::test]
    async fn test_open_options_page() {
        let h = harness();
        let response = send(&h, json!({"action": "openOptionsPage", "section": "notes"})).await;
        assert_eq!(response, json!({"success": true}));
        assert_eq!(*h.browser.opened.lock().unwrap(), vec![Some("notes".to_string())]);
    }

    #[tokio::test]
    async fn test_invalid_payload_is_error_response() {
        let h = harness();
        let response = send(&h, json!({"action": "updateBlockedSites"})).await;
        assert_eq!(response, json!({"error": "Invalid payload for updateBlockedSites: missing field `sites`"}));
    }

    #[tokio::test]
    async fn test_concurrent_dispatches() {
        let h = harness();
        let mut handles = Vec::new();
        for i in 0..8 {
            let router = h.router.clone();
            handles.push(tokio::spawn(async move {
                router
                    .dispatch(&json!({"action": "saveNote", "content": format!("n{}", i)}))
                    .await
            }));
        }
        for handle in handles {
            assert!(!handle.await.unwrap().is_error());
        }

        let notes = send(&h, json!({"action": "getNotes"})).await;
        assert_eq!(notes["notes"].as_array().unwrap().len(), 8);
    }
}
