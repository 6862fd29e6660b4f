//! Selection context menu
//!
//! Three entries act on selected text. The result goes back to the tab the
//! click came from as `{ action: "displayResult", data }`.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::browser::{Browser, TabId};
use crate::error::Result;
use crate::text::{TextOperation, TextWorkflow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMenuAction {
    SummarizeSelection,
    RewriteSelection,
    TranslateSelection,
}

impl ContextMenuAction {
    pub const ALL: [ContextMenuAction; 3] = [
        ContextMenuAction::SummarizeSelection,
        ContextMenuAction::RewriteSelection,
        ContextMenuAction::TranslateSelection,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ContextMenuAction::SummarizeSelection => "summarize-selection",
            ContextMenuAction::RewriteSelection => "rewrite-selection",
            ContextMenuAction::TranslateSelection => "translate-selection",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ContextMenuAction::SummarizeSelection => "Summarize with FocusMind",
            ContextMenuAction::RewriteSelection => "Rewrite with FocusMind",
            ContextMenuAction::TranslateSelection => "Translate with FocusMind",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.id() == id)
    }
}

/// Registration record for one menu entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: &'static str,
    pub title: &'static str,
    pub contexts: Vec<&'static str>,
}

/// All entries, in display order
pub fn menu_items() -> Vec<MenuItem> {
    ContextMenuAction::ALL
        .iter()
        .map(|action| MenuItem {
            id: action.id(),
            title: action.title(),
            contexts: vec!["selection"],
        })
        .collect()
}

pub struct ContextMenu {
    text: Arc<TextWorkflow>,
    browser: Arc<dyn Browser>,
}

impl ContextMenu {
    pub fn new(text: Arc<TextWorkflow>, browser: Arc<dyn Browser>) -> Self {
        Self { text, browser }
    }

    fn operation(&self, action: ContextMenuAction) -> TextOperation {
        match action {
            ContextMenuAction::SummarizeSelection => TextOperation::Summarize,
            ContextMenuAction::RewriteSelection => self.text.rewrite(None),
            ContextMenuAction::TranslateSelection => self.text.translate(None),
        }
    }

    /// Handle a click on `menu_item_id` with `selection` highlighted in `tab`.
    ///
    /// Clicks without a tab, or on ids this menu does not own, are ignored
    /// and yield `Ok(None)`. Otherwise the delivered result is returned.
    pub async fn on_click(
        &self,
        menu_item_id: &str,
        selection: &str,
        tab: Option<TabId>,
    ) -> Result<Option<String>> {
        let (Some(tab), Some(action)) = (tab, ContextMenuAction::from_id(menu_item_id)) else {
            return Ok(None);
        };

        let result = match self.text.run(&self.operation(action), selection).await {
            Ok(result) => result,
            Err(e) => {
                error!("Error with {}: {}", menu_item_id, e);
                return Err(e);
            }
        };

        self.browser
            .send_to_tab(tab, json!({ "action": "displayResult", "data": result }))
            .await?;
        info!(tab, item = menu_item_id, "Delivered selection result");
        Ok(Some(result))
    }
}
