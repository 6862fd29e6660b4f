//! Host browser surface
//!
//! The few browser capabilities the background logic needs: find the active
//! tab, read its visible text, open the options page and message a tab.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{FocusMindError, Result};

pub type TabId = u32;

#[async_trait]
pub trait Browser: Send + Sync {
    /// The focused tab of the current window, if any
    async fn active_tab(&self) -> Result<Option<TabId>>;

    /// Visible body text of a tab
    async fn extract_text(&self, tab: TabId) -> Result<String>;

    /// Open the options page, optionally at a section anchor
    async fn open_options_page(&self, section: Option<&str>) -> Result<()>;

    /// Deliver a message to the page running in `tab`
    async fn send_to_tab(&self, tab: TabId, message: Value) -> Result<()>;
}

/// Options page URL, with `#section` when one is requested
pub fn options_url(section: Option<&str>) -> String {
    match section {
        Some(section) if !section.is_empty() => format!("options.html#{}", section),
        _ => "options.html".to_string(),
    }
}

/// Browser stand-in for the command-line host.
///
/// The "active tab" is a text file given on the command line (tab 1).
/// Outgoing tab messages and page opens are emitted as JSON lines on the
/// outbox channel.
pub struct HeadlessBrowser {
    page_file: Option<PathBuf>,
    outbox: mpsc::UnboundedSender<Value>,
}

impl HeadlessBrowser {
    pub const PAGE_TAB: TabId = 1;

    pub fn new(page_file: Option<PathBuf>, outbox: mpsc::UnboundedSender<Value>) -> Self {
        Self { page_file, outbox }
    }

    fn emit(&self, line: Value) -> Result<()> {
        self.outbox
            .send(line)
            .map_err(|_| FocusMindError::Browser("output channel closed".to_string()))
    }
}

#[async_trait]
impl Browser for HeadlessBrowser {
    async fn active_tab(&self) -> Result<Option<TabId>> {
        Ok(self.page_file.as_ref().map(|_| Self::PAGE_TAB))
    }

    async fn extract_text(&self, tab: TabId) -> Result<String> {
        let path = match (&self.page_file, tab) {
            (Some(path), Self::PAGE_TAB) => path,
            _ => return Err(FocusMindError::Browser(format!("No tab with id {}", tab))),
        };
        debug!(path = %path.display(), "Extracting page text");
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FocusMindError::Browser(format!("Failed to read {}: {}", path.display(), e)))
    }

    async fn open_options_page(&self, section: Option<&str>) -> Result<()> {
        self.emit(json!({ "openUrl": options_url(section) }))
    }

    async fn send_to_tab(&self, tab: TabId, message: Value) -> Result<()> {
        self.emit(json!({ "tabId": tab, "message": message }))
    }
}
