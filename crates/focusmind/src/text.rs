//! On-device text operations
//!
//! Each operation checks availability, opens one capability session, sends
//! exactly one prompt and releases the session. Release is tied to a guard's
//! `Drop`, so it also happens when the prompt fails or the future is dropped.

use async_trait::async_trait;
use focusmind_core::format::truncate_chars;
use focusmind_core::Config;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::browser::Browser;
use crate::error::{FocusMindError, Result};

pub const MODEL_UNAVAILABLE: &str = "AI model is not available. Please check Chrome settings.";

/// Whether the provider can create a session right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Availability {
    Readily,
    AfterDownload,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub temperature: f64,
}

/// A live capability session
#[async_trait]
pub trait TextSession: Send {
    async fn prompt(&mut self, input: &str) -> Result<String>;

    /// Release the session. Called exactly once, by `SessionGuard`.
    fn destroy(&mut self);
}

/// The on-device text generation capability
#[async_trait]
pub trait TextCapabilityProvider: Send + Sync {
    async fn availability(&self) -> Result<Availability>;

    async fn create_session(&self, options: SessionOptions) -> Result<Box<dyn TextSession>>;
}

/// Provider for hosts without an on-device model
pub struct UnavailableProvider;

#[async_trait]
impl TextCapabilityProvider for UnavailableProvider {
    async fn availability(&self) -> Result<Availability> {
        Ok(Availability::No)
    }

    async fn create_session(&self, _options: SessionOptions) -> Result<Box<dyn TextSession>> {
        Err(FocusMindError::CapabilityUnavailable(MODEL_UNAVAILABLE.to_string()))
    }
}

/// Owns a session and destroys it when dropped
pub struct SessionGuard {
    session: Option<Box<dyn TextSession>>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn TextSession>) -> Self {
        Self { session: Some(session) }
    }

    pub async fn prompt(&mut self, input: &str) -> Result<String> {
        match self.session.as_mut() {
            Some(session) => session.prompt(input).await,
            None => Err(FocusMindError::Capability("session already released".to_string())),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.destroy();
            debug!("Capability session released");
        }
    }
}

/// The supported text operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextOperation {
    Summarize,
    Rewrite { tone: String },
    Translate { target_language: String },
    Proofread,
}

impl TextOperation {
    pub fn name(&self) -> &'static str {
        match self {
            TextOperation::Summarize => "summarize",
            TextOperation::Rewrite { .. } => "rewrite",
            TextOperation::Translate { .. } => "translate",
            TextOperation::Proofread => "proofread",
        }
    }

    /// Build the single prompt for this operation
    pub fn prompt(&self, text: &str) -> String {
        match self {
            TextOperation::Summarize => format!("Summarize the following text concisely:\n\n{}", text),
            TextOperation::Rewrite { tone } => {
                format!("Rewrite the following text in a {} tone:\n\n{}", tone, text)
            }
            TextOperation::Translate { target_language } => {
                format!("Translate the following text to {}:\n\n{}", target_language, text)
            }
            TextOperation::Proofread => format!(
                "Correct any spelling and grammar mistakes in the following text:\n\n{}",
                text
            ),
        }
    }
}

/// Runs text operations against the capability provider
pub struct TextWorkflow {
    provider: Arc<dyn TextCapabilityProvider>,
    options: SessionOptions,
    summary_char_limit: usize,
    default_tone: String,
    default_target_language: String,
}

impl TextWorkflow {
    pub fn new(provider: Arc<dyn TextCapabilityProvider>, config: &Config) -> Self {
        Self {
            provider,
            options: SessionOptions {
                temperature: config.temperature,
            },
            summary_char_limit: config.summary_char_limit,
            default_tone: config.default_tone.clone(),
            default_target_language: config.default_target_language.clone(),
        }
    }

    /// Rewrite with `tone`, or the configured default
    pub fn rewrite(&self, tone: Option<String>) -> TextOperation {
        TextOperation::Rewrite {
            tone: tone.unwrap_or_else(|| self.default_tone.clone()),
        }
    }

    /// Translate to `target_language`, or the configured default
    pub fn translate(&self, target_language: Option<String>) -> TextOperation {
        TextOperation::Translate {
            target_language: target_language.unwrap_or_else(|| self.default_target_language.clone()),
        }
    }

    /// Open a session, checking availability first
    async fn acquire(&self) -> Result<SessionGuard> {
        let availability = match self.provider.availability().await {
            Ok(availability) => availability,
            Err(e) => {
                debug!("Availability check failed: {}", e);
                Availability::No
            }
        };
        if availability != Availability::Readily {
            return Err(FocusMindError::CapabilityUnavailable(MODEL_UNAVAILABLE.to_string()));
        }

        let session = self.provider.create_session(self.options).await?;
        Ok(SessionGuard::new(session))
    }

    /// Run one operation over `text`
    pub async fn run(&self, operation: &TextOperation, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(FocusMindError::EmptyInput("No text provided.".to_string()));
        }

        let mut session = self.acquire().await?;
        debug!(operation = operation.name(), chars = text.chars().count(), "Prompting");
        let result = session.prompt(&operation.prompt(text)).await;
        drop(session);
        result
    }

    /// Summarize the visible text of the active tab
    pub async fn summarize_page(&self, browser: &dyn Browser) -> Result<String> {
        let tab = browser
            .active_tab()
            .await?
            .ok_or_else(|| FocusMindError::EmptyInput("No active tab found.".to_string()))?;

        let page_text = browser.extract_text(tab).await?;
        if page_text.trim().is_empty() {
            return Err(FocusMindError::EmptyInput("Could not extract text from the page.".to_string()));
        }

        let text = truncate_chars(&page_text, self.summary_char_limit);
        info!(tab, chars = text.chars().count(), "Summarizing page");
        self.run(&TextOperation::Summarize, text).await
    }
}
