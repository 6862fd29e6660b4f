//! Test doubles for the external collaborators

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::browser::{Browser, TabId};
use crate::error::{FocusMindError, Result};
use crate::text::{Availability, SessionOptions, TextCapabilityProvider, TextSession};

/// Capability provider that echoes prompts back
pub struct FakeProvider {
    availability: Availability,
    fail_prompts: bool,
    created: AtomicUsize,
    destroyed: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeProvider {
    pub fn with_availability(availability: Availability) -> Self {
        Self {
            availability,
            fail_prompts: false,
            created: AtomicUsize::new(0),
            destroyed: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn readily() -> Self {
        Self::with_availability(Availability::Readily)
    }

    pub fn failing_prompts(mut self) -> Self {
        self.fail_prompts = true;
        self
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

struct FakeSession {
    fail: bool,
    destroyed: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl TextSession for FakeSession {
    async fn prompt(&mut self, input: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(input.to_string());
        if self.fail {
            return Err(FocusMindError::Capability("model crashed".to_string()));
        }
        let head: String = input.chars().take(50).collect();
        Ok(format!("Mocked AI response for: \"{}...\"", head))
    }

    fn destroy(&mut self) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TextCapabilityProvider for FakeProvider {
    async fn availability(&self) -> Result<Availability> {
        Ok(self.availability)
    }

    async fn create_session(&self, _options: SessionOptions) -> Result<Box<dyn TextSession>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            fail: self.fail_prompts,
            destroyed: self.destroyed.clone(),
            prompts: self.prompts.clone(),
        }))
    }
}

/// Browser with at most one tab and a record of what it was asked to do
#[derive(Default)]
pub struct FakeBrowser {
    page: Option<String>,
    pub opened: Mutex<Vec<Option<String>>>,
    pub sent: Mutex<Vec<(TabId, Value)>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(text: &str) -> Self {
        Self {
            page: Some(text.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn active_tab(&self) -> Result<Option<TabId>> {
        Ok(self.page.as_ref().map(|_| 1))
    }

    async fn extract_text(&self, _tab: TabId) -> Result<String> {
        Ok(self.page.clone().unwrap_or_default())
    }

    async fn open_options_page(&self, section: Option<&str>) -> Result<()> {
        self.opened.lock().unwrap().push(section.map(str::to_string));
        Ok(())
    }

    async fn send_to_tab(&self, tab: TabId, message: Value) -> Result<()> {
        self.sent.lock().unwrap().push((tab, message));
        Ok(())
    }
}
