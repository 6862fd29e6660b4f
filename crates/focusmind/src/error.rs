//! Error taxonomy shared by every background component.
//!
//! Messages are shown to the user verbatim, so each variant's `Display` is
//! the whole user-facing text. There are no error codes.

use thiserror::Error;

/// Errors surfaced through command responses
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FocusMindError {
    /// The text capability cannot create a session (unsupported or disabled)
    #[error("{0}")]
    CapabilityUnavailable(String),

    /// Nothing to work on: blank selection, no active tab, empty page
    #[error("{0}")]
    EmptyInput(String),

    /// The router received an action name it does not know
    #[error("Unknown action")]
    UnknownCommand,

    /// A known action arrived with a payload that does not fit it
    #[error("Invalid payload for {action}: {reason}")]
    InvalidPayload { action: String, reason: String },

    /// The network-rule platform rejected an update
    #[error("Failed to update blocking rules: {0}")]
    RuleApply(String),

    /// The key-value store rejected a read or write
    #[error("Storage error: {0}")]
    Storage(String),

    /// A capability session failed while prompting
    #[error("Text operation failed: {0}")]
    Capability(String),

    /// The host browser surface failed (tab messaging, options page)
    #[error("Browser error: {0}")]
    Browser(String),
}

impl From<serde_json::Error> for FocusMindError {
    fn from(err: serde_json::Error) -> Self {
        FocusMindError::Storage(err.to_string())
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, FocusMindError>;
