//! Command protocol types
//!
//! Requests are JSON objects `{ "action": <name>, ...payload }`. Responses
//! are either the handler's fields or `{ "error": <message> }`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{FocusMindError, Result};

/// Every action a UI surface can send
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    ToggleFocusMode,
    SummarizePage,
    SaveNote {
        content: String,
    },
    GetNotes,
    DeleteNote {
        id: String,
    },
    ClearAllNotes,
    UpdateBlockedSites {
        sites: Vec<String>,
    },
    GetFocusStatus,
    GetFocusStats,
    ResetFocusStats,
    OpenOptionsPage {
        #[serde(default)]
        section: Option<String>,
    },
    SummarizeText {
        text: String,
    },
    RewriteText {
        text: String,
        #[serde(default)]
        tone: Option<String>,
    },
    TranslateText {
        text: String,
        #[serde(default, rename = "targetLanguage")]
        target_language: Option<String>,
    },
    ProofreadText {
        text: String,
    },
    CheckNavigation {
        url: String,
    },
}

impl Command {
    /// Wire names of all actions
    pub const ACTIONS: &'static [&'static str] = &[
        "toggleFocusMode",
        "summarizePage",
        "saveNote",
        "getNotes",
        "deleteNote",
        "clearAllNotes",
        "updateBlockedSites",
        "getFocusStatus",
        "getFocusStats",
        "resetFocusStats",
        "openOptionsPage",
        "summarizeText",
        "rewriteText",
        "translateText",
        "proofreadText",
        "checkNavigation",
    ];

    /// Parse a request object.
    ///
    /// A missing or unrecognized action name is `UnknownCommand`; a known
    /// action whose payload does not fit is `InvalidPayload`.
    pub fn parse(request: &Value) -> Result<Self> {
        let action = request
            .get("action")
            .and_then(Value::as_str)
            .ok_or(FocusMindError::UnknownCommand)?;

        if !Self::ACTIONS.contains(&action) {
            return Err(FocusMindError::UnknownCommand);
        }

        serde_json::from_value(request.clone()).map_err(|e| FocusMindError::InvalidPayload {
            action: action.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn action(&self) -> &'static str {
        match self {
            Command::ToggleFocusMode => "toggleFocusMode",
            Command::SummarizePage => "summarizePage",
            Command::SaveNote { .. } => "saveNote",
            Command::GetNotes => "getNotes",
            Command::DeleteNote { .. } => "deleteNote",
            Command::ClearAllNotes => "clearAllNotes",
            Command::UpdateBlockedSites { .. } => "updateBlockedSites",
            Command::GetFocusStatus => "getFocusStatus",
            Command::GetFocusStats => "getFocusStats",
            Command::ResetFocusStats => "resetFocusStats",
            Command::OpenOptionsPage { .. } => "openOptionsPage",
            Command::SummarizeText { .. } => "summarizeText",
            Command::RewriteText { .. } => "rewriteText",
            Command::TranslateText { .. } => "translateText",
            Command::ProofreadText { .. } => "proofreadText",
            Command::CheckNavigation { .. } => "checkNavigation",
        }
    }
}

/// Outcome of one dispatched command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandResult {
    Data(Value),
    Error { error: String },
}

impl CommandResult {
    pub fn error(message: impl Into<String>) -> Self {
        CommandResult::Error { error: message.into() }
    }

    /// The error message, when this is an error response
    pub fn error_message(&self) -> Option<&str> {
        match self {
            CommandResult::Error { error } => Some(error),
            CommandResult::Data(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CommandResult::Error { .. })
    }

    /// The response object sent back to the UI surface
    pub fn into_value(self) -> Value {
        match self {
            CommandResult::Data(value) => value,
            CommandResult::Error { error } => json!({ "error": error }),
        }
    }
}

impl From<Result<Value>> for CommandResult {
    fn from(result: Result<Value>) -> Self {
        match result {
            Ok(value) => CommandResult::Data(value),
            Err(e) => CommandResult::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unit_actions() {
        assert_eq!(Command::parse(&json!({"action": "getNotes"})).unwrap(), Command::GetNotes);
        assert_eq!(
            Command::parse(&json!({"action": "toggleFocusMode", "requestId": 4})).unwrap(),
            Command::ToggleFocusMode
        );
    }

    #[test]
    fn test_parse_payloads() {
        assert_eq!(
            Command::parse(&json!({"action": "saveNote", "content": "x"})).unwrap(),
            Command::SaveNote { content: "x".to_string() }
        );
        assert_eq!(
            Command::parse(&json!({"action": "updateBlockedSites", "sites": ["a.com"]})).unwrap(),
            Command::UpdateBlockedSites { sites: vec!["a.com".to_string()] }
        );
        assert_eq!(
            Command::parse(&json!({"action": "translateText", "text": "hola", "targetLanguage": "French"})).unwrap(),
            Command::TranslateText {
                text: "hola".to_string(),
                target_language: Some("French".to_string()),
            }
        );
        assert_eq!(
            Command::parse(&json!({"action": "openOptionsPage"})).unwrap(),
            Command::OpenOptionsPage { section: None }
        );
    }

    #[test]
    fn test_unknown_and_missing_action() {
        assert_eq!(
            Command::parse(&json!({"action": "doesNotExist"})),
            Err(FocusMindError::UnknownCommand)
        );
        assert_eq!(Command::parse(&json!({"content": "x"})), Err(FocusMindError::UnknownCommand));
        assert_eq!(Command::parse(&json!({"action": 3})), Err(FocusMindError::UnknownCommand));
        assert_eq!(Command::parse(&json!("saveNote")), Err(FocusMindError::UnknownCommand));
    }

    #[test]
    fn test_invalid_payload() {
        let err = Command::parse(&json!({"action": "saveNote"})).unwrap_err();
        assert_eq!(err.to_string(), "Invalid payload for saveNote: missing field `content`");

        let err = Command::parse(&json!({"action": "updateBlockedSites", "sites": "a.com"})).unwrap_err();
        assert!(matches!(err, FocusMindError::InvalidPayload { .. }));
    }

    #[test]
    fn test_action_names_round_trip() {
        let payload = json!({
            "content": "c", "id": "i", "sites": [], "text": "t", "url": "https://a.com"
        });
        for name in Command::ACTIONS {
            let mut request = payload.clone();
            request["action"] = json!(name);
            let command = Command::parse(&request).unwrap();
            assert_eq!(command.action(), *name);
        }
    }

    #[test]
    fn test_result_shapes() {
        let ok = CommandResult::from(Ok::<_, FocusMindError>(json!({"success": true})));
        assert_eq!(ok.clone().into_value(), json!({"success": true}));
        assert!(!ok.is_error());

        let err = CommandResult::from(Err::<Value, _>(FocusMindError::UnknownCommand));
        assert!(err.is_error());
        assert_eq!(err.error_message(), Some("Unknown action"));
        assert_eq!(err.into_value(), json!({"error": "Unknown action"}));
    }
}
