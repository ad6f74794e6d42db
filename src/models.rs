//! Core data types shared by the pipeline, the HTTP server, and the CLI.
//!
//! Request types are deserialized straight from JSON bodies; response types
//! mirror the JSON returned to clients.

use serde::{Deserialize, Serialize};

/// Mode id used when an ask request does not name one.
pub const DEFAULT_MODE_ID: &str = "general";

/// A named preset: how a question is phrased to the model and where its
/// answer is filed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode {
    pub id: String,
    pub name: String,
    pub prompt_template: String,
    /// Subdirectory of the data root, relative.
    pub save_dir: String,
    pub description: String,
}

/// Body of `POST /save`.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub filename: Option<String>,
    pub content: String,
}

/// Body of `POST /ask-ai`.
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub content: String,
    #[serde(default = "default_mode_id")]
    pub mode_id: String,
    #[serde(default)]
    pub filename: Option<String>,
}

fn default_mode_id() -> String {
    DEFAULT_MODE_ID.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    pub filepath: String,
    pub message: String,
    pub git_pushed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub success: bool,
    pub ai_response: String,
    pub filepath: String,
    pub message: String,
    pub git_pushed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_error: Option<String>,
}

/// Body of `GET /modes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModesResponse {
    pub modes: Vec<Mode>,
    pub default_mode: String,
}

/// Result of one stage → commit → push attempt.
///
/// Never an error: a failed publish is reported alongside a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublishOutcome {
    pub pushed: bool,
    pub error: Option<String>,
}

impl PublishOutcome {
    pub fn pushed() -> Self {
        Self {
            pushed: true,
            error: None,
        }
    }

    pub fn skipped() -> Self {
        Self::default()
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            pushed: false,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_request_defaults_to_general_mode() {
        let req: AskRequest = serde_json::from_str(r#"{"content": "q"}"#).unwrap();
        assert_eq!(req.mode_id, "general");
        assert!(req.filename.is_none());
    }

    #[test]
    fn test_save_response_omits_missing_git_error() {
        let resp = SaveResponse {
            success: true,
            filepath: "data/a.md".into(),
            message: "ok".into(),
            git_pushed: true,
            git_error: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("git_error").is_none());
        assert_eq!(json["git_pushed"], true);
    }
}
