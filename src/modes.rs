//! Mode registry loaded from a JSON file.
//!
//! # File Format
//!
//! ```json
//! {
//!   "default_mode": "general",
//!   "modes": [
//!     {
//!       "id": "general",
//!       "name": "一般",
//!       "prompt_template": "次の質問に答えてください:\n\n{content}",
//!       "save_dir": "general",
//!       "description": "General questions"
//!     }
//!   ]
//! }
//! ```
//!
//! The registry is loaded once at startup and shared read-only afterwards.
//! A missing or malformed file is a configuration error and the server must
//! not start.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Component, Path};
use tracing::{info, warn};

use crate::error::{SynapsisError, SynapsisResult};
use crate::models::{Mode, ModesResponse};

/// Placeholder replaced by the user's input in a prompt template.
pub const CONTENT_PLACEHOLDER: &str = "{content}";

#[derive(Debug, Deserialize)]
struct ModesFile {
    modes: Vec<Mode>,
    default_mode: String,
}

/// Immutable set of modes plus the default mode id.
#[derive(Debug, Clone)]
pub struct ModeRegistry {
    modes: Vec<Mode>,
    default_mode: String,
}

impl ModeRegistry {
    /// Read and validate the mode file at `path`.
    pub fn load(path: &Path) -> SynapsisResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SynapsisError::configuration(format!(
                "mode config file not readable: {}: {}",
                path.display(),
                e
            ))
        })?;

        let registry = Self::from_json(&raw).map_err(|e| match e {
            SynapsisError::Configuration(msg) => SynapsisError::configuration(format!(
                "{} ({})",
                msg,
                path.display()
            )),
            other => other,
        })?;

        info!(
            count = registry.modes.len(),
            default = %registry.default_mode,
            "loaded mode config"
        );
        Ok(registry)
    }

    /// Parse and validate a mode file's contents.
    pub fn from_json(raw: &str) -> SynapsisResult<Self> {
        let file: ModesFile = serde_json::from_str(raw)
            .map_err(|e| SynapsisError::configuration(format!("malformed mode config: {}", e)))?;
        Self::new(file.modes, file.default_mode)
    }

    pub fn new(modes: Vec<Mode>, default_mode: String) -> SynapsisResult<Self> {
        if modes.is_empty() {
            return Err(SynapsisError::configuration("mode config defines no modes"));
        }

        let mut seen = HashSet::new();
        for mode in &modes {
            if !seen.insert(mode.id.as_str()) {
                warn!(id = %mode.id, "duplicate mode id; the first definition wins");
            }
            validate_save_dir(mode)?;
            if !mode.prompt_template.contains(CONTENT_PLACEHOLDER) {
                warn!(id = %mode.id, "prompt template has no {{content}} placeholder");
            }
        }

        if !seen.contains(default_mode.as_str()) {
            return Err(SynapsisError::configuration(format!(
                "default_mode '{}' is not a defined mode",
                default_mode
            )));
        }

        Ok(Self {
            modes,
            default_mode,
        })
    }

    pub fn get(&self, id: &str) -> Option<&Mode> {
        self.modes.iter().find(|m| m.id == id)
    }

    /// Lookup that turns a miss into a client error.
    pub fn require(&self, id: &str) -> SynapsisResult<&Mode> {
        self.get(id)
            .ok_or_else(|| SynapsisError::InvalidMode(id.to_string()))
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    pub fn default_mode(&self) -> &str {
        &self.default_mode
    }

    /// Every distinct save directory, in definition order.
    pub fn save_dirs(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.modes
            .iter()
            .map(|m| m.save_dir.as_str())
            .filter(|d| seen.insert(*d))
            .collect()
    }

    /// List-all view served by `GET /modes`.
    pub fn to_response(&self) -> ModesResponse {
        ModesResponse {
            modes: self.modes.clone(),
            default_mode: self.default_mode.clone(),
        }
    }
}

/// Mode save directories must stay inside the data root.
fn validate_save_dir(mode: &Mode) -> SynapsisResult<()> {
    let dir = Path::new(&mode.save_dir);
    let escapes = dir
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(SynapsisError::configuration(format!(
            "mode '{}' save_dir must be a relative path inside the data root: {}",
            mode.id, mode.save_dir
        )));
    }
    Ok(())
}

impl Mode {
    /// Substitute `content` into the prompt template.
    ///
    /// `{content}` is replaced and `{{` / `}}` collapse to literal braces.
    /// Any other brace text is kept as written.
    pub fn render_prompt(&self, content: &str) -> String {
        let template = self.prompt_template.as_str();
        let mut out = String::with_capacity(template.len() + content.len());
        let mut rest = template;

        while let Some(pos) = rest.find(['{', '}']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if tail.starts_with(CONTENT_PLACEHOLDER) {
                out.push_str(content);
                rest = &tail[CONTENT_PLACEHOLDER.len()..];
            } else if tail.starts_with("{{") || tail.starts_with("}}") {
                out.push_str(&tail[..1]);
                rest = &tail[2..];
            } else {
                out.push_str(&tail[..1]);
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "default_mode": "general",
        "modes": [
            {
                "id": "general",
                "name": "一般",
                "prompt_template": "Answer this:\n\n{content}",
                "save_dir": "general",
                "description": "General questions"
            },
            {
                "id": "code",
                "name": "コード",
                "prompt_template": "Review {content} and return {{json}}",
                "save_dir": "dev/code",
                "description": "Code review"
            }
        ]
    }"#;

    fn mode_with_dir(dir: &str) -> Mode {
        Mode {
            id: "m".into(),
            name: "M".into(),
            prompt_template: "{content}".into(),
            save_dir: dir.into(),
            description: String::new(),
        }
    }

    #[test]
    fn test_parse_sample() {
        let reg = ModeRegistry::from_json(SAMPLE).unwrap();
        assert_eq!(reg.modes().len(), 2);
        assert_eq!(reg.default_mode(), "general");
        assert_eq!(reg.get("code").unwrap().name, "コード");
        assert_eq!(reg.save_dirs(), vec!["general", "dev/code"]);
    }

    #[test]
    fn test_require_unknown_is_invalid_mode() {
        let reg = ModeRegistry::from_json(SAMPLE).unwrap();
        let err = reg.require("unknown").unwrap_err();
        assert!(matches!(err, SynapsisError::InvalidMode(ref id) if id == "unknown"));
    }

    #[test]
    fn test_first_duplicate_wins() {
        let mut first = mode_with_dir("a");
        first.name = "First".into();
        let mut second = mode_with_dir("b");
        second.name = "Second".into();
        let reg = ModeRegistry::new(vec![first, second], "m".into()).unwrap();
        assert_eq!(reg.get("m").unwrap().name, "First");
    }

    #[test]
    fn test_unknown_default_rejected() {
        let err = ModeRegistry::new(vec![mode_with_dir("a")], "general".into()).unwrap_err();
        assert!(matches!(err, SynapsisError::Configuration(_)));
    }

    #[test]
    fn test_empty_modes_rejected() {
        assert!(ModeRegistry::from_json(r#"{"modes": [], "default_mode": "x"}"#).is_err());
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = ModeRegistry::from_json("{not json").unwrap_err();
        assert!(err.to_string().contains("malformed"));
    }

    #[test]
    fn test_escaping_save_dir_rejected() {
        for dir in ["../outside", "/abs/path", "a/../../b"] {
            let res = ModeRegistry::new(vec![mode_with_dir(dir)], "m".into());
            assert!(res.is_err(), "save_dir {:?} should be rejected", dir);
        }
        assert!(ModeRegistry::new(vec![mode_with_dir("./ok/nested")], "m".into()).is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = ModeRegistry::load(&tmp.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, SynapsisError::Configuration(_)));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("modes.json");
        std::fs::write(&path, SAMPLE).unwrap();
        let reg = ModeRegistry::load(&path).unwrap();
        assert!(reg.get("general").is_some());
    }

    #[test]
    fn test_render_prompt() {
        let reg = ModeRegistry::from_json(SAMPLE).unwrap();
        assert_eq!(
            reg.get("general").unwrap().render_prompt("What is Rust?"),
            "Answer this:\n\nWhat is Rust?"
        );
        assert_eq!(
            reg.get("code").unwrap().render_prompt("fn main() {}"),
            "Review fn main() {} and return {json}"
        );
    }

    #[test]
    fn test_render_prompt_keeps_unknown_placeholders() {
        let mut mode = mode_with_dir("a");
        mode.prompt_template = "{other} / {content} / }".into();
        assert_eq!(mode.render_prompt("x"), "{other} / x / }");
    }
}
