//! Save-and-publish pipeline.
//!
//! Composes the filename policy, formatter, file store, publisher and
//! language-model client into the two operations the service offers:
//!
//! - [`Pipeline::save`]: store content verbatim in the data root.
//! - [`Pipeline::ask`]: send content through a mode's prompt, store the
//!   question/answer document in the mode's directory.
//!
//! Both publish after a successful write. The publish runs to completion
//! even if the caller stops waiting for it. Validation (mode, filename) runs
//! before any side effect, so a rejected request neither calls the model
//! nor touches the disk.

use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{SynapsisError, SynapsisResult};
use crate::filename::resolve_filename;
use crate::format::{format_plain, format_qa};
use crate::llm::{Assistant, OpenAIChat};
use crate::models::{
    AskRequest, AskResponse, ModesResponse, PublishOutcome, SaveRequest, SaveResponse,
};
use crate::modes::ModeRegistry;
use crate::publish::{GitPublisher, NoopPublisher, Publisher};
use crate::store::FileStore;

/// Everything a request needs, built once at startup.
#[derive(Clone)]
pub struct Pipeline {
    store: FileStore,
    publisher: Arc<dyn Publisher>,
    modes: Option<Arc<ModeRegistry>>,
    assistant: Option<Arc<dyn Assistant>>,
}

impl Pipeline {
    pub fn new(store: FileStore, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            store,
            publisher,
            modes: None,
            assistant: None,
        }
    }

    /// Assemble a pipeline from configuration.
    ///
    /// Loads the mode registry and creates the data layout. With `with_assistant`, the API key must be present in the
    /// environment. With `publish` off, saves are never pushed.
    pub fn from_config(
        config: &Config,
        with_assistant: bool,
        publish: bool,
    ) -> anyhow::Result<Self> {
        let store = FileStore::new(&config.data.root);

        let publisher: Arc<dyn Publisher> = if publish {
            Arc::new(GitPublisher::from_config(&config.publish)?)
        } else {
            info!("publishing disabled");
            Arc::new(NoopPublisher)
        };

        let mut pipeline = Self::new(store, publisher);

        let registry = ModeRegistry::load(&config.modes.file)?;
        pipeline.store.ensure_layout(registry.save_dirs())?;
        pipeline = pipeline.with_modes(Arc::new(registry));

        if with_assistant {
            let chat = OpenAIChat::from_env(&config.openai)
                .context("AI client could not be configured")?;
            pipeline = pipeline.with_assistant(Arc::new(chat));
        }

        Ok(pipeline)
    }

    pub fn with_modes(mut self, modes: Arc<ModeRegistry>) -> Self {
        self.modes = Some(modes);
        self
    }

    pub fn with_assistant(mut self, assistant: Arc<dyn Assistant>) -> Self {
        self.assistant = Some(assistant);
        self
    }

    pub fn mode_registry(&self) -> SynapsisResult<&ModeRegistry> {
        self.modes
            .as_deref()
            .ok_or_else(|| SynapsisError::configuration("mode registry is not loaded"))
    }

    pub fn modes(&self) -> SynapsisResult<ModesResponse> {
        Ok(self.mode_registry()?.to_response())
    }

    /// Publish on a separate task so a dropped request cannot cancel it
    /// halfway through the git sequence.
    async fn publish(&self) -> PublishOutcome {
        let publisher = Arc::clone(&self.publisher);
        let root = self.store.root().to_path_buf();
        tokio::spawn(async move { publisher.publish(&root).await })
            .await
            .unwrap_or_else(|e| PublishOutcome::failed(format!("git operation error: {}", e)))
    }

    pub async fn save(&self, request: SaveRequest) -> SynapsisResult<SaveResponse> {
        let filename = resolve_filename(request.filename.as_deref(), None)?;
        let path = self
            .store
            .save(None, &filename, &format_plain(&request.content))
            .await?;

        let outcome = self.publish().await;

        Ok(SaveResponse {
            success: true,
            filepath: path.display().to_string(),
            message: format!("ファイルを保存しました: {}", filename),
            git_pushed: outcome.pushed,
            git_error: outcome.error,
        })
    }

    pub async fn ask(&self, request: AskRequest) -> SynapsisResult<AskResponse> {
        let mode = self.mode_registry()?.require(&request.mode_id)?;
        let filename = resolve_filename(request.filename.as_deref(), Some(&mode.id))?;
        let assistant = self
            .assistant
            .as_ref()
            .ok_or_else(|| SynapsisError::configuration("no AI client configured"))?;

        let prompt = mode.render_prompt(&request.content);
        info!(mode = %mode.id, model = assistant.model_name(), "asking AI");
        let answer = assistant.ask(&prompt).await.inspect_err(|e| {
            warn!(mode = %mode.id, error = %e, "AI request failed");
        })?;

        let document = format_qa(&mode.name, &request.content, &answer);
        let path = self
            .store
            .save(Some(&mode.save_dir), &filename, &document)
            .await?;

        let outcome = self.publish().await;

        Ok(AskResponse {
            success: true,
            ai_response: answer,
            filepath: path.display().to_string(),
            message: format!("AI回答を保存しました: {} / {}", mode.name, filename),
            git_pushed: outcome.pushed,
            git_error: outcome.error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mode;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct EchoAssistant {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Assistant for EchoAssistant {
        fn model_name(&self) -> &str {
            "echo"
        }

        async fn ask(&self, prompt: &str) -> SynapsisResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("echo: {}", prompt))
        }
    }

    struct FailingPublisher;

    #[async_trait]
    impl Publisher for FailingPublisher {
        async fn publish(&self, _repo_root: &Path) -> PublishOutcome {
            PublishOutcome::failed("git push failed: no remote")
        }
    }

    fn registry() -> Arc<ModeRegistry> {
        let mode = Mode {
            id: "general".into(),
            name: "一般".into(),
            prompt_template: "Q: {content}".into(),
            save_dir: "general".into(),
            description: "General".into(),
        };
        Arc::new(ModeRegistry::new(vec![mode], "general".into()).unwrap())
    }

    fn pipeline(tmp: &TempDir, publisher: Arc<dyn Publisher>) -> (Pipeline, Arc<EchoAssistant>) {
        let store = FileStore::new(tmp.path());
        let modes = registry();
        store.ensure_layout(modes.save_dirs()).unwrap();
        let assistant = Arc::new(EchoAssistant {
            calls: AtomicUsize::new(0),
        });
        let pipeline = Pipeline::new(store, publisher)
            .with_modes(modes)
            .with_assistant(assistant.clone());
        (pipeline, assistant)
    }

    #[tokio::test]
    async fn test_save_reports_publish_failure_as_success() {
        let tmp = TempDir::new().unwrap();
        let (pipeline, _) = pipeline(&tmp, Arc::new(FailingPublisher));

        let resp = pipeline
            .save(SaveRequest {
                filename: Some("note.md".into()),
                content: "hello".into(),
            })
            .await
            .unwrap();

        assert!(resp.success);
        assert!(!resp.git_pushed);
        assert_eq!(resp.git_error.as_deref(), Some("git push failed: no remote"));
        assert_eq!(resp.message, "ファイルを保存しました: note.md");
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("note.md")).unwrap(),
            "hello"
        );
    }

    #[tokio::test]
    async fn test_ask_writes_qa_document_in_mode_dir() {
        let tmp = TempDir::new().unwrap();
        let (pipeline, assistant) = pipeline(&tmp, Arc::new(NoopPublisher));

        let resp = pipeline
            .ask(AskRequest {
                content: "why?".into(),
                mode_id: "general".into(),
                filename: Some("a.md".into()),
            })
            .await
            .unwrap();

        assert_eq!(resp.ai_response, "echo: Q: why?");
        assert_eq!(resp.message, "AI回答を保存しました: 一般 / a.md");
        assert_eq!(assistant.calls.load(Ordering::SeqCst), 1);
        let saved = std::fs::read_to_string(tmp.path().join("general/a.md")).unwrap();
        assert_eq!(
            saved,
            "# 一般\n\n## 入力\n\nwhy?\n\n## AI回答\n\necho: Q: why?\n"
        );
    }

    #[tokio::test]
    async fn test_ask_generated_name_uses_mode_prefix() {
        let tmp = TempDir::new().unwrap();
        let (pipeline, _) = pipeline(&tmp, Arc::new(NoopPublisher));

        let resp = pipeline
            .ask(AskRequest {
                content: "q".into(),
                mode_id: "general".into(),
                filename: None,
            })
            .await
            .unwrap();

        let name = Path::new(&resp.filepath).file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("general_"), "{}", name);
    }

    #[tokio::test]
    async fn test_invalid_filename_skips_ai_call() {
        let tmp = TempDir::new().unwrap();
        let (pipeline, assistant) = pipeline(&tmp, Arc::new(NoopPublisher));

        let err = pipeline
            .ask(AskRequest {
                content: "q".into(),
                mode_id: "general".into(),
                filename: Some("..".into()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SynapsisError::InvalidFilename(_)));
        assert_eq!(assistant.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_modes_without_registry_is_configuration_error() {
        let tmp = TempDir::new().unwrap();
        let pipeline = Pipeline::new(FileStore::new(tmp.path()), Arc::new(NoopPublisher));
        assert!(matches!(
            pipeline.modes().unwrap_err(),
            SynapsisError::Configuration(_)
        ));
    }
}
