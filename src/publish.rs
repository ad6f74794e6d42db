//! Best-effort publishing of the data root to a git remote.
//!
//! After every successful save the whole data root is staged, committed and
//! force-pushed. Each step runs as its own `git` child process with the data
//! root as working directory:
//!
//! 1. `git add .`; failure stops with `"git add failed"`.
//! 2. `git commit -m "Synapsis: YYYY-MM-DD HH:MM:SS"`; when git reports
//!    *nothing to commit* the publish counts as done and push is skipped.
//! 3. `git push --force [<remote> <branch>]`.
//!
//! Nothing here ever fails the save: every outcome, including a missing
//! `git` binary, is folded into a [`PublishOutcome`].
//!
//! # Force push
//!
//! The push overwrites remote history. The local data root is treated as
//! the single source of truth; edits made directly on the remote are lost
//! on the next publish.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::PublishConfig;
use crate::models::PublishOutcome;

const NOTHING_TO_COMMIT: &str = "nothing to commit";
const COMMIT_PREFIX: &str = "Synapsis";

/// Capability to mirror a directory somewhere else.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, repo_root: &Path) -> PublishOutcome;
}

/// Publisher that does nothing; used when publishing is disabled.
pub struct NoopPublisher;

#[async_trait]
impl Publisher for NoopPublisher {
    async fn publish(&self, _repo_root: &Path) -> PublishOutcome {
        PublishOutcome::skipped()
    }
}

/// Stage → commit → force-push via the `git` CLI.
pub struct GitPublisher {
    program: PathBuf,
    offset: FixedOffset,
    target: Option<(String, String)>,
    // One publish at a time; concurrent commits would race on the index.
    lock: Mutex<()>,
}

impl GitPublisher {
    pub fn new(program: impl Into<PathBuf>, offset: FixedOffset) -> Self {
        Self {
            program: program.into(),
            offset,
            target: None,
            lock: Mutex::new(()),
        }
    }

    /// Push to an explicit `<remote> <branch>` instead of the upstream.
    pub fn with_target(
        mut self,
        remote: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        self.target = Some((remote.into(), branch.into()));
        self
    }

    pub fn from_config(config: &PublishConfig) -> anyhow::Result<Self> {
        let offset = config.offset()?;
        let publisher = Self::new(&config.git_program, offset);
        Ok(match (&config.remote, &config.branch) {
            (Some(remote), Some(branch)) => publisher.with_target(remote, branch),
            _ => publisher,
        })
    }

    async fn git(&self, repo_root: &Path, args: &[&str]) -> std::io::Result<Output> {
        debug!(?args, cwd = %repo_root.display(), "running git");
        Command::new(&self.program)
            .args(args)
            .current_dir(repo_root)
            // Untranslated messages, so "nothing to commit" can be matched.
            .env("LC_ALL", "C")
            .output()
            .await
    }

    async fn run(&self, repo_root: &Path) -> std::io::Result<PublishOutcome> {
        let add = self.git(repo_root, &["add", "."]).await?;
        if !add.status.success() {
            return Ok(PublishOutcome::failed("git add failed"));
        }

        let message = commit_message(&Utc::now().with_timezone(&self.offset));
        let commit = self.git(repo_root, &["commit", "-m", &message]).await?;
        if !commit.status.success() {
            let stdout = String::from_utf8_lossy(&commit.stdout);
            let stderr = String::from_utf8_lossy(&commit.stderr);
            // git prints this on stdout; older versions used stderr
            if stdout.contains(NOTHING_TO_COMMIT) || stderr.contains(NOTHING_TO_COMMIT) {
                debug!("nothing to commit; skipping push");
                return Ok(PublishOutcome::pushed());
            }
            let diagnostic = if stderr.trim().is_empty() { stdout } else { stderr };
            return Ok(PublishOutcome::failed(format!(
                "git commit failed: {}",
                diagnostic.trim()
            )));
        }

        let mut push_args = vec!["push", "--force"];
        if let Some((remote, branch)) = &self.target {
            push_args.push(remote);
            push_args.push(branch);
        }
        let push = self.git(repo_root, &push_args).await?;
        if !push.status.success() {
            let stderr = String::from_utf8_lossy(&push.stderr);
            return Ok(PublishOutcome::failed(format!(
                "git push failed: {}",
                stderr.trim()
            )));
        }

        Ok(PublishOutcome::pushed())
    }
}

#[async_trait]
impl Publisher for GitPublisher {
    async fn publish(&self, repo_root: &Path) -> PublishOutcome {
        let _guard = self.lock.lock().await;

        let outcome = match self.run(repo_root).await {
            Ok(outcome) => outcome,
            Err(e) => PublishOutcome::failed(format!("git operation error: {}", e)),
        };

        match &outcome.error {
            None if outcome.pushed => {
                info!(root = %repo_root.display(), "published data directory")
            }
            None => {}
            Some(err) => {
                warn!(root = %repo_root.display(), error = %err, "publish failed")
            }
        }
        outcome
    }
}

/// `Synapsis: YYYY-MM-DD HH:MM:SS` in the given time's zone.
pub fn commit_message(now: &DateTime<FixedOffset>) -> String {
    format!("{}: {}", COMMIT_PREFIX, now.format("%Y-%m-%d %H:%M:%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_commit_message_format() {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = jst.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(commit_message(&now), "Synapsis: 2025-01-02 03:04:05");
    }

    #[test]
    fn test_commit_message_uses_fixed_offset() {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let utc = Utc.with_ymd_and_hms(2025, 1, 1, 20, 0, 0).unwrap();
        assert_eq!(
            commit_message(&utc.with_timezone(&jst)),
            "Synapsis: 2025-01-02 05:00:00"
        );
    }

    #[tokio::test]
    async fn test_noop_publisher() {
        let outcome = NoopPublisher.publish(Path::new(".")).await;
        assert_eq!(outcome, PublishOutcome::skipped());
    }

    #[tokio::test]
    async fn test_missing_git_binary_is_reported() {
        let tmp = tempfile::TempDir::new().unwrap();
        let publisher = GitPublisher::new(
            "/nonexistent/git-binary-for-tests",
            FixedOffset::east_opt(0).unwrap(),
        );
        let outcome = publisher.publish(tmp.path()).await;
        assert!(!outcome.pushed);
        assert!(outcome
            .error
            .unwrap()
            .starts_with("git operation error:"));
    }
}
