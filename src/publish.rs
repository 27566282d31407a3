//! Committing and pushing regenerated files with git.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::PublishConfig;

/// Errors running git.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("git {args} failed with exit code {code}: {stderr}")]
    Git {
        args: String,
        code: i32,
        stderr: String,
    },
}

/// What a publish run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Nothing was staged, so nothing was committed.
    NoChanges,
    Committed,
    Pushed,
}

/// Commit message naming the command and the time of the run.
pub fn commit_message(command: &str, at: DateTime<Utc>) -> String {
    format!(
        "Update mirror state ({}) {}",
        command,
        at.format("%Y-%m-%d %H:%M UTC")
    )
}

/// Commits files inside a git working tree.
#[derive(Debug, Clone)]
pub struct Publisher {
    repo: PathBuf,
    remote: String,
    branch: Option<String>,
    push: bool,
}

impl Publisher {
    pub fn new(repo: impl Into<PathBuf>, config: &PublishConfig) -> Self {
        Self {
            repo: repo.into(),
            remote: config.remote.clone(),
            branch: config.branch.clone(),
            push: config.push,
        }
    }

    /// Disable pushing for this run.
    pub fn without_push(mut self) -> Self {
        self.push = false;
        self
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    async fn run(&self, args: &[&str]) -> Result<Output, PublishError> {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.repo)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("Running command: {:?}", cmd);
        Ok(cmd.output().await?)
    }

    async fn git(&self, args: &[&str]) -> Result<Output, PublishError> {
        let output = self.run(args).await?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(git_error(args, &output))
        }
    }

    /// Whether the index differs from HEAD.
    async fn has_staged_changes(&self) -> Result<bool, PublishError> {
        let args = ["diff", "--cached", "--quiet"];
        let output = self.run(&args).await?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(git_error(&args, &output)),
        }
    }

    /// Stage `paths`, then commit and push if anything changed.
    ///
    /// Paths that do not exist are ignored; deletions below existing
    /// directories are staged too.
    pub async fn publish(
        &self,
        paths: &[PathBuf],
        message: &str,
    ) -> Result<PublishOutcome, PublishError> {
        let existing: Vec<String> = paths
            .iter()
            .filter(|path| self.repo.join(path).exists())
            .map(|path| path.to_string_lossy().into_owned())
            .collect();
        if existing.is_empty() {
            info!("Nothing to publish");
            return Ok(PublishOutcome::NoChanges);
        }

        let mut add = vec!["add", "--all", "--"];
        add.extend(existing.iter().map(String::as_str));
        self.git(&add).await?;

        if !self.has_staged_changes().await? {
            info!("No changes to commit");
            return Ok(PublishOutcome::NoChanges);
        }

        self.git(&["commit", "--quiet", "-m", message]).await?;
        info!("Committed: {}", message);

        if !self.push {
            return Ok(PublishOutcome::Committed);
        }

        let refspec = match &self.branch {
            Some(branch) => format!("HEAD:{}", branch),
            None => "HEAD".to_string(),
        };
        self.git(&["push", "--quiet", self.remote.as_str(), refspec.as_str()])
            .await?;
        info!("Pushed to {} ({})", self.remote, refspec);
        Ok(PublishOutcome::Pushed)
    }
}

fn git_error(args: &[&str], output: &Output) -> PublishError {
    PublishError::Git {
        args: args.join(" "),
        code: output.status.code().unwrap_or(-1),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}
