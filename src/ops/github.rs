#![allow(async_fn_in_trait)]

use std::io::Write as _;
use std::path;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;
use tracing::instrument;

use crate::error::PrqError;

// -----------------------------------------------------------------------------
// Types

/// A pull request as reported by `gh pr view --json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub number: u64,
    pub url: String,
    pub state: String,
    #[serde(default)]
    pub is_draft: bool,
}

impl PullRequest {
    pub fn is_open(&self) -> bool {
        self.state == "OPEN"
    }
}

/// Everything needed to open a new pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    pub title: String,
    pub head: String,
    pub base: String,
    pub draft: bool,
    pub body: String,
}

// -----------------------------------------------------------------------------
// GithubOps trait

/// Operations for interacting with GitHub
#[cfg_attr(test, automock)]
pub trait GithubOps {
    /// Get the most recent PR for a head branch, returns None if no PR exists
    async fn pr_view(&self, branch: &str) -> Result<Option<PullRequest>>;

    /// Create a new PR and return the PR URL
    async fn pr_create(&self, pr: &NewPullRequest) -> Result<String>;

    /// Open the PR for a head branch in the browser
    async fn pr_open_in_browser(&self, branch: &str) -> Result<()>;
}

// -----------------------------------------------------------------------------
// RealGithub

/// Real implementation that calls the gh CLI
pub struct RealGithub {
    path: path::PathBuf,
}

impl RealGithub {
    pub fn new(path: path::PathBuf) -> Self {
        Self { path }
    }

    /// Fail with an environment error unless `gh` can be executed.
    pub async fn ensure_available(&self) -> Result<()> {
        let output = Command::new("gh")
            .current_dir(&self.path)
            .arg("--version")
            .output()
            .await;
        match output {
            Ok(output) if output.status.success() => Ok(()),
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                Err(e).context("Failed to execute gh command")
            }
            _ => Err(PrqError::ToolMissing {
                tool: "gh".to_string(),
            }
            .into()),
        }
    }
}

impl GithubOps for RealGithub {
    #[instrument(skip(self))]
    async fn pr_view(&self, branch: &str) -> Result<Option<PullRequest>> {
        let output = Command::new("gh")
            .current_dir(&self.path)
            .args([
                "pr",
                "view",
                branch,
                "--json",
                "number,url,state,isDraft",
            ])
            .output()
            .await
            .context("Failed to execute gh command")?;

        if !output.status.success() {
            // PR doesn't exist
            debug!(
                "gh pr view failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(None);
        }

        let pr: PullRequest = serde_json::from_slice(&output.stdout)
            .context("Failed to parse gh pr view output")?;
        Ok(Some(pr))
    }

    #[instrument(skip_all, fields(head = %pr.head, base = %pr.base))]
    async fn pr_create(&self, pr: &NewPullRequest) -> Result<String> {
        // The body goes through a file so gh never sees it on the command line
        let mut body_file =
            tempfile::NamedTempFile::new().context("Failed to create PR body file")?;
        body_file
            .write_all(pr.body.as_bytes())
            .context("Failed to write PR body file")?;
        body_file.flush()?;
        let body_path = body_file.path().to_string_lossy().to_string();

        let mut args: Vec<&str> = vec![
            "pr",
            "create",
            "--title",
            pr.title.as_str(),
            "--head",
            pr.head.as_str(),
            "--base",
            pr.base.as_str(),
            "--body-file",
            body_path.as_str(),
        ];
        if pr.draft {
            args.push("--draft");
        }

        let output = Command::new("gh")
            .current_dir(&self.path)
            .args(&args)
            .output()
            .await
            .context("Failed to execute gh command")?;

        if !output.status.success() {
            return Err(PrqError::PrCreateFailed {
                branch: pr.head.clone(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        // gh prints progress lines before the URL
        let stdout = String::from_utf8(output.stdout)?;
        let Some(url) = stdout.lines().map(str::trim).filter(|l| !l.is_empty()).last() else {
            bail!("gh pr create printed no PR URL");
        };
        Ok(url.to_string())
    }

    #[instrument(skip(self))]
    async fn pr_open_in_browser(&self, branch: &str) -> Result<()> {
        let output = Command::new("gh")
            .current_dir(&self.path)
            .args(["pr", "view", branch, "--web"])
            .output()
            .await
            .context("Failed to execute gh command")?;

        if !output.status.success() {
            bail!(
                "gh command failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(())
    }
}
