#![allow(async_fn_in_trait)]

use std::fmt::Display;
use std::path;
use std::process::Output;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
#[cfg(test)]
use mockall::automock;
use tokio::process::Command;
use tracing::instrument;

use crate::error::PrqError;

/// Name of the remote every branch is pushed to and compared against.
pub const REMOTE: &str = "origin";

// -----------------------------------------------------------------------------
// GitOps trait

/// Operations for interacting with Git
#[cfg_attr(test, automock)]
pub trait GitOps {
    /// Absolute path of the working tree root.
    async fn toplevel(&self) -> Result<path::PathBuf>;

    /// Read a single git config value, `None` when unset.
    async fn config_get(&self, key: &str) -> Result<Option<String>>;

    /// Branch pointed to by `origin/HEAD`, if the remote advertises one.
    async fn remote_default_branch(&self) -> Result<Option<String>>;

    /// Currently checked out branch, `None` on a detached HEAD.
    async fn current_branch(&self) -> Result<Option<String>>;

    async fn head_commit(&self) -> Result<CommitId>;

    async fn local_branch_exists(&self, branch: &str) -> Result<bool>;

    async fn remote_branch_exists(&self, branch: &str) -> Result<bool>;

    /// Subjects of the commits reachable from HEAD but not from
    /// `origin/<base>`, oldest first.
    async fn subjects_ahead_of(&self, base: &str) -> Result<Vec<String>>;

    /// Commits reachable from `tip` but not from `upstream`.
    async fn commits_between(&self, upstream: &str, tip: &CommitId) -> Result<Vec<CommitId>>;

    /// Create `branch` at HEAD and check it out.
    async fn create_branch(&self, branch: &str) -> Result<()>;

    async fn switch_branch(&self, branch: &str) -> Result<()>;

    async fn push_branch(&self, branch: &str) -> Result<()>;

    async fn force_push_branch(&self, branch: &str) -> Result<()>;

    async fn fetch_branch(&self, branch: &str) -> Result<()>;

    /// Hard-reset the checked out branch to `target`.
    async fn reset_hard(&self, target: &str) -> Result<()>;

    async fn cherry_pick(&self, commit_id: &CommitId) -> Result<()>;

    /// Check if `commit` is an ancestor of `descendant`.
    /// Returns true if `commit` is reachable from `descendant` by following parent links.
    async fn is_ancestor(&self, commit: &CommitId, descendant: &str) -> Result<bool>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitId(pub String);

impl Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// -----------------------------------------------------------------------------
// RealGit

/// Real implementation that calls the git CLI
pub struct RealGit {
    path: path::PathBuf,
}

impl RealGit {
    pub fn new(path: path::PathBuf) -> Self {
        Self { path }
    }

    /// Fail with an environment error unless `git` runs and `path` is inside a
    /// working tree.
    pub async fn ensure_repository(&self) -> Result<()> {
        let output = Command::new("git")
            .current_dir(&self.path)
            .args(["rev-parse", "--is-inside-work-tree"])
            .output()
            .await;
        match output {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(PrqError::ToolMissing {
                tool: "git".to_string(),
            }
            .into()),
            Err(e) => Err(e).context("Failed to execute git command"),
            Ok(output) if !output.status.success() => Err(PrqError::NotARepository.into()),
            Ok(_) => Ok(()),
        }
    }

    async fn output(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .current_dir(&self.path)
            .args(args)
            .output()
            .await
            .context("Failed to execute git command")
    }

    /// Run git and return trimmed stdout, failing on a non-zero exit.
    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args).await?;

        if !output.status.success() {
            bail!(
                "git command failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8(output.stdout)?.trim().to_string())
    }

    async fn ref_exists(&self, full_ref: &str) -> Result<bool> {
        let output = self
            .output(&["show-ref", "--verify", "--quiet", full_ref])
            .await?;
        Ok(output.status.success())
    }
}

impl GitOps for RealGit {
    async fn toplevel(&self) -> Result<path::PathBuf> {
        Ok(self.run(&["rev-parse", "--show-toplevel"]).await?.into())
    }

    async fn config_get(&self, key: &str) -> Result<Option<String>> {
        let output = self.output(&["config", "--get", key]).await?;

        // Exit code 1 means the key is not set
        if !output.status.success() {
            return Ok(None);
        }

        Ok(Some(String::from_utf8(output.stdout)?.trim().to_string()))
    }

    async fn remote_default_branch(&self) -> Result<Option<String>> {
        let head_ref = format!("refs/remotes/{REMOTE}/HEAD");
        let output = self
            .output(&["symbolic-ref", "--quiet", "--short", &head_ref])
            .await?;

        if !output.status.success() {
            return Ok(None);
        }

        let target = String::from_utf8(output.stdout)?.trim().to_string();
        Ok(target
            .strip_prefix(&format!("{REMOTE}/"))
            .map(|s| s.to_string()))
    }

    async fn current_branch(&self) -> Result<Option<String>> {
        let output = self
            .output(&["symbolic-ref", "--quiet", "--short", "HEAD"])
            .await?;

        // Exit code 1 means HEAD is detached
        if !output.status.success() {
            return Ok(None);
        }

        Ok(Some(String::from_utf8(output.stdout)?.trim().to_string()))
    }

    async fn head_commit(&self) -> Result<CommitId> {
        Ok(CommitId(self.run(&["rev-parse", "HEAD"]).await?))
    }

    async fn local_branch_exists(&self, branch: &str) -> Result<bool> {
        self.ref_exists(&format!("refs/heads/{branch}")).await
    }

    async fn remote_branch_exists(&self, branch: &str) -> Result<bool> {
        self.ref_exists(&format!("refs/remotes/{REMOTE}/{branch}"))
            .await
    }

    #[instrument(skip(self))]
    async fn subjects_ahead_of(&self, base: &str) -> Result<Vec<String>> {
        let range = format!("{REMOTE}/{base}..HEAD");
        let stdout = self
            .run(&["log", "--reverse", "--format=%s", &range])
            .await?;

        Ok(stdout
            .lines()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }

    async fn commits_between(&self, upstream: &str, tip: &CommitId) -> Result<Vec<CommitId>> {
        let range = format!("{upstream}..{tip}");
        let stdout = self.run(&["rev-list", &range]).await?;

        Ok(stdout
            .lines()
            .filter(|s| !s.is_empty())
            .map(|s| CommitId(s.to_string()))
            .collect())
    }

    #[instrument(skip(self))]
    async fn create_branch(&self, branch: &str) -> Result<()> {
        self.run(&["checkout", "-b", branch]).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn switch_branch(&self, branch: &str) -> Result<()> {
        self.run(&["checkout", branch]).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn push_branch(&self, branch: &str) -> Result<()> {
        self.run(&["push", "-u", REMOTE, branch]).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn force_push_branch(&self, branch: &str) -> Result<()> {
        self.run(&["push", "--force", "-u", REMOTE, branch]).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_branch(&self, branch: &str) -> Result<()> {
        // Forced refspec so the remote-tracking ref follows rewritten branches
        let refspec = format!("+refs/heads/{branch}:refs/remotes/{REMOTE}/{branch}");
        self.run(&["fetch", REMOTE, &refspec]).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn reset_hard(&self, target: &str) -> Result<()> {
        self.run(&["reset", "--hard", target]).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn cherry_pick(&self, commit_id: &CommitId) -> Result<()> {
        self.run(&["cherry-pick", &commit_id.0]).await?;
        Ok(())
    }

    async fn is_ancestor(&self, commit: &CommitId, descendant: &str) -> Result<bool> {
        let output = self
            .output(&["merge-base", "--is-ancestor", &commit.0, descendant])
            .await?;

        // Exit code 0 means it is an ancestor, 1 means it's not
        Ok(output.status.success())
    }
}
