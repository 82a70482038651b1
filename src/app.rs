use anyhow::Result;
use tracing::debug;

use crate::branch::encode_branch_name;
use crate::config::Config;
use crate::error::PrqError;
use crate::ops::git::CommitId;
use crate::ops::git::GitOps;
use crate::ops::github::GithubOps;

pub struct App<G: GitOps, H: GithubOps> {
    pub git: G,
    pub gh: H,
}

impl<G: GitOps, H: GithubOps> App<G, H> {
    pub fn new(git: G, gh: H) -> Self {
        Self { git, gh }
    }
}

/// Where HEAD was when the tool started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRef {
    /// `None` on a detached HEAD
    pub branch: Option<String>,
    pub commit: CommitId,
}

/// What has to happen to HEAD before pushing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadAction {
    /// The head branch is already checked out.
    Stay,
    /// The head branch exists locally; check it out.
    Switch,
    /// Create the head branch at HEAD and check it out.
    Create,
}

/// The resolved pull request, before anything is changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub title: String,
    pub head: String,
    pub base: String,
    pub action: HeadAction,
    /// Branch to check out again once the PR exists
    pub restore: Option<String>,
}

/// Shared helper methods for App
impl<G: GitOps, H: GithubOps> App<G, H> {
    pub(crate) async fn start_ref(&self) -> Result<CommitRef> {
        Ok(CommitRef {
            branch: self.git.current_branch().await?,
            commit: self.git.head_commit().await?,
        })
    }

    /// Use the explicit title, or the subject of the oldest commit on HEAD that
    /// is not on the remote base branch.
    pub(crate) async fn resolve_title(&self, config: &Config) -> Result<String> {
        if let Some(title) = config.title.as_deref().map(str::trim)
            && !title.is_empty()
        {
            return Ok(title.to_string());
        }

        if !self.git.remote_branch_exists(&config.base_branch).await? {
            return Err(PrqError::UnknownBase {
                base: config.base_branch.clone(),
            }
            .into());
        }

        let subjects = self.git.subjects_ahead_of(&config.base_branch).await?;
        debug!(count = subjects.len(), "commits ahead of base");

        subjects.into_iter().next().ok_or_else(|| {
            PrqError::NoTitle {
                base: config.base_branch.clone(),
            }
            .into()
        })
    }

    /// Decide the head branch and how to get onto it.
    pub(crate) async fn plan(
        &self,
        config: &Config,
        title: String,
        start: &CommitRef,
    ) -> Result<Plan> {
        let base = config.base_branch.clone();
        let on_base = start.branch.as_deref() == Some(base.as_str());

        let head = match (&config.branch, &start.branch) {
            (Some(branch), _) => branch.clone(),
            (None, Some(current)) if !on_base => current.clone(),
            (None, _) => {
                let encoded = encode_branch_name(&title);
                if encoded.is_empty() {
                    return Err(PrqError::NoBranchName { title }.into());
                }
                encoded
            }
        };

        if head == base {
            return Err(PrqError::HeadIsBase { branch: head }.into());
        }

        let action = if start.branch.as_deref() == Some(head.as_str()) {
            HeadAction::Stay
        } else if self.git.local_branch_exists(&head).await? {
            HeadAction::Switch
        } else {
            HeadAction::Create
        };

        let restore = if on_base && action != HeadAction::Stay {
            start.branch.clone()
        } else {
            None
        };

        Ok(Plan {
            title,
            head,
            base,
            action,
            restore,
        })
    }
}
