//! Getting the head branch onto `origin`.
//!
//! A plain push is tried first. When the remote already has a diverging
//! branch of the same name, the local branch is rebuilt on top of the remote
//! tip (hard reset, then cherry-pick of the starting commit) and force-pushed.
//! Nothing outside this fixed chain is retried.

use std::fmt::Display;

use anyhow::Result;
use tracing::debug;
use tracing::warn;

use crate::error::PrqError;
use crate::ops::git::CommitId;
use crate::ops::git::GitOps;
use crate::ops::git::REMOTE;

/// A step of the push fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushStep {
    PushDirect,
    FetchRemote,
    ResetAndCherryPick,
    ForcePush,
    Failed { step: &'static str, reason: String },
}

/// How the branch ended up on the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// A plain `git push` was accepted.
    Pushed,
    /// The remote had no such branch but refused the plain push.
    ForcePushed,
    /// The branch was reset to the remote tip and force-pushed. `discarded`
    /// counts local commits besides the starting one that did not survive.
    Rebuilt { cherry_picked: bool, discarded: usize },
}

impl Display for PushOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pushed => f.write_str("pushed"),
            Self::ForcePushed => f.write_str("force-pushed"),
            Self::Rebuilt {
                cherry_picked,
                discarded,
            } => {
                if *cherry_picked {
                    f.write_str("rebuilt on the remote branch with the original commit cherry-picked")?;
                } else {
                    f.write_str("reset to the remote branch, which already had the original commit")?;
                }
                match *discarded {
                    0 => Ok(()),
                    1 => f.write_str(" (1 other local commit was not kept)"),
                    n => write!(f, " ({n} other local commits were not kept)"),
                }
            }
        }
    }
}

/// Drives [`PushStep`]s until the branch is on the remote or a step fails.
pub struct PushCoordinator<'a, G: GitOps> {
    git: &'a G,
    branch: &'a str,
    /// Commit HEAD pointed at when the tool started
    original: &'a CommitId,
    rebuilt: bool,
    cherry_picked: bool,
    discarded: usize,
}

impl<'a, G: GitOps> PushCoordinator<'a, G> {
    pub fn new(git: &'a G, branch: &'a str, original: &'a CommitId) -> Self {
        Self {
            git,
            branch,
            original,
            rebuilt: false,
            cherry_picked: false,
            discarded: 0,
        }
    }

    pub async fn run(mut self) -> Result<PushOutcome> {
        let mut step = PushStep::PushDirect;
        loop {
            debug!(branch = self.branch, ?step, "push step");
            step = match step {
                PushStep::PushDirect => match self.git.push_branch(self.branch).await {
                    Ok(()) => return Ok(PushOutcome::Pushed),
                    Err(e) => {
                        debug!("push rejected: {e:#}");
                        PushStep::FetchRemote
                    }
                },
                PushStep::FetchRemote => match self.git.fetch_branch(self.branch).await {
                    Ok(()) => PushStep::ResetAndCherryPick,
                    Err(e) => {
                        debug!("fetch failed, assuming no remote branch: {e:#}");
                        PushStep::ForcePush
                    }
                },
                PushStep::ResetAndCherryPick => match self.reset_and_cherry_pick().await {
                    Ok(()) => PushStep::ForcePush,
                    Err(failed) => failed,
                },
                PushStep::ForcePush => match self.git.force_push_branch(self.branch).await {
                    Ok(()) if self.rebuilt => {
                        return Ok(PushOutcome::Rebuilt {
                            cherry_picked: self.cherry_picked,
                            discarded: self.discarded,
                        });
                    }
                    Ok(()) => return Ok(PushOutcome::ForcePushed),
                    Err(e) => PushStep::Failed {
                        step: "force push",
                        reason: format!("{e:#}"),
                    },
                },
                PushStep::Failed { step, reason } => {
                    return Err(PrqError::PushFailed {
                        branch: self.branch.to_string(),
                        step: step.to_string(),
                        reason,
                    }
                    .into());
                }
            };
        }
    }

    async fn reset_and_cherry_pick(&mut self) -> std::result::Result<(), PushStep> {
        let remote_ref = format!("{REMOTE}/{}", self.branch);

        // Only the starting commit survives the reset
        match self.git.commits_between(&remote_ref, self.original).await {
            Ok(local) if local.len() > 1 => {
                warn!(
                    "{} local commits on {} are not on {}; only {} will be kept",
                    local.len(),
                    self.branch,
                    remote_ref,
                    self.original
                );
                self.discarded = local.len() - 1;
            }
            Ok(_) => {}
            Err(e) => debug!("could not count local commits before reset: {e:#}"),
        }

        self.git
            .reset_hard(&remote_ref)
            .await
            .map_err(|e| PushStep::Failed {
                step: "reset",
                reason: format!("{e:#}"),
            })?;
        self.rebuilt = true;

        let contained = self
            .git
            .is_ancestor(self.original, "HEAD")
            .await
            .map_err(|e| PushStep::Failed {
                step: "ancestry check",
                reason: format!("{e:#}"),
            })?;
        if contained {
            return Ok(());
        }

        self.git
            .cherry_pick(self.original)
            .await
            .map_err(|e| PushStep::Failed {
                step: "cherry-pick",
                reason: format!("{e:#}"),
            })?;
        self.cherry_picked = true;
        Ok(())
    }
}
