use thiserror::Error;

/// Broad class of a failure, used to decide how to describe it to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required tool is missing or we are not inside a repository.
    Environment,
    /// The invocation does not carry enough information to proceed.
    Input,
    /// An external `git`/`gh` command failed.
    Operation,
}

#[derive(Debug, Error)]
pub enum PrqError {
    #[error("`{tool}` not found. Install it and make sure it is on your PATH.")]
    ToolMissing { tool: String },

    #[error("Not inside a git repository")]
    NotARepository,

    #[error(
        "No commits on HEAD ahead of origin/{base} to take a title from. Pass one explicitly: prq [branch] \"<title>\""
    )]
    NoTitle { base: String },

    #[error("Base branch origin/{base} does not exist. Fetch it or pass another base with -b.")]
    UnknownBase { base: String },

    #[error("Cannot derive a branch name from title {title:?}. Pass a branch name explicitly: prq <branch> \"<title>\"")]
    NoBranchName { title: String },

    #[error("Branch {branch} is the base branch. Pass a different branch name or base (-b).")]
    HeadIsBase { branch: String },

    #[error("Could not push {branch} ({step}): {reason}")]
    PushFailed {
        branch: String,
        step: String,
        reason: String,
    },

    #[error("Failed to create pull request for {branch}: {reason}")]
    PrCreateFailed { branch: String, reason: String },
}

impl PrqError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ToolMissing { .. } | Self::NotARepository => ErrorKind::Environment,
            Self::NoTitle { .. }
            | Self::UnknownBase { .. }
            | Self::NoBranchName { .. }
            | Self::HeadIsBase { .. } => ErrorKind::Input,
            Self::PushFailed { .. } | Self::PrCreateFailed { .. } => ErrorKind::Operation,
        }
    }
}

/// Find the tagged error in an `anyhow` chain, if any.
pub fn classify(err: &anyhow::Error) -> Option<ErrorKind> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<PrqError>())
        .map(PrqError::kind)
}
