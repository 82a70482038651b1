use std::path::PathBuf;

use anyhow::Result;
use anyhow::bail;
use tracing::debug;

use crate::branch::looks_like_branch_name;
use crate::ops::git::GitOps;

/// Base branch used when neither git config nor `origin/HEAD` names one.
pub const FALLBACK_BASE_BRANCH: &str = "master";

pub const TEMPLATE_FILE: &str = ".github/PULL_REQUEST_TEMPLATE.md";

pub const LYRICS_FILE: &str = ".github/lyrics.txt";

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Start the PR body from the repository's PR template
    pub template: bool,
    pub draft: bool,
    /// Open the PR in a browser once it exists
    pub open: bool,
    pub dry_run: bool,
    pub base_branch: String,
    /// Head branch given on the command line
    pub branch: Option<String>,
    /// PR title given on the command line
    pub title: Option<String>,
    /// PR template, relative to the repository root
    pub template_file: PathBuf,
    /// Lyrics side-file, relative to the repository root
    pub lyrics_file: PathBuf,
}

/// What the command line asked for, before defaults are applied.
///
/// `None` means "not given"; the git config value (or built-in default)
/// applies.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub template: Option<bool>,
    pub draft: Option<bool>,
    pub open: Option<bool>,
    pub dry_run: bool,
    pub base_branch: Option<String>,
    /// Up to two positional arguments: `[branch] [title]`
    pub positional: Vec<String>,
}

impl Config {
    /// Merge the command line with the `prq.*` settings in git config.
    pub async fn resolve(invocation: Invocation, git: &impl GitOps) -> Result<Self> {
        let base_branch = match invocation.base_branch {
            Some(base) => base,
            None => Self::default_base_branch(git).await?,
        };
        let template = match invocation.template {
            Some(value) => value,
            None => config_bool(git, "prq.template", true).await?,
        };
        let draft = match invocation.draft {
            Some(value) => value,
            None => config_bool(git, "prq.draft", false).await?,
        };
        let open = match invocation.open {
            Some(value) => value,
            None => config_bool(git, "prq.open", false).await?,
        };
        let lyrics_file = git
            .config_get("prq.lyricsFile")
            .await?
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(LYRICS_FILE));

        let (branch, title) = classify_positional(invocation.positional, git).await?;

        Ok(Self {
            template,
            draft,
            open,
            dry_run: invocation.dry_run,
            base_branch,
            branch,
            title,
            template_file: PathBuf::from(TEMPLATE_FILE),
            lyrics_file,
        })
    }

    async fn default_base_branch(git: &impl GitOps) -> Result<String> {
        if let Some(base) = git.config_get("prq.base").await? {
            return Ok(base);
        }
        if let Some(base) = git.remote_default_branch().await? {
            return Ok(base);
        }
        Ok(FALLBACK_BASE_BRANCH.to_string())
    }

    /// Default config for tests
    pub fn default_for_tests() -> Self {
        Self {
            template: true,
            draft: false,
            open: false,
            dry_run: false,
            base_branch: FALLBACK_BASE_BRANCH.to_string(),
            branch: None,
            title: None,
            template_file: PathBuf::from(TEMPLATE_FILE),
            lyrics_file: PathBuf::from(LYRICS_FILE),
        }
    }
}

/// Split positional arguments into (branch, title).
///
/// Two arguments are always branch then title. A single argument is a branch
/// when a local or remote ref of that name exists or it is shaped like one,
/// and a title otherwise.
async fn classify_positional(
    positional: Vec<String>,
    git: &impl GitOps,
) -> Result<(Option<String>, Option<String>)> {
    let mut args = positional.into_iter();
    match (args.next(), args.next(), args.next()) {
        (None, _, _) => Ok((None, None)),
        (Some(branch), Some(title), None) => Ok((Some(branch), Some(title))),
        (Some(arg), None, _) => {
            let is_branch = git.local_branch_exists(&arg).await?
                || git.remote_branch_exists(&arg).await?
                || looks_like_branch_name(&arg);
            debug!(arg = %arg, is_branch, "classified positional argument");
            if is_branch {
                Ok((Some(arg), None))
            } else {
                Ok((None, Some(arg)))
            }
        }
        (Some(_), Some(_), Some(_)) => bail!("Expected at most two arguments: [branch] [title]"),
    }
}

async fn config_bool(git: &impl GitOps, key: &str, default: bool) -> Result<bool> {
    let Some(value) = git.config_get(key).await? else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" | "" => Ok(false),
        _ => bail!("Invalid boolean for git config {key}: {value:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::git::MockGitOps;

    /// A git mock with no config set and no existing refs.
    fn bare_git() -> MockGitOps {
        let mut git = MockGitOps::new();
        git.expect_config_get().returning(|_| Ok(None));
        git.expect_remote_default_branch().returning(|| Ok(None));
        git.expect_local_branch_exists().returning(|_| Ok(false));
        git.expect_remote_branch_exists().returning(|_| Ok(false));
        git
    }

    fn positional(args: &[&str]) -> Invocation {
        Invocation {
            positional: args.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_for_tests() {
        let config = Config::default_for_tests();
        assert_eq!(config.base_branch, "master");
        assert!(config.template);
        assert!(!config.draft);
    }

    #[tokio::test]
    async fn test_resolve_defaults() -> Result<()> {
        let config = Config::resolve(Invocation::default(), &bare_git()).await?;
        assert_eq!(config, Config::default_for_tests());
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_reads_git_config() -> Result<()> {
        let mut git = MockGitOps::new();
        git.expect_config_get().returning(|key| match key {
            "prq.base" => Ok(Some("develop".to_string())),
            "prq.template" => Ok(Some("false".to_string())),
            "prq.draft" => Ok(Some("yes".to_string())),
            "prq.lyricsFile" => Ok(Some("LYRICS".to_string())),
            _ => Ok(None),
        });

        let config = Config::resolve(Invocation::default(), &git).await?;
        assert_eq!(config.base_branch, "develop");
        assert!(!config.template);
        assert!(config.draft);
        assert!(!config.open);
        assert_eq!(config.lyrics_file, PathBuf::from("LYRICS"));
        Ok(())
    }

    #[tokio::test]
    async fn test_flags_override_git_config() -> Result<()> {
        let mut git = MockGitOps::new();
        git.expect_config_get().returning(|key| match key {
            "prq.draft" => Ok(Some("true".to_string())),
            "prq.open" => Ok(Some("true".to_string())),
            _ => Ok(None),
        });
        git.expect_remote_default_branch()
            .returning(|| Ok(Some("main".to_string())));

        let invocation = Invocation {
            draft: Some(false),
            open: Some(false),
            base_branch: Some("release".to_string()),
            dry_run: true,
            ..Default::default()
        };
        let config = Config::resolve(invocation, &git).await?;
        assert!(!config.draft);
        assert!(!config.open);
        assert!(config.dry_run);
        assert_eq!(config.base_branch, "release");
        Ok(())
    }

    #[tokio::test]
    async fn test_base_falls_back_to_origin_head() -> Result<()> {
        let mut git = MockGitOps::new();
        git.expect_config_get().returning(|_| Ok(None));
        git.expect_remote_default_branch()
            .returning(|| Ok(Some("main".to_string())));

        let config = Config::resolve(Invocation::default(), &git).await?;
        assert_eq!(config.base_branch, "main");
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_boolean_in_git_config() {
        let mut git = MockGitOps::new();
        git.expect_config_get().returning(|key| match key {
            "prq.draft" => Ok(Some("maybe".to_string())),
            _ => Ok(None),
        });
        git.expect_remote_default_branch().returning(|| Ok(None));

        let err = Config::resolve(Invocation::default(), &git)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("prq.draft"));
    }

    #[tokio::test]
    async fn test_two_arguments_are_branch_then_title() -> Result<()> {
        let config =
            Config::resolve(positional(&["Not A Branch", "fix-login"]), &bare_git()).await?;
        assert_eq!(config.branch.as_deref(), Some("Not A Branch"));
        assert_eq!(config.title.as_deref(), Some("fix-login"));
        Ok(())
    }

    #[tokio::test]
    async fn test_single_ref_shaped_argument_is_branch() -> Result<()> {
        let config = Config::resolve(positional(&["feature/login"]), &bare_git()).await?;
        assert_eq!(config.branch.as_deref(), Some("feature/login"));
        assert_eq!(config.title, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_single_argument_with_whitespace_is_title() -> Result<()> {
        let config = Config::resolve(positional(&["Fix login bug"]), &bare_git()).await?;
        assert_eq!(config.branch, None);
        assert_eq!(config.title.as_deref(), Some("Fix login bug"));
        Ok(())
    }

    #[tokio::test]
    async fn test_single_existing_ref_is_branch() -> Result<()> {
        let mut git = MockGitOps::new();
        git.expect_config_get().returning(|_| Ok(None));
        git.expect_remote_default_branch().returning(|| Ok(None));
        git.expect_local_branch_exists()
            .returning(|branch| Ok(branch == "Feature_X"));

        let config = Config::resolve(positional(&["Feature_X"]), &git).await?;
        assert_eq!(config.branch.as_deref(), Some("Feature_X"));
        assert_eq!(config.title, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_single_existing_remote_ref_is_branch() -> Result<()> {
        let mut git = MockGitOps::new();
        git.expect_config_get().returning(|_| Ok(None));
        git.expect_remote_default_branch().returning(|| Ok(None));
        git.expect_local_branch_exists().returning(|_| Ok(false));
        git.expect_remote_branch_exists()
            .returning(|branch| Ok(branch == "Release_2"));

        let config = Config::resolve(positional(&["Release_2"]), &git).await?;
        assert_eq!(config.branch.as_deref(), Some("Release_2"));
        Ok(())
    }

    #[tokio::test]
    async fn test_three_arguments_rejected() {
        let result = Config::resolve(positional(&["a", "b", "c"]), &bare_git()).await;
        assert!(result.is_err());
    }
}
