#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;
use std::path::PathBuf;
use std::process::Stdio;

use prq::ops::github::GithubOps;
use prq::ops::github::NewPullRequest;
use prq::ops::github::PullRequest;
use tokio::process::Command;

/// Runs git in `dir` and returns trimmed stdout, failing on a non-zero exit.
pub async fn git(dir: &Path, args: &[&str]) -> anyhow::Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .await?;
    anyhow::ensure!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );

    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}

/// Sets the identity git needs for commits and cherry-picks.
async fn configure_identity(dir: &Path) -> anyhow::Result<()> {
    git(dir, &["config", "user.name", "Test User"]).await?;
    git(dir, &["config", "user.email", "test@example.com"]).await?;
    git(dir, &["config", "commit.gpgsign", "false"]).await?;
    Ok(())
}

/// A bare `origin` at `<root>/origin.git` and a clone of it at `<root>/work`
/// with one commit on `master`, pushed, and `origin/HEAD` pointing at master.
pub async fn create_repo_with_origin(root: &Path) -> anyhow::Result<(PathBuf, PathBuf)> {
    let origin = root.join("origin.git");
    let work = root.join("work");

    git(root, &["init", "--bare", "-b", "master", "origin.git"]).await?;
    git(root, &["clone", "origin.git", "work"]).await?;
    configure_identity(&work).await?;
    git(&work, &["symbolic-ref", "HEAD", "refs/heads/master"]).await?;

    commit_file(&work, "README.md", "hello\n", "Initial commit").await?;
    git(&work, &["push", "-u", "origin", "master"]).await?;
    git(&work, &["remote", "set-head", "origin", "master"]).await?;

    Ok((origin, work))
}

/// A second clone of `origin`, used to push competing work.
pub async fn clone_origin(origin: &Path, dest: &Path) -> anyhow::Result<()> {
    let origin = origin.to_string_lossy().to_string();
    let dest_str = dest.to_string_lossy().to_string();
    let parent = dest.parent().unwrap_or(Path::new("/"));
    git(parent, &["clone", &origin, &dest_str]).await?;
    configure_identity(dest).await?;
    Ok(())
}

/// Writes a file and commits it.
pub async fn commit_file(
    dir: &Path,
    filename: &str,
    contents: &str,
    message: &str,
) -> anyhow::Result<()> {
    tokio::fs::write(dir.join(filename), contents).await?;
    git(dir, &["add", filename]).await?;
    git(dir, &["commit", "-q", "-m", message]).await?;
    Ok(())
}

/// Tip of `branch` in a (possibly bare) repository, `None` if it doesn't exist.
pub async fn branch_tip(dir: &Path, branch: &str) -> Option<String> {
    git(dir, &["rev-parse", "--verify", "--quiet", &format!("refs/heads/{branch}")])
        .await
        .ok()
}

/// GitHub stand-in that records created pull requests.
#[derive(Default)]
pub struct FakeGithub {
    pub existing: Option<PullRequest>,
    pub created: RefCell<Vec<NewPullRequest>>,
    pub opened: RefCell<Vec<String>>,
}

impl GithubOps for FakeGithub {
    async fn pr_view(&self, _branch: &str) -> anyhow::Result<Option<PullRequest>> {
        Ok(self.existing.clone())
    }

    async fn pr_create(&self, pr: &NewPullRequest) -> anyhow::Result<String> {
        let mut created = self.created.borrow_mut();
        created.push(pr.clone());
        Ok(format!("https://github.com/test/repo/pull/{}", created.len()))
    }

    async fn pr_open_in_browser(&self, branch: &str) -> anyhow::Result<()> {
        self.opened.borrow_mut().push(branch.to_string());
        Ok(())
    }
}

pub enum TestDir {
    Temp(tempfile::TempDir),
    Kept(std::path::PathBuf),
}

impl TestDir {
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;

        if std::env::var("DEBUG_TESTS").is_ok() {
            let path = temp_dir.keep();
            eprintln!("Test directory kept at: {}", path.display());
            Ok(TestDir::Kept(path))
        } else {
            Ok(TestDir::Temp(temp_dir))
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            TestDir::Temp(t) => t.path(),
            TestDir::Kept(p) => p.as_path(),
        }
    }
}
