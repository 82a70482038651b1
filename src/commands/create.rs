use anyhow::Context;
use anyhow::Result;
use colored::Colorize;
use tracing::info;

use crate::App;
use crate::app::HeadAction;
use crate::app::Plan;
use crate::config::Config;
use crate::ops::git::GitOps;
use crate::ops::github::GithubOps;
use crate::ops::github::NewPullRequest;
use crate::push::PushCoordinator;
use crate::template;

impl<G: GitOps, H: GithubOps> App<G, H> {
    /// Open a pull request for the current work.
    ///
    /// 1. Resolve the title (explicit, or the oldest commit ahead of base).
    /// 2. Resolve the head branch (explicit, current, or encoded from the
    ///    title when starting on the base branch).
    /// 3. Dry run stops here and prints the plan.
    /// 4. Check out the head branch and push it, falling back to
    ///    fetch/reset/cherry-pick/force-push when the remote diverged.
    /// 5. Render the body from the PR template and create the PR, unless an
    ///    open PR for the head branch already exists.
    /// 6. Optionally open the PR in a browser, then go back to the starting
    ///    branch if we left it.
    pub async fn cmd_create(
        &self,
        config: &Config,
        stdout: &mut impl std::io::Write,
    ) -> Result<()> {
        let start = self.start_ref().await?;
        let title = self.resolve_title(config).await?;
        let plan = self.plan(config, title, &start).await?;
        info!(?plan, "resolved pull request");

        if config.dry_run {
            write_plan(&plan, config, stdout)?;
            writeln!(stdout, "{}", "Dry run: nothing was pushed or created".yellow())?;
            return Ok(());
        }

        match plan.action {
            HeadAction::Stay => {}
            HeadAction::Switch => {
                self.git.switch_branch(&plan.head).await?;
                writeln!(stdout, "Switched to branch {}", plan.head.cyan())?;
            }
            HeadAction::Create => {
                self.git.create_branch(&plan.head).await?;
                writeln!(stdout, "Created branch {}", plan.head.cyan())?;
            }
        }

        let outcome = PushCoordinator::new(&self.git, &plan.head, &start.commit)
            .run()
            .await?;
        writeln!(stdout, "Branch {} {}", plan.head.cyan(), outcome)?;

        let url = match self.gh.pr_view(&plan.head).await? {
            Some(pr) if pr.is_open() => {
                writeln!(stdout, "PR already exists: {}", pr.url)?;
                pr.url
            }
            _ => {
                let body = self.render_body(config).await?;
                let url = self
                    .gh
                    .pr_create(&NewPullRequest {
                        title: plan.title.clone(),
                        head: plan.head.clone(),
                        base: plan.base.clone(),
                        draft: config.draft,
                        body,
                    })
                    .await?;
                writeln!(stdout, "{} {}", "Created PR:".green().bold(), url)?;
                url
            }
        };

        if config.open {
            self.gh
                .pr_open_in_browser(&plan.head)
                .await
                .with_context(|| format!("Failed to open {url}"))?;
        }

        if let Some(original) = &plan.restore {
            self.git.switch_branch(original).await?;
            writeln!(stdout, "Switched back to {}", original.cyan())?;
        }

        Ok(())
    }

    async fn render_body(&self, config: &Config) -> Result<String> {
        let root = self.git.toplevel().await?;
        let raw = template::load_template(&root, config).await?;
        let lyrics = template::load_lyrics(&root, config).await?;
        Ok(template::render_body(&raw, lyrics.as_deref()))
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn write_plan(plan: &Plan, config: &Config, stdout: &mut impl std::io::Write) -> Result<()> {
    let head_note = match plan.action {
        HeadAction::Stay => "",
        HeadAction::Switch => " (existing, will switch)",
        HeadAction::Create => " (new, from HEAD)",
    };
    writeln!(stdout, "Title: {}", plan.title)?;
    writeln!(stdout, "Head branch: {}{}", plan.head, head_note)?;
    writeln!(stdout, "Base branch: {}", plan.base)?;
    writeln!(stdout, "Template: {}", on_off(config.template))?;
    writeln!(stdout, "Draft: {}", on_off(config.draft))?;
    writeln!(stdout, "Open: {}", on_off(config.open))?;
    Ok(())
}
