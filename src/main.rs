use anyhow::Result;
use clap::ArgAction;
use clap::Parser;
use clap::error::ErrorKind;
use colored::Colorize;
use prq::App;
use prq::Config;
use prq::Invocation;
use prq::ops::git::RealGit;
use prq::ops::github::RealGithub;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer as _;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

#[derive(Parser)]
#[command(name = "prq", version)]
#[command(about = "Open a GitHub pull request for the current work using git and gh", long_about = None)]
pub struct Cli {
    /// Head branch. A single argument that is not an existing branch and does
    /// not look like one is taken as the title instead.
    pub branch: Option<String>,

    /// PR title (defaults to the oldest commit ahead of the base branch)
    pub title: Option<String>,

    /// Start the PR body from .github/PULL_REQUEST_TEMPLATE.md
    #[arg(short = 't', short_alias = 'T', long, overrides_with = "no_template")]
    pub template: bool,

    /// Leave the PR body empty
    #[arg(long, overrides_with = "template")]
    pub no_template: bool,

    /// Open the PR as a draft
    #[arg(short = 'd', short_alias = 'D', long, overrides_with = "no_draft")]
    pub draft: bool,

    /// Open the PR ready for review
    #[arg(long, overrides_with = "draft")]
    pub no_draft: bool,

    /// Open the PR in a browser afterwards
    #[arg(short = 'o', short_alias = 'O', long, overrides_with = "no_open")]
    pub open: bool,

    /// Do not open a browser
    #[arg(long, overrides_with = "open")]
    pub no_open: bool,

    /// Print what would happen without changing anything
    #[arg(short = 'n', short_alias = 'N', long)]
    pub dry_run: bool,

    /// Base branch to merge into (defaults to git config prq.base, then origin/HEAD)
    #[arg(short = 'b', short_alias = 'B', long = "base", value_name = "BRANCH")]
    pub base: Option<String>,

    /// More logging on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    fn invocation(&self) -> Invocation {
        Invocation {
            template: flag_pair(self.template, self.no_template),
            draft: flag_pair(self.draft, self.no_draft),
            open: flag_pair(self.open, self.no_open),
            dry_run: self.dry_run,
            base_branch: self.base.clone(),
            positional: self.branch.iter().chain(&self.title).cloned().collect(),
        }
    }
}

/// `--x`/`--no-x` after clap has kept only the last one given.
fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn setup_logging(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    let timer = tracing_subscriber::fmt::time::ChronoLocal::new("%H:%M:%S%.3f".into());
    let format = tracing_subscriber::fmt::format().with_timer(timer);
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env()?;
    let subscriber = tracing_subscriber::fmt::layer()
        .event_format(format)
        .with_writer(std::io::stderr)
        .with_filter(filter);
    tracing_subscriber::registry().with(subscriber).init();
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let path = std::env::current_dir()?;
    let git = RealGit::new(path.clone());
    git.ensure_repository().await?;
    let gh = RealGithub::new(path);

    let config = Config::resolve(cli.invocation(), &git).await?;
    if !config.dry_run {
        gh.ensure_available().await?;
    }

    let app = App::new(git, gh);
    app.cmd_create(&config, &mut std::io::stdout()).await
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    if let Err(e) = setup_logging(cli.verbose) {
        eprintln!("Warning: logging disabled: {e:#}");
    }

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
