//! nagger - GitLab milestone and release automation
//!
//! CLI binary for nagging about missing milestones and releasing milestones.

use anyhow::{bail, Result};
use clap::{ArgAction, Parser, Subcommand};
use nagger::config::Config;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "nagger")]
#[command(about = "Milestone nagging and release automation for GitLab")]
#[command(version)]
struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Comment on open merge requests that have no milestone
    Nag {
        /// Dry run - show what would be done without posting comments
        #[arg(long)]
        dry_run: bool,

        /// Project to check (repeatable; defaults to NAGGER_NAG_PROJECTS)
        #[arg(long = "project")]
        projects: Vec<String>,

        /// Only check this merge request IID
        #[arg(long)]
        mr: Option<u64>,
    },

    /// Print the changelog of a milestone across release projects
    Changelog {
        /// Milestone title, e.g. v3.15
        milestone: String,

        /// Only the public changelog
        #[arg(long, conflicts_with = "internal")]
        external: bool,

        /// Only the concise changelog of all changes
        #[arg(long)]
        internal: bool,
    },

    /// Tag and release every release project
    #[command(alias = "tag-release")]
    Release {
        /// Full version tag, e.g. v3.15.0
        tag: String,

        /// Dry run - render notes without creating tags or releases
        #[arg(long)]
        dry_run: bool,

        /// Ref to tag (defaults to each project's default branch)
        #[arg(long = "ref")]
        git_ref: Option<String>,
    },

    /// Attach unmilestoned merge requests merged during a milestone
    Fixup {
        /// Milestone title
        milestone: String,

        /// Dry run - list candidates without assigning
        #[arg(long)]
        dry_run: bool,
    },

    /// List active release milestones
    Milestones {
        /// Project to list (defaults to the first release project)
        #[arg(long)]
        project: Option<String>,
    },

    /// Print the issue tree of a milestone
    Issues {
        /// Milestone title
        milestone: String,
    },

    /// Test authentication
    Auth {
        /// Show setup instructions instead of testing
        #[arg(long)]
        setup: bool,
    },

    /// Print CI variables
    DebugVariables,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(command: Commands) -> Result<()> {
    if let Commands::DebugVariables = command {
        cli::run_debug_variables();
        return Ok(());
    }

    let config = Config::from_env()?;

    match command {
        Commands::Nag {
            dry_run,
            projects,
            mr,
        } => cli::run_nag(&config, projects, mr, dry_run).await?,
        Commands::Changelog {
            milestone,
            external,
            internal,
        } => cli::run_changelog(&config, &milestone, external, internal).await?,
        Commands::Release {
            tag,
            dry_run,
            git_ref,
        } => cli::run_release(&config, &tag, git_ref, dry_run).await?,
        Commands::Fixup { milestone, dry_run } => {
            cli::run_fixup(&config, &milestone, dry_run).await?;
        }
        Commands::Milestones { project } => cli::run_milestones(&config, project).await?,
        Commands::Issues { milestone } => cli::run_issues(&config, &milestone).await?,
        Commands::Auth { setup } => cli::run_auth(&config, setup).await?,
        Commands::DebugVariables => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    tokio::select! {
        result = run(cli.command) => result,
        _ = tokio::signal::ctrl_c() => bail!("interrupted"),
    }
}
