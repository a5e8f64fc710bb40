mod cmd;
mod output;
mod root;
mod token;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "artisync",
    about = "Wait for the next successful workflow run and mirror its artifacts locally",
    version,
    propagate_version = true
)]
struct Cli {
    /// Working root holding data/ and the output directory
    /// (default: $GITHUB_WORKSPACE, then the current directory)
    #[arg(long, global = true, env = "ARTISYNC_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// GitHub token (falls back to data/github-token.txt)
    #[arg(long, global = true, env = "TOKEN_PAT", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll for a new run, collect its commit log and sync its artifacts (default)
    Run,

    /// Show the persisted sync record
    State,
}

fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run);

    let default_level = match command {
        Commands::Run => tracing::Level::INFO,
        Commands::State => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match command {
        Commands::Run => cmd::run::run(&root, cli.token.as_deref(), cli.json),
        Commands::State => cmd::state::run(&root, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
