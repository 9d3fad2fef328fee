//! multigitminder - log a CI run to a Beeminder goal
//!
//! Runs as a GitHub Action step. Every option can be given as a flag or
//! through the environment variable the Actions runner sets for it
//! (`INPUT_<NAME>` for action inputs, `GITHUB_SHA` / `GITHUB_REF` for the
//! commit).

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::Parser;
use multigitminder_core::beeminder::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use multigitminder_core::{
    init_tracing, run, ActionInputs, BeeminderClient, BeeminderConfig, Outcome,
};
use std::process::ExitCode;
use tracing::{debug, Level};

/// Exit code for a missing required input under `--strict`.
const EXIT_MISSING_INPUT: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "multigitminder")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Log a CI run as a data point on a Beeminder goal", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Commit SHA
    #[arg(long, env = "GITHUB_SHA")]
    sha: Option<String>,

    /// Full git ref, e.g. refs/heads/main
    #[arg(long, env = "GITHUB_REF")]
    git_ref: Option<String>,

    /// Beeminder user name
    #[arg(long, env = "INPUT_USERNAME")]
    username: Option<String>,

    /// Beeminder auth token
    #[arg(long, env = "INPUT_AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// Goal name
    #[arg(long, env = "INPUT_GOAL")]
    goal: Option<String>,

    /// Value of the data point
    #[arg(long, env = "INPUT_VALUE")]
    value: Option<String>,

    /// Comment (default: <branch>@<sha> via multigitminder API call)
    #[arg(long, env = "INPUT_COMMENT")]
    comment: Option<String>,

    /// Languages that must appear in the repository: a name or a list literal
    #[arg(long, env = "INPUT_TARGET_LANGS")]
    target_langs: Option<String>,

    /// Repository languages as a JSON object of byte counts
    #[arg(long, env = "INPUT_REPO_LANGS")]
    repo_langs: Option<String>,

    /// Beeminder API root
    #[arg(long, env = "INPUT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Request timeout in seconds
    #[arg(long = "timeout", env = "INPUT_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Validate inputs without contacting Beeminder
    #[arg(long, env = "INPUT_DRY_RUN", value_parser = FalseyValueParser::new())]
    dry_run: bool,

    /// Exit non-zero when a required input is missing
    #[arg(long, env = "INPUT_STRICT", value_parser = FalseyValueParser::new())]
    strict: bool,
}

impl Cli {
    fn inputs(&self) -> ActionInputs {
        ActionInputs {
            sha: self.sha.clone(),
            git_ref: self.git_ref.clone(),
            username: self.username.clone(),
            auth_token: self.auth_token.clone(),
            goal: self.goal.clone(),
            value: self.value.clone(),
            comment: self.comment.clone(),
            target_langs: self.target_langs.clone(),
            repo_langs: self.repo_langs.clone(),
            dry_run: self.dry_run,
        }
    }

    fn beeminder_config(&self) -> BeeminderConfig {
        BeeminderConfig::default()
            .with_base_url(&self.base_url)
            .with_timeout(self.timeout_secs)
    }
}

/// Print the user-facing line for an outcome and pick the exit code.
fn report(outcome: &Outcome, strict: bool) -> u8 {
    match outcome {
        Outcome::Skipped(missing) => {
            println!("{}", missing);
            if strict {
                EXIT_MISSING_INPUT
            } else {
                0
            }
        }
        Outcome::DryRun(receipt) => {
            println!("Dry run, nothing sent. Would log: {}", receipt);
            0
        }
        Outcome::Committed(receipt) => {
            println!("{}", receipt);
            0
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let inputs = cli.inputs();
    let config = cli.beeminder_config();
    debug!(base_url = %config.base_url, dry_run = inputs.dry_run, "Starting multigitminder");

    let outcome = run(&inputs, |creds| BeeminderClient::new(config, creds.clone()))
        .await
        .context("Failed to log data point to Beeminder")?;

    Ok(ExitCode::from(report(&outcome, cli.strict)))
}
