// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Command-line interface for the repo-insight binary.
//!
//! One invocation analyzes one repository: it validates the configuration,
//! logs a banner with the repository and remaining API quota, runs the
//! selected report groups, and exits non-zero on fatal errors.

use std::{path::PathBuf, process};

use clap::Parser;
use repo_insight::{
    Error, GitHubClient, Mode, OctocrabTransport, Pipeline, Settings, Tuning,
    config::DEFAULT_OUTPUT_DIR, load_tuning,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Aggregate GitHub repository metrics into CSV and PDF reports.
#[derive(Debug, Parser,)]
#[command(name = "repo-insight", version, about = "Aggregate GitHub repository metrics")]
struct Cli
{
    /// Repository to analyze, as `owner/repo`.
    #[arg(long = "repo", value_name = "OWNER/REPO")]
    repo: String,

    /// Report group to produce.
    #[arg(long = "mode", value_enum, default_value = "all")]
    mode: Mode,

    /// Personal access token used for API authentication.
    #[arg(long = "token", env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String,>,

    /// Directory receiving report artifacts.
    #[arg(long = "output-dir", env = "REPO_INSIGHT_OUTPUT_DIR", value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Trailing window in days for commits, pull requests, and merges.
    ///
    /// Churn sees only commits inside this window, so stale files are
    /// reported only when `churn.stale_days` is smaller.
    #[arg(long = "days", env = "REPO_INSIGHT_DAYS", default_value_t = 90)]
    days: u32,

    /// Optional YAML document with thresholds, fetch bounds, and retry policy.
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf,>,
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main]
async fn main()
{
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info",),),)
        .with_target(false,)
        .init();

    if let Err(error,) = run(Cli::parse(),).await {
        eprintln!("{}", error.to_display_string());
        process::exit(1,);
    }
}

/// Builds the settings and client, then runs the selected mode.
///
/// # Errors
///
/// Returns configuration errors before any network call and propagates fetch
/// errors that survive the retry policy.
async fn run(cli: Cli,) -> Result<(), Error,>
{
    let tuning = match cli.config.as_deref() {
        Some(path,) => load_tuning(path,)?,
        None => Tuning::default(),
    };
    let settings = Settings::new(&cli.repo, cli.token.as_deref(), cli.output_dir, cli.days, tuning,)?;

    let transport = OctocrabTransport::new(&settings.token, &settings.tuning.api.base_url,)?;
    let client = GitHubClient::new(transport, settings.tuning.retry.clone(),);

    let pipeline = Pipeline::new(&client, &settings,);
    let metadata = pipeline.metadata().await?;
    info!(
        "repository {} ({} stars), API quota remaining: {}",
        metadata.full_name,
        metadata.stars,
        metadata.rate_limit_remaining.map_or_else(|| "unknown".to_owned(), |remaining| remaining.to_string(),)
    );

    let exporter = pipeline.run(cli.mode,).await?;
    for (path, reason,) in exporter.failed() {
        warn!("not written: {} ({})", path.display(), reason);
    }

    Ok((),)
}
