// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Runtime configuration for a single metrics run.
//!
//! [`Settings`] is assembled once at startup from CLI flags, environment
//! variables, and an optional YAML tuning document, then passed by reference
//! into the client, fetchers, and exporters. The tuning document mirrors the
//! [`Tuning`] structure; every section is optional and falls back to the
//! defaults documented on each field.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{self, Error},
    repository::RepositoryId,
    retry::RetryConfig,
};

/// Default GitHub REST API root.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
/// Default trailing window, in days, for time-windowed metrics.
pub const DEFAULT_DAYS: u32 = 90;
/// Default directory receiving CSV and PDF artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "reports";
const TOKEN_PLACEHOLDER: &str = "<PASTE_GITHUB_TOKEN_HERE>";

/// Fully resolved configuration for one invocation.
#[derive(Debug, Clone,)]
pub struct Settings
{
    /// Repository under analysis.
    pub repository: RepositoryId,
    /// Personal access token used for bearer authentication.
    pub token:      String,
    /// Directory receiving report artifacts.
    pub output_dir: PathBuf,
    /// Trailing window, in days, applied to commits, PRs, and issues.
    pub days:       u32,
    /// Thresholds, fetch bounds, and retry policy.
    pub tuning:     Tuning,
}

impl Settings
{
    /// Validates raw startup inputs and assembles the settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the token is missing or blank, the
    /// repository identifier is malformed, or the day window is zero.
    pub fn new(
        repository: &str,
        token: Option<&str,>,
        output_dir: PathBuf,
        days: u32,
        tuning: Tuning,
    ) -> Result<Self, Error,>
    {
        let repository = RepositoryId::parse(repository,)?;

        let token = token
            .map(str::trim,)
            .filter(|value| !value.is_empty() && *value != TOKEN_PLACEHOLDER,)
            .ok_or_else(|| {
                Error::config("GITHUB_TOKEN is not set; provide --token or export GITHUB_TOKEN",)
            },)?
            .to_owned();

        if days == 0 {
            return Err(Error::config("--days must be at least 1",),);
        }

        Ok(Self {
            repository,
            token,
            output_dir,
            days,
            tuning,
        },)
    }

    /// Whether a file can be stale at all.
    ///
    /// Churn only sees commits inside the `days` window, so every analyzed
    /// file was touched within it; a `stale_days` cutoff at or beyond the
    /// window can never match.
    pub fn stale_files_reachable(&self,) -> bool
    {
        self.tuning.churn.stale_days < self.days
    }

    /// Resolves a path for the named artifact inside the output directory.
    pub fn artifact_path(&self, file_name: &str,) -> PathBuf
    {
        self.output_dir.join(file_name,)
    }
}

/// Optional YAML tuning document.
///
/// # Examples
///
/// ```
/// use repo_insight::Tuning;
///
/// let yaml = r#"
/// bus_factor:
///   threshold_percent: 75
/// churn:
///   stale_days: 365
/// "#;
/// let tuning: Tuning = serde_yaml::from_str(yaml,).expect("valid tuning",);
/// assert_eq!(tuning.bus_factor.threshold_percent, 75.0);
/// assert_eq!(tuning.churn.stale_days, 365);
/// assert_eq!(tuning.churn.churn_threshold, 500);
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize,)]
#[serde(deny_unknown_fields)]
pub struct Tuning
{
    /// Contributor concentration settings.
    #[serde(default)]
    pub bus_factor: BusFactorTuning,
    /// Churn, hotspot, and stale-file settings.
    #[serde(default)]
    pub churn:      ChurnTuning,
    /// Issue backlog settings.
    #[serde(default)]
    pub issues:     IssueTuning,
    /// Pagination and worker-pool bounds.
    #[serde(default)]
    pub fetch:      FetchTuning,
    /// Retry policy for API calls.
    #[serde(default)]
    pub retry:      RetryConfig,
    /// API endpoint overrides.
    #[serde(default)]
    pub api:        ApiTuning,
}

/// Loads the tuning document from `path`.
///
/// # Errors
///
/// Returns [`Error::ConfigIo`] when the file cannot be read and
/// [`Error::ConfigParse`] when it is not a valid tuning document.
pub fn load_tuning(path: &Path,) -> Result<Tuning, Error,>
{
    let contents =
        fs::read_to_string(path,).map_err(|source| error::config_io_error(path, source,),)?;
    parse_tuning(&contents,)
}

/// Parses a tuning document from a YAML string. Blank documents yield the
/// defaults.
///
/// # Errors
///
/// Returns [`Error::ConfigParse`] when the YAML is malformed or a value is
/// outside its accepted range.
pub fn parse_tuning(contents: &str,) -> Result<Tuning, Error,>
{
    if contents.trim().is_empty() {
        return Ok(Tuning::default(),);
    }
    Ok(serde_yaml::from_str(contents,)?,)
}

/// Bus factor settings.
#[derive(Debug, Clone, Deserialize, Serialize,)]
#[serde(deny_unknown_fields)]
pub struct BusFactorTuning
{
    /// Cumulative ownership percentage that ends the walk (default 50).
    #[serde(default = "default_threshold_percent", deserialize_with = "deserialize_percent")]
    pub threshold_percent: f64,
}

impl Default for BusFactorTuning
{
    fn default() -> Self
    {
        Self {
            threshold_percent: default_threshold_percent(),
        }
    }
}

/// Churn and stale-file settings.
#[derive(Debug, Clone, Deserialize, Serialize,)]
#[serde(deny_unknown_fields)]
pub struct ChurnTuning
{
    /// Minimum summed additions and deletions for a hotspot (default 500).
    #[serde(default = "default_churn_threshold")]
    pub churn_threshold:  u64,
    /// Minimum number of touching commits for a hotspot (default 10).
    #[serde(default = "default_commit_threshold")]
    pub commit_threshold: u64,
    /// Files untouched for this many days are stale (default 180). Only
    /// effective when smaller than the `--days` window.
    #[serde(default = "default_stale_days")]
    pub stale_days:       u32,
}

impl Default for ChurnTuning
{
    fn default() -> Self
    {
        Self {
            churn_threshold:  default_churn_threshold(),
            commit_threshold: default_commit_threshold(),
            stale_days:       default_stale_days(),
        }
    }
}

/// Issue backlog settings.
#[derive(Debug, Clone, Deserialize, Serialize,)]
#[serde(deny_unknown_fields)]
pub struct IssueTuning
{
    /// Sprint length in days for throughput buckets (default 14).
    #[serde(default = "default_sprint_days", deserialize_with = "deserialize_positive_u32")]
    pub sprint_days: u32,
}

impl Default for IssueTuning
{
    fn default() -> Self
    {
        Self {
            sprint_days: default_sprint_days(),
        }
    }
}

/// Pagination and concurrency bounds.
#[derive(Debug, Clone, Deserialize, Serialize,)]
#[serde(deny_unknown_fields)]
pub struct FetchTuning
{
    /// Items requested per REST page (default 100, GitHub maximum).
    #[serde(default = "default_per_page", deserialize_with = "deserialize_per_page")]
    pub per_page:          u32,
    /// Upper bound on pages for open-ended REST listings (default 40).
    #[serde(default = "default_max_pages", deserialize_with = "deserialize_positive_u32")]
    pub max_pages:         u32,
    /// Upper bound on commit pages fed into churn analysis (default 3).
    #[serde(default = "default_max_commit_pages", deserialize_with = "deserialize_positive_u32")]
    pub max_commit_pages:  u32,
    /// Upper bound on records collected by GraphQL scans (default 500).
    #[serde(default = "default_max_records", deserialize_with = "deserialize_positive_usize")]
    pub max_records:       usize,
    /// Upper bound on default-branch history pages walked for the total
    /// commit count (default 200).
    #[serde(default = "default_max_history_pages", deserialize_with = "deserialize_positive_u32")]
    pub max_history_pages: u32,
    /// Concurrent commit-detail requests (default 6).
    #[serde(default = "default_detail_workers", deserialize_with = "deserialize_positive_usize")]
    pub detail_workers:    usize,
}

impl Default for FetchTuning
{
    fn default() -> Self
    {
        Self {
            per_page:          default_per_page(),
            max_pages:         default_max_pages(),
            max_commit_pages:  default_max_commit_pages(),
            max_records:       default_max_records(),
            max_history_pages: default_max_history_pages(),
            detail_workers:    default_detail_workers(),
        }
    }
}

/// API endpoint overrides, useful for GitHub Enterprise installations.
#[derive(Debug, Clone, Deserialize, Serialize,)]
#[serde(deny_unknown_fields)]
pub struct ApiTuning
{
    /// REST root; GraphQL requests go to `<base_url>/graphql`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiTuning
{
    fn default() -> Self
    {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_threshold_percent() -> f64
{
    50.0
}

fn default_churn_threshold() -> u64
{
    500
}

fn default_commit_threshold() -> u64
{
    10
}

fn default_stale_days() -> u32
{
    180
}

fn default_sprint_days() -> u32
{
    14
}

fn default_per_page() -> u32
{
    100
}

fn default_max_pages() -> u32
{
    40
}

fn default_max_commit_pages() -> u32
{
    3
}

fn default_max_history_pages() -> u32
{
    200
}

fn default_max_records() -> usize
{
    500
}

fn default_detail_workers() -> usize
{
    6
}

fn default_base_url() -> String
{
    DEFAULT_API_BASE_URL.to_owned()
}

fn deserialize_percent<'de, D,>(deserializer: D,) -> Result<f64, D::Error,>
where
    D: serde::Deserializer<'de,>,
{
    let value = f64::deserialize(deserializer,)?;
    if !(0.0..=100.0).contains(&value,) {
        return Err(serde::de::Error::custom("threshold_percent must be between 0 and 100",),);
    }
    Ok(value,)
}

fn deserialize_per_page<'de, D,>(deserializer: D,) -> Result<u32, D::Error,>
where
    D: serde::Deserializer<'de,>,
{
    let value = u32::deserialize(deserializer,)?;
    if value == 0 || value > 100 {
        return Err(serde::de::Error::custom("per_page must be between 1 and 100",),);
    }
    Ok(value,)
}

fn deserialize_positive_u32<'de, D,>(deserializer: D,) -> Result<u32, D::Error,>
where
    D: serde::Deserializer<'de,>,
{
    let value = u32::deserialize(deserializer,)?;
    if value == 0 {
        return Err(serde::de::Error::custom("value must be greater than zero",),);
    }
    Ok(value,)
}

fn deserialize_positive_usize<'de, D,>(deserializer: D,) -> Result<usize, D::Error,>
where
    D: serde::Deserializer<'de,>,
{
    let value = usize::deserialize(deserializer,)?;
    if value == 0 {
        return Err(serde::de::Error::custom("value must be greater than zero",),);
    }
    Ok(value,)
}
