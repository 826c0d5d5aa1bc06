// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Fetch, compute, and export for each report group.
//!
//! A [`Pipeline`] serves one invocation. Repository metadata, commit listings,
//! commit details, and branches are shared by several consumers and fetched at
//! most once.

use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::{
    client::{GitHubClient, Transport},
    config::Settings,
    error::Error,
    fetch::{
        PullRequestSearch, count_pull_requests, fetch_branches, fetch_closed_unmerged_pull_requests,
        fetch_commit_details, fetch_commits, fetch_dependabot_alerts, fetch_issues,
        fetch_merged_pull_requests, fetch_pull_requests_for_review, fetch_reopen_candidates,
        fetch_repository_metadata, fetch_total_commits,
    },
    metrics::{
        TimeBuckets,
        activity::{activity_summary, commit_frequency_by_author, merge_frequency},
        bus_factor::{bus_factor, commit_counts},
        churn::{file_churn, hotspots, stale_files, test_to_code_ratio},
        issues::{issue_summary, sprint_throughput},
        lead_time::lead_time_summary,
        pull_requests::{merge_efficiency, pull_request_quality, reopen_summary},
        security::security_summary,
    },
    models::{Branch, Commit, CommitDetail, RepositoryMetadata},
    paginate::PageBounds,
    report::{
        Artifact, Exporter, pdf,
        tables::{self, ActivityOverview, CodeQualityCounts},
    },
    time::days_ago,
};

/// Rows per table in the PDF before truncation.
pub const DOCUMENT_ROWS: usize = 25;

/// Populated weeks shown in the PDF cadence section.
const RECENT_WEEKS: usize = 12;

/// Report selection on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum,)]
pub enum Mode
{
    /// Issue backlog summary and sprint throughput.
    Issues,
    /// Churn, hotspots, stale files, and test-to-code ratio.
    CodeQuality,
    /// Alerts, signed commits, and protected branches.
    Security,
    /// Commits, bus factor, merges, and pull request quality.
    Activity,
    /// Every CSV group.
    All,
    /// Every CSV group followed by the PDF summary.
    Pdf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
enum Group
{
    Issues,
    CodeQuality,
    Security,
    Activity,
}

impl Group
{
    const ALL: [Self; 4] = [Self::Issues, Self::CodeQuality, Self::Security, Self::Activity,];

    fn name(self,) -> &'static str
    {
        match self {
            Self::Issues => "issues",
            Self::CodeQuality => "code quality",
            Self::Security => "security",
            Self::Activity => "activity",
        }
    }
}

impl Mode
{
    fn groups(self,) -> &'static [Group]
    {
        match self {
            Self::Issues => &[Group::Issues],
            Self::CodeQuality => &[Group::CodeQuality],
            Self::Security => &[Group::Security],
            Self::Activity => &[Group::Activity],
            Self::All | Self::Pdf => &Group::ALL,
        }
    }
}

/// One invocation's fetch and report state.
pub struct Pipeline<'a, T: Transport,>
{
    client:   &'a GitHubClient<T,>,
    settings: &'a Settings,
    now:      DateTime<Utc,>,
    metadata: OnceCell<RepositoryMetadata,>,
    commits:  OnceCell<Vec<Commit,>,>,
    details:  OnceCell<Vec<CommitDetail,>,>,
    branches: OnceCell<Vec<Branch,>,>,
}

impl<'a, T: Transport,> Pipeline<'a, T,>
{
    pub fn new(client: &'a GitHubClient<T,>, settings: &'a Settings,) -> Self
    {
        Self::at(client, settings, Utc::now(),)
    }

    /// Pipeline whose windows end at `now`.
    pub fn at(client: &'a GitHubClient<T,>, settings: &'a Settings, now: DateTime<Utc,>,) -> Self
    {
        Self {
            client,
            settings,
            now,
            metadata: OnceCell::new(),
            commits: OnceCell::new(),
            details: OnceCell::new(),
            branches: OnceCell::new(),
        }
    }

    /// Start of the trailing window.
    pub fn since(&self,) -> DateTime<Utc,>
    {
        days_ago(self.now, self.settings.days,)
    }

    fn page_bounds(&self,) -> PageBounds
    {
        let fetch = &self.settings.tuning.fetch;
        PageBounds::pages(fetch.per_page, fetch.max_pages,)
    }

    fn search_bounds(&self,) -> PageBounds
    {
        let fetch = &self.settings.tuning.fetch;
        PageBounds::pages(fetch.per_page, fetch.max_pages,).with_max_records(fetch.max_records,)
    }

    /// Runs every group selected by `mode` and writes their artifacts.
    ///
    /// Failed file writes are logged and listed in the returned exporter.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors that survive the retry policy.
    pub async fn run(&self, mode: Mode,) -> Result<Exporter, Error,>
    {
        let mut exporter = Exporter::new(&self.settings.output_dir,);
        let mut document = Vec::new();

        for group in mode.groups() {
            info!("computing {} metrics for {}", group.name(), self.settings.repository);
            let artifacts = self.group(*group,).await?;
            for artifact in &artifacts {
                exporter.write_csv(artifact,);
            }
            document.extend(artifacts,);
        }

        if mode == Mode::Pdf {
            document.insert(0, self.overview().await?,);
            self.write_document(&mut exporter, &document,);
        }

        info!(
            "{} files written to {}, {} failed",
            exporter.written().len(),
            exporter.output_dir().display(),
            exporter.failed().len()
        );
        Ok(exporter,)
    }

    async fn group(&self, group: Group,) -> Result<Vec<Artifact,>, Error,>
    {
        match group {
            Group::Issues => self.issues().await,
            Group::CodeQuality => self.code_quality().await,
            Group::Security => self.security().await,
            Group::Activity => self.activity().await,
        }
    }

    fn write_document(&self, exporter: &mut Exporter, artifacts: &[Artifact],)
    {
        let repository = &self.settings.repository;
        let file_name = format!("{}-metrics-report.pdf", repository.slug());
        let intro = vec![
            format!("Window: last {} days (since {})", self.settings.days, self.since().format("%Y-%m-%d")),
            format!("Generated: {}", self.now.to_rfc3339_opts(SecondsFormat::Secs, true,)),
        ];

        exporter.export(&file_name, |path| {
            pdf::write_pdf(path, &format!("{repository} metrics report"), &intro, artifacts, DOCUMENT_ROWS,)
        },);
    }

    /// Repository facts and remaining quota, fetched once.
    ///
    /// # Errors
    ///
    /// Propagates the repository lookup error, `404` included.
    pub async fn metadata(&self,) -> Result<&RepositoryMetadata, Error,>
    {
        self.metadata.get_or_try_init(|| fetch_repository_metadata(self.client, &self.settings.repository,),).await
    }

    async fn overview(&self,) -> Result<Artifact, Error,>
    {
        let metadata = self.metadata().await?;
        let fetch = &self.settings.tuning.fetch;
        let total_commits = fetch_total_commits(
            self.client,
            &self.settings.repository,
            PageBounds::pages(fetch.per_page, fetch.max_history_pages,),
        )
        .await?;
        Ok(tables::repository_overview(metadata, total_commits,),)
    }

    async fn commits(&self,) -> Result<&[Commit], Error,>
    {
        let commits = self
            .commits
            .get_or_try_init(|| {
                fetch_commits(self.client, &self.settings.repository, Some(self.since(),), self.page_bounds(),)
            },)
            .await?;
        Ok(commits,)
    }

    /// Details for the newest commits, capped at `max_commit_pages` pages.
    async fn details(&self,) -> Result<&[CommitDetail], Error,>
    {
        let commits = self.commits().await?;
        let fetch = &self.settings.tuning.fetch;
        let sample = commits.len().min(fetch.per_page as usize * fetch.max_commit_pages as usize,);

        let details = self
            .details
            .get_or_init(|| {
                fetch_commit_details(
                    self.client,
                    &self.settings.repository,
                    &commits[..sample],
                    fetch.detail_workers,
                )
            },)
            .await;
        Ok(details,)
    }

    async fn branches(&self,) -> Result<&[Branch], Error,>
    {
        let branches = self
            .branches
            .get_or_try_init(|| fetch_branches(self.client, &self.settings.repository, self.page_bounds(),),)
            .await?;
        Ok(branches,)
    }

    /// Issue backlog artifacts.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors.
    pub async fn issues(&self,) -> Result<Vec<Artifact,>, Error,>
    {
        let issues = fetch_issues(self.client, &self.settings.repository, self.page_bounds(),).await?;
        info!("analyzing {} issues", issues.len());

        Ok(vec![
            tables::issue_summary(&issue_summary(&issues,),),
            tables::sprint_throughput(&sprint_throughput(&issues, self.settings.tuning.issues.sprint_days,),),
        ],)
    }

    /// Churn, hotspot, and stale-file artifacts.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors from the commit listing.
    pub async fn code_quality(&self,) -> Result<Vec<Artifact,>, Error,>
    {
        let details = self.details().await?;
        let churn = &self.settings.tuning.churn;
        if !self.settings.stale_files_reachable() {
            warn!(
                "stale_days ({}) is not below the {}-day window; no file can be reported stale",
                churn.stale_days, self.settings.days
            );
        }

        let files = file_churn(details,);
        let hot = hotspots(&files, churn.churn_threshold, churn.commit_threshold,);
        let stale = stale_files(&files, self.now, churn.stale_days,);
        let counts = CodeQualityCounts {
            files_analyzed:     files.len(),
            hotspot_files:      hot.len(),
            stale_files:        stale.len(),
            test_to_code_ratio: test_to_code_ratio(files.iter().map(|file| file.path.as_str(),),),
        };

        Ok(vec![
            tables::code_quality_summary(counts,),
            tables::code_churn(&files,),
            tables::hotspot_files(&hot,),
            tables::stale_files(&stale,),
        ],)
    }

    /// Security and compliance artifact.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors from the commit and branch listings.
    pub async fn security(&self,) -> Result<Vec<Artifact,>, Error,>
    {
        let alerts = fetch_dependabot_alerts(self.client, &self.settings.repository, self.page_bounds(),).await;
        let commits = self.commits().await?;
        let branches = self.branches().await?;

        Ok(vec![tables::security_compliance(&security_summary(&alerts, commits, branches,),)],)
    }

    /// Commit, merge, and review artifacts.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors.
    pub async fn activity(&self,) -> Result<Vec<Artifact,>, Error,>
    {
        let repo = &self.settings.repository;
        let since = self.since();
        let days = self.settings.days;

        let commits = self.commits().await?;
        let details = self.details().await?;
        let branches = self.branches().await?;

        let merged = fetch_merged_pull_requests(self.client, repo, since, self.search_bounds(),).await?;
        let closed_count = count_pull_requests(self.client, repo, PullRequestSearch::Closed, since,).await?;
        let merged_count = count_pull_requests(self.client, repo, PullRequestSearch::Merged, since,).await?;
        let closed_unmerged =
            fetch_closed_unmerged_pull_requests(self.client, repo, since, self.search_bounds(),).await?;
        let reviewed = fetch_pull_requests_for_review(self.client, repo, since, self.search_bounds(),).await?;
        let candidates = fetch_reopen_candidates(self.client, repo, since, self.search_bounds(),).await?;

        let activity = activity_summary(commits, details, branches.len(), days,);
        let ownership = bus_factor(&commit_counts(commits,), self.settings.tuning.bus_factor.threshold_percent,);
        let merges = merge_frequency(&merged, days,);
        let lead_time = lead_time_summary(&merged,);
        let efficiency = merge_efficiency(closed_count, merged_count,);
        let reopen = reopen_summary(&candidates, closed_count, since,);
        let quality = pull_request_quality(&reviewed,);
        let commit_buckets = TimeBuckets::from_instants(commits.iter().map(|commit| commit.timestamp,),);
        let merge_buckets = TimeBuckets::from_instants(merged.iter().map(|pull| pull.merged_at,),);

        let mut artifacts = vec![
            tables::repository_activity(ActivityOverview {
                activity:          &activity,
                bus_factor:        &ownership,
                threshold_percent: self.settings.tuning.bus_factor.threshold_percent,
                merges:            &merges,
                lead_time:         &lead_time,
                efficiency:        &efficiency,
                reopen:            &reopen,
            },),
            tables::pull_request_quality(&quality,),
            tables::commit_frequency(&commit_frequency_by_author(commits,),),
            tables::bus_factor_details(&ownership,),
            tables::branches(branches,),
            tables::merged_pull_requests(&merged,),
            tables::merge_lead_time(&merged,),
            tables::closed_not_merged(&closed_unmerged,),
            tables::reopened(&reopen,),
            tables::merges_distribution(&merge_buckets,),
            tables::commits_distribution(&commit_buckets,),
        ];
        artifacts.extend(tables::pull_request_highlights(&quality,),);
        artifacts.push(tables::recent_weeks(&commit_buckets, &merge_buckets, RECENT_WEEKS,),);
        Ok(artifacts,)
    }
}
