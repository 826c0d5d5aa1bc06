// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Metric results laid out as report artifacts.
//!
//! File names and column headers are consumed by downstream scrapers and must
//! stay stable.

use chrono::{DateTime, Utc};

use super::{
    csv::{summary_table, time_distribution},
    number, optional_count, optional_number, timestamp, Artifact, Table, MISSING
};
use crate::{
    metrics::{
        buckets::compare_week_keys, ActivitySummary, AuthorCommits, BusFactor, FileChurn, IssueSummary, LeadTimeStats,
        MergeEfficiency, MergeFrequency, PullRequestQuality, ReopenSummary, ReviewRow,
        Granularity, SecuritySummary, SprintThroughput, TimeBuckets
    },
    models::{Branch, PullRequest, RepositoryMetadata},
    time::hours_between
};

fn yes_no(flag: bool) -> String {
    let text = if flag { "yes" } else { "no" };
    text.to_owned()
}

fn percent(rate: Option<f64>) -> String {
    optional_number(rate.map(|rate| rate * 100.0))
}

fn date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|instant| instant.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn author(value: Option<&str>) -> String {
    value.unwrap_or_default().to_owned()
}

/// Repository facts opening the PDF, with the default-branch commit count.
pub fn repository_overview(metadata: &RepositoryMetadata, total_commits: u64) -> Artifact {
    let text = |value: Option<&str>| value.unwrap_or(MISSING).to_owned();
    let day = |value: Option<DateTime<Utc>>| value.map_or_else(|| MISSING.to_owned(), |instant| date(Some(instant)));
    let table = Table::key_value([
        ("full_name", metadata.full_name.clone()),
        ("description", text(metadata.description.as_deref())),
        ("language", text(metadata.language.as_deref())),
        ("stars", metadata.stars.to_string()),
        ("forks", metadata.forks.to_string()),
        ("open_issues", metadata.open_issues.to_string()),
        ("license", text(metadata.license.as_deref())),
        ("default_branch", text(metadata.default_branch.as_deref())),
        ("visibility", text(metadata.visibility.as_deref())),
        ("archived", yes_no(metadata.archived)),
        ("created_at", day(metadata.created_at)),
        ("updated_at", day(metadata.updated_at)),
        ("total_commits_default_branch", total_commits.to_string())
    ]);
    Artifact::document("Repository overview", table)
}

pub fn issue_summary(summary: &IssueSummary) -> Artifact {
    let table = Table::key_value([
        ("open_issues", summary.open.to_string()),
        ("closed_issues", summary.closed.to_string()),
        ("open_closed_ratio", number(summary.open_closed_ratio)),
        ("avg_resolution_time_days", number(summary.avg_resolution_days)),
        ("bug_issues", summary.labels.bugs.to_string()),
        ("feature_issues", summary.labels.features.to_string()),
        ("bug_feature_ratio", optional_number(summary.labels.ratio))
    ]);
    Artifact::new("issue_summary_metrics.csv", "Issue backlog", table)
}

pub fn sprint_throughput(throughput: &SprintThroughput) -> Artifact {
    let mut table = Table::new(&["sprint_start_date", "issues_created", "issues_closed"]);
    for start in throughput.sprints() {
        table.push(vec![
            start.format("%Y-%m-%d").to_string(),
            throughput.created.get(&start).copied().unwrap_or(0).to_string(),
            throughput.closed.get(&start).copied().unwrap_or(0).to_string(),
        ]);
    }
    Artifact::new(
        "issue_sprint_throughput.csv",
        format!("Issues per {}-day sprint", throughput.sprint_days),
        table
    )
}

/// Counts shown in the code quality summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodeQualityCounts {
    pub files_analyzed:     usize,
    pub hotspot_files:      usize,
    pub stale_files:        usize,
    pub test_to_code_ratio: Option<f64>
}

pub fn code_quality_summary(counts: CodeQualityCounts) -> Artifact {
    let table = Table::key_value([
        ("files_analyzed", counts.files_analyzed.to_string()),
        ("hotspot_files", counts.hotspot_files.to_string()),
        ("test_to_code_ratio", optional_number(counts.test_to_code_ratio)),
        ("stale_files", counts.stale_files.to_string())
    ]);
    Artifact::new("code_quality_summary.csv", "Code quality", table)
}

fn churn_table<'a, I>(files: I) -> Table
where
    I: IntoIterator<Item = &'a FileChurn>
{
    let mut table = Table::new(&["file_path", "code_churn", "commit_count", "additions", "deletions"]);
    for file in files {
        table.push(vec![
            file.path.clone(),
            file.churn.to_string(),
            file.commits.to_string(),
            file.additions.to_string(),
            file.deletions.to_string(),
        ]);
    }
    table
}

pub fn code_churn(files: &[FileChurn]) -> Artifact {
    Artifact::new("code_churn_by_file.csv", "Code churn by file", churn_table(files))
}

pub fn hotspot_files(hotspots: &[&FileChurn]) -> Artifact {
    Artifact::new("hotspot_files.csv", "Hotspot files", churn_table(hotspots.iter().copied()))
}

pub fn stale_files(stale: &[&FileChurn]) -> Artifact {
    let mut table = Table::new(&["file_path", "last_commit_date"]);
    for file in stale {
        table.push(vec![file.path.clone(), date(file.last_modified)]);
    }
    Artifact::new("stale_files.csv", "Stale files", table)
}

pub fn security_compliance(summary: &SecuritySummary) -> Artifact {
    let table = Table::key_value([
        ("open_security_alerts", summary.open_alerts.to_string()),
        ("avg_remediation_time_days", optional_number(summary.avg_remediation_days)),
        ("signed_commits_percentage", number(summary.signed_commits_percent)),
        ("protected_branches", summary.protected_branches.to_string())
    ]);
    Artifact::new("security_compliance_metrics.csv", "Security and compliance", table)
}

/// Inputs of the repository activity summary.
#[derive(Debug, Clone, Copy)]
pub struct ActivityOverview<'a> {
    pub activity:          &'a ActivitySummary,
    pub bus_factor:        &'a BusFactor,
    pub threshold_percent: f64,
    pub merges:            &'a MergeFrequency,
    pub lead_time:         &'a LeadTimeStats,
    pub efficiency:        &'a MergeEfficiency,
    pub reopen:            &'a ReopenSummary
}

pub fn repository_activity(overview: ActivityOverview<'_>) -> Artifact {
    let window = format!("last {} days", overview.activity.window_days);
    let w = window.as_str();
    let ActivityOverview {
        activity,
        bus_factor,
        threshold_percent,
        merges,
        lead_time,
        efficiency,
        reopen
    } = overview;

    let rows: Vec<(&'static str, String, String)> = vec![
        ("active_contributors", activity.active_contributors.to_string(), w.to_owned()),
        ("total_commits", activity.total_commits.to_string(), w.to_owned()),
        ("commits_per_day", number(activity.commits_per_day), w.to_owned()),
        (
            "avg_time_between_commits_hours",
            optional_number(activity.avg_hours_between_commits),
            w.to_owned()
        ),
        ("lines_added", activity.lines_added.to_string(), format!("{w} (sampled)")),
        ("lines_deleted", activity.lines_deleted.to_string(), format!("{w} (sampled)")),
        (
            "bus_factor",
            optional_count(bus_factor.bus_factor),
            format!("contributors reaching {}% ownership", number(threshold_percent))
        ),
        (
            "bus_factor_ownership_percent",
            optional_number(bus_factor.ownership_at_cutoff),
            w.to_owned()
        ),
        ("branch_count", activity.branches.to_string(), "parallel development complexity".to_owned()),
        ("merge_frequency_merged_prs", merges.merged.to_string(), w.to_owned()),
        ("merge_frequency_merges_per_week", number(merges.per_week), w.to_owned()),
        (
            "avg_time_between_merges_hours",
            optional_number(merges.avg_hours_between_merges),
            w.to_owned()
        ),
        ("avg_pr_merge_lead_time_hours", optional_number(lead_time.mean), w.to_owned()),
        ("median_pr_merge_lead_time_hours", optional_number(lead_time.median), w.to_owned()),
        ("p75_pr_merge_lead_time_hours", optional_number(lead_time.p75), w.to_owned()),
        ("p90_pr_merge_lead_time_hours", optional_number(lead_time.p90), w.to_owned()),
        ("prs_closed", efficiency.closed.to_string(), w.to_owned()),
        ("prs_merged", efficiency.merged.to_string(), w.to_owned()),
        (
            "prs_closed_not_merged",
            efficiency.closed_not_merged.to_string(),
            "closed without merge, including abandoned".to_owned()
        ),
        ("prs_merge_rate_percent", percent(efficiency.merge_rate), "merged / closed".to_owned()),
        ("prs_reopened", reopen.reopened.len().to_string(), w.to_owned()),
        ("prs_reopen_events", reopen.reopen_events.to_string(), w.to_owned()),
        ("prs_reopen_rate_percent", percent(reopen.reopen_rate), "reopened / closed".to_owned()),
    ];

    let mut table = Table::new(&["metric_name", "metric_value", "notes"]);
    for (name, value, notes) in rows {
        table.push(vec![name.to_owned(), value, notes]);
    }
    Artifact::new("repository_activity_metrics.csv", "Repository activity", table)
}

pub fn pull_request_quality(quality: &PullRequestQuality) -> Artifact {
    let table = summary_table([
        ("prs_scanned", quality.pull_requests.to_string(), "created in window"),
        ("prs_non_draft", quality.non_draft.to_string(), "drafts excluded below"),
        (
            "review_turnaround_avg_hours",
            optional_number(quality.avg_turnaround_hours),
            "created to first non-author review"
        ),
        (
            "review_turnaround_median_hours",
            optional_number(quality.median_turnaround_hours),
            ""
        ),
        ("avg_reviewers_per_pr", optional_number(quality.avg_reviewers), "distinct reviewers"),
        ("median_reviewers_per_pr", optional_number(quality.median_reviewers), ""),
        ("avg_pr_loc_changed", optional_number(quality.avg_loc_changed), "additions + deletions"),
        ("median_pr_loc_changed", optional_number(quality.median_loc_changed), ""),
        (
            "avg_pr_total_comments",
            optional_number(quality.avg_total_comments),
            "issue comments + review threads"
        ),
        ("median_pr_total_comments", optional_number(quality.median_total_comments), ""),
        (
            "approval_rate_percent",
            percent(quality.approval_rate),
            "merged with at least one approval / merged"
        ),
        ("merged_prs_count", quality.merged.to_string(), "")
    ]);
    Artifact::new("pr_quality_metrics.csv", "Pull request quality", table)
}

fn review_rows(title: &str, rows: &[ReviewRow]) -> Artifact {
    let mut table = Table::new(&[
        "number",
        "author",
        "loc_changed",
        "reviewers",
        "approvals",
        "review_turnaround_hours",
        "total_comments",
        "title"
    ]);
    for row in rows {
        table.push(vec![
            row.number.to_string(),
            author(row.author.as_deref()),
            row.loc_changed.to_string(),
            row.reviewers.to_string(),
            row.approvals.to_string(),
            optional_number(row.review_turnaround_hours),
            row.total_comments.to_string(),
            row.title.clone(),
        ]);
    }
    Artifact::document(title, table)
}

/// Largest and slowest-reviewed pull request sections for the PDF.
pub fn pull_request_highlights(quality: &PullRequestQuality) -> [Artifact; 2] {
    [
        review_rows("Largest pull requests", &quality.largest),
        review_rows("Slowest first review", &quality.slowest_review)
    ]
}

/// Commit and merge counts for the last `weeks` weeks with any activity.
pub fn recent_weeks(commits: &TimeBuckets, merges: &TimeBuckets, weeks: usize) -> Artifact {
    let mut keys: Vec<&str> = commits
        .trailing(Granularity::Week, weeks)
        .into_iter()
        .chain(merges.trailing(Granularity::Week, weeks))
        .map(|(key, _)| key)
        .collect();
    keys.sort_by(|a, b| compare_week_keys(a, b));
    keys.dedup();
    let skip = keys.len().saturating_sub(weeks);

    let mut table = Table::new(&["week", "commits", "merges"]);
    for key in keys.into_iter().skip(skip) {
        let count = |buckets: &TimeBuckets| buckets.per_week.get(key).copied().unwrap_or(0).to_string();
        table.push(vec![key.to_owned(), count(commits), count(merges)]);
    }
    Artifact::document(format!("Cadence, last {weeks} active weeks"), table)
}

pub fn commit_frequency(authors: &[AuthorCommits]) -> Artifact {
    let mut table = Table::new(&["author", "commit_count"]);
    for row in authors {
        table.push(vec![row.author.clone(), row.commits.to_string()]);
    }
    Artifact::new("commit_frequency_by_author.csv", "Commits by author", table)
}

pub fn bus_factor_details(bus_factor: &BusFactor) -> Artifact {
    let mut table = Table::new(&[
        "author",
        "commit_count",
        "ownership_percent",
        "cumulative_ownership_percent",
        "in_bus_factor"
    ]);
    for row in &bus_factor.contributors {
        table.push(vec![
            row.author.clone(),
            row.commits.to_string(),
            format!("{:.2}", row.ownership_percent),
            format!("{:.2}", row.cumulative_percent),
            yes_no(row.in_bus_factor),
        ]);
    }
    Artifact::new("bus_factor_details.csv", "Bus factor contributors", table)
}

pub fn branches(branches: &[Branch]) -> Artifact {
    let mut sorted: Vec<&Branch> = branches.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut table = Table::new(&["branch_name", "protected", "head_sha"]);
    for branch in sorted {
        table.push(vec![
            branch.name.clone(),
            yes_no(branch.protected),
            branch.head_sha.clone().unwrap_or_default(),
        ]);
    }
    Artifact::new("branches.csv", "Branches", table)
}

pub fn merged_pull_requests(merged: &[PullRequest]) -> Artifact {
    let mut table = Table::new(&[
        "number",
        "created_at",
        "merged_at",
        "author",
        "base",
        "head",
        "title",
        "url"
    ]);
    for pull in merged {
        table.push(vec![
            pull.number.to_string(),
            timestamp(pull.created_at),
            timestamp(pull.merged_at),
            author(pull.author.as_deref()),
            pull.base_ref.clone(),
            pull.head_ref.clone(),
            pull.title.clone(),
            pull.url.clone(),
        ]);
    }
    Artifact::new("merged_prs.csv", "Merged pull requests", table)
}

pub fn merge_lead_time(merged: &[PullRequest]) -> Artifact {
    let mut table = Table::new(&[
        "number",
        "created_at",
        "merged_at",
        "lead_time_hours",
        "lead_time_days",
        "author",
        "title",
        "url"
    ]);
    for pull in merged {
        let hours = pull
            .created_at
            .zip(pull.merged_at)
            .map(|(created, merged)| hours_between(created, merged))
            .filter(|hours| *hours >= 0.0);
        table.push(vec![
            pull.number.to_string(),
            timestamp(pull.created_at),
            timestamp(pull.merged_at),
            optional_number(hours),
            optional_number(hours.map(|hours| hours / 24.0)),
            author(pull.author.as_deref()),
            pull.title.clone(),
            pull.url.clone(),
        ]);
    }
    Artifact::new("pr_merge_lead_time.csv", "Pull request merge lead time", table)
}

pub fn closed_not_merged(pulls: &[PullRequest]) -> Artifact {
    let mut table = Table::new(&["number", "created_at", "closed_at", "author", "title", "url"]);
    for pull in pulls {
        table.push(vec![
            pull.number.to_string(),
            timestamp(pull.created_at),
            timestamp(pull.closed_at),
            author(pull.author.as_deref()),
            pull.title.clone(),
            pull.url.clone(),
        ]);
    }
    Artifact::new("prs_closed_not_merged.csv", "Closed without merge", table)
}

pub fn reopened(summary: &ReopenSummary) -> Artifact {
    let mut table = Table::new(&["number", "reopened_at", "closed_at", "author", "title", "url"]);
    for pull in &summary.reopened {
        table.push(vec![
            pull.number.to_string(),
            timestamp(Some(pull.reopened_at)),
            timestamp(pull.closed_at),
            author(pull.author.as_deref()),
            pull.title.clone(),
            pull.url.clone(),
        ]);
    }
    Artifact::new("prs_reopened.csv", "Reopened pull requests", table)
}

pub fn merges_distribution(buckets: &TimeBuckets) -> Artifact {
    Artifact::new(
        "merges_time_distribution.csv",
        "Merges over time",
        time_distribution(buckets, "merge_count")
    )
}

pub fn commits_distribution(buckets: &TimeBuckets) -> Artifact {
    Artifact::new(
        "commits_time_distribution.csv",
        "Commits over time",
        time_distribution(buckets, "commit_count")
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::metrics::bus_factor::bus_factor;

    fn cell<'a>(artifact: &'a Artifact, metric: &str) -> &'a str {
        artifact
            .table
            .rows
            .iter()
            .find(|row| row[0] == metric)
            .map(|row| row[1].as_str())
            .expect("metric row")
    }

    #[test]
    fn bus_factor_rows_use_two_decimals_and_yes_no() {
        let counts = vec![("a".to_owned(), 2), ("b".to_owned(), 1)];
        let artifact = bus_factor_details(&bus_factor(&counts, 50.0));

        assert_eq!(artifact.file_name, Some("bus_factor_details.csv"));
        assert_eq!(artifact.table.rows[0], vec!["a", "2", "66.67", "66.67", "yes"]);
        assert_eq!(artifact.table.rows[1], vec!["b", "1", "33.33", "100.00", "no"]);
    }

    #[test]
    fn missing_rates_render_placeholder() {
        let quality = crate::metrics::pull_requests::pull_request_quality(&[]);
        let artifact = pull_request_quality(&quality);
        assert_eq!(cell(&artifact, "approval_rate_percent"), "N/A");
        assert_eq!(cell(&artifact, "prs_scanned"), "0");
        assert_eq!(artifact.table.headers, vec!["metric_name", "metric_value", "notes"]);
    }

    #[test]
    fn lead_time_rows_convert_hours_to_days() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let pull = PullRequest {
            number: 7,
            created_at: Some(created),
            merged_at: Some(created + chrono::Duration::hours(36)),
            ..PullRequest::default()
        };
        let artifact = merge_lead_time(&[pull]);
        let row = &artifact.table.rows[0];
        assert_eq!(row[0], "7");
        assert_eq!(row[1], "2024-05-01T00:00:00Z");
        assert_eq!(row[3], "36");
        assert_eq!(row[4], "1.5");
    }

    #[test]
    fn overview_marks_unknown_facts() {
        let metadata = RepositoryMetadata {
            full_name: "o/r".to_owned(),
            stars: 42,
            license: Some("MIT License".to_owned()),
            archived: true,
            created_at: Some(Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap()),
            ..RepositoryMetadata::default()
        };

        let artifact = repository_overview(&metadata, 1234);
        assert_eq!(artifact.file_name, None);
        assert_eq!(cell(&artifact, "stars"), "42");
        assert_eq!(cell(&artifact, "license"), "MIT License");
        assert_eq!(cell(&artifact, "description"), "N/A");
        assert_eq!(cell(&artifact, "archived"), "yes");
        assert_eq!(cell(&artifact, "created_at"), "2020-01-02");
        assert_eq!(cell(&artifact, "updated_at"), "N/A");
        assert_eq!(cell(&artifact, "total_commits_default_branch"), "1234");
    }

    #[test]
    fn recent_weeks_merge_both_series_in_order() {
        let at = |month, day| Some(Utc.with_ymd_and_hms(2024, month, day, 12, 0, 0).unwrap());
        let commits = TimeBuckets::from_instants([at(3, 4), at(3, 15), at(1, 3)]);
        let merges = TimeBuckets::from_instants([at(3, 5), at(2, 20)]);

        let artifact = recent_weeks(&commits, &merges, 3);
        let rows: Vec<Vec<&str>> = artifact
            .table
            .rows
            .iter()
            .map(|row| row.iter().map(String::as_str).collect())
            .collect();

        assert_eq!(artifact.file_name, None);
        assert_eq!(rows, vec![vec!["2024-W8", "0", "1"], vec!["2024-W10", "1", "1"], vec![
            "2024-W11", "1", "0"
        ]]);
    }

    #[test]
    fn branches_are_sorted_by_name() {
        let branch = |name: &str, protected| Branch {
            name: name.to_owned(),
            protected,
            head_sha: Some(format!("{name}-sha"))
        };
        let artifact = branches(&[branch("main", true), branch("dev", false)]);
        assert_eq!(artifact.table.rows[0], vec!["dev", "no", "dev-sha"]);
        assert_eq!(artifact.table.rows[1], vec!["main", "yes", "main-sha"]);
    }
}
