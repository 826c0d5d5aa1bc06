// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Pure calculators that reduce fetched records into report values.
//!
//! Nothing here performs I/O. Records with missing or anomalous fields
//! (absent timestamps, negative durations) are skipped rather than treated as
//! errors, and ratios over empty inputs are either `None` or `0` as documented
//! per function.

pub mod activity;
pub mod buckets;
pub mod bus_factor;
pub mod churn;
pub mod issues;
pub mod lead_time;
pub mod pull_requests;
pub mod security;

pub use activity::{ActivitySummary, AuthorCommits, MergeFrequency};
pub use buckets::{Granularity, TimeBuckets};
pub use bus_factor::{BusFactor, ContributorOwnership};
pub use churn::FileChurn;
pub use issues::{BugFeatureSplit, IssueSummary, SprintThroughput};
pub use lead_time::LeadTimeStats;
pub use pull_requests::{MergeEfficiency, PullRequestQuality, ReopenSummary, ReviewRow};
pub use security::SecuritySummary;

/// Rounds to two decimal places.
pub fn round2(value: f64,) -> f64
{
    (value * 100.0).round() / 100.0
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64],) -> Option<f64,>
{
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64,)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn round2_rounds_half_away_from_zero()
    {
        assert_eq!(round2(1.005_1,), 1.01);
        assert_eq!(round2(2.0 / 3.0,), 0.67);
        assert_eq!(round2(-1.234,), -1.23);
    }

    #[test]
    fn mean_of_empty_is_none()
    {
        assert_eq!(mean(&[],), None);
        assert_eq!(mean(&[1.0, 2.0, 6.0],), Some(3.0));
    }
}
