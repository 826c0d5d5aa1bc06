// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Duration statistics with linearly interpolated percentiles.

use serde::Serialize;

use super::mean;
use crate::{models::Interval, time::hours_between};

/// Summary of a set of non-negative durations in hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize,)]
pub struct LeadTimeStats
{
    pub count:  usize,
    pub mean:   Option<f64,>,
    pub median: Option<f64,>,
    pub p75:    Option<f64,>,
    pub p90:    Option<f64,>,
    pub min:    Option<f64,>,
    pub max:    Option<f64,>,
}

/// Percentile `p` (0 to 100) of an ascending slice.
///
/// The rank `p / 100 * (n - 1)` is interpolated linearly between its floor and
/// ceiling indices. Percentiles at or below 0 return the minimum; at or above
/// 100 the maximum. An empty slice yields `None`.
///
/// ```
/// use repo_insight::metrics::lead_time::percentile;
///
/// let sorted = [1.0, 2.0, 3.0, 4.0, 10.0];
/// assert_eq!(percentile(&sorted, 50.0,), Some(3.0));
/// assert!((percentile(&sorted, 90.0,).unwrap() - 7.6).abs() < 1e-9);
/// ```
pub fn percentile(sorted: &[f64], p: f64,) -> Option<f64,>
{
    let (first, last,) = (sorted.first()?, sorted.last()?,);
    if p <= 0.0 {
        return Some(*first,);
    }
    if p >= 100.0 {
        return Some(*last,);
    }

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower],);
    }

    let weight = rank - lower as f64;
    Some(sorted[lower] + weight * (sorted[upper] - sorted[lower]),)
}

/// Summarizes durations, discarding negative and non-finite values.
pub fn summarize<I,>(durations: I,) -> LeadTimeStats
where
    I: IntoIterator<Item = f64,>,
{
    let mut values: Vec<f64,> =
        durations.into_iter().filter(|value| value.is_finite() && *value >= 0.0,).collect();
    values.sort_by(f64::total_cmp,);

    LeadTimeStats {
        count:  values.len(),
        mean:   mean(&values,),
        median: percentile(&values, 50.0,),
        p75:    percentile(&values, 75.0,),
        p90:    percentile(&values, 90.0,),
        min:    values.first().copied(),
        max:    values.last().copied(),
    }
}

/// Hours from start to completion, `None` when either instant is missing.
pub fn lead_time_hours<R: Interval,>(record: &R,) -> Option<f64,>
{
    Some(hours_between(record.started_at()?, record.completed_at()?,),)
}

/// Lead-time statistics over records that expose both instants.
pub fn lead_time_summary<'a, R, I,>(records: I,) -> LeadTimeStats
where
    R: Interval + 'a,
    I: IntoIterator<Item = &'a R,>,
{
    summarize(records.into_iter().filter_map(lead_time_hours,),)
}
