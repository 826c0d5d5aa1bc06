// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Day, week, and month event histograms.
//!
//! Buckets with no events are absent rather than zero. A trailing view
//! therefore covers the last N populated buckets, not the last N calendar
//! periods.

use std::{cmp::Ordering, collections::BTreeMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::time::{day_key, month_key, week_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize,)]
#[serde(rename_all = "lowercase")]
pub enum Granularity
{
    Day,
    Week,
    Month,
}

impl Granularity
{
    pub fn as_str(self,) -> &'static str
    {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

/// Event counts keyed by day, week, and month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize,)]
pub struct TimeBuckets
{
    pub per_day:   BTreeMap<String, u64,>,
    pub per_week:  BTreeMap<String, u64,>,
    pub per_month: BTreeMap<String, u64,>,
}

impl TimeBuckets
{
    /// Counts each present instant once per granularity; `None` is skipped.
    pub fn from_instants<I,>(instants: I,) -> Self
    where
        I: IntoIterator<Item = Option<DateTime<Utc,>,>,>,
    {
        let mut buckets = Self::default();
        for instant in instants.into_iter().flatten() {
            *buckets.per_day.entry(day_key(instant,),).or_default() += 1;
            *buckets.per_week.entry(week_key(instant,),).or_default() += 1;
            *buckets.per_month.entry(month_key(instant,),).or_default() += 1;
        }
        buckets
    }

    pub fn map(&self, granularity: Granularity,) -> &BTreeMap<String, u64,>
    {
        match granularity {
            Granularity::Day => &self.per_day,
            Granularity::Week => &self.per_week,
            Granularity::Month => &self.per_month,
        }
    }

    /// Entries in chronological order.
    ///
    /// Week keys carry an unpadded week number, so they are ordered by
    /// `(year, week)` instead of lexically.
    pub fn sorted(&self, granularity: Granularity,) -> Vec<(&str, u64,),>
    {
        let mut entries: Vec<(&str, u64,),> =
            self.map(granularity,).iter().map(|(key, count,)| (key.as_str(), *count,),).collect();
        if granularity == Granularity::Week {
            entries.sort_by(|a, b| compare_week_keys(a.0, b.0,),);
        }
        entries
    }

    /// Last `n` populated buckets in chronological order.
    pub fn trailing(&self, granularity: Granularity, n: usize,) -> Vec<(&str, u64,),>
    {
        let entries = self.sorted(granularity,);
        let skip = entries.len().saturating_sub(n,);
        entries.into_iter().skip(skip,).collect()
    }
}

fn parse_week_key(key: &str,) -> Option<(i32, u32,),>
{
    let (year, week,) = key.split_once("-W",)?;
    Some((year.parse().ok()?, week.parse().ok()?,),)
}

pub(crate) fn compare_week_keys(a: &str, b: &str,) -> Ordering
{
    match (parse_week_key(a,), parse_week_key(b,),) {
        (Some(left,), Some(right,),) => left.cmp(&right,),
        _ => a.cmp(b,),
    }
}

#[cfg(test)]
mod tests
{
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    use super::*;
    use crate::time::parse_timestamp;

    #[test]
    fn mid_march_instant_lands_in_expected_keys()
    {
        let buckets = TimeBuckets::from_instants([parse_timestamp("2024-03-15T12:00:00Z",)],);
        assert_eq!(buckets.per_day.get("2024-03-15"), Some(&1));
        assert_eq!(buckets.per_week.get("2024-W11"), Some(&1));
        assert_eq!(buckets.per_month.get("2024-03"), Some(&1));
    }

    #[test]
    fn missing_instants_are_skipped_and_gaps_stay_absent()
    {
        let buckets = TimeBuckets::from_instants([
            parse_timestamp("2024-01-10T00:00:00Z",),
            None,
            parse_timestamp("2024-03-10T00:00:00Z",),
        ],);
        assert_eq!(buckets.per_day.values().sum::<u64>(), 2);
        assert!(!buckets.per_month.contains_key("2024-02"));
        assert_eq!(buckets.trailing(Granularity::Month, 12,), vec![("2024-01", 1), ("2024-03", 1)]);
    }

    #[test]
    fn weeks_sort_numerically()
    {
        let buckets = TimeBuckets::from_instants([
            parse_timestamp("2024-03-15T00:00:00Z",),
            parse_timestamp("2024-01-10T00:00:00Z",),
            parse_timestamp("2023-12-20T00:00:00Z",),
        ],);
        let keys: Vec<&str,> = buckets.sorted(Granularity::Week,).into_iter().map(|(key, _,)| key,).collect();
        assert_eq!(keys, vec!["2023-W51", "2024-W2", "2024-W11"]);
        assert_eq!(buckets.trailing(Granularity::Week, 1,), vec![("2024-W11", 1)]);
    }

    proptest! {
        #[test]
        fn day_counts_sum_to_present_instants(offsets in proptest::collection::vec(proptest::option::of(0i64..2_000), 0..100)) {
            let base = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
            let present = offsets.iter().filter(|offset| offset.is_some()).count() as u64;
            let buckets = TimeBuckets::from_instants(
                offsets.iter().map(|offset| offset.map(|hours| base + Duration::hours(hours * 7))),
            );

            prop_assert_eq!(buckets.per_day.values().sum::<u64>(), present);
            prop_assert_eq!(buckets.per_week.values().sum::<u64>(), present);
            prop_assert_eq!(buckets.per_month.values().sum::<u64>(), present);
        }
    }
}
