// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Contributor concentration ("bus factor").
//!
//! Contributors are visited by commit count, highest first. A contributor is
//! counted while the ownership accumulated before them is still below the
//! threshold, so the bus factor is the smallest prefix whose cumulative share
//! reaches the threshold.

use serde::Serialize;

use crate::models::Commit;

/// Per-contributor ownership row.
#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct ContributorOwnership
{
    pub author:             String,
    pub commits:            u64,
    pub ownership_percent:  f64,
    pub cumulative_percent: f64,
    pub in_bus_factor:      bool,
}

/// Result of [`bus_factor`].
#[derive(Debug, Clone, Default, PartialEq, Serialize,)]
pub struct BusFactor
{
    /// Number of contributors counted, `None` when there are no commits.
    pub bus_factor:          Option<usize,>,
    /// Cumulative ownership of the counted contributors.
    pub ownership_at_cutoff: Option<f64,>,
    /// Every contributor in visiting order.
    pub contributors:        Vec<ContributorOwnership,>,
}

/// Commit counts per author in first-seen order.
pub fn commit_counts(commits: &[Commit],) -> Vec<(String, u64,),>
{
    let mut counts: Vec<(String, u64,),> = Vec::new();
    for commit in commits {
        match counts.iter_mut().find(|(author, _,)| *author == commit.author,) {
            Some((_, count,),) => *count += 1,
            None => counts.push((commit.author.clone(), 1,),),
        }
    }
    counts
}

/// Computes the bus factor for `(author, commit_count)` pairs.
///
/// Ties keep their input order. Zero total commits yields `None` for both
/// scalars and an empty contributor list.
///
/// # Examples
///
/// ```
/// use repo_insight::metrics::bus_factor::bus_factor;
///
/// let counts = vec![("a".to_owned(), 60), ("b".to_owned(), 30), ("c".to_owned(), 10)];
/// let result = bus_factor(&counts, 50.0,);
/// assert_eq!(result.bus_factor, Some(1));
/// assert_eq!(result.ownership_at_cutoff, Some(60.0));
/// assert!(!result.contributors[2].in_bus_factor);
/// ```
pub fn bus_factor(counts: &[(String, u64,)], threshold_percent: f64,) -> BusFactor
{
    let total: u64 = counts.iter().map(|(_, count,)| count,).sum();
    if total == 0 {
        return BusFactor::default();
    }

    let mut sorted: Vec<&(String, u64,),> = counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1,),);

    let total_f = total as f64;
    let mut running = 0u64;
    let mut counted = 0usize;
    let mut cutoff = 0.0;
    let mut contributors = Vec::with_capacity(sorted.len(),);

    for (author, commits,) in sorted {
        let in_bus_factor = (running as f64) * 100.0 < threshold_percent * total_f;
        running += commits;
        let cumulative_percent = running as f64 / total_f * 100.0;

        if in_bus_factor {
            counted += 1;
            cutoff = cumulative_percent;
        }

        contributors.push(ContributorOwnership {
            author: author.clone(),
            commits: *commits,
            ownership_percent: *commits as f64 / total_f * 100.0,
            cumulative_percent,
            in_bus_factor,
        },);
    }

    BusFactor {
        bus_factor: Some(counted,),
        ownership_at_cutoff: Some(cutoff,),
        contributors,
    }
}

#[cfg(test)]
mod tests
{
    use proptest::prelude::*;

    use super::*;

    fn counts(pairs: &[(&str, u64,)],) -> Vec<(String, u64,),>
    {
        pairs.iter().map(|(author, count,)| ((*author).to_owned(), *count,),).collect()
    }

    #[test]
    fn dominant_contributor_alone_meets_threshold()
    {
        let result = bus_factor(&counts(&[("C", 10,), ("A", 60,), ("B", 30,),],), 50.0,);

        assert_eq!(result.bus_factor, Some(1));
        assert_eq!(result.ownership_at_cutoff, Some(60.0));
        let order: Vec<&str,> = result.contributors.iter().map(|row| row.author.as_str(),).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
        assert_eq!(result.contributors[1].cumulative_percent, 90.0);
        assert!(!result.contributors[2].in_bus_factor);
        assert_eq!(result.contributors[2].cumulative_percent, 100.0);
    }

    #[test]
    fn evenly_split_history_needs_half_the_team()
    {
        let result = bus_factor(&counts(&[("a", 25,), ("b", 25,), ("c", 25,), ("d", 25,),],), 50.0,);
        assert_eq!(result.bus_factor, Some(2));
        assert_eq!(result.ownership_at_cutoff, Some(50.0));
    }

    #[test]
    fn ties_keep_input_order()
    {
        let result = bus_factor(&counts(&[("late", 5,), ("early", 5,), ("top", 9,),],), 50.0,);
        let order: Vec<&str,> = result.contributors.iter().map(|row| row.author.as_str(),).collect();
        assert_eq!(order, vec!["top", "late", "early"]);
    }

    #[test]
    fn no_commits_yields_nulls()
    {
        assert_eq!(bus_factor(&[], 50.0,), BusFactor::default());
        assert_eq!(bus_factor(&counts(&[("idle", 0,)],), 50.0,).bus_factor, None);
    }

    #[test]
    fn commit_counts_group_by_author()
    {
        let commit = |author: &str| Commit {
            sha: String::new(), author: author.to_owned(), timestamp: None, verified: false,
        };
        let grouped = commit_counts(&[commit("b",), commit("a",), commit("b",),],);
        assert_eq!(grouped, vec![("b".to_owned(), 2), ("a".to_owned(), 1)]);
    }

    proptest! {
        #[test]
        fn cutoff_is_the_smallest_prefix_reaching_threshold(
            raw in proptest::collection::vec(1u64..500, 1..30),
            threshold in 1.0f64..=100.0,
        ) {
            let input: Vec<(String, u64)> =
                raw.iter().enumerate().map(|(i, count)| (format!("dev{i}"), *count)).collect();
            let result = bus_factor(&input, threshold);
            let factor = result.bus_factor.expect("non-empty history");

            prop_assert!(factor >= 1 && factor <= input.len());
            let rows = &result.contributors;
            prop_assert!(rows[factor - 1].cumulative_percent + 1e-9 >= threshold);
            if factor >= 2 {
                prop_assert!(rows[factor - 2].cumulative_percent < threshold + 1e-9);
            }
            for pair in rows.windows(2) {
                prop_assert!(pair[0].cumulative_percent <= pair[1].cumulative_percent);
                prop_assert!(pair[0].commits >= pair[1].commits);
            }
            prop_assert!(rows.iter().take(factor).all(|row| row.in_bus_factor));
            prop_assert!(rows.iter().skip(factor).all(|row| !row.in_bus_factor));
        }
    }
}
