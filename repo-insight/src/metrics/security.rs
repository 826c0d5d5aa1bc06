// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Security and compliance indicators.

use serde::Serialize;

use super::{mean, round2};
use crate::{
    models::{Branch, Commit, SecurityAlert},
    time::days_between,
};

#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct SecuritySummary
{
    pub open_alerts:            usize,
    /// Mean days from alert creation to fix, `None` without fixed alerts.
    pub avg_remediation_days:   Option<f64,>,
    /// Verified commits as a percentage, `0` without commits.
    pub signed_commits_percent: f64,
    pub protected_branches:     usize,
}

pub fn open_alerts(alerts: &[SecurityAlert],) -> usize
{
    alerts.iter().filter(|alert| alert.is_open(),).count()
}

/// Alerts lacking either instant, or fixed before creation, are skipped.
pub fn average_remediation_days(alerts: &[SecurityAlert],) -> Option<f64,>
{
    let durations: Vec<f64,> = alerts
        .iter()
        .filter_map(|alert| Some(days_between(alert.created_at?, alert.fixed_at?,),),)
        .filter(|days| *days >= 0.0,)
        .collect();
    mean(&durations,).map(round2,)
}

pub fn signed_commits_percent(commits: &[Commit],) -> f64
{
    if commits.is_empty() {
        return 0.0;
    }
    let signed = commits.iter().filter(|commit| commit.verified,).count();
    round2(signed as f64 / commits.len() as f64 * 100.0,)
}

pub fn protected_branches(branches: &[Branch],) -> usize
{
    branches.iter().filter(|branch| branch.protected,).count()
}

pub fn security_summary(alerts: &[SecurityAlert], commits: &[Commit], branches: &[Branch],) -> SecuritySummary
{
    SecuritySummary {
        open_alerts:            open_alerts(alerts,),
        avg_remediation_days:   average_remediation_days(alerts,),
        signed_commits_percent: signed_commits_percent(commits,),
        protected_branches:     protected_branches(branches,),
    }
}
