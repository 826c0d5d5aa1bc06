// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! GitHub repository metrics aggregation.
//!
//! The crate fetches commits, issues, pull requests, branches, and security
//! alerts through a retrying REST/GraphQL client, folds them into activity and
//! quality metrics, and writes the results as CSV files and an optional PDF
//! summary. Metric calculators are pure functions over typed records and can
//! be used without any network access.

pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod metrics;
pub mod models;
pub mod paginate;
pub mod pipeline;
pub mod report;
pub mod repository;
pub mod retry;
pub mod time;

pub use client::{GitHubClient, OctocrabTransport, Transport};
pub use config::{Settings, Tuning, load_tuning, parse_tuning};
pub use error::Error;
pub use pipeline::{Mode, Pipeline};
pub use repository::RepositoryId;
pub use retry::RetryConfig;
