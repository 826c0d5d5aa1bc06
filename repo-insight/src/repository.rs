// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Repository identifiers supplied on the command line.
//!
//! Identifiers use the `owner/repo` form accepted by GitHub. Parsing rejects
//! anything else before a single request is made, and a lowercase hyphenated
//! slug is derived for report filenames.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::error::Error;

static IDENTIFIER: LazyLock<Regex,> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9](?:[A-Za-z0-9-]{0,38}))/([A-Za-z0-9._-]{1,100})$",)
        .expect("repository identifier pattern is valid",)
},);

/// Owner and repository name pair identifying a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize,)]
pub struct RepositoryId
{
    /// Account or organization that owns the repository.
    pub owner: String,
    /// Repository name.
    pub name:  String,
}

impl RepositoryId
{
    /// Parses an `owner/repo` identifier.
    ///
    /// Surrounding whitespace is ignored. The owner follows GitHub login rules
    /// and the name may contain alphanumerics, `.`, `_`, and `-`, but not dots
    /// alone (`.` and `..` would escape the repository path).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the identifier does not match the
    /// `owner/repo` form.
    ///
    /// # Examples
    ///
    /// ```
    /// use repo_insight::RepositoryId;
    ///
    /// let id = RepositoryId::parse(" apache/airflow ",)?;
    /// assert_eq!(id.owner, "apache");
    /// assert_eq!(id.name, "airflow");
    /// # Ok::<(), repo_insight::Error>(())
    /// ```
    pub fn parse(raw: &str,) -> Result<Self, Error,>
    {
        let trimmed = raw.trim();
        let captures = IDENTIFIER.captures(trimmed,).ok_or_else(|| {
            Error::config(format!("repository must use the owner/repo format, got '{trimmed}'"),)
        },)?;

        if captures[2].chars().all(|ch| ch == '.',) {
            return Err(Error::config(format!("repository name cannot consist of dots only, got '{trimmed}'"),),);
        }

        Ok(Self {
            owner: captures[1].to_owned(), name: captures[2].to_owned(),
        },)
    }

    /// Derives a filesystem-friendly slug such as `apache-airflow`.
    ///
    /// The slug contains lowercase ASCII alphanumerics separated by single
    /// hyphens; runs of punctuation collapse into one separator.
    pub fn slug(&self,) -> String
    {
        let joined = format!("{}-{}", self.owner, self.name);
        let mut slug = String::with_capacity(joined.len(),);
        let mut pending_separator = false;

        for candidate in joined.chars() {
            if candidate.is_ascii_alphanumeric() {
                if pending_separator && !slug.is_empty() {
                    slug.push('-',);
                }
                slug.push(candidate.to_ascii_lowercase(),);
                pending_separator = false;
            } else {
                pending_separator = true;
            }
        }

        slug
    }

    /// Search qualifier used by GraphQL issue searches, e.g. `repo:o/r`.
    pub fn search_qualifier(&self,) -> String
    {
        format!("repo:{}/{}", self.owner, self.name)
    }

    /// REST path prefix for repository-scoped endpoints.
    pub fn api_path(&self,) -> String
    {
        format!("/repos/{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryId
{
    type Err = Error;

    fn from_str(raw: &str,) -> Result<Self, Self::Err,>
    {
        Self::parse(raw,)
    }
}
