#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the repo-insight crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.
//!
//! Errors fall into four groups: configuration problems detected before any
//! network call, transient API failures that the retry loop absorbs, definitive
//! API failures that propagate immediately, and report-writing failures that
//! the exporter logs and skips.

use std::path::{Path, PathBuf};

/// Unified error type returned by the client, fetchers, and report writers.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Fatal startup problem such as a missing token or malformed repository.
    #[error("configuration error: {message}")]
    Config {
        /// Human readable description of the configuration problem.
        message: String
    },
    /// Returned when user-supplied values violate invariants.
    #[error("invalid input: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// Wraps YAML decoding errors for the optional tuning document.
    #[error("failed to parse configuration: {source}")]
    ConfigParse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Wraps I/O errors that occur while reading the tuning document.
    #[error("failed to read configuration from {path:?}: {source}")]
    ConfigIo {
        /// Location of the configuration file.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Non-success HTTP status returned by the remote API.
    #[error("GitHub API returned {status} for {endpoint}: {message}")]
    Http {
        /// HTTP status code.
        status:       u16,
        /// Endpoint that produced the status.
        endpoint:     String,
        /// Response body or reason supplied by the API.
        message:      String,
        /// Whether the status reflects an exhausted rate limit.
        rate_limited: bool
    },
    /// Connection, timeout, or other transport-level failure.
    #[error("transport failure for {endpoint}: {message}")]
    Transport {
        /// Endpoint being requested.
        endpoint: String,
        /// Description of the failure.
        message:  String
    },
    /// GraphQL responses carrying an `errors` array.
    #[error("GraphQL errors: {message}")]
    GraphQl {
        /// Serialized error list returned by the API.
        message: String
    },
    /// Wraps JSON decoding errors for API payloads.
    #[error("failed to decode API payload: {source}")]
    Decode {
        /// Underlying serde_json error.
        source: serde_json::Error
    },
    /// Wraps I/O errors that occur while writing report artifacts.
    #[error("failed to write report at {path:?}: {source}")]
    ReportIo {
        /// Location of the report being produced.
        path:   PathBuf,
        /// Underlying I/O error reported by the operating system.
        source: std::io::Error
    },
    /// Encoder failure reported by the CSV or PDF backend.
    #[error("failed to render report at {path:?}: {message}")]
    Report {
        /// Location of the report being produced.
        path:    PathBuf,
        /// Description of the encoder failure.
        message: String
    }
}

impl Error {
    /// Constructs a configuration error.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the configuration failure.
    pub fn config<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Config {
            message: message.into()
        }
    }

    /// Constructs a validation error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the validation failure.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs a report encoder error for the given artifact.
    pub fn report<M>(path: &Path, message: M) -> Self
    where
        M: Into<String>
    {
        Self::Report {
            path:    path.to_path_buf(),
            message: message.into()
        }
    }

    /// Returns `true` when retrying the same request may succeed.
    ///
    /// Rate limits, server errors, and transport failures are transient. Other
    /// client errors, decoding errors, and GraphQL errors are definitive.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http {
                status,
                rate_limited,
                ..
            } => *rate_limited || *status == 429 || (500..=599).contains(status),
            Self::Transport {
                ..
            } => true,
            _ => false
        }
    }

    /// Returns the HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http {
                status, ..
            } => Some(*status),
            _ => None
        }
    }

    /// Formats the error for diagnostics without the variant name.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::ConfigParse {
            source
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Decode {
            source
        }
    }
}

/// Creates an [`Error::ConfigIo`] variant capturing the failing path and
/// source.
pub fn config_io_error(path: &Path, source: std::io::Error) -> Error {
    Error::ConfigIo {
        path: path.to_path_buf(),
        source
    }
}

/// Creates an [`Error::ReportIo`] variant capturing the failing path and
/// source.
///
/// # Parameters
///
/// * `path` - Location of the report artifact that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn report_io_error(path: &Path, source: std::io::Error) -> Error {
    Error::ReportIo {
        path: path.to_path_buf(),
        source
    }
}
