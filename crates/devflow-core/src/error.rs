//! Error types for configuration, classification and context extraction.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid configuration value.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidNumber { key: String, value: String },

    #[error("unknown review focus '{0}' (expected general, security, performance or style)")]
    UnknownReviewFocus(String),

    #[error("unknown audit depth '{0}' (expected quick or deep)")]
    UnknownAuditDepth(String),

    #[error("{key} must be true or false, got '{value}'")]
    InvalidFlag { key: String, value: String },
}

/// Input could not be classified.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("input is empty")]
    EmptyInput,
}

/// Context could not be extracted.
///
/// These are never fatal to a workflow; the caller continues with whatever
/// context it has.
#[derive(Error, Debug)]
pub enum ContextError {
    /// Remote content could not be fetched.
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Local content could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
