//! Devflow Core - everything that happens before the repository is touched.
//!
//! - **config**: the explicit configuration object a workflow runs with
//! - **classifier**: turns raw input into a [`Task`](devflow_models::Task)
//! - **context**: builds the bounded context payload for the Code Agent

pub mod classifier;
pub mod config;
pub mod context;
pub mod error;

pub use classifier::{expand_path, language_for_extension, Classifier};
pub use config::{AgentPair, AuditDepth, ReviewFocus, Timeouts, WorkflowConfig};
pub use context::{
    collect_source_files, is_source_file, summarize_directory, ContextExtractor, HttpFetcher,
    RemoteFetcher,
};
pub use error::{ClassificationError, ConfigError, ContextError};
