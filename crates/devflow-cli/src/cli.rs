//! Command-line interface definition using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use devflow_core::{AuditDepth, ReviewFocus};

fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("DEVFLOW_GIT_HASH");
    const BUILD_DATE: &str = env!("DEVFLOW_BUILD_DATE");

    // "0.1.0 (abc1234, 2026-01-29)"
    static VERSION_STRING: std::sync::OnceLock<String> = std::sync::OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} ({}, {})", VERSION, GIT_HASH, BUILD_DATE))
}

/// Devflow - drive coding agents from a task to a merge request
#[derive(Parser, Debug)]
#[command(name = "devflow")]
#[command(author, version = version_string(), about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Repository to work in (default: current directory)
    #[arg(short, long, env = "DEVFLOW_REPO", global = true)]
    pub repo: Option<PathBuf>,

    /// Path to state directory
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Implement a feature from a description, file, directory or URL
    Feature {
        /// What to build
        #[arg(required = true)]
        input: String,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Write integration code for a remote resource
    Integrate {
        /// URL of the resource (API docs, schema, ...)
        #[arg(required = true)]
        input: String,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Review a file, directory or URL without changing anything
    Audit {
        /// What to review
        #[arg(required = true)]
        input: String,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Show agent adapters and whether they are installed
    Agents,
}

/// Options shared by the workflow commands.
#[derive(Args, Debug, Default)]
pub struct RunOptions {
    /// Language hint when none can be inferred
    #[arg(short, long)]
    pub language: Option<String>,

    /// Trunk branch to start from (default: detected)
    #[arg(long)]
    pub trunk: Option<String>,

    /// Review focus: general, security, performance or style
    #[arg(long, value_parser = parse_focus)]
    pub review_focus: Option<ReviewFocus>,

    /// Accept the proposed commit message without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Generate tests for changed source files before committing
    #[arg(long)]
    pub with_tests: bool,

    /// Test framework for generated tests (default: per language)
    #[arg(long)]
    pub test_framework: Option<String>,

    /// Audit depth: quick or deep
    #[arg(long, value_parser = parse_depth)]
    pub audit_depth: Option<AuditDepth>,
}

fn parse_focus(value: &str) -> Result<ReviewFocus, String> {
    value.parse().map_err(|e: devflow_core::ConfigError| e.to_string())
}

fn parse_depth(value: &str) -> Result<AuditDepth, String> {
    value.parse().map_err(|e: devflow_core::ConfigError| e.to_string())
}

impl Cli {
    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
