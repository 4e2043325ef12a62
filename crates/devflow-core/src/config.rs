//! Workflow configuration.
//!
//! Everything a run needs to know about its environment lives in
//! [`WorkflowConfig`], which is built once and handed to the coordinator.
//! Nothing below reads ambient state after construction.
//!
//! # Storage Structure
//!
//! ```text
//! ~/.devflow/
//! ├── workflows/    # One JSON record per run
//! └── outputs/      # Agent result files, one directory per run
//! ```
//!
//! # Environment Variables
//!
//! - `DEVFLOW_STATE_DIR`: Override the state directory
//! - `DEVFLOW_DEFAULT_LANGUAGE`: Language hint when none can be inferred
//! - `DEVFLOW_TRUNK_BRANCH`: Skip trunk detection and use this branch
//! - `DEVFLOW_REMOTE`: Remote to pull from and push to
//! - `DEVFLOW_CODER_AGENT` / `DEVFLOW_CODER_FALLBACK`: Coder adapter ids
//! - `DEVFLOW_REVIEWER_AGENT` / `DEVFLOW_REVIEWER_FALLBACK`: Reviewer adapter ids
//! - `DEVFLOW_CODER_TIMEOUT_SECS`, `DEVFLOW_REVIEWER_TIMEOUT_SECS`,
//!   `DEVFLOW_FETCH_TIMEOUT_SECS`, `DEVFLOW_PLATFORM_TIMEOUT_SECS`
//! - `DEVFLOW_REVIEW_FOCUS`: general, security, performance or style
//! - `DEVFLOW_AUDIT_MAX_FILES`: Files reviewed per quick directory audit
//! - `DEVFLOW_AUDIT_DEPTH`: quick or deep (deep reviews twice as many files)
//! - `DEVFLOW_GENERATE_TESTS`: Ask the Reviewer for tests of generated code
//! - `DEVFLOW_TEST_FRAMEWORK`: Test framework to target instead of the
//!   language default
//!
//! A fallback set to `none` disables the fallback for that role.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "DEVFLOW_STATE_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".devflow";

const DEFAULT_LANGUAGE: &str = "javascript";
const DEFAULT_REMOTE: &str = "origin";
const DEFAULT_AUDIT_MAX_FILES: usize = 10;

/// Get the default state directory.
///
/// 1. `DEVFLOW_STATE_DIR` environment variable if set
/// 2. `~/.devflow` if home directory is available
/// 3. `.devflow` in current directory as fallback
pub fn default_state_dir() -> PathBuf {
    std::env::var(STATE_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(DEFAULT_STATE_DIR))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
        })
}

/// Per-call timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub coder: Duration,
    pub reviewer: Duration,
    pub fetch: Duration,
    pub platform: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            coder: Duration::from_secs(120),
            reviewer: Duration::from_secs(90),
            fetch: Duration::from_secs(30),
            platform: Duration::from_secs(60),
        }
    }
}

/// Primary and fallback adapter ids for one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentPair {
    pub primary: String,
    pub fallback: Option<String>,
}

impl AgentPair {
    pub fn new(primary: impl Into<String>, fallback: Option<&str>) -> Self {
        Self {
            primary: primary.into(),
            fallback: fallback.map(str::to_string),
        }
    }
}

/// What a review concentrates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewFocus {
    #[default]
    General,
    Security,
    Performance,
    Style,
}

impl ReviewFocus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewFocus::General => "general",
            ReviewFocus::Security => "security",
            ReviewFocus::Performance => "performance",
            ReviewFocus::Style => "style",
        }
    }
}

impl fmt::Display for ReviewFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewFocus {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(ReviewFocus::General),
            "security" => Ok(ReviewFocus::Security),
            "performance" => Ok(ReviewFocus::Performance),
            "style" => Ok(ReviewFocus::Style),
            other => Err(ConfigError::UnknownReviewFocus(other.to_string())),
        }
    }
}

/// How much of a directory an audit covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuditDepth {
    #[default]
    Quick,
    Deep,
}

impl AuditDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditDepth::Quick => "quick",
            AuditDepth::Deep => "deep",
        }
    }
}

impl fmt::Display for AuditDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditDepth {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(AuditDepth::Quick),
            "deep" => Ok(AuditDepth::Deep),
            other => Err(ConfigError::UnknownAuditDepth(other.to_string())),
        }
    }
}

/// Configuration for a workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Language hint used when none can be inferred from the input.
    pub default_language: String,
    /// Trunk branch to use instead of detecting one.
    pub trunk_override: Option<String>,
    /// Remote name for pull and push.
    pub remote: String,
    pub timeouts: Timeouts,
    pub coder: AgentPair,
    pub reviewer: AgentPair,
    pub review_focus: ReviewFocus,
    /// Upper bound on files reviewed by a quick directory audit.
    pub audit_max_files: usize,
    pub audit_depth: AuditDepth,
    /// Generate tests for changed source files after review.
    pub generate_tests: bool,
    /// Overrides the per-language default test framework.
    pub test_framework: Option<String>,
    /// Root for workflow records and agent outputs.
    pub state_dir: PathBuf,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            default_language: DEFAULT_LANGUAGE.to_string(),
            trunk_override: None,
            remote: DEFAULT_REMOTE.to_string(),
            timeouts: Timeouts::default(),
            coder: AgentPair::new("claude-code", Some("gemini")),
            reviewer: AgentPair::new("gemini", Some("claude-code")),
            review_focus: ReviewFocus::default(),
            audit_max_files: DEFAULT_AUDIT_MAX_FILES,
            audit_depth: AuditDepth::default(),
            generate_tests: false,
            test_framework: None,
            state_dir: default_state_dir(),
        }
    }
}

impl WorkflowConfig {
    /// Builds a configuration from `DEVFLOW_*` environment variables.
    ///
    /// # Errors
    /// Returns an error if a numeric or enumerated variable is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Unset keys keep their defaults. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get(STATE_DIR_ENV) {
            config.state_dir = PathBuf::from(dir);
        }
        if let Some(lang) = get("DEVFLOW_DEFAULT_LANGUAGE") {
            config.default_language = lang.trim().to_string();
        }
        if let Some(trunk) = get("DEVFLOW_TRUNK_BRANCH") {
            config.trunk_override = Some(trunk.trim().to_string());
        }
        if let Some(remote) = get("DEVFLOW_REMOTE") {
            config.remote = remote.trim().to_string();
        }

        if let Some(primary) = get("DEVFLOW_CODER_AGENT") {
            config.coder.primary = primary.trim().to_string();
        }
        if let Some(fallback) = get("DEVFLOW_CODER_FALLBACK") {
            config.coder.fallback = parse_fallback(&fallback);
        }
        if let Some(primary) = get("DEVFLOW_REVIEWER_AGENT") {
            config.reviewer.primary = primary.trim().to_string();
        }
        if let Some(fallback) = get("DEVFLOW_REVIEWER_FALLBACK") {
            config.reviewer.fallback = parse_fallback(&fallback);
        }

        let secs = |key: &str, current: Duration| -> Result<Duration, ConfigError> {
            match get(key) {
                Some(v) => parse_positive(key, &v).map(Duration::from_secs),
                None => Ok(current),
            }
        };
        config.timeouts.coder = secs("DEVFLOW_CODER_TIMEOUT_SECS", config.timeouts.coder)?;
        config.timeouts.reviewer = secs("DEVFLOW_REVIEWER_TIMEOUT_SECS", config.timeouts.reviewer)?;
        config.timeouts.fetch = secs("DEVFLOW_FETCH_TIMEOUT_SECS", config.timeouts.fetch)?;
        config.timeouts.platform = secs("DEVFLOW_PLATFORM_TIMEOUT_SECS", config.timeouts.platform)?;

        if let Some(focus) = get("DEVFLOW_REVIEW_FOCUS") {
            config.review_focus = focus.parse()?;
        }
        if let Some(max) = get("DEVFLOW_AUDIT_MAX_FILES") {
            config.audit_max_files = parse_positive("DEVFLOW_AUDIT_MAX_FILES", &max)? as usize;
        }
        if let Some(depth) = get("DEVFLOW_AUDIT_DEPTH") {
            config.audit_depth = depth.parse()?;
        }
        if let Some(flag) = get("DEVFLOW_GENERATE_TESTS") {
            config.generate_tests = parse_flag("DEVFLOW_GENERATE_TESTS", &flag)?;
        }
        if let Some(framework) = get("DEVFLOW_TEST_FRAMEWORK") {
            config.test_framework = Some(framework.trim().to_string());
        }

        Ok(config)
    }

    /// Files a directory audit reviews at the configured depth.
    pub fn audit_file_limit(&self) -> usize {
        match self.audit_depth {
            AuditDepth::Quick => self.audit_max_files,
            AuditDepth::Deep => self.audit_max_files.saturating_mul(2),
        }
    }

    /// Directory holding workflow records.
    pub fn records_dir(&self) -> PathBuf {
        self.state_dir.join("workflows")
    }
}

fn parse_fallback(value: &str) -> Option<String> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
