//! Context extraction.
//!
//! Produces the text the Code Agent is given alongside the task: fetched
//! remote content, a file's contents, a directory summary, or the feature
//! text itself. Every payload is bounded by [`MAX_CONTEXT_BYTES`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use devflow_models::{truncate_context, Task, TaskKind, MAX_CONTEXT_BYTES};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::classifier::{expand_path, language_for_extension};
use crate::error::ContextError;

/// Entries listed in a directory summary.
const MAX_LISTING_ENTRIES: usize = 20;

/// Lines taken from the head of each manifest.
const MANIFEST_HEAD_LINES: usize = 50;

/// Well-known files summarized when present at the top of a directory.
const MANIFEST_FILES: &[&str] = &[
    "package.json",
    "requirements.txt",
    "pyproject.toml",
    "Cargo.toml",
    "go.mod",
    "pom.xml",
    "build.gradle",
    "Gemfile",
    "composer.json",
    "Makefile",
    "README.md",
];

/// Dependency, build and virtualenv directories never walked.
const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    "__pycache__",
    "venv",
    "build",
    "dist",
    "target",
    "vendor",
];

/// Extensions counted as markup or data rather than source code.
const NON_CODE_LANGUAGES: &[&str] = &["html", "css", "scss", "json", "yaml", "md"];

/// Fetches remote content.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Fetches at most `limit` bytes from `url`.
    async fn fetch(&self, url: &str, limit: usize, timeout: Duration)
        -> Result<String, ContextError>;
}

/// [`RemoteFetcher`] backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        limit: usize,
        timeout: Duration,
    ) -> Result<String, ContextError> {
        let fetch_error = |reason: String| ContextError::Fetch {
            url: url.to_string(),
            reason,
        };

        let mut response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status)));
        }

        // Stop reading once the limit is reached rather than buffering the
        // whole body.
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| fetch_error(e.to_string()))?
        {
            body.extend_from_slice(&chunk);
            if body.len() >= limit {
                break;
            }
        }
        body.truncate(limit);

        let mut text = String::from_utf8_lossy(&body).into_owned();
        truncate_context(&mut text);
        debug!(url = %url, bytes = text.len(), "fetched remote content");
        Ok(text)
    }
}

/// Builds context payloads for classified tasks.
#[derive(Clone)]
pub struct ContextExtractor {
    fetcher: Arc<dyn RemoteFetcher>,
    fetch_timeout: Duration,
}

impl ContextExtractor {
    pub fn new(fetcher: Arc<dyn RemoteFetcher>, fetch_timeout: Duration) -> Self {
        Self {
            fetcher,
            fetch_timeout,
        }
    }

    /// Returns the context for `task`.
    ///
    /// # Errors
    /// [`ContextError::Fetch`] for remote failures and [`ContextError::Read`]
    /// for unreadable files. Neither is meant to stop a workflow.
    pub async fn extract(&self, task: &Task) -> Result<String, ContextError> {
        let mut context = match task.kind() {
            TaskKind::RemoteResource => {
                self.fetcher
                    .fetch(task.raw_input(), MAX_CONTEXT_BYTES, self.fetch_timeout)
                    .await?
            }
            TaskKind::File => {
                let path = expand_path(task.raw_input());
                let bytes = fs::read(&path).map_err(|source| ContextError::Read {
                    path: path.clone(),
                    source,
                })?;
                String::from_utf8_lossy(&bytes).into_owned()
            }
            TaskKind::Directory => summarize_directory(&expand_path(task.raw_input())),
            TaskKind::FeatureText => task.raw_input().to_string(),
        };
        truncate_context(&mut context);
        Ok(context)
    }
}

/// Hidden entries and, below the root, [`IGNORED_DIRS`].
fn is_pruned(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    name.starts_with('.') || (entry.file_type().is_dir() && IGNORED_DIRS.contains(&name))
}

/// Structural summary of a directory: a bounded recursive file listing
/// followed by the head of each manifest found at the top level.
///
/// Unreadable entries are skipped.
pub fn summarize_directory(root: &Path) -> String {
    let mut summary = format!("Directory: {}\n\nFiles:\n", root.display());

    let files = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_pruned(e))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .take(MAX_LISTING_ENTRIES);

    for entry in files {
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        summary.push_str(&format!("  {}\n", rel.display()));
    }

    for name in MANIFEST_FILES {
        let path = root.join(name);
        if !path.is_file() {
            continue;
        }
        match fs::read_to_string(&path) {
            Ok(content) => {
                summary.push_str(&format!("\n=== {} ===\n", name));
                for line in content.lines().take(MANIFEST_HEAD_LINES) {
                    summary.push_str(line);
                    summary.push('\n');
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable manifest");
            }
        }
    }

    summary
}

/// Whether `path` has the extension of a programming language.
///
/// Markup and data files do not count.
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| language_for_extension(&ext.to_string_lossy()))
        .is_some_and(|lang| !NON_CODE_LANGUAGES.contains(&lang))
}

/// Source files under `root`, sorted by path, at most `limit` of them.
///
/// Only [`is_source_file`] matches are returned. Hidden entries and
/// dependency or build output directories are skipped.
pub fn collect_source_files(root: &Path, limit: usize) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_pruned(e))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && is_source_file(e.path()))
        .take(limit)
        .map(DirEntry::into_path)
        .collect()
}
