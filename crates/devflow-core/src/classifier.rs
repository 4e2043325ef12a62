//! Input classification.
//!
//! Decides what a raw input string refers to and derives the slug that
//! names the feature branch. The URI check runs first, so a URL is never
//! mistaken for a local path that happens to share its name.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::Utc;
use devflow_models::{sanitize_slug, Task, TaskKind};
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::error::ClassificationError;

/// Last path segments treated as carrying no meaning of their own.
const INDEX_NAMES: &[&str] = &[
    "index",
    "index.html",
    "index.htm",
    "index.php",
    "default.htm",
    "default.html",
    "default.aspx",
];

/// Prefix of the slug used when a URL has no usable path segment.
const WEB_CONTENT_PREFIX: &str = "web-content-";

fn uri_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("URI pattern is valid")
    })
}

/// Maps a file extension to a language name.
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    let lang = match ext.to_ascii_lowercase().as_str() {
        "js" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "py" => "python",
        "go" => "go",
        "java" => "java",
        "cpp" | "cc" | "cxx" => "cpp",
        "c" => "c",
        "cs" => "csharp",
        "php" => "php",
        "rb" => "ruby",
        "rs" => "rust",
        "swift" => "swift",
        "kt" => "kotlin",
        "html" => "html",
        "css" => "css",
        "scss" => "scss",
        "json" => "json",
        "yaml" => "yaml",
        "md" => "md",
        _ => return None,
    };
    Some(lang)
}

/// Classifies raw input into a [`Task`].
#[derive(Debug, Clone)]
pub struct Classifier {
    default_language: String,
}

impl Classifier {
    /// Creates a classifier that falls back to `default_language` when the
    /// input carries no recognizable language.
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            default_language: default_language.into(),
        }
    }

    /// Classifies `raw`.
    ///
    /// # Errors
    /// Returns [`ClassificationError::EmptyInput`] if `raw` is blank.
    pub fn classify(&self, raw: &str) -> Result<Task, ClassificationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ClassificationError::EmptyInput);
        }

        let task = if uri_pattern().is_match(raw) {
            Task::new(
                raw,
                TaskKind::RemoteResource,
                url_slug(raw, Utc::now().timestamp()),
                &self.default_language,
            )
        } else {
            let path = expand_path(raw);
            if path.is_file() {
                let slug = path
                    .file_stem()
                    .map(|s| sanitize_slug(&s.to_string_lossy()))
                    .unwrap_or_else(|| sanitize_slug(raw));
                let language = path
                    .extension()
                    .and_then(|e| language_for_extension(&e.to_string_lossy()))
                    .unwrap_or(self.default_language.as_str())
                    .to_string();
                Task::new(raw, TaskKind::File, slug, language)
            } else if path.is_dir() {
                Task::new(
                    raw,
                    TaskKind::Directory,
                    directory_slug(&path),
                    &self.default_language,
                )
            } else {
                Task::new(
                    raw,
                    TaskKind::FeatureText,
                    sanitize_slug(raw),
                    &self.default_language,
                )
            }
        };

        debug!(kind = %task.kind(), slug = %task.slug(), language = %task.language_hint(), "classified input");
        Ok(task)
    }
}

/// Expands a leading `~` so home-relative paths resolve.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Slug for a URL: its last non-empty path segment, unless that segment is
/// missing or an index page.
fn url_slug(raw: &str, now_unix: i64) -> String {
    let segment = last_path_segment(raw);
    match segment {
        Some(seg) if !INDEX_NAMES.contains(&seg.to_ascii_lowercase().as_str()) => {
            sanitize_slug(&seg)
        }
        _ => format!("{}{}", WEB_CONTENT_PREFIX, now_unix),
    }
}

fn last_path_segment(raw: &str) -> Option<String> {
    match Url::parse(raw) {
        Ok(url) => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string),
        Err(_) => {
            // Not parseable as a URL; split what follows the authority by hand.
            let rest = raw.split_once("://").map(|(_, r)| r)?;
            let path = rest.split(['?', '#']).next()?;
            let (_, path) = path.split_once('/')?;
            path.split('/')
                .filter(|s| !s.is_empty())
                .last()
                .map(str::to_string)
        }
    }
}

fn directory_slug(path: &Path) -> String {
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    resolved
        .file_name()
        .map(|n| sanitize_slug(&n.to_string_lossy()))
        .unwrap_or_else(|| "root".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn is_slug_safe(slug: &str) -> bool {
        slug.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }

    #[test]
    fn test_empty_input_fails() {
        let classifier = Classifier::new("javascript");
        assert_eq!(classifier.classify(""), Err(ClassificationError::EmptyInput));
        assert_eq!(classifier.classify("   "), Err(ClassificationError::EmptyInput));
    }

    #[test]
    fn test_url_uses_last_segment() {
        let classifier = Classifier::new("javascript");
        let task = classifier.classify("https://api.example.com/docs").unwrap();
        assert_eq!(task.kind(), TaskKind::RemoteResource);
        assert_eq!(task.slug(), "docs");
        assert_eq!(task.language_hint(), "javascript");
    }

    #[test]
    fn test_url_ignores_query_and_trailing_slash() {
        assert_eq!(url_slug("https://example.com/api/Users/?page=2#top", 1), "users");
        assert_eq!(url_slug("https://example.com/guide.html", 1), "guide-html");
    }

    #[test]
    fn test_url_without_path_or_with_index() {
        assert_eq!(url_slug("https://example.com", 42), "web-content-42");
        assert_eq!(url_slug("https://example.com/", 42), "web-content-42");
        assert_eq!(url_slug("https://example.com/docs/index.html", 7), "web-content-7");
        assert_eq!(url_slug("https://example.com/INDEX", 7), "web-content-7");
    }

    #[test]
    fn test_url_fallback_uses_current_time() {
        let classifier = Classifier::new("javascript");
        let task = classifier.classify("https://example.com").unwrap();
        let suffix = task.slug().strip_prefix("web-content-").unwrap();
        assert!(suffix.parse::<i64>().unwrap() > 0);
    }

    #[test]
    fn test_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("auth.py");
        fs::write(&path, "def login(): pass\n").unwrap();

        let classifier = Classifier::new("javascript");
        let task = classifier.classify(path.to_str().unwrap()).unwrap();
        assert_eq!(task.kind(), TaskKind::File);
        assert_eq!(task.slug(), "auth");
        assert_eq!(task.language_hint(), "python");
    }

    #[test]
    fn test_file_slugs_are_safe() {
        let dir = tempdir().unwrap();
        let classifier = Classifier::new("javascript");
        for name in ["My Component.tsx", "weird_name!!.rs", "UPPER.Go", "no_ext"] {
            let path = dir.path().join(name);
            fs::write(&path, "x").unwrap();
            let task = classifier.classify(path.to_str().unwrap()).unwrap();
            assert_eq!(task.kind(), TaskKind::File);
            assert!(is_slug_safe(task.slug()), "unsafe slug {}", task.slug());
        }
    }

    #[test]
    fn test_unknown_extension_keeps_default_language() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "x").unwrap();

        let task = Classifier::new("go").classify(path.to_str().unwrap()).unwrap();
        assert_eq!(task.language_hint(), "go");
    }

    #[test]
    fn test_existing_directory() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("Payment_Service");
        fs::create_dir(&project).unwrap();

        let task = Classifier::new("javascript")
            .classify(project.to_str().unwrap())
            .unwrap();
        assert_eq!(task.kind(), TaskKind::Directory);
        assert_eq!(task.slug(), "payment-service");
    }

    #[test]
    fn test_feature_text() {
        let task = Classifier::new("python")
            .classify("payment retries with backoff")
            .unwrap();
        assert_eq!(task.kind(), TaskKind::FeatureText);
        assert_eq!(task.slug(), "payment-retries-with-backoff");
        assert_eq!(task.raw_input(), "payment retries with backoff");
    }

    #[test]
    fn test_language_table() {
        assert_eq!(language_for_extension("jsx"), Some("javascript"));
        assert_eq!(language_for_extension("TSX"), Some("typescript"));
        assert_eq!(language_for_extension("cxx"), Some("cpp"));
        assert_eq!(language_for_extension("cs"), Some("csharp"));
        assert_eq!(language_for_extension("kt"), Some("kotlin"));
        assert_eq!(language_for_extension("yaml"), Some("yaml"));
        assert_eq!(language_for_extension("zig"), None);
    }
}
