//! Task types for Devflow.
//!
//! A task is the classified form of the single free-form input a workflow
//! run starts from. It is built once, then handed by value through the
//! pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on the context payload carried by a task, in bytes.
pub const MAX_CONTEXT_BYTES: usize = 10_000;

/// What kind of input a task was classified from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// A `scheme://` resource such as a documentation URL.
    RemoteResource,
    /// An existing regular file.
    File,
    /// An existing directory.
    Directory,
    /// Free text describing a feature.
    FeatureText,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskKind::RemoteResource => "remote-resource",
            TaskKind::File => "file",
            TaskKind::Directory => "directory",
            TaskKind::FeatureText => "feature-text",
        };
        f.write_str(label)
    }
}

/// A classified unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    raw_input: String,
    kind: TaskKind,
    slug: String,
    language_hint: String,
    #[serde(default)]
    context: String,
}

impl Task {
    /// Creates a task with an empty context.
    pub fn new(
        raw_input: impl Into<String>,
        kind: TaskKind,
        slug: impl Into<String>,
        language_hint: impl Into<String>,
    ) -> Self {
        Self {
            raw_input: raw_input.into(),
            kind,
            slug: slug.into(),
            language_hint: language_hint.into(),
            context: String::new(),
        }
    }

    /// Returns the task carrying `context`, truncated to [`MAX_CONTEXT_BYTES`].
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let mut context = context.into();
        truncate_context(&mut context);
        self.context = context;
        self
    }

    /// The input exactly as the caller supplied it.
    pub fn raw_input(&self) -> &str {
        &self.raw_input
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Branch-safe identifier derived from the input.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn language_hint(&self) -> &str {
        &self.language_hint
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

/// Replaces every character outside `[A-Za-z0-9]` with `-` and lower-cases
/// the result.
pub fn sanitize_slug(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

/// Truncates `text` in place to at most [`MAX_CONTEXT_BYTES`], backing off
/// to the nearest character boundary.
pub fn truncate_context(text: &mut String) {
    if text.len() <= MAX_CONTEXT_BYTES {
        return;
    }
    let mut end = MAX_CONTEXT_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}
