//! Branch state for a workflow run.

use serde::{Deserialize, Serialize};

/// Prefix shared by every feature branch.
pub const FEATURE_PREFIX: &str = "feature/";

/// Derives the feature branch name for a slug.
///
/// The mapping is pure, so re-running a workflow for the same input lands on
/// the same branch.
pub fn feature_branch_name(slug: &str) -> String {
    format!("{}{}", FEATURE_PREFIX, slug)
}

/// Repository branch state as seen by a workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchState {
    /// Resolved trunk branch (`main`, `master`, or the remote default).
    pub trunk_name: String,
    /// `feature/<slug>`.
    pub feature_branch_name: String,
    /// Whether the working tree was clean on entry.
    pub is_clean: bool,
    /// Whether the feature branch exists locally.
    pub exists_locally: bool,
    /// Whether uncommitted changes were stashed on entry.
    #[serde(default)]
    pub stashed: bool,
    /// Whether an existing feature branch was resumed rather than created.
    #[serde(default)]
    pub resumed: bool,
    /// Why refreshing trunk from the remote failed, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_error: Option<String>,
}

impl BranchState {
    /// Feature branch name without the `feature/` prefix.
    pub fn feature_suffix(&self) -> &str {
        self.feature_branch_name
            .strip_prefix(FEATURE_PREFIX)
            .unwrap_or(&self.feature_branch_name)
    }
}
