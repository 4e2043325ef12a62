//! Feature branch lifecycle.
//!
//! The branch manager moves a working tree through
//!
//! ```text
//! Dirty --stash--> Clean --checkout trunk, pull--> OnTrunk --checkout/create--> OnFeatureBranch
//! ```
//!
//! Stashed changes are left in the stash.

use std::sync::Arc;

use devflow_models::{feature_branch_name, BranchState, Task};
use tracing::{debug, info, warn};

use crate::error::BranchError;
use crate::vcs::VersionControl;

/// Trunk used when nothing else can be detected.
const FALLBACK_TRUNK: &str = "master";
const PREFERRED_TRUNK: &str = "main";

/// Where the working tree is in the branch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchPhase {
    Dirty,
    Clean,
    OnTrunk,
    OnFeatureBranch,
}

/// Prepares the feature branch for a task.
#[derive(Clone)]
pub struct BranchManager {
    vcs: Arc<dyn VersionControl>,
    remote: String,
    trunk_override: Option<String>,
}

impl BranchManager {
    pub fn new(
        vcs: Arc<dyn VersionControl>,
        remote: impl Into<String>,
        trunk_override: Option<String>,
    ) -> Self {
        Self {
            vcs,
            remote: remote.into(),
            trunk_override,
        }
    }

    /// Resolves the trunk branch.
    ///
    /// Order: configured override, the remote's default branch, a local
    /// `main`, then `master`.
    pub fn resolve_trunk(&self) -> Result<String, BranchError> {
        if let Some(trunk) = &self.trunk_override {
            return Ok(trunk.clone());
        }
        if let Some(default) = self.vcs.remote_default_branch(&self.remote)? {
            return Ok(default);
        }
        if self.vcs.local_branch_exists(PREFERRED_TRUNK)? {
            return Ok(PREFERRED_TRUNK.to_string());
        }
        Ok(FALLBACK_TRUNK.to_string())
    }

    /// Leaves the working tree on `feature/<slug>`, creating the branch from
    /// trunk or resuming it if it already exists.
    ///
    /// Calling this again for the same task lands on the same branch.
    ///
    /// # Errors
    /// [`BranchError::NotARepository`] before touching anything if the
    /// directory is not a working tree; other variants if a checkout fails.
    pub fn ensure_feature_branch(&self, task: &Task) -> Result<BranchState, BranchError> {
        if !self.vcs.is_repository() {
            return Err(BranchError::NotARepository(self.vcs.workdir().to_path_buf()));
        }

        let feature = feature_branch_name(task.slug());
        let is_clean = !self.vcs.has_uncommitted_changes()?;
        let mut phase = if is_clean {
            BranchPhase::Clean
        } else {
            BranchPhase::Dirty
        };
        debug!(?phase, "branch phase");

        let mut stashed = false;
        if phase == BranchPhase::Dirty {
            let message = format!("devflow: auto-stash before {}", feature);
            self.vcs.stash(&message)?;
            stashed = true;
            phase = self.transition(phase, BranchPhase::Clean);
            info!(message = %message, "stashed uncommitted changes");
        }

        let trunk = self.resolve_trunk()?;
        if self.vcs.current_branch()?.as_deref() != Some(trunk.as_str()) {
            self.vcs
                .checkout(&trunk)
                .map_err(|source| BranchError::TrunkCheckout {
                    branch: trunk.clone(),
                    source,
                })?;
        }
        phase = self.transition(phase, BranchPhase::OnTrunk);

        let pull_error = self.refresh_trunk(&trunk);

        let exists_locally = self.vcs.local_branch_exists(&feature)?;
        if exists_locally {
            self.vcs.checkout(&feature)?;
            info!(branch = %feature, "resumed existing feature branch");
        } else {
            self.vcs.create_branch(&feature, &trunk)?;
            info!(branch = %feature, trunk = %trunk, "created feature branch");
        }
        self.transition(phase, BranchPhase::OnFeatureBranch);

        Ok(BranchState {
            trunk_name: trunk,
            feature_branch_name: feature,
            is_clean,
            exists_locally,
            stashed,
            resumed: exists_locally,
            pull_error,
        })
    }

    /// Pulls trunk when a remote is configured. Returns the failure, if any.
    fn refresh_trunk(&self, trunk: &str) -> Option<String> {
        match self.vcs.remote_url(&self.remote) {
            Ok(Some(_)) => match self.vcs.pull(&self.remote, trunk) {
                Ok(()) => None,
                Err(e) => {
                    warn!(remote = %self.remote, trunk = %trunk, error = %e, "pull failed, continuing from local trunk");
                    Some(e.to_string())
                }
            },
            Ok(None) => {
                debug!(remote = %self.remote, "no remote configured, skipping pull");
                None
            }
            Err(e) => {
                warn!(remote = %self.remote, error = %e, "could not inspect remote");
                Some(e.to_string())
            }
        }
    }

    fn transition(&self, from: BranchPhase, to: BranchPhase) -> BranchPhase {
        debug!(?from, ?to, "branch phase transition");
        to
    }
}
