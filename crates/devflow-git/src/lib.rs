//! Devflow Git - version control capability and branch lifecycle.
//!
//! - [`VersionControl`]: the operations a workflow needs from a working tree
//! - [`GitCli`]: implementation over the `git` binary
//! - [`InMemoryRepository`]: recording fake for tests
//! - [`BranchManager`]: stash, resolve trunk, create or resume `feature/<slug>`

pub mod branch;
pub mod cli;
pub mod error;
pub mod memory;
pub mod vcs;

pub use branch::{BranchManager, BranchPhase};
pub use cli::GitCli;
pub use error::{BranchError, GitError, Result};
pub use memory::InMemoryRepository;
pub use vcs::VersionControl;
