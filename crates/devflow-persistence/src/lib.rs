//! Persistence layer for Devflow.
//!
//! Two stores live under the state directory:
//!
//! - [`RecordStore`]: one JSON document per workflow run, append-only
//! - [`OutputStore`]: agent result files scoped to a single run
//!
//! All writes go through [`atomic`] (write to temp file, then rename).
//!
//! # Example
//!
//! ```no_run
//! use devflow_persistence::RecordStore;
//!
//! let store = RecordStore::new("/home/user/.devflow");
//! # let record: devflow_models::WorkflowRecord = unimplemented!();
//! let path = store.append(&record).unwrap();
//! println!("record written to {}", path.display());
//! ```

pub mod atomic;
pub mod error;
pub mod output_store;
pub mod record_store;

pub use error::{PersistenceError, Result};
pub use output_store::OutputStore;
pub use record_store::RecordStore;
