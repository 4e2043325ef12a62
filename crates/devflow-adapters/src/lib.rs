//! Agent adapters for command-line coding assistants.
//!
//! # Key Concepts
//!
//! - **AgentAdapter**: how to launch one tool (program and arguments per access level)
//! - **AdapterRegistry**: built-in adapters, looked up by id or alias
//! - **CapabilityProvider**: resolves an id to `Available(tool)` or
//!   `Unavailable { reason }`
//! - **process**: runs a tool with its prompt on stdin under a timeout
//!
//! # Example
//!
//! ```no_run
//! use devflow_adapters::{Capability, CapabilityProvider, SystemProvider};
//!
//! let provider = SystemProvider::default();
//! match provider.resolve("cc") {
//!     Capability::Available(tool) => println!("{} is ready", tool.id()),
//!     Capability::Unavailable { tool, reason } => println!("{}: {}", tool, reason),
//! }
//! ```

pub mod capability;
pub mod claude_code;
pub mod gemini;
pub mod process;
pub mod registry;
pub mod traits;

pub use capability::{AgentTool, Capability, CapabilityProvider, SubprocessTool, SystemProvider};
pub use claude_code::ClaudeCodeAdapter;
pub use gemini::GeminiAdapter;
pub use process::{run_with_stdin, ExecError};
pub use registry::AdapterRegistry;
pub use traits::{AdapterInfo, AgentAdapter};
