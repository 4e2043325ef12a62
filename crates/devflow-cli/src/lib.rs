//! Devflow CLI library.
//!
//! Argument parsing, command handlers and the terminal commit message
//! confirmer behind the `devflow` binary.

pub mod cli;
pub mod commands;
pub mod confirm;
