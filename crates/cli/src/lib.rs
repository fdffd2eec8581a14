//! cfgvault CLI library
//!
//! Argument parsing, tracing setup and command implementations for the
//! `cfgvault` binary. The binary itself only wires these together so the
//! commands can be tested without spawning a process.

pub mod cli;
pub mod commands;
pub mod tracing;

pub use cli::{CliError, EXIT_CLI, EXIT_OK, EXIT_RESOLVE, exit_code_for, render_error};
