//! Secret fetcher implementations
//!
//! This module provides built-in fetchers that require no network access:
//!
//! - [`MemoryFetcher`] - Records held in memory
//! - [`FileFetcher`] - Records read from a JSON document on disk
//!
//! Additional backends are available via separate crates:
//!
//! - `vault` - HashiCorp Vault (cfgvault-vault crate)

mod file;
mod memory;

pub use file::FileFetcher;
pub use memory::MemoryFetcher;
