//! `HashiCorp` Vault integration for cfgvault
//!
//! This crate provides the Vault backend for `cfgvault-secrets`:
//! - [`VaultFetcher`]: reads secret records over the HTTP API, or through
//!   the `vault` CLI when no token is available
//! - [`VaultConfig`]: address, token and timeouts, usually from the
//!   environment
//! - [`TokenRenewer`]: keeps a renewable token alive in the background

mod client;
mod config;
mod error;
mod fetcher;
mod renewal;
mod response;
pub mod token;

pub use config::{DEFAULT_ADDR, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, VaultConfig};
pub use error::{ApiError, VaultError};
pub use fetcher::VaultFetcher;
pub use renewal::{DEFAULT_RETRY_DELAY, RenewalHandle, TokenRenewer};
pub use token::{TokenSource, discover_token};
