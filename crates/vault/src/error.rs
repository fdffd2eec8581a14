//! Errors raised by the Vault client

use cfgvault_secrets::DecodeFailure;
use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// A failed call to Vault, over HTTP or through the `vault` binary.
///
/// Messages include the status and Vault's `errors` array, never response
/// data.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Vault answered with a non-success status
    #[error("Vault returned {status}{}", describe(.errors))]
    Status {
        /// HTTP status of the response
        status: StatusCode,
        /// Messages from Vault's `errors` array
        errors: Vec<String>,
    },

    /// The request never got a response (connect failure, timeout)
    #[error("Request to Vault failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The response body was not the expected JSON document
    #[error("Vault response could not be decoded: {0}")]
    Decode(DecodeFailure),

    /// The `vault` binary could not be started
    #[error("Failed to execute vault CLI: {0}")]
    Spawn(#[source] std::io::Error),

    /// The `vault` binary exited with an error
    #[error("vault CLI failed ({code}): {stderr}")]
    Cli {
        /// Exit code, or `signal` when killed
        code: String,
        /// Trimmed standard error output
        stderr: String,
    },

    /// The `vault` binary printed something other than a logical response
    #[error("vault CLI output could not be decoded: {0}")]
    CliOutput(DecodeFailure),

    /// The `vault` binary did not finish in time
    #[error("vault CLI did not finish within {}s", .0.as_secs())]
    CliTimeout(std::time::Duration),
}

impl ApiError {
    /// HTTP status of a rejected request
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn describe(errors: &[String]) -> String {
    if errors.is_empty() {
        String::new()
    } else {
        format!(": {}", errors.join("; "))
    }
}

/// Errors setting up or maintaining a Vault session
#[derive(Debug, Error)]
pub enum VaultError {
    /// `VAULT_ADDR` (or the configured address) is not a URL
    #[error("Invalid Vault address '{address}': {source}")]
    InvalidAddress {
        /// Address as given
        address: String,
        /// Parse failure
        #[source]
        source: url::ParseError,
    },

    /// No token in the environment or on disk
    #[error("No Vault token available: set VAULT_TOKEN or VAULT_TOKEN_PATH")]
    MissingToken,

    /// A token file was configured but could not be used
    #[error("Could not read Vault token from '{}': {source}", path.display())]
    TokenFile {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The token or namespace cannot be sent as a header value
    #[error("{header} contains characters that are not allowed in an HTTP header")]
    InvalidHeader {
        /// Header that could not be built
        header: &'static str,
    },

    /// Vault rejected the token (403 on lookup)
    #[error("The Vault token seems to be invalid")]
    InvalidToken {
        /// Rejected lookup
        #[source]
        source: ApiError,
    },

    /// The token could not be looked up for another reason
    #[error("Could not validate the Vault token: {source}")]
    TokenLookup {
        /// Failed lookup
        #[source]
        source: ApiError,
    },

    /// The HTTP client could not be constructed
    #[error("Failed to build Vault HTTP client: {source}")]
    HttpClient {
        /// Builder failure
        #[source]
        source: reqwest::Error,
    },
}
