use crate::tracing::LogLevel;
use cfgvault_secrets::{DEFAULT_PROVIDER, SecretError};
use cfgvault_vault::VaultError;
use clap::{Parser, Subcommand, ValueEnum};
use miette::{Diagnostic, Report};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// CLI or configuration error exit code
pub const EXIT_CLI: i32 = 2;
/// Secret resolution error exit code
pub const EXIT_RESOLVE: i32 = 3;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// CLI or configuration error (exit code 2)
    #[error("CLI/configuration error: {message}")]
    #[diagnostic(code(cfgvault::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// The secret store could not satisfy the request (exit code 3)
    #[error("Resolution error: {message}")]
    #[diagnostic(code(cfgvault::cli::resolve))]
    Resolve {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Other unexpected error (exit code 3)
    #[error("Unexpected error: {message}")]
    #[diagnostic(code(cfgvault::cli::other))]
    Other {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new resolution error
    #[must_use]
    pub fn resolve(message: impl Into<String>) -> Self {
        Self::Resolve {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new resolution error with help text
    #[must_use]
    pub fn resolve_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Resolve {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new other error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }

    const fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Resolve { .. } => "resolve",
            Self::Other { .. } => "other",
        }
    }
}

/// Map secret errors onto CLI categories.
///
/// Malformed paths are a problem with the caller's input (exit code 2);
/// everything the store reports is a resolution error (exit code 3).
impl From<SecretError> for CliError {
    fn from(err: SecretError) -> Self {
        match &err {
            SecretError::InvalidPath { .. } => Self::config_with_help(
                err.to_string(),
                "References are written as <path>:<key>, e.g. secret/data/app:password",
            ),
            SecretError::NotFound { .. } => Self::resolve_with_help(
                err.to_string(),
                "Check that the path exists and includes the mount (and data/ for KV v2)",
            ),
            SecretError::MissingKey { .. } => Self::resolve(err.to_string()),
            SecretError::Fetch { .. } => Self::resolve_with_help(
                err.to_string(),
                "The backend may be unavailable; retrying later can succeed",
            ),
            SecretError::DeadlineExceeded { .. } => Self::resolve_with_help(
                err.to_string(),
                "Increase --timeout-secs or check backend latency",
            ),
            SecretError::Cancelled => Self::other(err.to_string()),
        }
    }
}

impl From<VaultError> for CliError {
    fn from(err: VaultError) -> Self {
        match &err {
            VaultError::MissingToken | VaultError::TokenFile { .. } => Self::config_with_help(
                err.to_string(),
                "Set VAULT_TOKEN, or VAULT_TOKEN_PATH to a file holding the token",
            ),
            VaultError::InvalidAddress { .. } => Self::config_with_help(
                err.to_string(),
                "Set VAULT_ADDR to the server URL, e.g. https://vault.example.com:8200",
            ),
            VaultError::InvalidHeader { .. } | VaultError::HttpClient { .. } => {
                Self::config(err.to_string())
            }
            VaultError::InvalidToken { .. } | VaultError::TokenLookup { .. } => {
                Self::resolve(err.to_string())
            }
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Resolve { .. } | CliError::Other { .. } => EXIT_RESOLVE,
    }
}

/// Render error appropriately based on JSON flag
#[allow(clippy::print_stdout, clippy::print_stderr)]
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let error_envelope = ErrorEnvelope::new(serde_json::json!({
            "code": err.code(),
            "message": err.to_string()
        }));

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        let _ = io::stderr().flush();
    }
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct OkEnvelope<T> {
    /// Status indicator - always "ok" for success
    pub status: &'static str,
    /// The actual data payload
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Secret store to read from
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum Backend {
    /// HashiCorp Vault (HTTP with a token, otherwise the vault CLI)
    #[default]
    Vault,
    /// A local JSON secrets file
    File,
}

/// Resolve secret references with lease tracking.
#[derive(Parser, Debug)]
#[command(name = "cfgvault")]
#[command(about = "Resolve secret references from Vault and report when they expire")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Emit JSON envelope instead of text.
    #[arg(long, global = true, help = "Emit JSON envelope instead of text")]
    pub json: bool,

    /// Secret store backend.
    #[arg(
        long,
        global = true,
        env = "CFGVAULT_BACKEND",
        value_enum,
        default_value_t = Backend::Vault,
        help = "Secret store backend"
    )]
    pub backend: Backend,

    /// Secrets file for the file backend.
    #[arg(
        long,
        global = true,
        env = "CFGVAULT_SECRETS_FILE",
        value_name = "FILE",
        help = "JSON secrets file used by the file backend"
    )]
    pub secrets_file: Option<PathBuf>,

    /// Deadline for the whole resolution, in seconds.
    #[arg(
        long,
        global = true,
        value_name = "SECS",
        help = "Abort resolution after this many seconds"
    )]
    pub timeout_secs: Option<u64>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve references given on the command line.
    #[command(about = "Resolve <path>:<key> references")]
    Resolve {
        /// References to resolve.
        #[arg(value_name = "PATH:KEY", required = true)]
        refs: Vec<String>,
        /// Print secret values instead of [REDACTED].
        #[arg(long, help = "Print secret values instead of [REDACTED]")]
        reveal: bool,
    },
    /// Find `${provider:path:key}` references in a file and resolve them.
    #[command(about = "Find and resolve ${provider:path:key} references in a file")]
    Scan {
        /// File to scan.
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Provider name to match in references.
        #[arg(long, default_value = DEFAULT_PROVIDER, help = "Provider name to match")]
        provider: String,
        /// Only list references, do not resolve them.
        #[arg(long, help = "Only list references, do not resolve them")]
        list_only: bool,
        /// Print secret values instead of [REDACTED].
        #[arg(long, help = "Print secret values instead of [REDACTED]")]
        reveal: bool,
    },
    /// Show version information.
    #[command(about = "Show version information")]
    Version,
}

/// Parse command line arguments into CLI structure
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
