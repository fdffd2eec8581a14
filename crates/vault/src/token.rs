//! Locating the Vault token

use crate::VaultError;
use secrecy::SecretString;
use std::path::{Path, PathBuf};

/// Environment variable holding the token itself
pub const VAULT_TOKEN_VAR: &str = "VAULT_TOKEN";

/// Environment variable naming a file that holds the token
pub const VAULT_TOKEN_PATH_VAR: &str = "VAULT_TOKEN_PATH";

/// Token file mounted into platform workloads
pub const DEFAULT_TOKEN_FILE: &str = "/var/run/secrets/nais.io/vault/vault_token";

/// Where a token was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// `VAULT_TOKEN`
    Env,
    /// The file named by `VAULT_TOKEN_PATH`
    PathVar(PathBuf),
    /// The platform default token file
    DefaultFile(PathBuf),
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env => write!(f, "{VAULT_TOKEN_VAR}"),
            Self::PathVar(path) | Self::DefaultFile(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Find a token, checking in order:
///
/// 1. `VAULT_TOKEN`, when set and non-empty
/// 2. the file named by `VAULT_TOKEN_PATH`
/// 3. `default_file`, when it exists
///
/// Returns `Ok(None)` when none of them apply.
///
/// # Errors
///
/// Returns [`VaultError::TokenFile`] if a token file exists or is named but
/// cannot be read or is empty.
pub fn discover_token(
    default_file: &Path,
) -> Result<Option<(SecretString, TokenSource)>, VaultError> {
    if let Ok(token) = std::env::var(VAULT_TOKEN_VAR)
        && !token.trim().is_empty()
    {
        return Ok(Some((SecretString::from(token.trim()), TokenSource::Env)));
    }

    if let Some(path) = std::env::var_os(VAULT_TOKEN_PATH_VAR) {
        let path = PathBuf::from(path);
        let token = read_token_file(&path)?;
        return Ok(Some((token, TokenSource::PathVar(path))));
    }

    if default_file.exists() {
        let token = read_token_file(default_file)?;
        return Ok(Some((token, TokenSource::DefaultFile(default_file.to_path_buf()))));
    }

    Ok(None)
}

fn read_token_file(path: &Path) -> Result<SecretString, VaultError> {
    let contents = std::fs::read_to_string(path).map_err(|source| VaultError::TokenFile {
        path: path.to_path_buf(),
        source,
    })?;

    let token = contents.trim();
    if token.is_empty() {
        return Err(VaultError::TokenFile {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, "file is empty"),
        });
    }
    Ok(SecretString::from(token))
}
