use super::{ResolveReport, render_json, resolve_request};
use crate::cli::{Cli, CliError};
use cfgvault_secrets::ReferenceScanner;
use std::path::Path;
use tracing::instrument;

/// Find `${provider:path:key}` references in `file` and resolve them.
///
/// With `list_only`, the references are printed one per line without
/// contacting the backend.
#[instrument(name = "scan_command", skip(cli))]
pub async fn execute(
    cli: &Cli,
    file: &Path,
    provider: &str,
    list_only: bool,
    reveal: bool,
) -> Result<String, CliError> {
    let contents = tokio::fs::read_to_string(file).await.map_err(|e| {
        CliError::config_with_help(
            format!("Could not read {}: {e}", file.display()),
            "Pass the path of a configuration file to scan",
        )
    })?;

    let scanner = ReferenceScanner::new(provider);
    let request = scanner.request(&contents);
    tracing::debug!(
        provider = scanner.provider(),
        refs = request.len(),
        paths = request.distinct_paths(),
        "Scanned file for references"
    );

    if list_only {
        let refs: Vec<String> = request.iter().map(ToString::to_string).collect();
        return if cli.json {
            render_json(&refs)
        } else {
            Ok(refs.join("\n"))
        };
    }

    let result = resolve_request(cli, &request).await?;
    ResolveReport::new(&result, reveal).render(cli.json)
}
