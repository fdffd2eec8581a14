use super::{ResolveReport, resolve_request};
use crate::cli::{Cli, CliError};
use cfgvault_secrets::{ResolutionRequest, SecretRef};
use tracing::instrument;

/// Parse `path:key` arguments into a request.
///
/// Repeated references are kept once, in first-occurrence order.
///
/// # Errors
///
/// Returns a configuration error for the first malformed reference.
pub fn parse_refs(refs: &[String]) -> Result<ResolutionRequest, CliError> {
    refs.iter()
        .map(|r| SecretRef::parse(r).map_err(CliError::from))
        .collect()
}

/// Resolve references given on the command line.
#[instrument(name = "resolve_command", skip_all, fields(refs = refs.len()))]
pub async fn execute(cli: &Cli, refs: &[String], reveal: bool) -> Result<String, CliError> {
    let request = parse_refs(refs)?;
    let result = resolve_request(cli, &request).await?;

    tracing::debug!(
        values = result.len(),
        min_lease_secs = result.min_lease().map(|l| l.as_secs()),
        "Resolved references"
    );

    ResolveReport::new(&result, reveal).render(cli.json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(refs: &[&str]) -> Vec<String> {
        refs.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_refs_dedups_in_order() {
        let request =
            parse_refs(&args(&["secret/b:token", "secret/a:user", "secret/b:token"])).unwrap();
        let refs: Vec<_> = request.iter().map(ToString::to_string).collect();
        assert_eq!(refs, vec!["secret/b:token", "secret/a:user"]);
    }

    #[test]
    fn test_parse_refs_rejects_missing_key() {
        let result = parse_refs(&args(&["secret/app"]));
        assert!(matches!(result, Err(CliError::Config { .. })));
    }
}
