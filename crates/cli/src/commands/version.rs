use serde::Serialize;
use tracing::instrument;

#[derive(Debug, Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
    description: &'static str,
    correlation_id: String,
}

/// Package and session information, as text or a JSON envelope.
#[instrument]
pub fn get_version_info(json: bool) -> String {
    let info = VersionInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        description: env!("CARGO_PKG_DESCRIPTION"),
        correlation_id: crate::tracing::correlation_id().to_string(),
    };

    tracing::debug!(
        package_name = info.name,
        package_version = info.version,
        "Gathering package information"
    );

    if json && let Ok(rendered) = super::render_json(&info) {
        return rendered;
    }

    format!(
        "{} {} - {}\nCorrelation ID: {}",
        info.name, info.version, info.description, info.correlation_id
    )
}
