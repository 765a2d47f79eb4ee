use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Url;

use super::{types::Config, ConfigError};

/// Names GeoServer accepts for workspaces, stores and layers without
/// escaping them in REST paths.
static RESOURCE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.-]*$").expect("valid resource name regex"));

/// Validate configuration
/// Currently validates:
/// - REST and public URLs are absolute http(s) URLs
/// - Timeouts and the readiness budget are non-zero
/// - Workspace, datastore, layer and column names are plain identifiers
/// - Namespace URI and SRID are set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    validate_http_url("geoserver.url", &config.geoserver.url)?;
    validate_http_url("provision.public_url", &config.provision.public_url)?;

    if config.geoserver.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "geoserver.timeout_secs cannot be 0".to_string(),
        ));
    }
    if config.readiness.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "readiness.max_attempts cannot be 0".to_string(),
        ));
    }
    if config.readiness.probe_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "readiness.probe_timeout_secs cannot be 0".to_string(),
        ));
    }

    validate_name("workspace.name", &config.workspace.name)?;
    validate_name("datastore.name", &config.datastore.name)?;
    validate_name("layer.name", &config.layer.name)?;
    validate_name("layer.geometry_column", &config.layer.geometry_column)?;
    validate_name("layer.key_column", &config.layer.key_column)?;

    if config.workspace.namespace_uri.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "workspace.namespace_uri cannot be empty".to_string(),
        ));
    }
    if config.datastore.jndi_reference.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "datastore.jndi_reference cannot be empty".to_string(),
        ));
    }
    if config.layer.srid == 0 {
        return Err(ConfigError::ValidationError(
            "layer.srid cannot be 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::ValidationError(format!("{} is not a valid URL: {}", field, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::ValidationError(format!(
            "{} must use http or https, got '{}'",
            field, other
        ))),
    }
}

fn validate_name(field: &str, value: &str) -> Result<(), ConfigError> {
    if RESOURCE_NAME.is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{} '{}' must start with a letter or underscore and contain only letters, digits, '_', '.' or '-'",
            field, value
        )))
    }
}
