use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "geoinit.toml";

/// Unprefixed variables and the string fields they set.
const GEOSERVER_ENV: [(&str, &str); 3] = [
    ("GEOSERVER_URL", "geoserver.url"),
    ("GEOSERVER_USER", "geoserver.username"),
    ("GEOSERVER_PASSWORD", "geoserver.password"),
];

/// Load configuration with environment variable overrides.
///
/// Layers, lowest precedence first: built-in defaults, the TOML file,
/// `GEOSERVER_URL` / `GEOSERVER_USER` / `GEOSERVER_PASSWORD`, and
/// `GEOINIT_<SECTION>__<KEY>` variables. An explicit `path` must exist;
/// the default file is optional.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
            Toml::file(path)
        }
        None => Toml::file(DEFAULT_CONFIG_PATH),
    };

    let mut figment = Figment::from(Serialized::defaults(Config::default())).merge(file);
    // Plain strings, never parsed into numbers or booleans.
    for (var, key) in GEOSERVER_ENV {
        if let Ok(value) = std::env::var(var) {
            figment = figment.merge(Serialized::default(key, value));
        }
    }

    let config: Config = figment
        .merge(Env::prefixed("GEOINIT_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
