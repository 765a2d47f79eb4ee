//! Waiting for GeoServer to answer before provisioning.

use std::time::Duration;

use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ReadinessConfig;
use crate::geoserver::{RestApi, RestRequest};
use crate::metrics;

/// Endpoint probed for readiness.
pub const VERSION_PATH: &str = "/about/version.json";

/// Poll the version endpoint until it answers 200.
///
/// Transport errors and non-200 answers both consume an attempt and are
/// followed by `delay_secs` (except after the last attempt). Returns
/// `false` once `max_attempts` probes have failed.
pub async fn wait_for_ready(api: &dyn RestApi, config: &ReadinessConfig) -> bool {
    info!("Waiting for GeoServer at {} to be ready", api.base_url());

    let probe_timeout = Duration::from_secs(config.probe_timeout_secs as u64);
    let delay = Duration::from_secs(config.delay_secs);

    for attempt in 1..=config.max_attempts {
        metrics::READINESS_PROBES.inc();
        let request = RestRequest::get(VERSION_PATH).with_timeout(probe_timeout);

        match api.execute(request).await {
            Ok(response) if response.status == 200 => {
                match parse_version(&response.body) {
                    Some(version) => info!("GeoServer {} is ready", version),
                    None => info!("GeoServer is ready"),
                }
                return true;
            }
            Ok(response) => {
                info!(
                    "Attempt {}/{}: GeoServer not ready yet (HTTP {})",
                    attempt, config.max_attempts, response.status
                );
            }
            Err(e) => {
                info!(
                    "Attempt {}/{}: GeoServer not ready yet ({})",
                    attempt, config.max_attempts, e
                );
            }
        }

        if attempt < config.max_attempts {
            sleep(delay).await;
        }
    }

    warn!(
        "GeoServer did not become ready after {} attempts",
        config.max_attempts
    );
    false
}

/// Extract the GeoServer version from `/about/version.json`.
///
/// The body looks like
/// `{"about":{"resource":[{"@name":"GeoServer","Version":"2.24.1"}, ...]}}`.
pub fn parse_version(body: &str) -> Option<String> {
    let doc: Value = match serde_json::from_str(body) {
        Ok(doc) => doc,
        Err(e) => {
            debug!("Version response is not JSON: {}", e);
            return None;
        }
    };
    doc.get("about")?
        .get("resource")?
        .as_array()?
        .iter()
        .find(|r| r.get("@name").and_then(Value::as_str) == Some("GeoServer"))?
        .get("Version")
        .and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}
