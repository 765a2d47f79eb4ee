//! Testing utilities and mock implementations.
//!
//! `MockRestApi` stands in for a GeoServer instance so the provisioner can be
//! exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use geoinit_core::testing::{fixtures, MockRestApi};
//!
//! let api = MockRestApi::new();
//! fixtures::script_happy_path(&api).await;
//! ```

mod mock_rest_api;

pub use mock_rest_api::MockRestApi;

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::json;

    use super::MockRestApi;
    use crate::geoserver::RestResponse;

    pub const LAYER_PATH: &str =
        "/workspaces/station_pois/datastores/station_pois/featuretypes/station_pois";

    /// Feature type representation as GeoServer returns it.
    pub fn feature_type_json() -> serde_json::Value {
        json!({
            "featureType": {
                "name": "station_pois",
                "nativeName": "station_pois",
                "title": "Station POIs",
                "enabled": false,
                "srs": "EPSG:4326",
                "projectionPolicy": "FORCE_DECLARED"
            }
        })
    }

    /// Global settings representation as GeoServer returns it.
    pub fn settings_json() -> serde_json::Value {
        json!({
            "global": {
                "settings": {
                    "charset": "UTF-8",
                    "numDecimals": 8,
                    "verbose": false
                },
                "numDecimals": 8,
                "globalServices": true,
                "xmlPostRequestLogBufferSize": 1024
            }
        })
    }

    /// Script a service that accepts every step with the default config.
    pub async fn script_happy_path(api: &MockRestApi) {
        api.respond("GET", "/about/version.json", RestResponse::new(200, "{}"))
            .await;
        api.respond("POST", "/workspaces", RestResponse::new(201, "station_pois"))
            .await;
        api.respond("PUT", "/namespaces/station_pois", RestResponse::new(200, ""))
            .await;
        api.respond(
            "POST",
            "/workspaces/station_pois/datastores",
            RestResponse::new(201, "station_pois"),
        )
        .await;
        api.respond(
            "POST",
            "/workspaces/station_pois/datastores/station_pois/featuretypes",
            RestResponse::new(201, "station_pois"),
        )
        .await;
        api.respond(
            "GET",
            LAYER_PATH,
            RestResponse::new(200, feature_type_json().to_string()),
        )
        .await;
        api.respond("PUT", LAYER_PATH, RestResponse::new(200, ""))
            .await;
        api.respond(
            "GET",
            "/settings",
            RestResponse::new(200, settings_json().to_string()),
        )
        .await;
        api.respond("PUT", "/settings", RestResponse::new(200, ""))
            .await;
    }
}
