//! reqwest-backed GeoServer REST client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use tracing::debug;

use crate::config::GeoServerConfig;
use crate::metrics;

use super::{Body, GeoServerError, Method, RestApi, RestRequest, RestResponse};

/// GeoServer REST client using HTTP Basic authentication.
pub struct GeoServerClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl GeoServerClient {
    /// Create a new client for the configured REST root.
    pub fn new(config: &GeoServerConfig) -> Result<Self, GeoServerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| GeoServerError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl RestApi for GeoServerClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn execute(&self, request: RestRequest) -> Result<RestResponse, GeoServerError> {
        let url = self.url(&request.path);
        let method = request.method;

        let mut builder = match method {
            Method::Get => self.client.get(&url).header(ACCEPT, "application/json"),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
        }
        .basic_auth(&self.username, Some(&self.password));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, body.content_type());
            builder = match body {
                Body::Xml(xml) => builder.body(xml),
                Body::Json(value) => builder.json(&value),
            };
        }

        debug!(method = %method, url = %url, "Sending GeoServer request");
        let start = Instant::now();

        let result = builder.send().await;
        let elapsed = start.elapsed().as_secs_f64();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                metrics::record_request(method.as_str(), "error", elapsed);
                return Err(GeoServerError::from(e));
            }
        };

        let status = response.status().as_u16();
        metrics::record_request(method.as_str(), &status.to_string(), elapsed);

        let body = response.text().await.map_err(GeoServerError::from)?;
        debug!(method = %method, url = %url, status, "GeoServer responded");

        Ok(RestResponse { status, body })
    }
}
