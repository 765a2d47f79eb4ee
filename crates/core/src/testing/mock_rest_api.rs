//! Mock GeoServer REST API for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::geoserver::{GeoServerError, RestApi, RestRequest, RestResponse};

type Scripted = Result<RestResponse, GeoServerError>;

/// Mock implementation of the RestApi trait.
///
/// Provides controllable behavior for testing:
/// - Script responses per method and path (queued; the last one repeats)
/// - Simulate transport failures
/// - Record every request for assertions
///
/// # Example
///
/// ```rust,ignore
/// let api = MockRestApi::new();
/// api.respond("POST", "/workspaces", RestResponse::new(409, "exists")).await;
///
/// // ... run the provisioner ...
///
/// assert_eq!(api.count("POST", "/workspaces").await, 1);
/// ```
#[derive(Debug)]
pub struct MockRestApi {
    base_url: String,
    scripts: Arc<RwLock<HashMap<(String, String), VecDeque<Scripted>>>>,
    fallback: Arc<RwLock<RestResponse>>,
    requests: Arc<RwLock<Vec<RestRequest>>>,
}

impl Default for MockRestApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRestApi {
    /// Create a mock that answers 404 to anything not scripted.
    pub fn new() -> Self {
        Self {
            base_url: "http://mock-geoserver/geoserver/rest".to_string(),
            scripts: Arc::new(RwLock::new(HashMap::new())),
            fallback: Arc::new(RwLock::new(RestResponse::new(404, "No such resource"))),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Queue a response for `method` and `path` (query excluded).
    pub async fn respond(&self, method: &str, path: &str, response: RestResponse) {
        self.push(method, path, Ok(response)).await;
    }

    /// Queue a transport error for `method` and `path`.
    pub async fn respond_err(&self, method: &str, path: &str, error: GeoServerError) {
        self.push(method, path, Err(error)).await;
    }

    /// Replace any queued responses for `method` and `path` with `response`.
    pub async fn set_response(&self, method: &str, path: &str, response: RestResponse) {
        self.replace(method, path, Ok(response)).await;
    }

    /// Replace any queued responses for `method` and `path` with `error`.
    pub async fn set_error(&self, method: &str, path: &str, error: GeoServerError) {
        self.replace(method, path, Err(error)).await;
    }

    /// Response for requests without a script.
    pub async fn set_fallback(&self, response: RestResponse) {
        *self.fallback.write().await = response;
    }

    /// All requests received so far, in order.
    pub async fn requests(&self) -> Vec<RestRequest> {
        self.requests.read().await.clone()
    }

    /// Number of requests received for `method` and `path`.
    pub async fn count(&self, method: &str, path: &str) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.method.as_str() == method && r.path == path)
            .count()
    }

    /// Requests received for `method` and `path`.
    pub async fn requests_for(&self, method: &str, path: &str) -> Vec<RestRequest> {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.method.as_str() == method && r.path == path)
            .cloned()
            .collect()
    }

    async fn replace(&self, method: &str, path: &str, scripted: Scripted) {
        self.scripts
            .write()
            .await
            .insert((method.to_string(), path.to_string()), VecDeque::from([scripted]));
    }

    async fn push(&self, method: &str, path: &str, scripted: Scripted) {
        self.scripts
            .write()
            .await
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back(scripted);
    }
}

#[async_trait]
impl RestApi for MockRestApi {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn execute(&self, request: RestRequest) -> Result<RestResponse, GeoServerError> {
        let key = (request.method.as_str().to_string(), request.path.clone());
        self.requests.write().await.push(request);

        let mut scripts = self.scripts.write().await;
        match scripts.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(|| {
                Err(GeoServerError::Request("empty mock script".to_string()))
            }),
            Some(queue) if queue.len() == 1 => queue[0].clone(),
            _ => Ok(self.fallback.read().await.clone()),
        }
    }
}
