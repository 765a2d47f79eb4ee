//! Types shared by GeoServer REST clients.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors raised before a response status is available.
#[derive(Debug, Clone, Error)]
pub enum GeoServerError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for GeoServerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GeoServerError::Timeout
        } else if e.is_connect() {
            GeoServerError::ConnectionFailed(e.to_string())
        } else if e.is_builder() {
            GeoServerError::Client(e.to_string())
        } else {
            GeoServerError::Request(e.to_string())
        }
    }
}

/// HTTP methods used by the provisioning steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Xml(String),
    Json(serde_json::Value),
}

impl Body {
    pub fn content_type(&self) -> &'static str {
        match self {
            Body::Xml(_) => "application/xml",
            Body::Json(_) => "application/json",
        }
    }
}

/// A request relative to the REST root.
#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    pub method: Method,
    /// Path below the REST root, starting with '/'
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Body>,
    /// Overrides the client-wide timeout
    pub timeout: Option<Duration>,
}

impl RestRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Body) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Body) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Path plus query string, for logs and plans.
    pub fn display_path(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.path, query)
    }
}

/// Status and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    pub status: u16,
    pub body: String,
}

impl RestResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Body shortened for error messages.
    pub fn body_excerpt(&self) -> String {
        excerpt(&self.body, 500)
    }
}

pub(crate) fn excerpt(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        let mut short: String = trimmed.chars().take(max_chars).collect();
        short.push('…');
        short
    }
}

/// Access to a GeoServer REST root.
///
/// Every status code, including 4xx and 5xx, is returned as a
/// `RestResponse`; only transport failures are errors.
#[async_trait]
pub trait RestApi: Send + Sync {
    /// REST root this client talks to.
    fn base_url(&self) -> &str;

    /// Send a single request.
    async fn execute(&self, request: RestRequest) -> Result<RestResponse, GeoServerError>;
}
