// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP transport used by the API session.
//!
//! The session only needs two verbs: a JSON POST for login and a GET with
//! query parameters. Keeping them behind a trait lets the tests script the
//! remote service without a network.

use crate::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Default timeout for GET requests (login has its own, shorter bound).
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Minimal response view: status, lower-cased headers and body text.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn from_json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Parse the body as JSON.
    pub fn body_json(&self) -> Result<Value, AppError> {
        serde_json::from_str(&self.body)
            .map_err(|e| AppError::Decode(format!("JSON parse error: {}", e)))
    }
}

/// Network-level failures, before any HTTP status is known.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Other(String),
}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        AppError::Connection(err.to_string())
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body with an explicit timeout.
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError>;

    /// GET with query parameters.
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, TransportError>;
}

/// Production transport backed by `reqwest` with a cookie store, so the
/// session cookie set by `/auth` is sent on later requests.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("iracing-stats/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }

    async fn read_response(response: reqwest::Response) -> Result<HttpResponse, TransportError> {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(classify_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError> {
        let response = self
            .http
            .post(url)
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_error)?;

        Self::read_response(response).await
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, TransportError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(classify_error)?;

        Self::read_response(response).await
    }
}

fn classify_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ScriptedTransport - offline transport for tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(debug_assertions)]
pub use scripted::{RecordedRequest, ScriptedTransport};

#[cfg(debug_assertions)]
mod scripted {
    use super::{HttpResponse, Transport, TransportError};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::{Duration, SystemTime};

    /// A request observed by the scripted transport.
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub method: &'static str,
        pub path: String,
        pub url: String,
        pub query: Vec<(String, String)>,
        pub body: Option<Value>,
        pub at: SystemTime,
    }

    enum Scripted {
        Response {
            response: HttpResponse,
            delay: Option<Duration>,
        },
        Error(TransportError),
    }

    /// Transport that replays queued responses per `METHOD path`.
    ///
    /// Responses are consumed in order; a route with nothing queued answers
    /// 404. Every request is recorded with its wall-clock time.
    /// Only available in debug/test builds.
    #[derive(Default)]
    pub struct ScriptedTransport {
        routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_response(&self, method: &str, path: &str, response: HttpResponse) {
            self.push(method, path, Scripted::Response { response, delay: None });
        }

        /// Queue a response that is returned only after `delay`.
        pub fn push_delayed(&self, method: &str, path: &str, response: HttpResponse, delay: Duration) {
            self.push(
                method,
                path,
                Scripted::Response {
                    response,
                    delay: Some(delay),
                },
            );
        }

        pub fn push_error(&self, method: &str, path: &str, error: TransportError) {
            self.push(method, path, Scripted::Error(error));
        }

        pub fn on_get(&self, path: &str, status: u16, body: Value) {
            self.push_response("GET", path, HttpResponse::from_json(status, &body));
        }

        pub fn on_post(&self, path: &str, status: u16, body: Value) {
            self.push_response("POST", path, HttpResponse::from_json(status, &body));
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }

        /// Number of requests seen for `METHOD path`.
        pub fn count(&self, method: &str, path: &str) -> usize {
            self.requests()
                .iter()
                .filter(|r| r.method == method && r.path == path)
                .count()
        }

        fn push(&self, method: &str, path: &str, scripted: Scripted) {
            if let Ok(mut routes) = self.routes.lock() {
                routes
                    .entry(route_key(method, path))
                    .or_default()
                    .push_back(scripted);
            }
        }

        async fn respond(
            &self,
            method: &'static str,
            url: &str,
            query: Vec<(String, String)>,
            body: Option<Value>,
        ) -> Result<HttpResponse, TransportError> {
            let path = reqwest::Url::parse(url)
                .map(|u| u.path().to_string())
                .unwrap_or_else(|_| url.to_string());

            if let Ok(mut requests) = self.requests.lock() {
                requests.push(RecordedRequest {
                    method,
                    path: path.clone(),
                    url: url.to_string(),
                    query,
                    body,
                    at: SystemTime::now(),
                });
            }

            let next = self
                .routes
                .lock()
                .ok()
                .and_then(|mut routes| routes.get_mut(&route_key(method, &path))?.pop_front());

            match next {
                Some(Scripted::Response { response, delay }) => {
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                    Ok(response)
                }
                Some(Scripted::Error(e)) => Err(e),
                None => Ok(HttpResponse::new(404, "{}")),
            }
        }
    }

    fn route_key(method: &str, path: &str) -> String {
        format!("{} {}", method.to_ascii_uppercase(), path)
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn post_json(
            &self,
            url: &str,
            body: &Value,
            _timeout: Duration,
        ) -> Result<HttpResponse, TransportError> {
            self.respond("POST", url, Vec::new(), Some(body.clone()))
                .await
        }

        async fn get(
            &self,
            url: &str,
            query: &[(&str, String)],
        ) -> Result<HttpResponse, TransportError> {
            let query = query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect();
            self.respond("GET", url, query, None).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(429, "").with_header("X-RateLimit-Reset", "1700000000");
        assert_eq!(response.header("x-ratelimit-reset"), Some("1700000000"));
        assert_eq!(response.header("X-RATELIMIT-RESET"), Some("1700000000"));
        assert_eq!(response.header("x-ratelimit-remaining"), None);
    }

    #[test]
    fn test_body_json_rejects_html() {
        let response = HttpResponse::new(200, "<html>maintenance</html>");
        assert!(matches!(response.body_json(), Err(AppError::Decode(_))));
    }

    #[test]
    fn test_transport_error_maps_to_connection() {
        let err: AppError = TransportError::Timeout.into();
        assert!(err.is_connection_error());
    }

    #[tokio::test]
    async fn test_scripted_transport_replays_in_order() {
        let transport = ScriptedTransport::new();
        transport.on_get("/data/car/get", 200, json!([1]));
        transport.on_get("/data/car/get", 500, json!({}));

        let url = "https://members-ng.iracing.com/data/car/get";
        assert_eq!(transport.get(url, &[]).await.unwrap().status, 200);
        assert_eq!(transport.get(url, &[]).await.unwrap().status, 500);
        // Queue exhausted
        assert_eq!(transport.get(url, &[]).await.unwrap().status, 404);
        assert_eq!(transport.count("GET", "/data/car/get"), 3);
    }
}
