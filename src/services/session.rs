// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! iRacing members API session.
//!
//! Handles:
//! - Login with the encoded credential token
//! - Transparent re-login when the session cookie expires (401)
//! - Rate limit waits driven by `x-ratelimit-reset` (429)
//! - Resolution of `{"link": ...}` indirections
//! - The car id -> name index, refreshed after every login

use crate::error::{AppError, Result};
use crate::models::{Car, MemberCareerResponse, MemberInfoResponse, RecentRacesResponse};
use crate::services::credentials::Credentials;
use crate::services::transport::{HttpResponse, Transport, TransportError};
use crate::time_utils::duration_until_epoch;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;

pub const DEFAULT_BASE_URL: &str = "https://members-ng.iracing.com";

pub const AUTH_ENDPOINT: &str = "/auth";
pub const MEMBER_ENDPOINT: &str = "/data/member/get";
pub const CAREER_ENDPOINT: &str = "/data/stats/member_career";
pub const RECENT_RACES_ENDPOINT: &str = "/data/stats/member_recent_races";
pub const CARS_ENDPOINT: &str = "/data/car/get";

const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Login request timeout.
const LOGIN_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a caller waits for another caller's login (10 x 2s).
const LOGIN_WAIT: Duration = Duration::from_secs(20);

/// Request attempts per logical GET, across re-logins and rate limit waits.
pub const MAX_REQUEST_ATTEMPTS: u32 = 8;

/// Wait used for a 429 that carries no usable reset header.
pub const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(1);

/// Upper bound on a single rate limit wait.
const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(10 * 60);

/// State of one logical GET.
enum Step {
    NeedLogin,
    Retry,
    Done(Value),
    Failed(AppError),
}

/// Authenticated session against the iRacing members API.
///
/// Share it behind an `Arc`: logins are serialized internally, so a setup
/// validation and a background refresh racing on the same session result
/// in a single `POST /auth`.
pub struct ApiSession {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    base_url: String,
    authenticated: AtomicBool,
    /// Serializes login attempts.
    login_lock: Mutex<()>,
    login_wait: Duration,
    car_names: DashMap<u64, String>,
    /// Set by each login; cleared by the next car list load.
    car_names_stale: AtomicBool,
    /// Serializes car list loads.
    car_names_lock: Mutex<()>,
    rate_limit_backoff: Duration,
}

impl ApiSession {
    /// Create an unauthenticated session. No request is made until first use.
    pub fn new(transport: Arc<dyn Transport>, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            authenticated: AtomicBool::new(false),
            login_lock: Mutex::new(()),
            login_wait: LOGIN_WAIT,
            car_names: DashMap::new(),
            car_names_stale: AtomicBool::new(false),
            car_names_lock: Mutex::new(()),
            rate_limit_backoff: DEFAULT_RATE_LIMIT_BACKOFF,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.rate_limit_backoff = backoff;
        self
    }

    pub fn with_login_wait(mut self, wait: Duration) -> Self {
        self.login_wait = wait;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    /// Resolved name for a car id, if the index has it.
    pub fn car_name(&self, car_id: u64) -> Option<String> {
        self.car_names.get(&car_id).map(|name| name.clone())
    }

    pub fn car_count(&self) -> usize {
        self.car_names.len()
    }

    // ─── Authentication ──────────────────────────────────────────────────────

    /// Confirm the credentials by logging in (no-op if already logged in).
    pub async fn check_connection(&self) -> Result<()> {
        self.login().await
    }

    /// Log in unless another caller already did.
    ///
    /// Callers that arrive while a login is running wait for it (bounded)
    /// and then return without posting again if it succeeded. The car list
    /// is loaded after the login guard is released.
    pub async fn login(&self) -> Result<()> {
        let guard = tokio::time::timeout(self.login_wait, self.login_lock.lock())
            .await
            .map_err(|_| {
                AppError::Connection("Timed out waiting for a login already in progress".to_string())
            })?;

        if self.is_authenticated() {
            tracing::debug!("Already authenticated, skipping login");
            return Ok(());
        }

        self.authenticate().await?;
        self.car_names_stale.store(true, Ordering::SeqCst);
        drop(guard);

        self.ensure_car_names().await;
        Ok(())
    }

    /// Reload the car name index if a login happened since the last load.
    ///
    /// Waits for a load already in flight, so callers see the index it
    /// produced.
    pub async fn ensure_car_names(&self) {
        let _guard = self.car_names_lock.lock().await;
        if self.car_names_stale.swap(false, Ordering::SeqCst) {
            self.refresh_car_names().await;
        }
    }

    async fn authenticate(&self) -> Result<()> {
        let url = self.build_url(AUTH_ENDPOINT);
        let body = serde_json::json!({
            "email": self.credentials.username(),
            "password": self.credentials.encoded_password(),
        });

        let response = self
            .transport
            .post_json(&url, &body, LOGIN_TIMEOUT)
            .await
            .map_err(|e| match e {
                TransportError::Timeout => AppError::Connection("Login timed out".to_string()),
                other => AppError::Connection(other.to_string()),
            })?;

        let has_authcode = response
            .body_json()
            .ok()
            .and_then(|json| json.get("authcode").map(is_truthy))
            .unwrap_or(false);

        if response.status != 200 || !has_authcode {
            tracing::warn!(status = response.status, "iRacing login rejected");
            return Err(AppError::Auth {
                body: response.body,
            });
        }

        self.authenticated.store(true, Ordering::SeqCst);
        tracing::info!("Logged in to iRacing");
        Ok(())
    }

    /// Reload the car name index. Failures are logged and otherwise ignored.
    async fn refresh_car_names(&self) {
        match self.get_cars().await {
            Ok(cars) => {
                let ids: HashSet<u64> = cars.iter().map(|c| c.car_id).collect();
                for car in cars {
                    self.car_names.insert(car.car_id, car.car_name);
                }
                self.car_names.retain(|id, _| ids.contains(id));
                tracing::info!(count = self.car_names.len(), "Car names loaded");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load car names, continuing anyway");
            }
        }
    }

    // ─── Resource Access ─────────────────────────────────────────────────────

    /// Authenticated GET returning the resolved JSON body.
    ///
    /// Logs in when needed, re-logs in on 401, waits out 429s and follows
    /// link indirections. Gives up after `MAX_REQUEST_ATTEMPTS` requests.
    pub async fn get_resource(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = self.build_url(endpoint);
        let mut attempts = 0;
        let mut logins = 0;
        let mut step = if self.is_authenticated() {
            Step::Retry
        } else {
            Step::NeedLogin
        };

        loop {
            step = match step {
                Step::Done(value) => return Ok(value),
                Step::Failed(err) => return Err(err),
                _ if attempts >= MAX_REQUEST_ATTEMPTS => exhausted(endpoint, attempts),
                Step::NeedLogin if logins >= MAX_REQUEST_ATTEMPTS => exhausted(endpoint, attempts),
                Step::NeedLogin => {
                    logins += 1;
                    self.login().await?;
                    Step::Retry
                }
                Step::Retry if !self.is_authenticated() => Step::NeedLogin,
                Step::Retry => {
                    attempts += 1;
                    let response = self.transport.get(&url, params).await?;
                    self.handle_response(endpoint, response).await
                }
            };
        }
    }

    async fn handle_response(&self, endpoint: &str, response: HttpResponse) -> Step {
        match response.status {
            200 => match self.resolve_body(&response).await {
                Ok(value) => Step::Done(value),
                Err(e) => Step::Failed(e),
            },
            401 => {
                tracing::info!(endpoint, "iRacing session expired, logging in again");
                self.authenticated.store(false, Ordering::SeqCst);
                Step::NeedLogin
            }
            429 => {
                let wait = self.rate_limit_wait(&response);
                tracing::warn!(
                    endpoint,
                    wait_ms = wait.as_millis() as u64,
                    "iRacing rate limit hit (429), waiting"
                );
                tokio::time::sleep(wait).await;
                Step::Retry
            }
            status => {
                tracing::warn!(endpoint, status, "Unhandled iRacing response");
                Step::Failed(AppError::UnhandledResponse {
                    status,
                    endpoint: endpoint.to_string(),
                })
            }
        }
    }

    /// Single GET with no retry loop; never re-enters login.
    async fn fetch_once(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        let response = self.transport.get(&self.build_url(endpoint), params).await?;
        if response.status != 200 {
            return Err(AppError::UnhandledResponse {
                status: response.status,
                endpoint: endpoint.to_string(),
            });
        }
        self.resolve_body(&response).await
    }

    /// Parse a 200 body, following a link indirection if present.
    async fn resolve_body(&self, response: &HttpResponse) -> Result<Value> {
        let body = response.body_json()?;
        match link_target(&body) {
            Some(link) => self.follow_link(link).await,
            None => Ok(body),
        }
    }

    /// Plain GET of a data link (no auth handling, no retries).
    async fn follow_link(&self, link: &str) -> Result<Value> {
        tracing::debug!("Following iRacing data link");
        let response = self.transport.get(link, &[]).await?;
        if response.status != 200 {
            tracing::warn!(status = response.status, "iRacing data link failed");
            return Err(AppError::UnhandledResponse {
                status: response.status,
                endpoint: link.to_string(),
            });
        }
        response.body_json()
    }

    fn rate_limit_wait(&self, response: &HttpResponse) -> Duration {
        let reset = response.header(RATE_LIMIT_RESET_HEADER).and_then(|v| {
            let v = v.trim();
            v.parse::<u64>()
                .ok()
                .or_else(|| v.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f.ceil() as u64))
        });

        match reset {
            Some(reset) => duration_until_epoch(reset, SystemTime::now())
                .unwrap_or(Duration::ZERO)
                .min(MAX_RATE_LIMIT_WAIT),
            None => self.rate_limit_backoff,
        }
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn get_typed<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let value = self.get_resource(endpoint, params).await?;
        serde_json::from_value(value).map_err(|e| AppError::Decode(format!("{}: {}", endpoint, e)))
    }

    // ─── API Wrappers ────────────────────────────────────────────────────────

    /// Member info including licenses.
    pub async fn get_member(&self, cust_id: u64) -> Result<MemberInfoResponse> {
        self.get_typed(
            MEMBER_ENDPOINT,
            &[
                ("cust_ids", cust_id.to_string()),
                ("include_licenses", "true".to_string()),
            ],
        )
        .await
    }

    pub async fn get_member_career(&self, cust_id: u64) -> Result<MemberCareerResponse> {
        self.get_typed(CAREER_ENDPOINT, &[("cust_id", cust_id.to_string())])
            .await
    }

    /// Recent races, most recent first.
    pub async fn get_recent_races(&self, cust_id: u64) -> Result<RecentRacesResponse> {
        self.get_typed(RECENT_RACES_ENDPOINT, &[("cust_id", cust_id.to_string())])
            .await
    }

    /// Car list, fetched once without the login loop (it is loaded right
    /// after a login).
    pub async fn get_cars(&self) -> Result<Vec<Car>> {
        let value = self.fetch_once(CARS_ENDPOINT, &[]).await?;
        serde_json::from_value(value)
            .map_err(|e| AppError::Decode(format!("{}: {}", CARS_ENDPOINT, e)))
    }
}

/// Check credentials once with a throwaway session (used during setup).
pub async fn validate_credentials(
    transport: Arc<dyn Transport>,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<()> {
    ApiSession::new(transport, Credentials::new(username, password))
        .with_base_url(base_url)
        .check_connection()
        .await
}

fn exhausted(endpoint: &str, attempts: u32) -> Step {
    tracing::error!(endpoint, attempts, "Giving up on iRacing request");
    Step::Failed(AppError::RetriesExhausted {
        endpoint: endpoint.to_string(),
        attempts,
    })
}

/// `link` target of an indirection body, if it is one.
fn link_target(body: &Value) -> Option<&str> {
    body.as_object()?.get("link")?.as_str()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
