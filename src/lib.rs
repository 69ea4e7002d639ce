// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! iracing-stats: iRacing career statistics for home-automation hosts
//!
//! This crate logs in to the iRacing members API, fetches a member's license
//! and career statistics plus their recent races, and keeps the latest
//! snapshot cached for the host to publish as named values.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

use config::Config;
use error::Result;
use services::{ApiSession, RefreshScheduler, ReqwestTransport, StatsFetcher, Transport};
use std::sync::Arc;

/// Shared integration state.
pub struct AppState {
    pub config: Config,
    pub session: Arc<ApiSession>,
    pub scheduler: Arc<RefreshScheduler>,
}

impl AppState {
    /// Build the integration over the production HTTP transport.
    pub fn from_config(config: Config) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new()?);
        Ok(Self::with_transport(config, transport))
    }

    /// Build the integration over any transport.
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        let session = Arc::new(
            ApiSession::new(transport, config.credentials())
                .with_base_url(&config.base_url)
                .with_rate_limit_backoff(config.rate_limit_backoff),
        );
        let fetcher = StatsFetcher::new(session.clone(), config.category_scheme.clone());
        let scheduler = Arc::new(RefreshScheduler::new(
            fetcher,
            config.cust_id,
            config.refresh_interval(),
        ));

        Self {
            config,
            session,
            scheduler,
        }
    }

    /// Validate the configured credentials on the shared session.
    ///
    /// Shares its login with any refresh running at the same time.
    pub async fn validate_credentials(&self) -> Result<()> {
        self.session.check_connection().await
    }
}

/// Check a username/password pair before any integration is configured.
/// Used by the host's setup form; a running integration should call
/// `AppState::validate_credentials` instead.
pub async fn validate_credentials(username: &str, password: &str) -> Result<()> {
    let transport = Arc::new(ReqwestTransport::new()?);
    services::validate_credentials(
        transport,
        services::session::DEFAULT_BASE_URL,
        username,
        password,
    )
    .await
}
