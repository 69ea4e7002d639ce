// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! iracing-stats headless host
//!
//! Polls the iRacing members API on the configured interval and logs each
//! refreshed set of named values as structured JSON.

use iracing_stats::{config::Config, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        cust_id = config.cust_id,
        interval_minutes = config.refresh_interval_minutes,
        categories = config.category_scheme.len(),
        "Starting iracing-stats"
    );

    let state = AppState::from_config(config)?;

    // Fail fast on bad credentials rather than polling forever
    if let Err(e) = state.validate_credentials().await {
        tracing::error!(error = %e, reason = e.setup_error_key(), "Unable to log in to iRacing");
        return Err(e.into());
    }

    let mut snapshots = state.scheduler.subscribe();
    let poller = state.scheduler.clone().spawn();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = snapshots.borrow_and_update().clone();
                if let Some(snapshot) = latest {
                    for value in snapshot.published_values() {
                        tracing::info!(
                            key = %value.key,
                            value = %value.value,
                            "Named value updated"
                        );
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    poller.abort();
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("iracing_stats=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
