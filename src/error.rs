// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types shared by the session, fetcher and scheduler.

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Network-level failure: timeout, DNS or connect failure.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Credentials rejected or the auth response had an unexpected shape.
    #[error("Authentication failed: {body}")]
    Auth { body: String },

    #[error("Unhandled HTTP {status} response from {endpoint}")]
    UnhandledResponse { status: u16, endpoint: String },

    #[error("Gave up on {endpoint} after {attempts} attempts")]
    RetriesExhausted { endpoint: String, attempts: u32 },

    #[error("Not found in response: {0}")]
    Lookup(String),

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Returns true if this error means the credentials were rejected.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, AppError::Auth { .. })
    }

    /// Returns true if the remote service could not be reached at all.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, AppError::Connection(_))
    }

    /// Error key shown by the host's setup form.
    pub fn setup_error_key(&self) -> &'static str {
        match self {
            AppError::Connection(_) => "cannot_connect",
            AppError::Auth { .. } => "invalid_auth",
            _ => "unknown",
        }
    }
}

/// Result type alias for session and fetch operations
pub type Result<T> = std::result::Result<T, AppError>;
