// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential handling for the iRacing login endpoint.
//!
//! The service never receives the raw password: it expects
//! `base64(sha256(password + lowercase(email)))`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::{Digest, Sha256};
use std::fmt;

/// Encode a username/password pair into the token the auth endpoint expects.
pub fn encode_password(username: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(username.to_lowercase().as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Login credentials with the password already encoded.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    encoded_password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            encoded_password: encode_password(username, password),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn encoded_password(&self) -> &str {
        &self.encoded_password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("encoded_password", &"<redacted>")
            .finish()
    }
}
