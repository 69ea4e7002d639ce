// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - iRacing API access and refresh logic.

pub mod credentials;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod transport;

pub use credentials::{encode_password, Credentials};
pub use scheduler::{RefreshOutcome, RefreshScheduler, SnapshotReceiver};
pub use session::{validate_credentials, ApiSession};
pub use stats::{assemble_snapshot, StatsFetcher};
pub use transport::{HttpResponse, ReqwestTransport, Transport, TransportError};

#[cfg(debug_assertions)]
pub use transport::{RecordedRequest, ScriptedTransport};
