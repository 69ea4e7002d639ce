// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Time remaining until the given Unix timestamp (seconds).
///
/// Returns `None` if the instant is not in the future, and `Duration::MAX`
/// if it lies beyond what `SystemTime` can represent.
pub fn duration_until_epoch(epoch_secs: u64, now: SystemTime) -> Option<Duration> {
    match UNIX_EPOCH.checked_add(Duration::from_secs(epoch_secs)) {
        Some(target) => target.duration_since(now).ok().filter(|d| !d.is_zero()),
        None => Some(Duration::MAX),
    }
}

/// Serialize a timestamp with `format_utc_rfc3339`.
pub fn serialize_utc_rfc3339<S: serde::Serializer>(
    date: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_utc_rfc3339(*date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_utc_rfc3339_uses_z_suffix() {
        let date = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(format_utc_rfc3339(date), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_duration_until_future_epoch() {
        let now = UNIX_EPOCH + Duration::from_secs(1_000);
        assert_eq!(
            duration_until_epoch(1_002, now),
            Some(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_duration_until_unrepresentable_epoch_is_max() {
        let now = UNIX_EPOCH + Duration::from_secs(1_000);
        assert_eq!(duration_until_epoch(u64::MAX, now), Some(Duration::MAX));
    }

    #[test]
    fn test_duration_until_past_epoch_is_none() {
        let now = UNIX_EPOCH + Duration::from_millis(1_000_500);
        assert_eq!(duration_until_epoch(1_000, now), None);
        assert_eq!(duration_until_epoch(999, now), None);
    }
}
