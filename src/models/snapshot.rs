// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Statistics snapshot published to the host after each refresh.
//!
//! A snapshot is built in one go by the stats fetcher and never mutated
//! afterwards; the next successful refresh replaces it wholesale.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::models::LicenseCategory;
use crate::time_utils::serialize_utc_rfc3339;

/// Per-category values. Each half (license, career) is unset when the
/// remote response had no entry for the category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryStats {
    pub licence_irating: Option<i64>,
    pub licence_safety_rating: Option<f64>,
    pub starts: Option<u32>,
    pub laps: Option<u32>,
    pub wins: Option<u32>,
    pub top5: Option<u32>,
}

impl CategoryStats {
    /// True when neither the license nor the career entry was found.
    pub fn is_unset(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySnapshot {
    pub category: LicenseCategory,
    pub stats: CategoryStats,
}

/// A recent race as returned by the service, plus the resolved car name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceResult {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub car_name: String,
}

impl RaceResult {
    pub fn car_id(&self) -> Option<u64> {
        self.fields.get("car_id").and_then(Value::as_u64)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// One complete set of statistics for a member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatSnapshot {
    pub cust_id: u64,
    pub driver_name: String,
    /// One entry per scheme category, in scheme order.
    pub categories: Vec<CategorySnapshot>,
    pub recent_results: Vec<RaceResult>,
    #[serde(serialize_with = "serialize_utc_rfc3339")]
    pub fetched_at: DateTime<Utc>,
}

impl StatSnapshot {
    /// Look up a category by its field prefix (e.g. `"oval"`).
    pub fn category(&self, prefix: &str) -> Option<&CategoryStats> {
        self.categories
            .iter()
            .find(|c| c.category.prefix == prefix)
            .map(|c| &c.stats)
    }

    pub fn category_by_id(&self, category_id: u8) -> Option<&CategoryStats> {
        self.categories
            .iter()
            .find(|c| c.category.id == category_id)
            .map(|c| &c.stats)
    }

    /// Flatten into the named values published by the host.
    ///
    /// The `driver` value comes first and carries the recent results as
    /// attributes; it is followed by six values per category.
    pub fn named_values(&self) -> Vec<NamedValue> {
        let mut values = Vec::with_capacity(1 + self.categories.len() * 6);

        values.push(NamedValue {
            key: "driver".to_string(),
            value: Value::String(self.driver_name.clone()),
            attributes: Some(json!({ "recent_results": self.recent_results })),
        });

        for CategorySnapshot { category, stats } in &self.categories {
            let prefix = category.prefix.as_ref();
            values.push(NamedValue::plain(
                format!("{prefix}_licence_ir"),
                json!(stats.licence_irating),
            ));
            values.push(NamedValue::plain(
                format!("{prefix}_licence_sr"),
                json!(stats.licence_safety_rating),
            ));
            values.push(NamedValue::plain(format!("{prefix}_starts"), json!(stats.starts)));
            values.push(NamedValue::plain(format!("{prefix}_laps"), json!(stats.laps)));
            values.push(NamedValue::plain(format!("{prefix}_wins"), json!(stats.wins)));
            values.push(NamedValue::plain(format!("{prefix}_top5"), json!(stats.top5)));
        }

        values
    }

    /// Named values that carry data; unset fields are left out so the host
    /// never creates an entity for them.
    pub fn published_values(&self) -> Vec<NamedValue> {
        self.named_values()
            .into_iter()
            .filter(|v| !v.value.is_null())
            .collect()
    }
}

/// A single value published to the host, keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValue {
    pub key: String,
    /// `null` when the underlying field is unset
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
}

impl NamedValue {
    fn plain(key: String, value: Value) -> Self {
        Self {
            key,
            value,
            attributes: None,
        }
    }
}
