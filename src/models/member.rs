// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Response shapes of the iRacing members API endpoints we consume.
//!
//! Only the fields needed for a snapshot are typed; everything else in the
//! payloads is ignored.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// `GET /data/member/get` response.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberInfoResponse {
    #[serde(default)]
    pub members: Vec<Member>,
}

/// A member with their licenses.
#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    pub cust_id: u64,
    pub display_name: String,
    #[serde(default)]
    pub licenses: Vec<License>,
}

/// One license entry per racing category.
#[derive(Debug, Clone, Deserialize)]
pub struct License {
    pub category_id: u8,
    /// Missing for categories the member never raced
    #[serde(default)]
    pub irating: Option<i64>,
    pub safety_rating: f64,
}

/// `GET /data/stats/member_career` response.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberCareerResponse {
    #[serde(default)]
    pub stats: Vec<CareerStats>,
}

/// Career totals for one category.
#[derive(Debug, Clone, Deserialize)]
pub struct CareerStats {
    pub category_id: u8,
    pub starts: u32,
    pub laps: u32,
    pub wins: u32,
    pub top5: u32,
}

/// `GET /data/stats/member_recent_races` response.
///
/// Races are kept as raw objects and passed through to consumers.
#[derive(Debug, Clone, Deserialize)]
pub struct RecentRacesResponse {
    #[serde(default)]
    pub races: Vec<Map<String, Value>>,
}

/// Entry of the `GET /data/car/get` list.
#[derive(Debug, Clone, Deserialize)]
pub struct Car {
    pub car_id: u64,
    pub car_name: String,
}

/// Index entries by `category_id`, keeping the first match for each id.
pub fn index_by_category<'a, T>(
    items: &'a [T],
    category_id: impl Fn(&T) -> u8,
) -> HashMap<u8, &'a T> {
    let mut index = HashMap::with_capacity(items.len());
    for item in items {
        index.entry(category_id(item)).or_insert(item);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_license_without_irating() {
        let license: License = serde_json::from_value(json!({
            "category_id": 3,
            "category": "dirt_oval",
            "safety_rating": 2.5,
            "group_name": "Rookie"
        }))
        .unwrap();

        assert_eq!(license.irating, None);
        assert_eq!(license.safety_rating, 2.5);
    }

    #[test]
    fn test_index_keeps_first_match() {
        let stats: Vec<CareerStats> = serde_json::from_value(json!([
            {"category_id": 1, "starts": 10, "laps": 100, "wins": 1, "top5": 3},
            {"category_id": 1, "starts": 99, "laps": 999, "wins": 9, "top5": 9},
            {"category_id": 2, "starts": 5, "laps": 50, "wins": 0, "top5": 1}
        ]))
        .unwrap();

        let index = index_by_category(&stats, |s| s.category_id);
        assert_eq!(index.len(), 2);
        assert_eq!(index[&1].starts, 10);
        assert_eq!(index[&2].laps, 50);
    }
}
