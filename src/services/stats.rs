// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Snapshot assembly.
//!
//! Handles the workflow for one refresh:
//! 1. Fetch member info with licenses
//! 2. Fetch career totals
//! 3. Fetch recent races
//! 4. Reshape into a `StatSnapshot` for the configured category scheme

use crate::error::{AppError, Result};
use crate::models::member::index_by_category;
use crate::models::{
    CategoryScheme, CategorySnapshot, CategoryStats, MemberCareerResponse, MemberInfoResponse,
    RaceResult, RecentRacesResponse, StatSnapshot,
};
use crate::services::ApiSession;
use chrono::Utc;
use std::sync::Arc;

/// Number of recent races kept in a snapshot.
pub const RECENT_RESULTS_LIMIT: usize = 5;

/// Car name used when a race's car id is not in the session index.
pub const UNKNOWN_CAR_NAME: &str = "Unknown car";

/// Builds snapshots for a member from the API session.
#[derive(Clone)]
pub struct StatsFetcher {
    session: Arc<ApiSession>,
    scheme: CategoryScheme,
}

impl StatsFetcher {
    pub fn new(session: Arc<ApiSession>, scheme: CategoryScheme) -> Self {
        Self { session, scheme }
    }

    pub fn session(&self) -> &Arc<ApiSession> {
        &self.session
    }

    pub fn scheme(&self) -> &CategoryScheme {
        &self.scheme
    }

    /// Fetch a fresh snapshot for `cust_id`.
    ///
    /// Any request failure fails the whole snapshot; a category missing from
    /// the responses only leaves that category unset.
    pub async fn fetch_snapshot(&self, cust_id: u64) -> Result<StatSnapshot> {
        tracing::debug!(cust_id, "Fetching iRacing snapshot");

        let member = self.session.get_member(cust_id).await?;
        let career = self.session.get_member_career(cust_id).await?;
        let races = self.session.get_recent_races(cust_id).await?;
        self.session.ensure_car_names().await;

        let snapshot = assemble_snapshot(cust_id, &self.scheme, member, career, races, |car_id| {
            self.session.car_name(car_id)
        })?;

        tracing::info!(
            cust_id,
            driver = %snapshot.driver_name,
            recent_results = snapshot.recent_results.len(),
            "iRacing snapshot fetched"
        );
        Ok(snapshot)
    }
}

/// Reshape the three API responses into a snapshot.
///
/// `car_name` resolves car ids; unresolved ids get `UNKNOWN_CAR_NAME`.
pub fn assemble_snapshot(
    cust_id: u64,
    scheme: &CategoryScheme,
    member_info: MemberInfoResponse,
    career: MemberCareerResponse,
    recent: RecentRacesResponse,
    car_name: impl Fn(u64) -> Option<String>,
) -> Result<StatSnapshot> {
    let member = member_info
        .members
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Lookup(format!("Member {}", cust_id)))?;

    let licenses = index_by_category(&member.licenses, |l| l.category_id);
    let career_stats = index_by_category(&career.stats, |s| s.category_id);

    let categories = scheme
        .categories()
        .iter()
        .map(|category| {
            let mut stats = CategoryStats::default();

            match licenses.get(&category.id) {
                Some(license) => {
                    stats.licence_irating = license.irating;
                    stats.licence_safety_rating = Some(license.safety_rating);
                }
                None => {
                    tracing::debug!(cust_id, category = %category.prefix, "No license entry");
                }
            }

            match career_stats.get(&category.id) {
                Some(totals) => {
                    stats.starts = Some(totals.starts);
                    stats.laps = Some(totals.laps);
                    stats.wins = Some(totals.wins);
                    stats.top5 = Some(totals.top5);
                }
                None => {
                    tracing::debug!(cust_id, category = %category.prefix, "No career entry");
                }
            }

            CategorySnapshot {
                category: category.clone(),
                stats,
            }
        })
        .collect();

    let recent_results = recent
        .races
        .into_iter()
        .take(RECENT_RESULTS_LIMIT)
        .map(|fields| {
            let car_id = fields.get("car_id").and_then(|v| v.as_u64());
            let name = car_id.and_then(&car_name).unwrap_or_else(|| {
                tracing::warn!(cust_id, car_id, "Car name not found, using placeholder");
                UNKNOWN_CAR_NAME.to_string()
            });
            RaceResult {
                fields,
                car_name: name,
            }
        })
        .collect();

    Ok(StatSnapshot {
        cust_id,
        driver_name: member.display_name,
        categories,
        recent_results,
        fetched_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn member_info(license_categories: &[u8]) -> MemberInfoResponse {
        let licenses: Vec<_> = license_categories
            .iter()
            .map(|id| json!({"category_id": id, "irating": 1000 + *id as i64, "safety_rating": 2.5}))
            .collect();
        serde_json::from_value(json!({
            "members": [{"cust_id": 12345, "display_name": "Test Driver", "licenses": licenses}]
        }))
        .unwrap()
    }

    fn career(categories: &[u8]) -> MemberCareerResponse {
        let stats: Vec<_> = categories
            .iter()
            .map(|id| json!({"category_id": id, "starts": 10, "laps": 200, "wins": *id, "top5": 4}))
            .collect();
        serde_json::from_value(json!({"cust_id": 12345, "stats": stats})).unwrap()
    }

    fn races(count: usize) -> RecentRacesResponse {
        let races: Vec<_> = (0..count)
            .map(|i| json!({"subsession_id": 9000 + i, "car_id": 67, "finish_position": i + 1}))
            .collect();
        serde_json::from_value(json!({"cust_id": 12345, "races": races})).unwrap()
    }

    fn mx5(car_id: u64) -> Option<String> {
        (car_id == 67).then(|| "Mazda MX-5 Cup".to_string())
    }

    #[test]
    fn test_missing_categories_stay_unset() {
        let snapshot = assemble_snapshot(
            12345,
            &CategoryScheme::legacy(),
            member_info(&[1, 3]),
            career(&[1, 3]),
            races(0),
            mx5,
        )
        .unwrap();

        let oval = snapshot.category("oval").unwrap();
        assert_eq!(oval.licence_irating, Some(1001));
        assert_eq!(oval.licence_safety_rating, Some(2.5));
        assert_eq!(oval.wins, Some(1));

        assert!(snapshot.category("road").unwrap().is_unset());
        assert!(snapshot.category("dirt_road").unwrap().is_unset());
        assert_eq!(snapshot.category("dirt_oval").unwrap().starts, Some(10));
    }

    #[test]
    fn test_license_without_career_is_partial() {
        let snapshot = assemble_snapshot(
            12345,
            &CategoryScheme::legacy(),
            member_info(&[2]),
            career(&[]),
            races(0),
            mx5,
        )
        .unwrap();

        let road = snapshot.category("road").unwrap();
        assert_eq!(road.licence_irating, Some(1002));
        assert_eq!(road.starts, None);
    }

    #[test]
    fn test_recent_results_truncated_in_order() {
        let snapshot = assemble_snapshot(
            12345,
            &CategoryScheme::current(),
            member_info(&[1]),
            career(&[1]),
            races(20),
            mx5,
        )
        .unwrap();

        assert_eq!(snapshot.recent_results.len(), RECENT_RESULTS_LIMIT);
        let positions: Vec<_> = snapshot
            .recent_results
            .iter()
            .map(|r| r.get("finish_position").cloned().unwrap())
            .collect();
        assert_eq!(positions, vec![json!(1), json!(2), json!(3), json!(4), json!(5)]);
        assert!(snapshot
            .recent_results
            .iter()
            .all(|r| r.car_name == "Mazda MX-5 Cup"));
    }

    #[test]
    fn test_unknown_car_uses_placeholder() {
        let recent: RecentRacesResponse = serde_json::from_value(json!({
            "races": [{"car_id": 999}, {"series_name": "no car id"}]
        }))
        .unwrap();

        let snapshot = assemble_snapshot(
            12345,
            &CategoryScheme::current(),
            member_info(&[]),
            career(&[]),
            recent,
            mx5,
        )
        .unwrap();

        assert_eq!(snapshot.recent_results[0].car_name, UNKNOWN_CAR_NAME);
        assert_eq!(snapshot.recent_results[1].car_name, UNKNOWN_CAR_NAME);
    }

    #[test]
    fn test_no_member_is_lookup_error() {
        let empty: MemberInfoResponse = serde_json::from_value(json!({"members": []})).unwrap();
        let result = assemble_snapshot(
            12345,
            &CategoryScheme::current(),
            empty,
            career(&[]),
            races(0),
            mx5,
        );
        assert!(matches!(result, Err(AppError::Lookup(_))));
    }
}
