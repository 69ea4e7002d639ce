// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use iracing_stats::config::Config;
use iracing_stats::models::CategoryScheme;
use iracing_stats::services::session::{
    AUTH_ENDPOINT, CAREER_ENDPOINT, CARS_ENDPOINT, MEMBER_ENDPOINT, RECENT_RACES_ENDPOINT,
};
use iracing_stats::services::{ApiSession, Credentials, ScriptedTransport};
use iracing_stats::AppState;
use serde_json::{json, Value};
use std::sync::Arc;

pub const CUST_ID: u64 = 12345;

/// Create a session over a fresh scripted transport.
#[allow(dead_code)]
pub fn test_session() -> (Arc<ScriptedTransport>, Arc<ApiSession>) {
    let transport = Arc::new(ScriptedTransport::new());
    let session = Arc::new(ApiSession::new(
        transport.clone(),
        Credentials::new("driver@example.com", "hunter2"),
    ));
    (transport, session)
}

/// Create the full integration (legacy categories) over a scripted transport.
#[allow(dead_code)]
pub fn test_app() -> (Arc<ScriptedTransport>, AppState) {
    let transport = Arc::new(ScriptedTransport::new());
    let config = Config {
        cust_id: CUST_ID,
        category_scheme: CategoryScheme::legacy(),
        ..Config::default()
    };
    let state = AppState::with_transport(config, transport.clone());
    (transport, state)
}

/// Queue a successful login followed by the car list it triggers.
#[allow(dead_code)]
pub fn script_login(transport: &ScriptedTransport) {
    transport.on_post(AUTH_ENDPOINT, 200, json!({"authcode": "abc123", "ssoCookieValue": "x"}));
    transport.on_get(
        CARS_ENDPOINT,
        200,
        json!([
            {"car_id": 67, "car_name": "Mazda MX-5 Cup"},
            {"car_id": 132, "car_name": "BMW M4 GT3"}
        ]),
    );
}

#[allow(dead_code)]
pub fn member_fixture(categories: &[u8]) -> Value {
    let licenses: Vec<Value> = categories
        .iter()
        .map(|id| {
            json!({
                "category_id": id,
                "category": format!("category_{}", id),
                "irating": 1500 + (*id as i64) * 100,
                "safety_rating": 3.0 + (*id as f64) / 10.0,
                "group_name": "Class B"
            })
        })
        .collect();

    json!({
        "success": true,
        "cust_ids": [CUST_ID],
        "members": [{
            "cust_id": CUST_ID,
            "display_name": "Test Driver",
            "licenses": licenses
        }]
    })
}

#[allow(dead_code)]
pub fn career_fixture(categories: &[u8]) -> Value {
    let stats: Vec<Value> = categories
        .iter()
        .map(|id| {
            json!({
                "category_id": id,
                "category": format!("category_{}", id),
                "starts": 100 + *id as u32,
                "wins": *id as u32,
                "top5": 20 + *id as u32,
                "poles": 1,
                "laps": 5000 + *id as u32,
                "laps_led": 42
            })
        })
        .collect();

    json!({"cust_id": CUST_ID, "stats": stats})
}

#[allow(dead_code)]
pub fn races_fixture(count: usize) -> Value {
    let races: Vec<Value> = (0..count)
        .map(|i| {
            let car_id = if i % 2 == 0 { 67 } else { 132 };
            json!({
                "subsession_id": 70_000_000 + i,
                "series_name": "Global Mazda MX-5 Fanatec Cup",
                "car_id": car_id,
                "start_position": 10,
                "finish_position": i + 1,
                "incidents": 2
            })
        })
        .collect();

    json!({"cust_id": CUST_ID, "races": races})
}

/// Queue the three snapshot endpoints.
#[allow(dead_code)]
pub fn script_snapshot(transport: &ScriptedTransport, categories: &[u8], races: usize) {
    transport.on_get(MEMBER_ENDPOINT, 200, member_fixture(categories));
    transport.on_get(CAREER_ENDPOINT, 200, career_fixture(categories));
    transport.on_get(RECENT_RACES_ENDPOINT, 200, races_fixture(races));
}
