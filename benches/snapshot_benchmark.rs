use criterion::{black_box, criterion_group, criterion_main, Criterion};
use iracing_stats::models::{
    CategoryScheme, MemberCareerResponse, MemberInfoResponse, RecentRacesResponse,
};
use iracing_stats::services::assemble_snapshot;
use serde_json::{json, Value};

fn member_value() -> Value {
    let licenses: Vec<Value> = (1..=6)
        .map(|id| json!({"category_id": id, "irating": 1500 + id * 50, "safety_rating": 3.5}))
        .collect();
    json!({"members": [{"cust_id": 12345, "display_name": "Bench Driver", "licenses": licenses}]})
}

fn career_value() -> Value {
    let stats: Vec<Value> = (1..=6)
        .map(|id| json!({"category_id": id, "starts": 250, "laps": 9000, "wins": 12, "top5": 60}))
        .collect();
    json!({"stats": stats})
}

fn races_value() -> Value {
    let races: Vec<Value> = (0..25)
        .map(|i| json!({"subsession_id": 70_000_000 + i, "car_id": 67, "finish_position": 3}))
        .collect();
    json!({"races": races})
}

fn benchmark_assemble_snapshot(c: &mut Criterion) {
    let member: MemberInfoResponse =
        serde_json::from_value(member_value()).expect("Failed to parse member fixture");
    let career: MemberCareerResponse =
        serde_json::from_value(career_value()).expect("Failed to parse career fixture");
    let races: RecentRacesResponse =
        serde_json::from_value(races_value()).expect("Failed to parse races fixture");

    let mut group = c.benchmark_group("snapshot");

    for (name, scheme) in [
        ("current_scheme", CategoryScheme::current()),
        ("legacy_scheme", CategoryScheme::legacy()),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                assemble_snapshot(
                    12345,
                    black_box(&scheme),
                    member.clone(),
                    career.clone(),
                    races.clone(),
                    |_| Some("Mazda MX-5 Cup".to_string()),
                )
            })
        });
    }

    group.bench_function("named_values", |b| {
        let snapshot = assemble_snapshot(
            12345,
            &CategoryScheme::current(),
            member.clone(),
            career.clone(),
            races.clone(),
            |_| Some("Mazda MX-5 Cup".to_string()),
        )
        .expect("Failed to assemble snapshot");
        b.iter(|| black_box(&snapshot).named_values())
    });

    group.finish();
}

criterion_group!(benches, benchmark_assemble_snapshot);
criterion_main!(benches);
