use chrono::Utc;
use criterion::{criterion_group, criterion_main, Criterion};
use eco_tracker::models::{Activity, NewActivity, ParticipantTotals};
use eco_tracker::services::leaderboard::rank_participants;
use std::hint::black_box;

const CATEGORIES: [&str; 6] = [
    "Green Transportation",
    "Water Conservation",
    "Tree Plantation",
    "Energy Saving",
    "Waste Reduction",
    "Composting",
];

/// Synthetic history: `participants` owners with 20 activities each.
fn build_activities(participants: usize) -> Vec<Activity> {
    let now = Utc::now();
    (0..participants * 20)
        .map(|i| {
            let request = NewActivity::new(
                "bench",
                CATEGORIES[i % CATEGORIES.len()],
                (i % 17) as f64,
            );
            Activity::new(&format!("participant-{}", i % participants), request, now)
        })
        .collect()
}

fn benchmark_aggregation(c: &mut Criterion) {
    let small = build_activities(100);
    let large = build_activities(5_000);

    let mut group = c.benchmark_group("leaderboard_aggregation");

    group.bench_function("rank_2k_activities", |b| {
        b.iter(|| rank_participants(black_box(&small)))
    });

    group.bench_function("rank_100k_activities", |b| {
        b.iter(|| rank_participants(black_box(&large)))
    });

    group.bench_function("totals_one_participant", |b| {
        let mine: Vec<&Activity> = large
            .iter()
            .filter(|a| a.participant_id == "participant-42")
            .collect();
        b.iter(|| ParticipantTotals::from_activities(black_box(mine.iter().copied()), Utc::now()))
    });

    group.finish();
}

criterion_group!(benches, benchmark_aggregation);
criterion_main!(benches);
