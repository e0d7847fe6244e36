// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (`FIRESTORE_EMULATOR_HOST`); they are skipped otherwise.

use chrono::{Duration, TimeZone, Utc};
use eco_tracker::db::{CheckInCommit, EngagementStore, FirestoreDb};
use eco_tracker::error::AppError;
use eco_tracker::models::{Activity, AuthProvider, NewActivity, Participant};
use eco_tracker::services::checkin::CheckInState;
use eco_tracker::services::EngagementService;
use std::sync::Arc;

mod common;
use common::test_db;

fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, uuid::Uuid::new_v4())
}

// ═══════════════════════════════════════════════════════════════════════════
// PARTICIPANT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_participant_round_trip_and_email_index() {
    require_emulator!();

    let db = test_db().await;
    let participant = Participant::new("Ada", &unique_email("ada"), AuthProvider::Local, Utc::now());

    assert!(db.get_participant(&participant.id).await.unwrap().is_none());
    db.insert_participant(&participant).await.unwrap();

    let stored = db.get_participant(&participant.id).await.unwrap().unwrap();
    assert_eq!(stored.display_name, "Ada");
    assert_eq!(stored.check_in_streak, 0);

    let by_email = db
        .get_participant_by_email(&participant.email.to_uppercase())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_email.id, participant.id);

    let duplicate = Participant::new("Other", &participant.email, AuthProvider::Google, Utc::now());
    assert!(matches!(
        db.insert_participant(&duplicate).await,
        Err(AppError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_get_participants_skips_unknown_ids() {
    require_emulator!();

    let db = test_db().await;
    let a = Participant::new("A", &unique_email("a"), AuthProvider::Local, Utc::now());
    let b = Participant::new("B", &unique_email("b"), AuthProvider::Local, Utc::now());
    db.insert_participant(&a).await.unwrap();
    db.insert_participant(&b).await.unwrap();

    let ids = vec![a.id.clone(), "missing".to_string(), b.id.clone()];
    let mut found: Vec<String> = db
        .get_participants(&ids)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    found.sort();

    let mut expected = vec![a.id, b.id];
    expected.sort();
    assert_eq!(found, expected);
}

// ═══════════════════════════════════════════════════════════════════════════
// ACTIVITY TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_activities_filtered_and_newest_first() {
    require_emulator!();

    let db = test_db().await;
    let owner = Participant::new("Owner", &unique_email("owner"), AuthProvider::Local, Utc::now());
    db.insert_participant(&owner).await.unwrap();

    let base = Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap();
    for (i, title) in ["older", "newer"].iter().enumerate() {
        let activity = Activity::new(
            &owner.id,
            NewActivity::new(*title, "Tree Plantation", 1.0),
            base + Duration::hours(i as i64),
        );
        db.insert_activity(&activity).await.unwrap();
    }
    let other = Activity::new(
        "someone-else",
        NewActivity::new("not mine", "Energy Saving", 1.0),
        base,
    );
    db.insert_activity(&other).await.unwrap();

    let activities = db.get_activities_for_participant(&owner.id).await.unwrap();
    let titles: Vec<&str> = activities.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, ["newer", "older"]);
    assert_eq!(activities[0].points_earned, 50.0);
    assert_eq!(activities[0].impact.co2_saved_kg, Some(21.0));
}

// ═══════════════════════════════════════════════════════════════════════════
// CHECK-IN TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_check_in_commit_guard() {
    require_emulator!();

    let db = test_db().await;
    let participant =
        Participant::new("Streaker", &unique_email("streak"), AuthProvider::Local, Utc::now());
    db.insert_participant(&participant).await.unwrap();

    let t0 = Utc.with_ymd_and_hms(2026, 4, 2, 9, 0, 0).unwrap();
    let commit = CheckInCommit {
        participant_id: &participant.id,
        expected_last_check_in_at: None,
        next: CheckInState {
            streak: 1,
            last_check_in_at: Some(t0),
        },
        eco_bonus: 0,
        now: t0,
    };

    let updated = db.commit_check_in(commit).await.unwrap();
    assert_eq!(updated.check_in_streak, 1);

    let stale = db.commit_check_in(commit).await.unwrap_err();
    assert!(matches!(stale, AppError::Conflict(_)));

    let stored = db.get_participant(&participant.id).await.unwrap().unwrap();
    assert_eq!(stored.last_check_in_at, Some(t0));
}

#[tokio::test]
async fn test_profile_update_keeps_redeemed_eco_points() {
    require_emulator!();

    let db = test_db().await;
    let participant =
        Participant::new("Saver", &unique_email("saver"), AuthProvider::Local, Utc::now());
    db.insert_participant(&participant).await.unwrap();

    // Copy read before the check-in lands: eco_points 0, no streak.
    let mut stale = db.get_participant(&participant.id).await.unwrap().unwrap();

    let t0 = Utc.with_ymd_and_hms(2026, 4, 3, 9, 0, 0).unwrap();
    db.commit_check_in(CheckInCommit {
        participant_id: &participant.id,
        expected_last_check_in_at: None,
        next: CheckInState {
            streak: 0,
            last_check_in_at: Some(t0),
        },
        eco_bonus: 50,
        now: t0,
    })
    .await
    .unwrap();

    stale.display_name = "Saver Renamed".to_string();
    stale.updated_at = t0 + Duration::minutes(1);
    db.update_participant_profile(&stale).await.unwrap();

    let stored = db.get_participant(&participant.id).await.unwrap().unwrap();
    assert_eq!(stored.display_name, "Saver Renamed");
    assert_eq!(stored.eco_points, 50);
    assert_eq!(stored.last_check_in_at, Some(t0));
}

#[tokio::test]
async fn test_update_profile_unknown_participant() {
    require_emulator!();

    let db = test_db().await;
    let ghost = Participant::new("Ghost", &unique_email("ghost"), AuthProvider::Local, Utc::now());
    assert!(matches!(
        db.update_participant_profile(&ghost).await,
        Err(AppError::NotFound(_))
    ));
    assert!(db.get_participant(&ghost.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_service_over_firestore() {
    require_emulator!();

    let service = EngagementService::new(Arc::new(test_db().await), 10);
    let participant = service
        .register_participant(eco_tracker::models::NewParticipant {
            display_name: "Grace".to_string(),
            email: unique_email("grace"),
        })
        .await
        .unwrap();

    service
        .record_activity(
            &participant.id,
            NewActivity::new("Recycled", "Waste Reduction", 2.0),
        )
        .await
        .unwrap();
    assert_eq!(service.get_points(&participant.id).await.unwrap(), 20.0);

    let outcome = service.check_in(&participant.id, Utc::now()).await.unwrap();
    assert_eq!(outcome.check_in_streak, 1);
}

#[tokio::test]
async fn test_offline_client_fails() {
    let db = FirestoreDb::new_mock();
    assert!(matches!(
        db.get_all_activities().await,
        Err(AppError::Database(_))
    ));
}
