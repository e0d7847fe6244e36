// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use eco_tracker::config::Config;
use eco_tracker::db::{EngagementStore, FirestoreDb, MemoryDb};
use eco_tracker::models::{NewParticipant, Participant};
use eco_tracker::services::{EngagementService, GoogleIdTokenVerifier};
use eco_tracker::AppState;
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::sync::Arc;

/// Key id the static federated verifier accepts.
#[allow(dead_code)]
pub const TEST_KID: &str = "test-key-1";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Engagement service over a fresh in-memory store.
#[allow(dead_code)]
pub fn test_service() -> (EngagementService, MemoryDb) {
    let db = MemoryDb::new();
    let service = EngagementService::new(
        Arc::new(db.clone()),
        Config::test_default().leaderboard_limit,
    );
    (service, db)
}

/// Register a participant with a unique email.
#[allow(dead_code)]
pub async fn register(service: &EngagementService, name: &str) -> Participant {
    service
        .register_participant(NewParticipant {
            display_name: name.to_string(),
            email: format!("{}-{}@example.com", name.to_lowercase(), uuid::Uuid::new_v4()),
        })
        .await
        .expect("Failed to register participant")
}

/// Private half of the federated test key pair.
#[allow(dead_code)]
pub fn federated_encoding_key() -> EncodingKey {
    EncodingKey::from_rsa_pem(include_bytes!("../fixtures/federated_test_key.pem"))
        .expect("Invalid test private key")
}

/// Full app state over a memory store, with federated tokens checked
/// against the fixture public key.
#[allow(dead_code)]
pub fn create_test_state() -> (AppState, MemoryDb) {
    let config = Config::test_default();
    let db = MemoryDb::new();

    let decoding_key =
        DecodingKey::from_rsa_pem(include_bytes!("../fixtures/federated_test_key.pub.pem"))
            .expect("Invalid test public key");
    let verifier = GoogleIdTokenVerifier::new_with_static_key(&config, TEST_KID, decoding_key)
        .expect("Failed to build static verifier");

    let store: Arc<dyn EngagementStore> = Arc::new(db.clone());
    let state = AppState::with_store_and_verifier(config, store, Arc::new(verifier));
    (state, db)
}
