// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Participants (profile and check-in streak)
//! - Participant emails (unique email index)
//! - Activities (logged actions with frozen impact/points)

use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::{paths, FirestoreConsistencySelector, FirestoreTransaction};
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::db::{apply_check_in, collections, CheckInCommit, EngagementStore};
use crate::error::{AppError, Result};
use crate::models::participant::normalize_email;
use crate::models::{Activity, Participant};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Document in the email index collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmailIndexEntry {
    participant_id: String,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore (Emulator)");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client for testing; every operation fails.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    async fn get_email_entry(&self, email: &str) -> Result<Option<EmailIndexEntry>> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PARTICIPANT_EMAILS)
            .obj()
            .one(&normalize_email(email))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Client whose reads join `transaction`, so Firestore aborts the commit if
/// a document read here is written by someone else first.
fn transaction_reader(
    client: &firestore::FirestoreDb,
    transaction: &FirestoreTransaction<'_>,
) -> firestore::FirestoreDb {
    client.clone_with_consistency_selector(FirestoreConsistencySelector::Transaction(
        transaction.transaction_id().clone(),
    ))
}

/// Map a commit failure, reporting lost contention as `Conflict`.
fn commit_error(e: FirestoreError) -> AppError {
    match e {
        FirestoreError::DataConflictError(err) => AppError::Conflict(err.to_string()),
        FirestoreError::DatabaseError(ref err) if err.retry_possible => {
            AppError::Conflict(format!("transaction aborted by contention: {}", e))
        }
        other => AppError::Database(format!("Transaction commit failed: {}", other)),
    }
}

#[async_trait]
impl EngagementStore for FirestoreDb {
    // ─── Participant Operations ──────────────────────────────────

    async fn get_participant(&self, participant_id: &str) -> Result<Option<Participant>> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PARTICIPANTS)
            .obj()
            .one(participant_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_participant_by_email(&self, email: &str) -> Result<Option<Participant>> {
        match self.get_email_entry(email).await? {
            Some(entry) => self.get_participant(&entry.participant_id).await,
            None => Ok(None),
        }
    }

    /// Concurrent point lookups, bounded to avoid overloading Firestore.
    async fn get_participants(&self, participant_ids: &[String]) -> Result<Vec<Participant>> {
        let found = stream::iter(participant_ids.iter().cloned())
            .map(|id| async move { self.get_participant(&id).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<Participant>>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<Participant>>>>()?;

        Ok(found.into_iter().flatten().collect())
    }

    /// Writes the participant and its email index entry in one transaction.
    async fn insert_participant(&self, participant: &Participant) -> Result<()> {
        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let existing: Option<EmailIndexEntry> = transaction_reader(client, &transaction)
            .fluent()
            .select()
            .by_id_in(collections::PARTICIPANT_EMAILS)
            .obj()
            .one(&participant.email)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read email index in transaction: {}", e))
            })?;

        if existing.is_some() {
            let _ = transaction.rollback().await;
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                participant.email
            )));
        }

        client
            .fluent()
            .update()
            .in_col(collections::PARTICIPANTS)
            .document_id(&participant.id)
            .object(participant)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add participant to transaction: {}", e))
            })?;

        let entry = EmailIndexEntry {
            participant_id: participant.id.clone(),
        };
        client
            .fluent()
            .update()
            .in_col(collections::PARTICIPANT_EMAILS)
            .document_id(&participant.email)
            .object(&entry)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add email index to transaction: {}", e))
            })?;

        transaction.commit().await.map_err(commit_error)?;

        tracing::info!(participant_id = %participant.id, "Participant created");
        Ok(())
    }

    /// Masked write: streak and eco-point fields are never touched here.
    async fn update_participant_profile(&self, participant: &Participant) -> Result<()> {
        if self.get_participant(&participant.id).await?.is_none() {
            return Err(AppError::NotFound(format!("Participant {}", participant.id)));
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(paths!(Participant::{display_name, updated_at}))
            .in_col(collections::PARTICIPANTS)
            .document_id(&participant.id)
            .object(participant)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Activity Operations ─────────────────────────────────────

    async fn insert_activity(&self, activity: &Activity) -> Result<()> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ACTIVITIES)
            .document_id(&activity.id)
            .object(activity)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_activities_for_participant(
        &self,
        participant_id: &str,
    ) -> Result<Vec<Activity>> {
        let mut activities: Vec<Activity> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(|q| q.for_all([q.field("participant_id").eq(participant_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Sorted here rather than in the query to avoid a composite index.
        activities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(activities)
    }

    async fn get_all_activities(&self) -> Result<Vec<Activity>> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Check-in Commit ─────────────────────────────────────────

    /// Guarded write of a check-in transition.
    ///
    /// The participant is re-read inside the transaction and compared
    /// against the timestamp the transition was computed from; a mismatch
    /// means another writer got there first and nothing is written. A writer
    /// that commits between our read and our commit makes Firestore abort
    /// the transaction, which is also reported as `Conflict`.
    async fn commit_check_in(&self, commit: CheckInCommit<'_>) -> Result<Participant> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let current: Option<Participant> = transaction_reader(client, &transaction)
            .fluent()
            .select()
            .by_id_in(collections::PARTICIPANTS)
            .obj()
            .one(commit.participant_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read participant in transaction: {}", e))
            })?;

        let Some(mut participant) = current else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!(
                "Participant {}",
                commit.participant_id
            )));
        };

        if participant.last_check_in_at != commit.expected_last_check_in_at {
            tracing::warn!(
                participant_id = commit.participant_id,
                "Check-in state changed concurrently, aborting write"
            );
            let _ = transaction.rollback().await;
            return Err(AppError::Conflict(
                "check-in state changed concurrently".to_string(),
            ));
        }

        apply_check_in(&mut participant, &commit);

        client
            .fluent()
            .update()
            .fields(paths!(Participant::{
                check_in_streak,
                last_check_in_at,
                eco_points,
                updated_at
            }))
            .in_col(collections::PARTICIPANTS)
            .document_id(&participant.id)
            .object(&participant)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add check-in to transaction: {}", e))
            })?;

        transaction.commit().await.map_err(commit_error)?;

        Ok(participant)
    }
}
