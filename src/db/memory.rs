// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store for tests and local development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::db::{apply_check_in, CheckInCommit, EngagementStore};
use crate::error::{AppError, Result};
use crate::models::participant::normalize_email;
use crate::models::{Activity, Participant};

#[derive(Default)]
struct MemoryState {
    participants: HashMap<String, Participant>,
    /// normalized email → participant id
    emails: HashMap<String, String>,
    activities: Vec<Activity>,
}

/// Mutex-guarded maps implementing [`EngagementStore`].
#[derive(Default, Clone)]
pub struct MemoryDb {
    state: Arc<Mutex<MemoryState>>,
    offline: Arc<AtomicBool>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail as if the backend were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Database(
                "Database not connected (offline mode)".to_string(),
            ));
        }
        self.state
            .lock()
            .map_err(|_| AppError::Database("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl EngagementStore for MemoryDb {
    async fn get_participant(&self, participant_id: &str) -> Result<Option<Participant>> {
        Ok(self.lock()?.participants.get(participant_id).cloned())
    }

    async fn get_participant_by_email(&self, email: &str) -> Result<Option<Participant>> {
        let state = self.lock()?;
        Ok(state
            .emails
            .get(&normalize_email(email))
            .and_then(|id| state.participants.get(id))
            .cloned())
    }

    async fn get_participants(&self, participant_ids: &[String]) -> Result<Vec<Participant>> {
        let state = self.lock()?;
        Ok(participant_ids
            .iter()
            .filter_map(|id| state.participants.get(id))
            .cloned()
            .collect())
    }

    async fn insert_participant(&self, participant: &Participant) -> Result<()> {
        let mut state = self.lock()?;
        if state.emails.contains_key(&participant.email) {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                participant.email
            )));
        }
        if state.participants.contains_key(&participant.id) {
            return Err(AppError::Conflict(format!(
                "Participant {} already exists",
                participant.id
            )));
        }
        state
            .emails
            .insert(participant.email.clone(), participant.id.clone());
        state
            .participants
            .insert(participant.id.clone(), participant.clone());
        Ok(())
    }

    async fn update_participant_profile(&self, participant: &Participant) -> Result<()> {
        let mut state = self.lock()?;
        let stored = state
            .participants
            .get_mut(&participant.id)
            .ok_or_else(|| AppError::NotFound(format!("Participant {}", participant.id)))?;
        stored.display_name = participant.display_name.clone();
        stored.updated_at = participant.updated_at;
        Ok(())
    }

    async fn insert_activity(&self, activity: &Activity) -> Result<()> {
        self.lock()?.activities.push(activity.clone());
        Ok(())
    }

    async fn get_activities_for_participant(
        &self,
        participant_id: &str,
    ) -> Result<Vec<Activity>> {
        let mut activities: Vec<Activity> = self
            .lock()?
            .activities
            .iter()
            .filter(|a| a.participant_id == participant_id)
            .cloned()
            .collect();
        activities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(activities)
    }

    async fn get_all_activities(&self) -> Result<Vec<Activity>> {
        Ok(self.lock()?.activities.clone())
    }

    async fn commit_check_in(&self, commit: CheckInCommit<'_>) -> Result<Participant> {
        let mut state = self.lock()?;
        let participant = state
            .participants
            .get_mut(commit.participant_id)
            .ok_or_else(|| AppError::NotFound(format!("Participant {}", commit.participant_id)))?;

        if participant.last_check_in_at != commit.expected_last_check_in_at {
            return Err(AppError::Conflict(
                "check-in state changed concurrently".to_string(),
            ));
        }

        apply_check_in(participant, &commit);
        Ok(participant.clone())
    }
}
