// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Engagement service: the operations callers run against the store.
//!
//! Handles:
//! 1. Recording activities with a frozen impact/points snapshot
//! 2. Totals, points and badges folded from history
//! 3. The leaderboard and per-participant detail view
//! 4. Daily check-ins and participant profiles

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use validator::Validate;

use crate::db::{CheckInCommit, EngagementStore};
use crate::error::{AppError, Result};
use crate::models::{
    Activity, AuthProvider, NewActivity, NewParticipant, Participant, ParticipantTotals,
    ProfileUpdate,
};
use crate::services::badges::{evaluate_badges, Badge};
use crate::services::checkin::{
    CheckInLocks, CheckInOutcome, CheckInStatusView, CheckInTransition,
};
use crate::services::leaderboard::{
    build_entries, rank_participants, resolve_limit, LeaderboardEntry, ParticipantDetail,
};

pub struct EngagementService {
    store: Arc<dyn EngagementStore>,
    locks: CheckInLocks,
    leaderboard_limit: usize,
}

impl EngagementService {
    pub fn new(store: Arc<dyn EngagementStore>, leaderboard_limit: usize) -> Self {
        Self {
            store,
            locks: CheckInLocks::default(),
            leaderboard_limit,
        }
    }

    /// Per-participant lock guarding read-modify-write of streak fields.
    fn participant_lock(&self, participant_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(participant_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn require_participant(&self, participant_id: &str) -> Result<Participant> {
        self.store
            .get_participant(participant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Participant {}", participant_id)))
    }

    // ─── Activities ──────────────────────────────────────────────

    /// Validate and store a new activity for a participant.
    pub async fn record_activity(
        &self,
        participant_id: &str,
        request: NewActivity,
    ) -> Result<Activity> {
        request.validate()?;

        if request.title.trim().is_empty() {
            return Err(AppError::Validation("title is required".to_string()));
        }
        if request.category.label().trim().is_empty() {
            return Err(AppError::Validation("category is required".to_string()));
        }
        match &request.quantity {
            None => return Err(AppError::Validation("quantity is required".to_string())),
            Some(q) if q.is_blank() => {
                return Err(AppError::Validation("quantity is required".to_string()))
            }
            Some(_) => {}
        }

        if !request.category.is_recognized() {
            tracing::warn!(
                participant_id,
                category = %request.category,
                "Unrecognized activity category, scoring with defaults"
            );
        }

        self.require_participant(participant_id).await?;

        let activity = Activity::new(participant_id, request, Utc::now());
        self.store.insert_activity(&activity).await?;

        tracing::info!(
            participant_id,
            activity_id = %activity.id,
            category = %activity.category,
            points = activity.points_earned,
            "Activity recorded"
        );

        Ok(activity)
    }

    /// A participant's activities, newest first.
    pub async fn list_activities(&self, participant_id: &str) -> Result<Vec<Activity>> {
        self.store
            .get_activities_for_participant(participant_id)
            .await
    }

    pub async fn get_totals(&self, participant_id: &str) -> Result<ParticipantTotals> {
        self.get_totals_at(participant_id, Utc::now()).await
    }

    /// Totals with "today" taken as the UTC day of `now`.
    pub async fn get_totals_at(
        &self,
        participant_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ParticipantTotals> {
        let activities = self.list_activities(participant_id).await?;
        Ok(ParticipantTotals::from_activities(&activities, now))
    }

    pub async fn get_points(&self, participant_id: &str) -> Result<f64> {
        Ok(self.get_totals(participant_id).await?.total_points)
    }

    pub async fn get_badges(&self, participant_id: &str) -> Result<Vec<Badge>> {
        let totals = self.get_totals(participant_id).await?;
        Ok(evaluate_badges(totals.total_points, totals.total_activities))
    }

    // ─── Leaderboard ─────────────────────────────────────────────

    /// Top participants by points. `None` uses the configured default size.
    pub async fn get_leaderboard(&self, limit: Option<usize>) -> Result<Vec<LeaderboardEntry>> {
        let limit = resolve_limit(limit, self.leaderboard_limit)?;

        let activities = self.store.get_all_activities().await?;
        let mut scores = rank_participants(&activities);
        scores.truncate(limit);

        let ids: Vec<String> = scores.iter().map(|s| s.participant_id.clone()).collect();
        let participants: HashMap<String, Participant> = self
            .store
            .get_participants(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        tracing::debug!(
            limit,
            entries = scores.len(),
            activities = activities.len(),
            "Leaderboard computed"
        );

        Ok(build_entries(scores, &participants))
    }

    pub async fn get_participant_detail(&self, participant_id: &str) -> Result<ParticipantDetail> {
        let participant = self.require_participant(participant_id).await?;
        let activities = self.list_activities(participant_id).await?;
        let totals = ParticipantTotals::from_activities(&activities, Utc::now());

        Ok(ParticipantDetail {
            profile: (&participant).into(),
            points: totals.total_points,
            badges: evaluate_badges(totals.total_points, totals.total_activities),
            totals,
            activities,
        })
    }

    // ─── Check-in ────────────────────────────────────────────────

    /// Attempt a daily check-in at `now`.
    ///
    /// A too-early attempt is a normal outcome and writes nothing. Unknown
    /// ids fail before a lock entry is created for them.
    pub async fn check_in(
        &self,
        participant_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CheckInOutcome> {
        self.require_participant(participant_id).await?;

        let lock = self.participant_lock(participant_id);
        let _guard = lock.lock().await;

        // Re-read under the lock; the first read may predate another check-in.
        let participant = self.require_participant(participant_id).await?;
        let current = participant.check_in_state();
        let transition = current.advance(now);

        match transition {
            CheckInTransition::TooEarly { eligible_at, .. } => {
                tracing::info!(
                    participant_id,
                    streak = current.streak,
                    eligible_at = %eligible_at,
                    "Check-in rejected: too early"
                );
            }
            CheckInTransition::Accepted {
                next,
                redeemed,
                eco_bonus,
            } => {
                let updated = self
                    .store
                    .commit_check_in(CheckInCommit {
                        participant_id,
                        expected_last_check_in_at: current.last_check_in_at,
                        next,
                        eco_bonus,
                        now,
                    })
                    .await?;

                if redeemed {
                    tracing::info!(
                        participant_id,
                        eco_bonus,
                        eco_points = updated.eco_points,
                        "Check-in streak redeemed"
                    );
                } else {
                    tracing::info!(participant_id, streak = next.streak, "Check-in accepted");
                }
            }
        }

        Ok(CheckInOutcome::from(&transition))
    }

    /// Current streak and next eligible instant; `{0, null}` when the
    /// participant has no check-in record.
    pub async fn get_check_in_status(&self, participant_id: &str) -> Result<CheckInStatusView> {
        let state = self
            .store
            .get_participant(participant_id)
            .await?
            .map(|p| p.check_in_state())
            .unwrap_or_default();
        Ok(state.into())
    }

    // ─── Participants ────────────────────────────────────────────

    /// Register a local participant. Fails with `Conflict` if the email is taken.
    pub async fn register_participant(&self, request: NewParticipant) -> Result<Participant> {
        request.validate()?;
        if request.display_name.trim().is_empty() {
            return Err(AppError::Validation("display name is required".to_string()));
        }

        let participant = Participant::new(
            &request.display_name,
            &request.email,
            AuthProvider::Local,
            Utc::now(),
        );
        self.store.insert_participant(&participant).await?;

        tracing::info!(participant_id = %participant.id, "Participant registered");
        Ok(participant)
    }

    /// Change a participant's display name.
    ///
    /// Runs under the check-in lock so a concurrent check-in on the same
    /// instance cannot interleave with it.
    pub async fn update_profile(
        &self,
        participant_id: &str,
        display_name: &str,
    ) -> Result<Participant> {
        let update = ProfileUpdate::new(display_name);
        update.validate()?;

        self.require_participant(participant_id).await?;

        let lock = self.participant_lock(participant_id);
        let _guard = lock.lock().await;

        let mut participant = self.require_participant(participant_id).await?;
        participant.display_name = update.display_name;
        participant.updated_at = Utc::now();
        self.store.update_participant_profile(&participant).await?;

        tracing::info!(participant_id, "Profile updated");
        Ok(participant)
    }

    pub async fn get_participant(&self, participant_id: &str) -> Result<Participant> {
        self.require_participant(participant_id).await
    }
}
