//! Database layer.
//!
//! [`EngagementStore`] is the persistence seam the engagement service runs
//! against. [`FirestoreDb`] is the production implementation; [`MemoryDb`]
//! backs tests and local runs.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Activity, Participant};
use crate::services::checkin::CheckInState;

/// Collection names as constants.
pub mod collections {
    pub const PARTICIPANTS: &str = "participants";
    /// Email → participant id index (keyed by normalized email)
    pub const PARTICIPANT_EMAILS: &str = "participant_emails";
    pub const ACTIVITIES: &str = "activities";
}

/// A check-in transition ready to be written.
#[derive(Debug, Clone, Copy)]
pub struct CheckInCommit<'a> {
    pub participant_id: &'a str,
    /// `last_check_in_at` as read before computing the transition
    pub expected_last_check_in_at: Option<DateTime<Utc>>,
    pub next: CheckInState,
    pub eco_bonus: u64,
    pub now: DateTime<Utc>,
}

/// Storage operations needed by the scoring and engagement core.
#[async_trait]
pub trait EngagementStore: Send + Sync {
    async fn get_participant(&self, participant_id: &str) -> Result<Option<Participant>>;

    /// Look up by normalized email.
    async fn get_participant_by_email(&self, email: &str) -> Result<Option<Participant>>;

    /// Batch point lookup. Unknown ids are skipped, order is unspecified.
    async fn get_participants(&self, participant_ids: &[String]) -> Result<Vec<Participant>>;

    /// Create a participant. Fails with `Conflict` if the email is taken.
    async fn insert_participant(&self, participant: &Participant) -> Result<()>;

    /// Overwrite profile fields (display name, `updated_at`).
    async fn update_participant_profile(&self, participant: &Participant) -> Result<()>;

    async fn insert_activity(&self, activity: &Activity) -> Result<()>;

    /// Activities owned by one participant, newest first.
    async fn get_activities_for_participant(&self, participant_id: &str)
        -> Result<Vec<Activity>>;

    /// Every stored activity (leaderboard aggregation).
    async fn get_all_activities(&self) -> Result<Vec<Activity>>;

    /// Write a check-in transition only if `last_check_in_at` is unchanged
    /// since it was read. Returns the updated participant, `Conflict` if the
    /// guard failed, `NotFound` if the participant vanished.
    async fn commit_check_in(&self, commit: CheckInCommit<'_>) -> Result<Participant>;
}

/// Apply a committed transition to a participant record.
pub(crate) fn apply_check_in(participant: &mut Participant, commit: &CheckInCommit<'_>) {
    participant.check_in_streak = commit.next.streak;
    participant.last_check_in_at = commit.next.last_check_in_at;
    participant.eco_points = participant.eco_points.saturating_add(commit.eco_bonus);
    participant.updated_at = commit.now;
}
