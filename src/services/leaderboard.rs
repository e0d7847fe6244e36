// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard projection over stored activities.
//!
//! Nothing here touches storage: callers load activities and participants,
//! and these functions fold, order and label them.

use serde::Serialize;
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::config::MAX_LEADERBOARD_LIMIT;
use crate::error::{AppError, Result};
use crate::models::{Activity, Participant, ParticipantProfile, ParticipantTotals};
use crate::services::badges::{evaluate_badges, Badge};

/// Display name used when an activity's owner no longer resolves.
pub const UNKNOWN_PARTICIPANT_NAME: &str = "Unknown User";

/// Aggregated score of one participant.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantScore {
    pub participant_id: String,
    pub points: f64,
    pub total_activities: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: u32,
    pub participant_id: String,
    pub name: String,
    pub email: String,
    pub points: f64,
    pub total_activities: u32,
    pub badges: Vec<Badge>,
}

/// Everything shown for a single participant.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ParticipantDetail {
    pub profile: ParticipantProfile,
    pub totals: ParticipantTotals,
    pub points: f64,
    pub badges: Vec<Badge>,
    /// Newest first
    pub activities: Vec<Activity>,
}

/// Resolve a requested leaderboard size.
///
/// `None` falls back to `default_limit`, zero is rejected and anything above
/// [`MAX_LEADERBOARD_LIMIT`] is clamped.
pub fn resolve_limit(requested: Option<usize>, default_limit: usize) -> Result<usize> {
    match requested {
        Some(0) => Err(AppError::Validation(
            "leaderboard limit must be at least 1".to_string(),
        )),
        Some(n) => Ok(n.min(MAX_LEADERBOARD_LIMIT)),
        None => Ok(default_limit.clamp(1, MAX_LEADERBOARD_LIMIT)),
    }
}

/// Group activities by owner and order by points descending.
///
/// Ties are broken by participant id ascending so the order is stable
/// across calls.
pub fn rank_participants<'a>(
    activities: impl IntoIterator<Item = &'a Activity>,
) -> Vec<ParticipantScore> {
    let mut by_participant: HashMap<&str, (f64, u32)> = HashMap::new();
    for activity in activities {
        let entry = by_participant
            .entry(activity.participant_id.as_str())
            .or_insert((0.0, 0));
        entry.0 += activity.points_earned;
        entry.1 += 1;
    }

    let mut scores: Vec<ParticipantScore> = by_participant
        .into_iter()
        .map(|(id, (points, total_activities))| ParticipantScore {
            participant_id: id.to_string(),
            points,
            total_activities,
        })
        .collect();

    scores.sort_by(|a, b| {
        b.points
            .total_cmp(&a.points)
            .then_with(|| a.participant_id.cmp(&b.participant_id))
    });
    scores
}

/// Label already-ranked scores with identity and badges.
pub fn build_entries(
    scores: Vec<ParticipantScore>,
    participants: &HashMap<String, Participant>,
) -> Vec<LeaderboardEntry> {
    scores
        .into_iter()
        .enumerate()
        .map(|(idx, score)| {
            let (name, email) = match participants.get(&score.participant_id) {
                Some(p) => (p.display_name.clone(), p.email.clone()),
                None => (UNKNOWN_PARTICIPANT_NAME.to_string(), String::new()),
            };

            LeaderboardEntry {
                rank: idx as u32 + 1,
                badges: evaluate_badges(score.points, score.total_activities),
                participant_id: score.participant_id,
                name,
                email,
                points: score.points,
                total_activities: score.total_activities,
            }
        })
        .collect()
}
