// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Participant model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::services::checkin::CheckInState;

/// How a participant record was first provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProvider {
    Local,
    Google,
}

/// Participant profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Participant ID (also used as document ID)
    pub id: String,
    pub display_name: String,
    /// Normalized (trimmed, lower-case) and unique
    pub email: String,
    /// Redeemed check-in bonuses
    #[serde(default)]
    pub eco_points: u64,
    #[serde(default)]
    pub check_in_streak: u32,
    #[serde(default)]
    pub last_check_in_at: Option<DateTime<Utc>>,
    pub auth_provider: AuthProvider,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(
        display_name: &str,
        email: &str,
        auth_provider: AuthProvider,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            display_name: display_name.trim().to_string(),
            email: normalize_email(email),
            eco_points: 0,
            check_in_streak: 0,
            last_check_in_at: None,
            auth_provider,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn check_in_state(&self) -> CheckInState {
        CheckInState {
            streak: self.check_in_streak,
            last_check_in_at: self.last_check_in_at,
        }
    }
}

/// Lower-case and trim an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registration request for a local participant.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewParticipant {
    #[validate(length(min = 1, max = 100, message = "display name must be 1-100 characters"))]
    pub display_name: String,
    #[validate(email(message = "email address is invalid"))]
    pub email: String,
}

/// Display-name change for an existing participant.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 100, message = "display name must be 1-100 characters"))]
    pub display_name: String,
}

impl ProfileUpdate {
    pub fn new(display_name: &str) -> Self {
        Self {
            display_name: display_name.trim().to_string(),
        }
    }
}

/// Participant fields safe to hand back to clients.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ParticipantProfile {
    pub id: String,
    pub display_name: String,
    pub email: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub eco_points: u64,
    pub check_in_streak: u32,
    pub last_check_in_at: Option<String>,
    pub member_since: String,
}

impl From<&Participant> for ParticipantProfile {
    fn from(p: &Participant) -> Self {
        use crate::time_utils::format_utc_rfc3339;

        Self {
            id: p.id.clone(),
            display_name: p.display_name.clone(),
            email: p.email.clone(),
            eco_points: p.eco_points,
            check_in_streak: p.check_in_streak,
            last_check_in_at: p.last_check_in_at.map(format_utc_rfc3339),
            member_since: format_utc_rfc3339(p.created_at),
        }
    }
}
