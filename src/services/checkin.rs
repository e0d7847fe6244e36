// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily check-in streak state machine.
//!
//! The machine is derived from two stored fields, `check_in_streak` and
//! `last_check_in_at`:
//!
//! - **Fresh**: never checked in
//! - **Cool-down**: less than 24h since the last check-in (rejected)
//! - **Eligible**: 24h to 48h since the last check-in (streak grows)
//! - **Lapsed**: 48h or more (streak restarts at 1)
//!
//! Reaching [`REDEMPTION_STREAK`] converts the streak into
//! [`REDEMPTION_BONUS`] eco-points and resets it to 0.
//!
//! [`CheckInState::advance`] is pure; persisting the result is the caller's
//! job (see `EngagementService::check_in`).

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::format_utc_rfc3339;

pub const COOL_DOWN_HOURS: i64 = 24;
pub const LAPSE_HOURS: i64 = 48;
pub const REDEMPTION_STREAK: u32 = 10;
pub const REDEMPTION_BONUS: u64 = 50;

/// Shared per-participant locks serializing check-in read-modify-write.
pub type CheckInLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Stored streak fields of one participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckInState {
    pub streak: u32,
    pub last_check_in_at: Option<DateTime<Utc>>,
}

/// Where a participant sits relative to the check-in windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInPhase {
    Fresh,
    CoolDown { eligible_at: DateTime<Utc> },
    Eligible,
    Lapsed,
}

/// Result of attempting a check-in at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInTransition {
    /// Persist `next`; `eco_bonus` is 0 unless the streak was redeemed.
    Accepted {
        next: CheckInState,
        redeemed: bool,
        eco_bonus: u64,
    },
    /// Nothing changes until `eligible_at`.
    TooEarly {
        current: CheckInState,
        eligible_at: DateTime<Utc>,
    },
}

impl CheckInState {
    pub fn phase(&self, now: DateTime<Utc>) -> CheckInPhase {
        let Some(last) = self.last_check_in_at else {
            return CheckInPhase::Fresh;
        };

        let elapsed = now.signed_duration_since(last);

        // A last check-in in the future (clock skew) counts as cool-down.
        if elapsed < Duration::hours(COOL_DOWN_HOURS) {
            CheckInPhase::CoolDown {
                eligible_at: last + Duration::hours(COOL_DOWN_HOURS),
            }
        } else if elapsed < Duration::hours(LAPSE_HOURS) {
            CheckInPhase::Eligible
        } else {
            CheckInPhase::Lapsed
        }
    }

    /// Compute the transition for a check-in attempt at `now`.
    pub fn advance(&self, now: DateTime<Utc>) -> CheckInTransition {
        let streak = match self.phase(now) {
            CheckInPhase::CoolDown { eligible_at } => {
                return CheckInTransition::TooEarly {
                    current: *self,
                    eligible_at,
                };
            }
            CheckInPhase::Fresh | CheckInPhase::Lapsed => 1,
            CheckInPhase::Eligible => self.streak.saturating_add(1),
        };

        let (streak, redeemed, eco_bonus) = if streak >= REDEMPTION_STREAK {
            (0, true, REDEMPTION_BONUS)
        } else {
            (streak, false, 0)
        };

        CheckInTransition::Accepted {
            next: CheckInState {
                streak,
                last_check_in_at: Some(now),
            },
            redeemed,
            eco_bonus,
        }
    }

    /// Earliest instant the next check-in is accepted.
    pub fn next_check_in_after(&self) -> Option<DateTime<Utc>> {
        self.last_check_in_at
            .map(|last| last + Duration::hours(COOL_DOWN_HOURS))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum CheckInStatus {
    #[serde(rename = "checked-in")]
    CheckedIn,
    #[serde(rename = "too-early")]
    TooEarly,
}

/// Outcome of a check-in attempt as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CheckInOutcome {
    pub status: CheckInStatus,
    pub check_in_streak: u32,
    pub redeemed: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub eco_bonus: u64,
    pub next_check_in_after: Option<String>,
}

impl From<&CheckInTransition> for CheckInOutcome {
    fn from(transition: &CheckInTransition) -> Self {
        match transition {
            CheckInTransition::Accepted {
                next,
                redeemed,
                eco_bonus,
            } => CheckInOutcome {
                status: CheckInStatus::CheckedIn,
                check_in_streak: next.streak,
                redeemed: *redeemed,
                eco_bonus: *eco_bonus,
                next_check_in_after: next.next_check_in_after().map(format_utc_rfc3339),
            },
            CheckInTransition::TooEarly {
                current,
                eligible_at,
            } => CheckInOutcome {
                status: CheckInStatus::TooEarly,
                check_in_streak: current.streak,
                redeemed: false,
                eco_bonus: 0,
                next_check_in_after: Some(format_utc_rfc3339(*eligible_at)),
            },
        }
    }
}

/// Read-only streak view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CheckInStatusView {
    pub check_in_streak: u32,
    pub next_check_in_after: Option<String>,
}

impl From<CheckInState> for CheckInStatusView {
    fn from(state: CheckInState) -> Self {
        Self {
            check_in_streak: state.streak,
            next_check_in_after: state.next_check_in_after().map(format_utc_rfc3339),
        }
    }
}
