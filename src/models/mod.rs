// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod participant;
pub mod stats;

pub use activity::{Activity, ActivityCategory, NewActivity, QuantityInput};
pub use participant::{
    AuthProvider, NewParticipant, Participant, ParticipantProfile, ProfileUpdate,
};
pub use stats::{ImpactTotals, ParticipantTotals};
