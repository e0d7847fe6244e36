// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod badges;
pub mod checkin;
pub mod engagement;
pub mod google_oidc;
pub mod identity;
pub mod leaderboard;
pub mod scoring;
pub mod session;

pub use badges::Badge;
pub use checkin::{CheckInOutcome, CheckInStatus, CheckInStatusView};
pub use engagement::EngagementService;
pub use google_oidc::{FederatedPrincipal, GoogleIdTokenVerifier, OidcError};
pub use identity::{Credential, IdentityResolver};
pub use leaderboard::{LeaderboardEntry, ParticipantDetail};
pub use scoring::Impact;
