// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Badge thresholds.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Cumulative achievement. Variant order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Badge {
    #[serde(rename = "Beginner")]
    Beginner,
    #[serde(rename = "Consistent Contributor")]
    ConsistentContributor,
    #[serde(rename = "Eco Champion")]
    EcoChampion,
    #[serde(rename = "Sustainability Legend")]
    SustainabilityLegend,
    #[serde(rename = "100 Points Club")]
    PointsClub100,
    #[serde(rename = "500 Points Club")]
    PointsClub500,
    #[serde(rename = "1000 Points Club")]
    PointsClub1000,
}

const ACTIVITY_TIERS: [(u32, Badge); 4] = [
    (1, Badge::Beginner),
    (10, Badge::ConsistentContributor),
    (25, Badge::EcoChampion),
    (50, Badge::SustainabilityLegend),
];

const POINTS_TIERS: [(f64, Badge); 3] = [
    (100.0, Badge::PointsClub100),
    (500.0, Badge::PointsClub500),
    (1000.0, Badge::PointsClub1000),
];

impl Badge {
    pub fn label(&self) -> &'static str {
        match self {
            Badge::Beginner => "Beginner",
            Badge::ConsistentContributor => "Consistent Contributor",
            Badge::EcoChampion => "Eco Champion",
            Badge::SustainabilityLegend => "Sustainability Legend",
            Badge::PointsClub100 => "100 Points Club",
            Badge::PointsClub500 => "500 Points Club",
            Badge::PointsClub1000 => "1000 Points Club",
        }
    }
}

/// Every badge whose threshold the totals have reached.
pub fn evaluate_badges(total_points: f64, total_activities: u32) -> Vec<Badge> {
    let activity_badges = ACTIVITY_TIERS
        .iter()
        .filter(|(threshold, _)| total_activities >= *threshold)
        .map(|(_, badge)| *badge);

    let points_badges = POINTS_TIERS
        .iter()
        .filter(|(threshold, _)| total_points >= *threshold)
        .map(|(_, badge)| *badge);

    activity_badges.chain(points_badges).collect()
}
