// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Sustainability activity model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::services::scoring::{self, Impact};

/// Kind of sustainability action. Unknown labels are kept verbatim so the
/// activity can still be stored; they score with the pass-through defaults.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityCategory {
    GreenTransportation,
    WaterConservation,
    TreePlantation,
    EnergySaving,
    WasteReduction,
    Other(String),
}

impl ActivityCategory {
    pub fn label(&self) -> &str {
        match self {
            ActivityCategory::GreenTransportation => "Green Transportation",
            ActivityCategory::WaterConservation => "Water Conservation",
            ActivityCategory::TreePlantation => "Tree Plantation",
            ActivityCategory::EnergySaving => "Energy Saving",
            ActivityCategory::WasteReduction => "Waste Reduction",
            ActivityCategory::Other(label) => label,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ActivityCategory::Other(_))
    }
}

impl From<String> for ActivityCategory {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Green Transportation" => ActivityCategory::GreenTransportation,
            "Water Conservation" => ActivityCategory::WaterConservation,
            "Tree Plantation" => ActivityCategory::TreePlantation,
            "Energy Saving" => ActivityCategory::EnergySaving,
            "Waste Reduction" => ActivityCategory::WasteReduction,
            _ => ActivityCategory::Other(label),
        }
    }
}

impl From<&str> for ActivityCategory {
    fn from(label: &str) -> Self {
        ActivityCategory::from(label.to_string())
    }
}

impl From<ActivityCategory> for String {
    fn from(category: ActivityCategory) -> Self {
        match category {
            ActivityCategory::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Quantity as submitted: clients send either a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuantityInput {
    Number(f64),
    Text(String),
}

impl QuantityInput {
    /// True when the client sent nothing usable at all (empty string).
    pub fn is_blank(&self) -> bool {
        matches!(self, QuantityInput::Text(s) if s.trim().is_empty())
    }

    /// Numeric value, with anything unparseable treated as zero.
    pub fn coerce(&self) -> f64 {
        let raw = match self {
            QuantityInput::Number(n) => *n,
            QuantityInput::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        };
        scoring::sanitize_quantity(raw)
    }
}

impl From<f64> for QuantityInput {
    fn from(value: f64) -> Self {
        QuantityInput::Number(value)
    }
}

/// Request to log a new activity.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewActivity {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    pub category: ActivityCategory,
    pub quantity: Option<QuantityInput>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    /// User-supplied date of the action (free-form, as entered)
    pub activity_date: Option<String>,
    pub activity_type: Option<String>,
}

impl NewActivity {
    pub fn new(
        title: impl Into<String>,
        category: impl Into<ActivityCategory>,
        quantity: impl Into<QuantityInput>,
    ) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            quantity: Some(quantity.into()),
            description: None,
            location: None,
            activity_date: None,
            activity_type: None,
        }
    }
}

/// Stored activity record.
///
/// `impact` and `points_earned` are computed once in [`Activity::new`] and
/// never recomputed, so later rate changes leave history untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Activity {
    /// Activity ID (also used as document ID)
    pub id: String,
    /// Owning participant
    pub participant_id: String,
    pub title: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub category: ActivityCategory,
    /// Units implied by category (km, liters, trees, energy units, kg)
    pub quantity: f64,
    pub impact: Impact,
    pub points_earned: f64,
    /// Rate table version that produced `points_earned`
    pub points_schedule: u16,
    pub description: Option<String>,
    pub location: Option<String>,
    pub activity_date: Option<String>,
    /// "Personal" unless the client says otherwise
    pub activity_type: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

impl Activity {
    /// Build an activity, freezing its impact and points snapshot.
    ///
    /// The request must already have passed validation.
    pub fn new(participant_id: &str, request: NewActivity, created_at: DateTime<Utc>) -> Self {
        let quantity = request
            .quantity
            .as_ref()
            .map(QuantityInput::coerce)
            .unwrap_or(0.0);

        let impact = scoring::calculate_impact(&request.category, quantity);
        let points_earned = scoring::calculate_points(&request.category, quantity);

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            participant_id: participant_id.to_string(),
            title: request.title.trim().to_string(),
            category: request.category,
            quantity,
            impact,
            points_earned,
            points_schedule: scoring::POINTS_SCHEDULE_VERSION,
            description: request.description,
            location: request.location,
            activity_date: request.activity_date,
            activity_type: request
                .activity_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "Personal".to_string()),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serde_uses_display_labels() {
        let json = serde_json::to_string(&ActivityCategory::TreePlantation).unwrap();
        assert_eq!(json, "\"Tree Plantation\"");

        let parsed: ActivityCategory = serde_json::from_str("\"Waste Reduction\"").unwrap();
        assert_eq!(parsed, ActivityCategory::WasteReduction);

        let unknown: ActivityCategory = serde_json::from_str("\"Composting\"").unwrap();
        assert_eq!(unknown, ActivityCategory::Other("Composting".to_string()));
        assert_eq!(serde_json::to_string(&unknown).unwrap(), "\"Composting\"");
    }

    #[test]
    fn test_quantity_coercion() {
        assert_eq!(QuantityInput::Number(3.5).coerce(), 3.5);
        assert_eq!(QuantityInput::Text(" 12 ".to_string()).coerce(), 12.0);
        assert_eq!(QuantityInput::Text("lots".to_string()).coerce(), 0.0);
        assert_eq!(QuantityInput::Number(-4.0).coerce(), 0.0);
        assert!(QuantityInput::Text("  ".to_string()).is_blank());
    }

    #[test]
    fn test_quantity_accepts_number_or_string() {
        let body = r#"{"title":"Bus","category":"Green Transportation","quantity":"15"}"#;
        let request: NewActivity = serde_json::from_str(body).unwrap();
        assert_eq!(request.quantity, Some(QuantityInput::Text("15".to_string())));

        let body = r#"{"title":"Bus","category":"Green Transportation","quantity":15}"#;
        let request: NewActivity = serde_json::from_str(body).unwrap();
        assert_eq!(request.quantity, Some(QuantityInput::Number(15.0)));
    }

    #[test]
    fn test_new_activity_freezes_snapshot() {
        let now = Utc::now();
        let activity = Activity::new(
            "p-1",
            NewActivity::new("Planted oaks", "Tree Plantation", 3.0),
            now,
        );

        assert_eq!(activity.impact.co2_saved_kg, Some(63.0));
        assert_eq!(activity.impact.water_saved_l, None);
        assert_eq!(activity.points_earned, 150.0);
        assert_eq!(activity.points_schedule, scoring::POINTS_SCHEDULE_VERSION);
        assert_eq!(activity.activity_type, "Personal");
        assert_eq!(activity.created_at, now);
    }

    #[test]
    fn test_title_validation() {
        let request = NewActivity::new("", "Energy Saving", 1.0);
        assert!(request.validate().is_err());

        let request = NewActivity::new("x".repeat(201), "Energy Saving", 1.0);
        assert!(request.validate().is_err());
    }
}
