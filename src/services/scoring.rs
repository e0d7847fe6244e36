// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Impact and points calculators.
//!
//! Both are total functions: unknown categories and garbage quantities
//! degrade to the documented defaults instead of failing the request.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::ActivityCategory;

/// Version of [`points_rate`]. Stored on every activity.
///
/// Schedule 1 (15/kg waste, 5/l water, 10/km transit, 8/unit energy,
/// 0 for unknown categories) is retired and must not be reintroduced:
/// activities scored under it keep their frozen `points_earned`.
pub const POINTS_SCHEDULE_VERSION: u16 = 2;

/// Environmental impact of one activity. Only the metrics relevant to the
/// category are populated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Impact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co2_saved_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_saved_l: Option<f64>,
}

impl Impact {
    pub fn is_empty(&self) -> bool {
        self.co2_saved_kg.is_none() && self.water_saved_l.is_none()
    }
}

/// Clamp a raw quantity to a non-negative finite number.
pub fn sanitize_quantity(quantity: f64) -> f64 {
    if quantity.is_finite() && quantity > 0.0 {
        quantity
    } else {
        0.0
    }
}

/// Environmental impact for `quantity` units of `category`.
pub fn calculate_impact(category: &ActivityCategory, quantity: f64) -> Impact {
    let q = sanitize_quantity(quantity);

    let co2 = |factor: f64| Impact {
        co2_saved_kg: Some(q * factor),
        water_saved_l: None,
    };

    match category {
        // km travelled
        ActivityCategory::GreenTransportation => co2(0.2),
        // liters
        ActivityCategory::WaterConservation => Impact {
            co2_saved_kg: None,
            water_saved_l: Some(q),
        },
        // one tree absorbs ~21 kg CO2 per year
        ActivityCategory::TreePlantation => co2(21.0),
        ActivityCategory::EnergySaving => co2(0.82),
        // kg of plastic
        ActivityCategory::WasteReduction => co2(1.5),
        ActivityCategory::Other(_) => Impact::default(),
    }
}

/// Points per unit for a category under the current schedule.
pub fn points_rate(category: &ActivityCategory) -> f64 {
    match category {
        ActivityCategory::GreenTransportation => 2.0,
        ActivityCategory::WaterConservation => 1.0,
        ActivityCategory::TreePlantation => 50.0,
        ActivityCategory::EnergySaving => 5.0,
        ActivityCategory::WasteReduction => 10.0,
        ActivityCategory::Other(_) => 1.0,
    }
}

/// Points earned by one activity.
pub fn calculate_points(category: &ActivityCategory, quantity: f64) -> f64 {
    points_rate(category) * sanitize_quantity(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_impact_table() {
        let impact = calculate_impact(&ActivityCategory::GreenTransportation, 10.0);
        assert!(approx_eq(impact.co2_saved_kg, 2.0));
        assert_eq!(impact.water_saved_l, None);

        let impact = calculate_impact(&ActivityCategory::WaterConservation, 40.0);
        assert_eq!(impact.co2_saved_kg, None);
        assert_eq!(impact.water_saved_l, Some(40.0));

        let impact = calculate_impact(&ActivityCategory::TreePlantation, 3.0);
        assert!(approx_eq(impact.co2_saved_kg, 63.0));

        let impact = calculate_impact(&ActivityCategory::EnergySaving, 100.0);
        assert!(approx_eq(impact.co2_saved_kg, 82.0));

        let impact = calculate_impact(&ActivityCategory::WasteReduction, 2.0);
        assert!(approx_eq(impact.co2_saved_kg, 3.0));
    }

    #[test]
    fn test_unrecognized_category_defaults() {
        let other = ActivityCategory::Other("Composting".to_string());
        assert!(calculate_impact(&other, 12.0).is_empty());
        assert_eq!(calculate_points(&other, 12.0), 12.0);
    }

    #[test]
    fn test_points_table() {
        assert_eq!(calculate_points(&ActivityCategory::GreenTransportation, 10.0), 20.0);
        assert_eq!(calculate_points(&ActivityCategory::WaterConservation, 10.0), 10.0);
        assert_eq!(calculate_points(&ActivityCategory::TreePlantation, 3.0), 150.0);
        assert_eq!(calculate_points(&ActivityCategory::EnergySaving, 4.0), 20.0);
        assert_eq!(calculate_points(&ActivityCategory::WasteReduction, 2.0), 20.0);
    }

    #[test]
    fn test_invalid_quantities_score_zero() {
        for q in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -5.0, 0.0] {
            assert_eq!(calculate_points(&ActivityCategory::TreePlantation, q), 0.0);
            assert_eq!(
                calculate_impact(&ActivityCategory::TreePlantation, q).co2_saved_kg,
                Some(0.0)
            );
        }
    }

    #[test]
    fn test_calculators_are_pure() {
        let category = ActivityCategory::EnergySaving;
        assert_eq!(
            calculate_impact(&category, 7.5),
            calculate_impact(&category, 7.5)
        );
        assert_eq!(calculate_points(&category, 7.5), calculate_points(&category, 7.5));
    }

    #[test]
    fn test_impact_serializes_sparse() {
        let impact = calculate_impact(&ActivityCategory::WaterConservation, 5.0);
        assert_eq!(
            serde_json::to_value(impact).unwrap(),
            serde_json::json!({ "water_saved_l": 5.0 })
        );
        let empty = serde_json::to_value(Impact::default()).unwrap();
        assert_eq!(empty, serde_json::json!({}));
    }
}
