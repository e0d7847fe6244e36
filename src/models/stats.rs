//! Participant totals folded from stored activities.
//!
//! Totals are a read-side projection: they are recomputed from the frozen
//! per-activity snapshots on every request and never persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::Activity;
use crate::time_utils::same_utc_day;

/// Summed environmental impact across activities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ImpactTotals {
    pub co2_saved_kg: f64,
    pub water_saved_l: f64,
}

/// Dashboard totals for one participant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ParticipantTotals {
    pub total_activities: u32,
    /// Activities created on the current UTC day
    pub today_activities: u32,
    pub total_points: f64,
    pub total_impact: ImpactTotals,
}

impl ParticipantTotals {
    /// Fold a participant's activities. `now` decides which day is "today".
    pub fn from_activities<'a>(
        activities: impl IntoIterator<Item = &'a Activity>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut totals = Self::default();
        for activity in activities {
            totals.add_activity(activity, now);
        }
        totals
    }

    /// Add one activity's frozen snapshot.
    pub fn add_activity(&mut self, activity: &Activity, now: DateTime<Utc>) {
        self.total_activities += 1;
        self.total_points += activity.points_earned;

        if let Some(co2) = activity.impact.co2_saved_kg {
            self.total_impact.co2_saved_kg += co2;
        }
        if let Some(water) = activity.impact.water_saved_l {
            self.total_impact.water_saved_l += water;
        }

        if same_utc_day(activity.created_at, now) {
            self.today_activities += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::NewActivity;
    use chrono::TimeZone;

    fn make_activity(category: &str, quantity: f64, created_at: DateTime<Utc>) -> Activity {
        Activity::new("p-1", NewActivity::new("test", category, quantity), created_at)
    }

    #[test]
    fn test_totals_sum_snapshots() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 15, 0, 0).unwrap();
        let activities = vec![
            make_activity("Tree Plantation", 3.0, now),
            make_activity("Waste Reduction", 2.0, now),
            make_activity("Water Conservation", 25.0, now),
        ];

        let totals = ParticipantTotals::from_activities(&activities, now);

        assert_eq!(totals.total_activities, 3);
        assert_eq!(totals.total_points, 150.0 + 20.0 + 25.0);
        assert_eq!(totals.total_impact.co2_saved_kg, 63.0 + 3.0);
        assert_eq!(totals.total_impact.water_saved_l, 25.0);
    }

    #[test]
    fn test_today_uses_utc_day_of_now() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 0, 30, 0).unwrap();
        let yesterday_late = Utc.with_ymd_and_hms(2026, 3, 9, 23, 59, 0).unwrap();
        let activities = vec![
            make_activity("Energy Saving", 1.0, now),
            make_activity("Energy Saving", 1.0, yesterday_late),
        ];

        let totals = ParticipantTotals::from_activities(&activities, now);

        assert_eq!(totals.total_activities, 2);
        assert_eq!(totals.today_activities, 1);
    }

    #[test]
    fn test_points_come_from_stored_snapshot() {
        let now = Utc::now();
        let mut legacy = make_activity("Waste Reduction", 2.0, now);
        // Scored under an older rate table; must not be rescored.
        legacy.points_earned = 30.0;
        legacy.points_schedule = 1;

        let totals = ParticipantTotals::from_activities([&legacy], now);
        assert_eq!(totals.total_points, 30.0);
    }
}
