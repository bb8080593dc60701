//! Derived country statistics.
//!
//! Both the aggregate read path and the recompute write path derive
//! `visit_count` / `color_intensity` through [`CountryStats::from_counts`], so
//! the map colors always agree with the persisted counts.

use serde::Serialize;

use crate::models::VisitRefs;

/// Total visits at which a country's color saturates.
pub const SATURATION_VISITS: i64 = 5;

/// Linear ramp from 0 to 1, saturating at [`SATURATION_VISITS`].
pub fn color_intensity(total_visits: i64) -> f64 {
    if total_visits <= 0 {
        return 0.0;
    }
    (total_visits as f64 / SATURATION_VISITS as f64).min(1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountryStats {
    pub visit_count: i64,
    pub color_intensity: f64,
}

impl CountryStats {
    pub fn from_counts(primary_visits: i64, fusion_visits: i64) -> Self {
        let visit_count = primary_visits + fusion_visits;
        Self {
            visit_count,
            color_intensity: color_intensity(visit_count),
        }
    }
}

/// Countries whose statistics must be recomputed after a visit mutation.
///
/// `primary` is the primary country of the row the caller acted on; a failed
/// recompute there is reported. `secondary` holds every other affected
/// country, each listed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecountPlan {
    pub primary: String,
    pub secondary: Vec<String>,
}

impl RecountPlan {
    /// Plan for `current` (the created, updated or deleted row), plus the
    /// references the row held before an update.
    pub fn new(current: &VisitRefs, previous: Option<&VisitRefs>) -> Self {
        let primary = current.country_id.clone();
        let mut secondary: Vec<String> = Vec::new();

        let candidates = current.fusion_credit().into_iter().chain(
            previous
                .into_iter()
                .flat_map(|p| std::iter::once(p.country_id.as_str()).chain(p.fusion_credit())),
        );

        for id in candidates {
            if id != primary && !secondary.iter().any(|s| s == id) {
                secondary.push(id.to_string());
            }
        }

        Self { primary, secondary }
    }

    /// Every country in the plan, primary first.
    pub fn countries(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.secondary.iter().map(String::as_str))
    }
}
