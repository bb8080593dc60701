use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Visit;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Country {
    pub id: String,
    pub name: String,
    pub country_code: String,
    pub cuisine_style: String,
    pub cuisine_description: Option<String>,
    pub visit_count: i64,
    pub color_intensity: f64,
}

/// Lightweight country record used for dropdowns and filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CountrySummary {
    pub id: String,
    pub name: String,
    pub country_code: String,
    pub cuisine_style: String,
}

/// Reference data for one country, as seeded.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCountry {
    pub name: String,
    pub country_code: String,
    pub cuisine_style: String,
    #[serde(default)]
    pub cuisine_description: Option<String>,
}

/// Raw reference counts for one country, before derivation.
#[derive(Debug, Clone, FromRow)]
pub struct CountryTally {
    pub country_code: String,
    pub name: String,
    pub primary_visits: i64,
    pub fusion_visits: i64,
}

/// Map-coloring entry returned by the aggregate query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryAggregate {
    pub country_code: String,
    pub name: String,
    pub visit_count: i64,
    pub color_intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryDetails {
    #[serde(flatten)]
    pub country: Country,
    /// Primary visits first, then fusion visits; each newest first.
    pub restaurants: Vec<Visit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuisineOption {
    pub value: String,
    pub label: String,
}

impl From<String> for CuisineOption {
    fn from(cuisine: String) -> Self {
        Self {
            label: cuisine.clone(),
            value: cuisine,
        }
    }
}
