use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use crate::error::LedgerError;

/// A restaurant visit as stored in the `restaurants` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Visit {
    pub id: String,
    pub country_id: String,
    pub restaurant_name: String,
    pub location: String,
    pub items_devoured: String,
    pub king_julien_favorite: Option<String>,
    pub mort_favorite: Option<String>,
    pub rating: Option<i32>,
    pub is_fusion: bool,
    pub fusion_country_id: Option<String>,
    pub visit_date: NaiveDate,
}

impl Visit {
    pub fn refs(&self) -> VisitRefs {
        VisitRefs {
            country_id: self.country_id.clone(),
            is_fusion: self.is_fusion,
            fusion_country_id: self.fusion_country_id.clone(),
        }
    }
}

/// The countries a visit credits.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct VisitRefs {
    pub country_id: String,
    pub is_fusion: bool,
    pub fusion_country_id: Option<String>,
}

impl VisitRefs {
    /// The country receiving fusion credit, if any.
    pub fn fusion_credit(&self) -> Option<&str> {
        if self.is_fusion {
            self.fusion_country_id.as_deref()
        } else {
            None
        }
    }
}

/// Visit body accepted by the create and update endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VisitPayload {
    pub country_id: Option<String>,
    pub restaurant_name: Option<String>,
    pub location: Option<String>,
    pub items_devoured: Option<String>,
    pub king_julien_favorite: Option<String>,
    pub mort_favorite: Option<String>,
    pub rating: Option<i32>,
    pub is_fusion: Option<bool>,
    pub fusion_country_id: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub visit_date: Option<NaiveDate>,
}

/// Reads `visit_date`, where an empty string means no date was picked.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(date) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("visit_date '{date}': {e}"))),
    }
}

/// A validated visit, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVisit {
    pub country_id: String,
    pub restaurant_name: String,
    pub location: String,
    pub items_devoured: String,
    pub king_julien_favorite: Option<String>,
    pub mort_favorite: Option<String>,
    pub rating: Option<i32>,
    pub is_fusion: bool,
    pub fusion_country_id: Option<String>,
    pub visit_date: NaiveDate,
}

impl NewVisit {
    pub fn refs(&self) -> VisitRefs {
        VisitRefs {
            country_id: self.country_id.clone(),
            is_fusion: self.is_fusion,
            fusion_country_id: self.fusion_country_id.clone(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl VisitPayload {
    /// Apply defaults and check required fields. `today` fills a missing
    /// `visit_date`.
    pub fn validate(self, today: NaiveDate) -> Result<NewVisit, LedgerError> {
        let country_id = non_empty(self.country_id);
        let restaurant_name = non_empty(self.restaurant_name);
        let location = non_empty(self.location);

        let (country_id, restaurant_name, location) = match (country_id, restaurant_name, location)
        {
            (Some(c), Some(r), Some(l)) => (c, r, l),
            _ => {
                return Err(LedgerError::Validation(
                    "Missing required fields: country_id, restaurant_name, location".to_string(),
                ))
            }
        };

        // 0 is what forms send for "not rated"
        let rating = self.rating.filter(|r| *r != 0);
        if let Some(rating) = rating {
            if !(1..=5).contains(&rating) {
                return Err(LedgerError::Validation(format!(
                    "rating must be between 1 and 5, got {rating}"
                )));
            }
        }

        let is_fusion = self.is_fusion.unwrap_or(false);
        // A non-fusion visit never carries a fusion reference, so it cannot be counted as one.
        let fusion_country_id = if is_fusion {
            match non_empty(self.fusion_country_id) {
                Some(id) if id == country_id => {
                    return Err(LedgerError::Validation(
                        "fusion_country_id must differ from country_id".to_string(),
                    ))
                }
                Some(id) => Some(id),
                None => {
                    return Err(LedgerError::Validation(
                        "fusion_country_id is required when is_fusion is true".to_string(),
                    ))
                }
            }
        } else {
            None
        };

        Ok(NewVisit {
            country_id,
            restaurant_name,
            location,
            items_devoured: self.items_devoured.unwrap_or_default(),
            king_julien_favorite: non_empty(self.king_julien_favorite),
            mort_favorite: non_empty(self.mort_favorite),
            rating,
            is_fusion,
            fusion_country_id,
            visit_date: self.visit_date.unwrap_or(today),
        })
    }
}
