//! Country reference data.

pub mod iso;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::models::NewCountry;
use crate::storage::{Storage, StorageResult};

pub use iso::{iso3_to_iso2, normalize_country_code};

const BUNDLED_COUNTRIES: &str = include_str!("../../data/countries.json");

/// One dataset row, keyed by its three-letter code.
#[derive(Debug, Deserialize)]
struct SeedRow {
    name: String,
    iso3: String,
    cuisine_style: String,
    #[serde(default)]
    cuisine_description: Option<String>,
}

impl From<SeedRow> for NewCountry {
    fn from(row: SeedRow) -> Self {
        NewCountry {
            country_code: normalize_country_code(&row.iso3),
            name: row.name,
            cuisine_style: row.cuisine_style,
            cuisine_description: row.cuisine_description.filter(|d| !d.is_empty()),
        }
    }
}

fn parse_countries(json: &str) -> Result<Vec<NewCountry>> {
    let rows: Vec<SeedRow> = serde_json::from_str(json)?;
    Ok(rows.into_iter().map(NewCountry::from).collect())
}

/// The dataset compiled into the binary.
pub fn bundled_countries() -> Result<Vec<NewCountry>> {
    parse_countries(BUNDLED_COUNTRIES).context("bundled country dataset is malformed")
}

/// A dataset in the bundled format, read from disk.
pub fn load_countries(path: &Path) -> Result<Vec<NewCountry>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_countries(&json).with_context(|| format!("failed to parse {}", path.display()))
}

/// Upsert every country by code. Visit statistics are left untouched.
pub async fn seed_countries(storage: &dyn Storage, countries: &[NewCountry]) -> StorageResult<usize> {
    for country in countries {
        storage.upsert_country(country).await?;
    }
    info!("Seeded {} countries", countries.len());
    Ok(countries.len())
}

/// Seed the bundled dataset if the countries table is empty.
pub async fn seed_if_empty(storage: &dyn Storage) -> Result<Option<usize>> {
    if storage.count_countries().await? > 0 {
        return Ok(None);
    }
    let countries = bundled_countries()?;
    Ok(Some(seed_countries(storage, &countries).await?))
}
