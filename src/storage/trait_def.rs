use crate::models::{
    Country, CountrySummary, CountryTally, NewCountry, NewVisit, Visit, VisitRefs,
};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> Result<()>;

    /// Insert a country, or refresh its reference fields if the code already
    /// exists. Derived statistics are left untouched.
    async fn upsert_country(&self, country: &NewCountry) -> StorageResult<Country>;

    async fn get_country(&self, id: &str) -> StorageResult<Option<Country>>;

    async fn get_country_by_code(&self, country_code: &str) -> StorageResult<Option<Country>>;

    async fn count_countries(&self) -> StorageResult<i64>;

    /// List countries ordered by name, optionally restricted to one cuisine style
    async fn list_countries(&self, cuisine: Option<&str>) -> StorageResult<Vec<CountrySummary>>;

    /// Distinct non-empty cuisine styles, ordered
    async fn list_cuisines(&self) -> StorageResult<Vec<String>>;

    /// Primary and fusion reference counts for every country, ordered by name
    async fn country_tallies(&self) -> StorageResult<Vec<CountryTally>>;

    /// Number of visits whose primary country is `country_id`
    async fn count_primary_visits(&self, country_id: &str) -> StorageResult<i64>;

    /// Number of visits crediting `country_id` as their fusion country
    async fn count_fusion_visits(&self, country_id: &str) -> StorageResult<i64>;

    /// Persist derived statistics. Returns false if the country does not exist.
    async fn write_country_stats(
        &self,
        country_id: &str,
        visit_count: i64,
        color_intensity: f64,
    ) -> StorageResult<bool>;

    async fn insert_visit(&self, visit: &NewVisit) -> StorageResult<Visit>;

    async fn get_visit_refs(&self, id: &str) -> StorageResult<Option<VisitRefs>>;

    /// Replace every field of an existing visit. Returns None if it does not exist.
    async fn update_visit(&self, id: &str, visit: &NewVisit) -> StorageResult<Option<Visit>>;

    async fn delete_visit(&self, id: &str) -> StorageResult<bool>;

    /// Visits whose primary country is `country_id`, newest first
    async fn list_primary_visits(&self, country_id: &str) -> StorageResult<Vec<Visit>>;

    /// Visits crediting `country_id` as fusion country, newest first
    async fn list_fusion_visits(&self, country_id: &str) -> StorageResult<Vec<Visit>>;
}
