use crate::models::{
    Country, CountrySummary, CountryTally, NewCountry, NewVisit, Visit, VisitRefs,
};
use crate::storage::{Storage, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Storage wrapper caching country reference data.
///
/// Only the country listing and the cuisine list are cached: both are built
/// from seeded columns that visit mutations never touch. Anything carrying
/// derived statistics always goes to the underlying store.
pub struct CachedStorage {
    /// Underlying storage implementation
    inner: Arc<dyn Storage>,
    /// Country listings keyed by cuisine filter (None = unfiltered)
    countries_cache: Cache<Option<String>, Arc<Vec<CountrySummary>>>,
    /// Distinct cuisine styles
    cuisines_cache: Cache<(), Arc<Vec<String>>>,
}

impl CachedStorage {
    pub fn new(inner: Arc<dyn Storage>, max_cache_entries: u64, ttl_secs: u64) -> Self {
        let countries_cache = Cache::builder()
            .max_capacity(max_cache_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        let cuisines_cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            inner,
            countries_cache,
            cuisines_cache,
        }
    }

    /// Drop every cached listing
    pub fn invalidate(&self) {
        self.countries_cache.invalidate_all();
        self.cuisines_cache.invalidate_all();
    }
}

#[async_trait]
impl Storage for CachedStorage {
    async fn init(&self) -> Result<()> {
        self.inner.init().await
    }

    async fn upsert_country(&self, country: &NewCountry) -> StorageResult<Country> {
        let result = self.inner.upsert_country(country).await?;

        // Names and cuisines may have changed
        self.invalidate();

        Ok(result)
    }

    async fn get_country(&self, id: &str) -> StorageResult<Option<Country>> {
        self.inner.get_country(id).await
    }

    async fn get_country_by_code(&self, country_code: &str) -> StorageResult<Option<Country>> {
        self.inner.get_country_by_code(country_code).await
    }

    async fn count_countries(&self) -> StorageResult<i64> {
        self.inner.count_countries().await
    }

    async fn list_countries(&self, cuisine: Option<&str>) -> StorageResult<Vec<CountrySummary>> {
        let key = cuisine.map(str::to_string);

        if let Some(cached) = self.countries_cache.get(&key).await {
            return Ok(cached.as_ref().clone());
        }

        // Cache miss - fetch from underlying storage
        let result = self.inner.list_countries(cuisine).await?;
        self.countries_cache
            .insert(key, Arc::new(result.clone()))
            .await;

        Ok(result)
    }

    async fn list_cuisines(&self) -> StorageResult<Vec<String>> {
        if let Some(cached) = self.cuisines_cache.get(&()).await {
            return Ok(cached.as_ref().clone());
        }

        let result = self.inner.list_cuisines().await?;
        self.cuisines_cache.insert((), Arc::new(result.clone())).await;

        Ok(result)
    }

    async fn country_tallies(&self) -> StorageResult<Vec<CountryTally>> {
        self.inner.country_tallies().await
    }

    async fn count_primary_visits(&self, country_id: &str) -> StorageResult<i64> {
        self.inner.count_primary_visits(country_id).await
    }

    async fn count_fusion_visits(&self, country_id: &str) -> StorageResult<i64> {
        self.inner.count_fusion_visits(country_id).await
    }

    async fn write_country_stats(
        &self,
        country_id: &str,
        visit_count: i64,
        color_intensity: f64,
    ) -> StorageResult<bool> {
        self.inner
            .write_country_stats(country_id, visit_count, color_intensity)
            .await
    }

    async fn insert_visit(&self, visit: &NewVisit) -> StorageResult<Visit> {
        self.inner.insert_visit(visit).await
    }

    async fn get_visit_refs(&self, id: &str) -> StorageResult<Option<VisitRefs>> {
        self.inner.get_visit_refs(id).await
    }

    async fn update_visit(&self, id: &str, visit: &NewVisit) -> StorageResult<Option<Visit>> {
        self.inner.update_visit(id, visit).await
    }

    async fn delete_visit(&self, id: &str) -> StorageResult<bool> {
        self.inner.delete_visit(id).await
    }

    async fn list_primary_visits(&self, country_id: &str) -> StorageResult<Vec<Visit>> {
        self.inner.list_primary_visits(country_id).await
    }

    async fn list_fusion_visits(&self, country_id: &str) -> StorageResult<Vec<Visit>> {
        self.inner.list_fusion_visits(country_id).await
    }
}
