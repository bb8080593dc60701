//! Visit ledger and country aggregator.
//!
//! Every visit mutation is followed by a recount of each country the visit
//! referenced before and after the change. Counts are always re-derived from
//! the visit rows, never adjusted in place.

pub mod stats;

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    CountryAggregate, CountryDetails, CountrySummary, CuisineOption, NewVisit, Visit,
    VisitPayload,
};
use crate::storage::Storage;

pub use stats::{color_intensity, CountryStats, RecountPlan};

pub struct VisitLedger {
    storage: Arc<dyn Storage>,
}

impl VisitLedger {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    fn today() -> chrono::NaiveDate {
        chrono::Utc::now().date_naive()
    }

    /// Record a new visit and credit its countries.
    pub async fn create_visit(&self, payload: VisitPayload) -> LedgerResult<Visit> {
        let visit = payload.validate(Self::today())?;
        self.ensure_countries_exist(&visit).await?;

        let created = self.storage.insert_visit(&visit).await?;
        info!(
            "Visit {} recorded at {} (country {})",
            created.id, created.restaurant_name, created.country_id
        );

        self.apply(RecountPlan::new(&created.refs(), None)).await?;

        Ok(created)
    }

    /// Replace a visit and recount every country it referenced before or after.
    pub async fn update_visit(&self, visit_id: &str, payload: VisitPayload) -> LedgerResult<Visit> {
        let visit = payload.validate(Self::today())?;
        self.ensure_countries_exist(&visit).await?;

        let previous = self
            .storage
            .get_visit_refs(visit_id)
            .await?
            .ok_or_else(|| visit_not_found(visit_id))?;

        let updated = self
            .storage
            .update_visit(visit_id, &visit)
            .await?
            .ok_or_else(|| visit_not_found(visit_id))?;
        info!("Visit {} updated", updated.id);

        self.apply(RecountPlan::new(&updated.refs(), Some(&previous)))
            .await?;

        Ok(updated)
    }

    /// Remove a visit and withdraw its credits.
    pub async fn delete_visit(&self, visit_id: &str) -> LedgerResult<()> {
        // Without the old references the affected countries could not be recounted
        let previous = self
            .storage
            .get_visit_refs(visit_id)
            .await?
            .ok_or_else(|| visit_not_found(visit_id))?;

        if !self.storage.delete_visit(visit_id).await? {
            return Err(visit_not_found(visit_id));
        }
        info!("Visit {} deleted", visit_id);

        self.apply(RecountPlan::new(&previous, None)).await
    }

    /// Recompute and persist one country's statistics from the visit rows.
    ///
    /// A failed primary count aborts without writing. A failed fusion count
    /// falls back to primary-only counting.
    pub async fn update_country_stats(&self, country_id: &str) -> LedgerResult<CountryStats> {
        let primary = self.storage.count_primary_visits(country_id).await?;

        let fusion = match self.storage.count_fusion_visits(country_id).await {
            Ok(count) => count,
            Err(e) => {
                warn!(
                    "Counting fusion visits for country {} failed, using primary visits only: {}",
                    country_id, e
                );
                0
            }
        };

        let stats = CountryStats::from_counts(primary, fusion);
        let written = self
            .storage
            .write_country_stats(country_id, stats.visit_count, stats.color_intensity)
            .await?;

        if written {
            debug!(
                "Country {}: {} primary + {} fusion = {} visits, intensity {}",
                country_id, primary, fusion, stats.visit_count, stats.color_intensity
            );
        } else {
            warn!("Country {} not found while writing statistics", country_id);
        }

        Ok(stats)
    }

    /// Recount every country. Repairs counts left stale by racing mutations.
    pub async fn recount_all(&self) -> LedgerResult<usize> {
        let countries = self.storage.list_countries(None).await?;
        for country in &countries {
            self.update_country_stats(&country.id).await?;
        }
        info!("Recounted statistics for {} countries", countries.len());
        Ok(countries.len())
    }

    /// Visit counts for every country, derived fresh from the visit rows.
    pub async fn countries_aggregate(&self) -> LedgerResult<Vec<CountryAggregate>> {
        let tallies = self.storage.country_tallies().await?;

        let aggregates: Vec<CountryAggregate> = tallies
            .into_iter()
            .map(|tally| {
                let stats = CountryStats::from_counts(tally.primary_visits, tally.fusion_visits);
                CountryAggregate {
                    country_code: tally.country_code,
                    name: tally.name,
                    visit_count: stats.visit_count,
                    color_intensity: stats.color_intensity,
                }
            })
            .collect();

        debug!(
            "Aggregated {} countries, {} visited",
            aggregates.len(),
            aggregates.iter().filter(|c| c.visit_count > 0).count()
        );

        Ok(aggregates)
    }

    /// A country with its primary visits followed by its fusion visits.
    pub async fn country_details(&self, country_code: &str) -> LedgerResult<CountryDetails> {
        let country = self
            .storage
            .get_country_by_code(country_code)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("Country {country_code} not found")))?;

        let mut restaurants = self.storage.list_primary_visits(&country.id).await?;

        match self.storage.list_fusion_visits(&country.id).await {
            Ok(fusion) => restaurants.extend(fusion),
            Err(e) => warn!(
                "Loading fusion visits for {} failed, returning primary visits only: {}",
                country.name, e
            ),
        }

        Ok(CountryDetails {
            country,
            restaurants,
        })
    }

    pub async fn all_countries(&self, cuisine: Option<&str>) -> LedgerResult<Vec<CountrySummary>> {
        let cuisine = cuisine.filter(|c| !c.is_empty());
        Ok(self.storage.list_countries(cuisine).await?)
    }

    pub async fn distinct_cuisines(&self) -> LedgerResult<Vec<CuisineOption>> {
        let cuisines = self.storage.list_cuisines().await?;
        Ok(cuisines.into_iter().map(CuisineOption::from).collect())
    }

    /// Visits whose primary country is `country_id`, newest first.
    pub async fn primary_visits(&self, country_id: &str) -> LedgerResult<Vec<Visit>> {
        Ok(self.storage.list_primary_visits(country_id).await?)
    }

    async fn ensure_countries_exist(&self, visit: &NewVisit) -> LedgerResult<()> {
        let refs = visit.refs();
        let referenced = std::iter::once(refs.country_id.as_str()).chain(refs.fusion_credit());
        for country_id in referenced {
            if self.storage.get_country(country_id).await?.is_none() {
                return Err(LedgerError::Validation(format!(
                    "Unknown country id: {country_id}"
                )));
            }
        }
        Ok(())
    }

    /// Recount the plan's countries. Only a failure on the primary country
    /// reaches the caller; the visit row itself is already committed.
    async fn apply(&self, plan: RecountPlan) -> LedgerResult<()> {
        self.update_country_stats(&plan.primary).await?;

        for country_id in &plan.secondary {
            if let Err(e) = self.update_country_stats(country_id).await {
                warn!("Failed to update statistics for country {}: {}", country_id, e);
            }
        }

        Ok(())
    }
}

fn visit_not_found(visit_id: &str) -> LedgerError {
    LedgerError::NotFound(format!("Visit {visit_id} not found"))
}
