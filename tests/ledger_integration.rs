//! Integration tests for the visit ledger
//!
//! Every mutation is checked against the persisted country statistics, which
//! must always equal the number of visits crediting each country.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tastemap::ledger::VisitLedger;
use tastemap::models::{
    Country, CountrySummary, CountryTally, NewCountry, NewVisit, Visit, VisitPayload, VisitRefs,
};
use tastemap::storage::{SqliteStorage, Storage, StorageError, StorageResult};
use tastemap::LedgerError;

/// Helper to create SQLite test storage with a handful of countries
async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();

    for (name, code, cuisine) in [
        ("France", "FR", "French"),
        ("Italy", "IT", "Italian"),
        ("Japan", "JP", "Japanese"),
        ("Thailand", "TH", "Thai"),
    ] {
        storage
            .upsert_country(&NewCountry {
                name: name.to_string(),
                country_code: code.to_string(),
                cuisine_style: cuisine.to_string(),
                cuisine_description: None,
            })
            .await
            .unwrap();
    }

    Arc::new(storage)
}

async fn country_id(storage: &Arc<dyn Storage>, code: &str) -> String {
    storage
        .get_country_by_code(code)
        .await
        .unwrap()
        .unwrap()
        .id
}

async fn stored_count(storage: &Arc<dyn Storage>, code: &str) -> (i64, f64) {
    let country = storage.get_country_by_code(code).await.unwrap().unwrap();
    (country.visit_count, country.color_intensity)
}

fn payload(country_id: &str, restaurant: &str) -> VisitPayload {
    VisitPayload {
        country_id: Some(country_id.to_string()),
        restaurant_name: Some(restaurant.to_string()),
        location: Some("Madagascar".to_string()),
        items_devoured: Some("Everything".to_string()),
        ..Default::default()
    }
}

fn fusion_payload(country_id: &str, fusion_id: &str, restaurant: &str) -> VisitPayload {
    VisitPayload {
        is_fusion: Some(true),
        fusion_country_id: Some(fusion_id.to_string()),
        ..payload(country_id, restaurant)
    }
}

#[tokio::test]
async fn test_create_credits_primary_country() {
    let storage = create_test_storage().await;
    let ledger = VisitLedger::new(Arc::clone(&storage));
    let fr = country_id(&storage, "FR").await;

    let visit = ledger.create_visit(payload(&fr, "Chez Julien")).await.unwrap();
    assert_eq!(visit.country_id, fr);
    assert!(!visit.is_fusion);
    assert_eq!(visit.fusion_country_id, None);
    assert_eq!(visit.visit_date, chrono::Utc::now().date_naive());

    assert_eq!(stored_count(&storage, "FR").await, (1, 0.2));
    assert_eq!(stored_count(&storage, "IT").await, (0, 0.0));
}

#[tokio::test]
async fn test_fusion_visit_credits_both_countries() {
    let storage = create_test_storage().await;
    let ledger = VisitLedger::new(Arc::clone(&storage));
    let fr = country_id(&storage, "FR").await;
    let jp = country_id(&storage, "JP").await;

    ledger
        .create_visit(fusion_payload(&fr, &jp, "Sushi Bistro"))
        .await
        .unwrap();

    assert_eq!(stored_count(&storage, "FR").await.0, 1);
    assert_eq!(stored_count(&storage, "JP").await.0, 1);

    // JP sees the visit through its fusion list only
    assert!(ledger.primary_visits(&jp).await.unwrap().is_empty());
    let details = ledger.country_details("JP").await.unwrap();
    assert_eq!(details.restaurants.len(), 1);
    assert_eq!(details.restaurants[0].restaurant_name, "Sushi Bistro");
}

#[tokio::test]
async fn test_update_moves_credit_between_countries() {
    let storage = create_test_storage().await;
    let ledger = VisitLedger::new(Arc::clone(&storage));
    let fr = country_id(&storage, "FR").await;
    let it = country_id(&storage, "IT").await;
    let jp = country_id(&storage, "JP").await;
    let th = country_id(&storage, "TH").await;

    let visit = ledger
        .create_visit(fusion_payload(&fr, &jp, "Fusion Palace"))
        .await
        .unwrap();

    let updated = ledger
        .update_visit(&visit.id, fusion_payload(&it, &th, "Fusion Palace"))
        .await
        .unwrap();
    assert_eq!(updated.id, visit.id);
    assert_eq!(updated.country_id, it);

    assert_eq!(stored_count(&storage, "FR").await.0, 0);
    assert_eq!(stored_count(&storage, "JP").await.0, 0);
    assert_eq!(stored_count(&storage, "IT").await.0, 1);
    assert_eq!(stored_count(&storage, "TH").await.0, 1);
}

#[tokio::test]
async fn test_update_clearing_fusion_withdraws_fusion_credit() {
    let storage = create_test_storage().await;
    let ledger = VisitLedger::new(Arc::clone(&storage));
    let fr = country_id(&storage, "FR").await;
    let jp = country_id(&storage, "JP").await;

    let visit = ledger
        .create_visit(fusion_payload(&fr, &jp, "Le Ramen"))
        .await
        .unwrap();
    assert_eq!(stored_count(&storage, "JP").await.0, 1);

    let updated = ledger
        .update_visit(&visit.id, payload(&fr, "Le Ramen"))
        .await
        .unwrap();
    assert!(!updated.is_fusion);
    assert_eq!(updated.fusion_country_id, None);

    assert_eq!(stored_count(&storage, "FR").await.0, 1);
    assert_eq!(stored_count(&storage, "JP").await, (0, 0.0));
}

#[tokio::test]
async fn test_update_keeps_supplied_visit_date() {
    let storage = create_test_storage().await;
    let ledger = VisitLedger::new(Arc::clone(&storage));
    let fr = country_id(&storage, "FR").await;

    let visit = ledger.create_visit(payload(&fr, "Bistro")).await.unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();

    let updated = ledger
        .update_visit(
            &visit.id,
            VisitPayload {
                visit_date: Some(date),
                rating: Some(4),
                ..payload(&fr, "Bistro")
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.visit_date, date);
    assert_eq!(updated.rating, Some(4));
}

#[tokio::test]
async fn test_delete_withdraws_all_credit() {
    let storage = create_test_storage().await;
    let ledger = VisitLedger::new(Arc::clone(&storage));
    let fr = country_id(&storage, "FR").await;
    let jp = country_id(&storage, "JP").await;

    let visit = ledger
        .create_visit(fusion_payload(&fr, &jp, "Bento Brasserie"))
        .await
        .unwrap();
    ledger.delete_visit(&visit.id).await.unwrap();

    assert_eq!(stored_count(&storage, "FR").await, (0, 0.0));
    assert_eq!(stored_count(&storage, "JP").await, (0, 0.0));
    assert!(storage.get_visit_refs(&visit.id).await.unwrap().is_none());

    let again = ledger.delete_visit(&visit.id).await;
    assert!(matches!(again, Err(LedgerError::NotFound(_))));
}

#[tokio::test]
async fn test_update_unknown_visit_is_not_found() {
    let storage = create_test_storage().await;
    let ledger = VisitLedger::new(Arc::clone(&storage));
    let fr = country_id(&storage, "FR").await;

    let result = ledger.update_visit("no-such-visit", payload(&fr, "Ghost")).await;
    assert!(matches!(result, Err(LedgerError::NotFound(_))));
    assert_eq!(stored_count(&storage, "FR").await.0, 0);
}

#[tokio::test]
async fn test_invalid_payloads_write_nothing() {
    let storage = create_test_storage().await;
    let ledger = VisitLedger::new(Arc::clone(&storage));
    let fr = country_id(&storage, "FR").await;

    let missing = ledger
        .create_visit(VisitPayload {
            location: None,
            ..payload(&fr, "Nowhere")
        })
        .await;
    match missing {
        Err(LedgerError::Validation(msg)) => {
            assert_eq!(msg, "Missing required fields: country_id, restaurant_name, location")
        }
        other => panic!("Expected validation error, got {:?}", other),
    }

    let unknown_country = ledger.create_visit(payload("atlantis", "Sunken Grill")).await;
    assert!(matches!(unknown_country, Err(LedgerError::Validation(_))));

    let unknown_fusion = ledger
        .create_visit(fusion_payload(&fr, "atlantis", "Sunken Grill"))
        .await;
    assert!(matches!(unknown_fusion, Err(LedgerError::Validation(_))));

    assert!(ledger.primary_visits(&fr).await.unwrap().is_empty());
    assert_eq!(stored_count(&storage, "FR").await.0, 0);
}

#[tokio::test]
async fn test_intensity_saturates_at_five_visits() {
    let storage = create_test_storage().await;
    let ledger = VisitLedger::new(Arc::clone(&storage));
    let it = country_id(&storage, "IT").await;

    for i in 0..3 {
        ledger
            .create_visit(payload(&it, &format!("Trattoria {}", i)))
            .await
            .unwrap();
    }
    assert_eq!(stored_count(&storage, "IT").await, (3, 0.6));

    for i in 3..7 {
        ledger
            .create_visit(payload(&it, &format!("Trattoria {}", i)))
            .await
            .unwrap();
    }
    assert_eq!(stored_count(&storage, "IT").await, (7, 1.0));
}

#[tokio::test]
async fn test_aggregate_agrees_with_stored_counts() {
    let storage = create_test_storage().await;
    let ledger = VisitLedger::new(Arc::clone(&storage));
    let fr = country_id(&storage, "FR").await;
    let jp = country_id(&storage, "JP").await;

    ledger.create_visit(payload(&fr, "Le Petit")).await.unwrap();
    ledger
        .create_visit(fusion_payload(&fr, &jp, "Wasabi Crêpes"))
        .await
        .unwrap();
    ledger.create_visit(payload(&jp, "Izakaya")).await.unwrap();

    let aggregate = ledger.countries_aggregate().await.unwrap();
    assert_eq!(aggregate.len(), 4);

    // Ordered by name
    let names: Vec<&str> = aggregate.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["France", "Italy", "Japan", "Thailand"]);

    for entry in &aggregate {
        let (count, intensity) = stored_count(&storage, &entry.country_code).await;
        assert_eq!(entry.visit_count, count, "{}", entry.country_code);
        assert_eq!(entry.color_intensity, intensity, "{}", entry.country_code);
    }

    let france = aggregate.iter().find(|c| c.country_code == "FR").unwrap();
    assert_eq!(france.visit_count, 2);
    let japan = aggregate.iter().find(|c| c.country_code == "JP").unwrap();
    assert_eq!(japan.visit_count, 2);
}

#[tokio::test]
async fn test_country_details_lists_primary_then_fusion() {
    let storage = create_test_storage().await;
    let ledger = VisitLedger::new(Arc::clone(&storage));
    let fr = country_id(&storage, "FR").await;
    let jp = country_id(&storage, "JP").await;

    ledger
        .create_visit(fusion_payload(&fr, &jp, "Fusion First"))
        .await
        .unwrap();
    ledger.create_visit(payload(&jp, "Sushi Bar")).await.unwrap();

    let details = ledger.country_details("JP").await.unwrap();
    assert_eq!(details.country.country_code, "JP");
    let names: Vec<&str> = details
        .restaurants
        .iter()
        .map(|v| v.restaurant_name.as_str())
        .collect();
    assert_eq!(names, vec!["Sushi Bar", "Fusion First"]);

    let missing = ledger.country_details("ZZ").await;
    match missing {
        Err(LedgerError::NotFound(msg)) => assert_eq!(msg, "Country ZZ not found"),
        other => panic!("Expected not found, got {:?}", other),
    }
}

#[tokio::test]
async fn test_primary_visits_newest_first() {
    let storage = create_test_storage().await;
    let ledger = VisitLedger::new(Arc::clone(&storage));
    let th = country_id(&storage, "TH").await;

    for (name, day) in [("Old Pad Thai", 1), ("New Pad Thai", 20), ("Mid Pad Thai", 10)] {
        ledger
            .create_visit(VisitPayload {
                visit_date: NaiveDate::from_ymd_opt(2024, 5, day),
                ..payload(&th, name)
            })
            .await
            .unwrap();
    }

    let visits = ledger.primary_visits(&th).await.unwrap();
    let names: Vec<&str> = visits.iter().map(|v| v.restaurant_name.as_str()).collect();
    assert_eq!(names, vec!["New Pad Thai", "Mid Pad Thai", "Old Pad Thai"]);
}

#[tokio::test]
async fn test_recount_all_repairs_stale_counts() {
    let storage = create_test_storage().await;
    let ledger = VisitLedger::new(Arc::clone(&storage));
    let fr = country_id(&storage, "FR").await;
    let it = country_id(&storage, "IT").await;

    ledger.create_visit(payload(&fr, "Le Coq")).await.unwrap();
    storage.write_country_stats(&fr, 42, 1.0).await.unwrap();
    storage.write_country_stats(&it, 3, 0.6).await.unwrap();

    assert_eq!(ledger.recount_all().await.unwrap(), 4);
    assert_eq!(stored_count(&storage, "FR").await, (1, 0.2));
    assert_eq!(stored_count(&storage, "IT").await, (0, 0.0));
}

#[tokio::test]
async fn test_cuisines_and_country_filter() {
    let storage = create_test_storage().await;
    let ledger = VisitLedger::new(Arc::clone(&storage));

    let cuisines = ledger.distinct_cuisines().await.unwrap();
    let values: Vec<&str> = cuisines.iter().map(|c| c.value.as_str()).collect();
    assert_eq!(values, vec!["French", "Italian", "Japanese", "Thai"]);
    assert!(cuisines.iter().all(|c| c.value == c.label));

    let italian = ledger.all_countries(Some("Italian")).await.unwrap();
    assert_eq!(italian.len(), 1);
    assert_eq!(italian[0].country_code, "IT");

    // An empty filter means no filter
    assert_eq!(ledger.all_countries(Some("")).await.unwrap().len(), 4);
    assert_eq!(ledger.all_countries(None).await.unwrap().len(), 4);
}

/// Delegates to SQLite, failing the selected reads.
struct FaultyStorage {
    inner: Arc<dyn Storage>,
    fail_primary_counts: bool,
    fail_fusion_reads: bool,
}

impl FaultyStorage {
    fn failing_fusion_reads(inner: Arc<dyn Storage>) -> Self {
        Self {
            inner,
            fail_primary_counts: false,
            fail_fusion_reads: true,
        }
    }

    fn failing_primary_counts(inner: Arc<dyn Storage>) -> Self {
        Self {
            inner,
            fail_primary_counts: true,
            fail_fusion_reads: false,
        }
    }
}

fn injected_failure(what: &str) -> StorageError {
    StorageError::Other(anyhow!("{} unavailable", what))
}

#[async_trait]
impl Storage for FaultyStorage {
    async fn init(&self) -> anyhow::Result<()> {
        self.inner.init().await
    }

    async fn upsert_country(&self, country: &NewCountry) -> StorageResult<Country> {
        self.inner.upsert_country(country).await
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
        self.inner.list_countries(cuisine).await
    }

    async fn list_cuisines(&self) -> StorageResult<Vec<String>> {
        self.inner.list_cuisines().await
    }

    async fn country_tallies(&self) -> StorageResult<Vec<CountryTally>> {
        self.inner.country_tallies().await
    }

    async fn count_primary_visits(&self, country_id: &str) -> StorageResult<i64> {
        if self.fail_primary_counts {
            return Err(injected_failure("primary count"));
        }
        self.inner.count_primary_visits(country_id).await
    }

    async fn count_fusion_visits(&self, country_id: &str) -> StorageResult<i64> {
        if self.fail_fusion_reads {
            return Err(injected_failure("fusion count"));
        }
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
        if self.fail_fusion_reads {
            return Err(injected_failure("fusion list"));
        }
        self.inner.list_fusion_visits(country_id).await
    }
}

#[tokio::test]
async fn test_fusion_read_failures_degrade_to_primary_only() {
    let inner = create_test_storage().await;
    let fr = country_id(&inner, "FR").await;
    let jp = country_id(&inner, "JP").await;

    let storage: Arc<dyn Storage> =
        Arc::new(FaultyStorage::failing_fusion_reads(Arc::clone(&inner)));
    let ledger = VisitLedger::new(Arc::clone(&storage));

    // The mutation still succeeds; fusion credit is simply not counted
    ledger
        .create_visit(fusion_payload(&fr, &jp, "Degraded Diner"))
        .await
        .unwrap();
    ledger.create_visit(payload(&jp, "Ramen Stop")).await.unwrap();

    assert_eq!(stored_count(&inner, "FR").await.0, 1);
    assert_eq!(stored_count(&inner, "JP").await.0, 1);

    let details = ledger.country_details("JP").await.unwrap();
    assert_eq!(details.restaurants.len(), 1);
    assert_eq!(details.restaurants[0].restaurant_name, "Ramen Stop");
}

#[tokio::test]
async fn test_failed_primary_count_writes_nothing_and_reaches_caller() {
    let inner = create_test_storage().await;
    let fr = country_id(&inner, "FR").await;
    inner.write_country_stats(&fr, 7, 1.0).await.unwrap();

    let storage: Arc<dyn Storage> =
        Arc::new(FaultyStorage::failing_primary_counts(Arc::clone(&inner)));
    let ledger = VisitLedger::new(Arc::clone(&storage));

    let direct = ledger.update_country_stats(&fr).await;
    assert!(matches!(direct, Err(LedgerError::Persistence(_))));
    assert_eq!(stored_count(&inner, "FR").await, (7, 1.0));

    // The row is committed but the recount error surfaces
    let created = ledger.create_visit(payload(&fr, "Half Done")).await;
    assert!(matches!(created, Err(LedgerError::Persistence(_))));
    assert_eq!(stored_count(&inner, "FR").await, (7, 1.0));
    assert_eq!(inner.list_primary_visits(&fr).await.unwrap().len(), 1);

    // A healthy recount repairs it
    VisitLedger::new(Arc::clone(&inner))
        .recount_all()
        .await
        .unwrap();
    assert_eq!(stored_count(&inner, "FR").await, (1, 0.2));
}

#[tokio::test]
async fn test_update_adding_fusion_credits_only_fusion_country() {
    let storage = create_test_storage().await;
    let ledger = VisitLedger::new(Arc::clone(&storage));
    let fr = country_id(&storage, "FR").await;
    let jp = country_id(&storage, "JP").await;

    let visit = ledger.create_visit(payload(&fr, "Le Zen")).await.unwrap();
    ledger.create_visit(payload(&jp, "Tokyo Diner")).await.unwrap();
    assert_eq!(stored_count(&storage, "FR").await.0, 1);
    assert_eq!(stored_count(&storage, "JP").await.0, 1);

    ledger
        .update_visit(&visit.id, fusion_payload(&fr, &jp, "Le Zen"))
        .await
        .unwrap();

    assert_eq!(stored_count(&storage, "FR").await.0, 1);
    assert_eq!(stored_count(&storage, "JP").await.0, 2);
    assert_eq!(stored_count(&storage, "IT").await.0, 0);
}

#[tokio::test]
async fn test_update_switching_fusion_country_moves_fusion_credit() {
    let storage = create_test_storage().await;
    let ledger = VisitLedger::new(Arc::clone(&storage));
    let fr = country_id(&storage, "FR").await;
    let jp = country_id(&storage, "JP").await;
    let th = country_id(&storage, "TH").await;

    let visit = ledger
        .create_visit(fusion_payload(&fr, &jp, "Fusion Swap"))
        .await
        .unwrap();
    assert_eq!(stored_count(&storage, "JP").await.0, 1);

    ledger
        .update_visit(&visit.id, fusion_payload(&fr, &th, "Fusion Swap"))
        .await
        .unwrap();

    assert_eq!(stored_count(&storage, "FR").await.0, 1);
    assert_eq!(stored_count(&storage, "JP").await, (0, 0.0));
    assert_eq!(stored_count(&storage, "TH").await, (1, 0.2));
}

#[tokio::test]
async fn test_country_details_reread_is_stable() {
    let storage = create_test_storage().await;
    let ledger = VisitLedger::new(Arc::clone(&storage));
    let fr = country_id(&storage, "FR").await;
    let jp = country_id(&storage, "JP").await;

    ledger.create_visit(payload(&jp, "Sushi Go")).await.unwrap();
    ledger
        .create_visit(fusion_payload(&fr, &jp, "Miso Bistro"))
        .await
        .unwrap();

    let first = ledger.country_details("JP").await.unwrap();
    let second = ledger.country_details("JP").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.country.visit_count, 2);
}

#[tokio::test]
async fn test_fusion_reference_without_flag_is_not_credited() {
    let storage = create_test_storage().await;
    let ledger = VisitLedger::new(Arc::clone(&storage));
    let fr = country_id(&storage, "FR").await;
    let jp = country_id(&storage, "JP").await;

    let visit = ledger
        .create_visit(VisitPayload {
            is_fusion: Some(false),
            fusion_country_id: Some(jp.clone()),
            ..payload(&fr, "Not Really Fusion")
        })
        .await
        .unwrap();
    assert_eq!(visit.fusion_country_id, None);

    assert_eq!(stored_count(&storage, "FR").await, (1, 0.2));
    assert_eq!(stored_count(&storage, "JP").await, (0, 0.0));
    assert!(ledger.country_details("JP").await.unwrap().restaurants.is_empty());
}
