use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::VisitLedger;
use crate::models::{
    CountryAggregate, CountryDetails, CountrySummary, CuisineOption, Visit, VisitPayload,
};

pub struct AppState {
    pub ledger: Arc<VisitLedger>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Deserialize)]
pub struct CountryQuery {
    pub code: Option<String>,
}

#[derive(Deserialize)]
pub struct CountriesQuery {
    pub cuisine: Option<String>,
}

#[derive(Deserialize)]
pub struct RestaurantsQuery {
    pub country_id: Option<String>,
}

fn required(value: Option<String>, message: &str) -> LedgerResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| LedgerError::Validation(message.to_string()))
}

/// Service banner
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "King Julien's World Cuisine Tour API".to_string(),
    })
}

/// Health check endpoint
pub async fn health_check() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "OK".to_string(),
    })
}

/// Visit counts for every country, for map coloring
pub async fn get_aggregate(
    State(state): State<Arc<AppState>>,
) -> LedgerResult<Json<Vec<CountryAggregate>>> {
    Ok(Json(state.ledger.countries_aggregate().await?))
}

/// One country with its restaurants
pub async fn get_country(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CountryQuery>,
) -> LedgerResult<Json<CountryDetails>> {
    let code = required(query.code, "Country code is required")?;
    Ok(Json(state.ledger.country_details(&code).await?))
}

/// Countries for dropdowns, optionally filtered by cuisine
pub async fn list_countries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CountriesQuery>,
) -> LedgerResult<Json<Vec<CountrySummary>>> {
    Ok(Json(
        state.ledger.all_countries(query.cuisine.as_deref()).await?,
    ))
}

pub async fn list_cuisines(
    State(state): State<Arc<AppState>>,
) -> LedgerResult<Json<Vec<CuisineOption>>> {
    Ok(Json(state.ledger.distinct_cuisines().await?))
}

/// Restaurants whose primary country is `country_id`
pub async fn list_restaurants(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RestaurantsQuery>,
) -> LedgerResult<Json<Vec<Visit>>> {
    let country_id = required(query.country_id, "Country ID is required")?;
    Ok(Json(state.ledger.primary_visits(&country_id).await?))
}

pub async fn create_visit(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VisitPayload>, JsonRejection>,
) -> LedgerResult<(StatusCode, Json<Visit>)> {
    let Json(payload) = payload?;
    let visit = state.ledger.create_visit(payload).await?;
    Ok((StatusCode::CREATED, Json(visit)))
}

pub async fn update_visit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<VisitPayload>, JsonRejection>,
) -> LedgerResult<Json<Visit>> {
    let Json(payload) = payload?;
    Ok(Json(state.ledger.update_visit(&id, payload).await?))
}

pub async fn delete_visit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> LedgerResult<Json<SuccessResponse>> {
    state.ledger.delete_visit(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}
