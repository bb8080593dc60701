use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::CorsConfig;
use crate::ledger::VisitLedger;

use super::handlers::{
    create_visit, delete_visit, get_aggregate, get_country, health_check, list_countries,
    list_cuisines, list_restaurants, root, update_visit, AppState,
};

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn create_api_router(ledger: Arc<VisitLedger>, cors: &CorsConfig) -> Router {
    let state = Arc::new(AppState { ledger });

    let api = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/aggregate", get(get_aggregate))
        .route("/country", get(get_country))
        .route("/countries", get(list_countries))
        .route("/cuisines", get(list_cuisines))
        .route("/restaurants", get(list_restaurants))
        .route("/visit", post(create_visit))
        .route("/visit/{id}", put(update_visit).delete(delete_visit))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors))
}
