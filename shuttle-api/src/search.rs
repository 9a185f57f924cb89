use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shuttle_catalog::FareQuote;
use shuttle_core::{TripId, TripOption, TripSearchRequest};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/trips/search", post(search_trips))
        .route("/v1/trips/{trip_id}/quote", get(quote_trip))
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub trips: Vec<TripOption>,
}

/// POST /v1/trips/search
async fn search_trips(
    State(state): State<AppState>,
    Json(req): Json<TripSearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let trips = state.query.search_trips(&req).await?;
    tracing::debug!(
        origin = %req.origin,
        destination = %req.destination,
        date = %req.date,
        hits = trips.len(),
        "trip search"
    );
    Ok(Json(SearchResponse { trips }))
}

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub seats: u32,
}

/// GET /v1/trips/{trip_id}/quote?seats=N
async fn quote_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<FareQuote>, AppError> {
    let quote = state.query.quote(&TripId(trip_id), params.seats).await?;
    Ok(Json(quote))
}
