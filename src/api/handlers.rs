//! REST handlers for stations, trains, routes, trips and tickets

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ApiResult, AppState};
use crate::catalog::{self, TripQuery};
use crate::models::{
    NewRoute, NewStation, NewTicket, NewTrain, NewTrip, Route, Station, Ticket, Train, Trip,
};
use crate::tickets;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct DeletedResponse {
    pub detail: String,
}

#[derive(Serialize)]
pub struct AvailableDatesResponse {
    pub dates: Vec<NaiveDate>,
}

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Deserialize)]
pub struct DirectionQuery {
    pub start_station_id: i64,
    pub end_station_id: i64,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// GET /
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({"message": "Train Tickets API is running"}))
}

/// POST /stations
pub async fn create_station(
    State(state): State<AppState>,
    Json(new): Json<NewStation>,
) -> ApiResult<Station> {
    Ok(Json(catalog::create_station(&state.db, new).await?))
}

/// GET /stations
pub async fn list_stations(State(state): State<AppState>) -> ApiResult<Vec<Station>> {
    Ok(Json(catalog::list_stations(&state.db).await?))
}

/// GET /stations/:id
pub async fn get_station(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Station> {
    Ok(Json(catalog::get_station(&state.db, id).await?))
}

/// DELETE /stations/:id
pub async fn delete_station(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<DeletedResponse> {
    catalog::delete_station(&state.db, id).await?;
    Ok(Json(DeletedResponse {
        detail: "Station deleted".to_string(),
    }))
}

/// POST /trains
pub async fn create_train(
    State(state): State<AppState>,
    Json(new): Json<NewTrain>,
) -> ApiResult<Train> {
    Ok(Json(catalog::create_train(&state.db, new).await?))
}

/// GET /trains
pub async fn list_trains(State(state): State<AppState>) -> ApiResult<Vec<Train>> {
    Ok(Json(catalog::list_trains(&state.db).await?))
}

/// POST /routes
pub async fn create_route(
    State(state): State<AppState>,
    Json(new): Json<NewRoute>,
) -> ApiResult<Route> {
    Ok(Json(catalog::create_route(&state.db, new).await?))
}

/// GET /routes
pub async fn list_routes(State(state): State<AppState>) -> ApiResult<Vec<Route>> {
    Ok(Json(catalog::list_routes(&state.db).await?))
}

/// POST /trips
pub async fn create_trip(
    State(state): State<AppState>,
    Json(new): Json<NewTrip>,
) -> ApiResult<Trip> {
    Ok(Json(catalog::create_trip(&state.db, new).await?))
}

/// GET /trips?start_station_id&end_station_id&travel_date
pub async fn list_trips(
    State(state): State<AppState>,
    Query(query): Query<TripQuery>,
) -> ApiResult<Vec<Trip>> {
    Ok(Json(catalog::list_trips(&state.db, &query).await?))
}

/// GET /trips/available-dates?start_station_id&end_station_id
pub async fn available_dates(
    State(state): State<AppState>,
    Query(params): Query<DirectionQuery>,
) -> ApiResult<AvailableDatesResponse> {
    let dates =
        catalog::available_dates(&state.db, params.start_station_id, params.end_station_id).await?;
    Ok(Json(AvailableDatesResponse { dates }))
}

/// POST /tickets
pub async fn create_ticket(
    State(state): State<AppState>,
    Json(new): Json<NewTicket>,
) -> ApiResult<Ticket> {
    Ok(Json(tickets::create_ticket(&state.db, new).await?))
}

/// GET /tickets/:id
pub async fn get_ticket(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Ticket> {
    Ok(Json(tickets::get_ticket(&state.db, id).await?))
}

/// POST /tickets/:id/cancel
pub async fn cancel_ticket(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Ticket> {
    Ok(Json(tickets::cancel_ticket(&state.db, id).await?))
}
