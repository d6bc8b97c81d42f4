//! Reporting endpoints. Every handler accepts the same optional filters.

use axum::extract::{Query, State};
use axum::Json;

use super::{ApiResult, AppState};
use crate::analytics::{
    self, DayTotals, DirectionTotals, RouteTotals, Summary, TicketFilter, TicketRow,
};

/// GET /analytics/summary
pub async fn summary(
    State(state): State<AppState>,
    Query(filter): Query<TicketFilter>,
) -> ApiResult<Summary> {
    Ok(Json(analytics::summary(&state.db, &filter).await?))
}

/// GET /analytics/by-day
pub async fn by_day(
    State(state): State<AppState>,
    Query(filter): Query<TicketFilter>,
) -> ApiResult<Vec<DayTotals>> {
    Ok(Json(analytics::by_day(&state.db, &filter).await?))
}

/// GET /analytics/by-route
pub async fn by_route(
    State(state): State<AppState>,
    Query(filter): Query<TicketFilter>,
) -> ApiResult<Vec<RouteTotals>> {
    Ok(Json(analytics::by_route(&state.db, &filter).await?))
}

/// GET /analytics/by-direction
pub async fn by_direction(
    State(state): State<AppState>,
    Query(filter): Query<TicketFilter>,
) -> ApiResult<Vec<DirectionTotals>> {
    Ok(Json(analytics::by_direction(&state.db, &filter).await?))
}

/// GET /analytics/tickets
pub async fn tickets(
    State(state): State<AppState>,
    Query(filter): Query<TicketFilter>,
) -> ApiResult<Vec<TicketRow>> {
    Ok(Json(analytics::tickets(&state.db, &filter).await?))
}

/// GET /analytics/top-routes
pub async fn top_routes(
    State(state): State<AppState>,
    Query(filter): Query<TicketFilter>,
) -> ApiResult<Vec<RouteTotals>> {
    Ok(Json(analytics::top_routes(&state.db, &filter).await?))
}
