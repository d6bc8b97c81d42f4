//! HTTP API for ticket sales and analytics
//!
//! CRUD endpoints live in [`handlers`], the reporting endpoints in
//! [`analytics`]. Both share [`AppState`] and render failures through
//! [`ErrorResponse`].

pub mod analytics;
pub mod handlers;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::db::DbConn;
use crate::error::Error;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
}

impl AppState {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Invalid(_) => StatusCode::BAD_REQUEST,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {}", self);
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, Error>;

/// CORS for the given origins; unparsable origins are skipped
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        // Service
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Catalog
        .route("/stations", post(handlers::create_station).get(handlers::list_stations))
        .route(
            "/stations/:id",
            get(handlers::get_station).delete(handlers::delete_station),
        )
        .route("/trains", post(handlers::create_train).get(handlers::list_trains))
        .route("/routes", post(handlers::create_route).get(handlers::list_routes))
        .route("/trips", post(handlers::create_trip).get(handlers::list_trips))
        .route("/trips/available-dates", get(handlers::available_dates))
        // Sales
        .route("/tickets", post(handlers::create_ticket))
        .route("/tickets/:id", get(handlers::get_ticket))
        .route("/tickets/:id/cancel", post(handlers::cancel_ticket))
        // Analytics
        .route("/analytics/summary", get(analytics::summary))
        .route("/analytics/by-day", get(analytics::by_day))
        .route("/analytics/by-route", get(analytics::by_route))
        .route("/analytics/by-direction", get(analytics::by_direction))
        .route("/analytics/tickets", get(analytics::tickets))
        .route("/analytics/top-routes", get(analytics::top_routes))
        // State and middleware
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}
