//! REST API server for train ticket sales and analytics
//!
//! Usage:
//!   ./target/release/api_server [options]
//!
//! Options:
//!   --port PORT          Port to listen on (default: 8000)
//!   --host ADDR          Address to bind (default: 0.0.0.0)
//!   --db-path PATH       Path to SurrealDB database (default: data/train_tickets.db)
//!   --memory             Use an in-memory database
//!   --cors-origin URL    Allowed CORS origin, repeatable
//!
//! Endpoints:
//!   GET    /health                      Health check
//!   POST   /stations, GET /stations     Stations
//!   GET    /stations/:id, DELETE        Single station
//!   POST   /trains, GET /trains         Trains
//!   POST   /routes, GET /routes         Routes
//!   POST   /trips, GET /trips           Trips (?start_station_id&end_station_id&travel_date)
//!   GET    /trips/available-dates       Departure dates between two stations
//!   POST   /tickets, GET /tickets/:id   Tickets
//!   POST   /tickets/:id/cancel          Cancel a ticket
//!   GET    /analytics/{summary,by-day,by-route,by-direction,tickets,top-routes}

use anyhow::Result;
use clap::Parser;
use train_tickets::api::{self, AppState};
use train_tickets::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .init();

    let config = Config::parse();

    let db = config.open_store().await?;
    if config.memory {
        tracing::warn!("Using in-memory database; data is lost on exit");
    } else {
        tracing::info!("Opened database at {}", config.db_path);
    }

    let origins = config.allowed_origins();
    tracing::info!("Allowed CORS origins: {:?}", origins);
    let app = api::router(AppState::new(db), api::cors_layer(&origins));

    let addr = config.addr();
    tracing::info!("Starting REST server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
