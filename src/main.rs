use anyhow::Result;
use train_tickets::analytics::{self, TicketFilter};
use train_tickets::{catalog, db};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let db = db::connect("data/train_tickets.db").await?;
    db::init_schema(&db).await?;

    info!("Connected to SurrealDB");

    info!("=== Sales Statistics ===");

    let everything = TicketFilter::new();

    let summary = analytics::summary(&db, &everything).await?;
    info!(
        "Tickets: {}  Revenue: {:.2}  Avg price: {:.2}  Routes sold: {}",
        summary.total_tickets, summary.total_revenue, summary.avg_price, summary.routes_sold
    );

    let stations = catalog::list_stations(&db).await?;
    let station_code = |id: i64| {
        stations
            .iter()
            .find(|s| s.id == id)
            .map_or_else(|| format!("#{id}"), |s| s.code.clone())
    };

    // Busiest directions
    for direction in analytics::by_direction(&db, &everything).await? {
        info!(
            "{} -> {}: {} tickets, {:.2} revenue",
            station_code(direction.start_station_id),
            station_code(direction.end_station_id),
            direction.tickets,
            direction.revenue
        );
    }

    // Top 5 routes
    for (rank, route) in analytics::top_routes(&db, &everything).await?.iter().enumerate() {
        info!(
            "#{} route {}: {} tickets, {:.2} revenue",
            rank + 1,
            route.route_id,
            route.tickets,
            route.revenue
        );
    }

    Ok(())
}
