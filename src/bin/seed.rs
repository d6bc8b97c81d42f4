//! Populate the database with demo stations, trains, routes, trips and tickets
//!
//! Usage:
//!   cargo run --release --bin seed -- [OPTIONS]
//!
//! Options:
//!   --db-path <PATH>  SurrealDB path (default: data/train_tickets.db)
//!   --memory          Seed a throwaway in-memory database
//!   --seed <N>        Random seed for reproducibility (default: 2024)
//!   --reset           Delete existing data first

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use train_tickets::{db, seed};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "seed")]
#[command(about = "Fill the train tickets database with demo data")]
struct Args {
    /// Database path
    #[arg(long, default_value = "data/train_tickets.db")]
    db_path: String,

    /// Use an in-memory database
    #[arg(long)]
    memory: bool,

    /// Random seed for reproducibility
    #[arg(long, default_value = "2024")]
    seed: u64,

    /// Delete existing data before seeding
    #[arg(long)]
    reset: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let db = if args.memory {
        db::connect_in_memory().await?
    } else {
        db::connect(&args.db_path).await?
    };
    db::init_schema(&db).await?;

    let today = Local::now().date_naive();
    let report = seed::populate(&db, today, args.seed, args.reset).await?;

    info!(
        "Seeded {} stations, {} trains, {} routes, {} trips, {} tickets",
        report.stations, report.trains, report.routes, report.trips, report.tickets
    );

    Ok(())
}
