use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer};
use std::ops::RangeInclusive;
use surrealdb::engine::local::{Db, Mem, RocksDb};
use surrealdb::Surreal;

use crate::error::Result;

pub type DbConn = Surreal<Db>;

const NAMESPACE: &str = "train_tickets";
const DATABASE: &str = "sales";

/// Initialize database connection with RocksDB backend
pub async fn connect(path: &str) -> Result<DbConn> {
    let db = Surreal::new::<RocksDb>(path).await?;
    db.use_ns(NAMESPACE).use_db(DATABASE).await?;
    Ok(db)
}

/// Initialize a throwaway in-memory database
pub async fn connect_in_memory() -> Result<DbConn> {
    let db = Surreal::new::<Mem>(()).await?;
    db.use_ns(NAMESPACE).use_db(DATABASE).await?;
    Ok(db)
}

/// Initialize database schema. Safe to run on every startup.
pub async fn init_schema(db: &DbConn) -> Result<()> {
    db.query(
        r#"
        -- Per-table id sequences
        DEFINE TABLE IF NOT EXISTS counter SCHEMALESS;

        -- Station table
        DEFINE TABLE IF NOT EXISTS station SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS name ON station TYPE string;
        DEFINE FIELD IF NOT EXISTS code ON station TYPE string;
        DEFINE INDEX IF NOT EXISTS idx_station_code ON station FIELDS code UNIQUE;

        -- Train table
        DEFINE TABLE IF NOT EXISTS train SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS number ON train TYPE string;
        DEFINE FIELD IF NOT EXISTS name ON train TYPE option<string>;
        DEFINE INDEX IF NOT EXISTS idx_train_number ON train FIELDS number UNIQUE;

        -- Route table (directed station pair)
        DEFINE TABLE IF NOT EXISTS route SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS start_station ON route TYPE record<station>;
        DEFINE FIELD IF NOT EXISTS end_station ON route TYPE record<station>;
        DEFINE INDEX IF NOT EXISTS idx_route_start ON route FIELDS start_station;
        DEFINE INDEX IF NOT EXISTS idx_route_end ON route FIELDS end_station;

        -- Trip table; times are fixed-width naive timestamps
        DEFINE TABLE IF NOT EXISTS trip SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS route ON trip TYPE record<route>;
        DEFINE FIELD IF NOT EXISTS train ON trip TYPE record<train>;
        DEFINE FIELD IF NOT EXISTS departure_time ON trip TYPE string;
        DEFINE FIELD IF NOT EXISTS arrival_time ON trip TYPE string;
        DEFINE FIELD IF NOT EXISTS base_price ON trip TYPE float;
        DEFINE INDEX IF NOT EXISTS idx_trip_route ON trip FIELDS route;

        -- Ticket table
        DEFINE TABLE IF NOT EXISTS ticket SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS trip ON ticket TYPE record<trip>;
        DEFINE FIELD IF NOT EXISTS passenger_name ON ticket TYPE string;
        DEFINE FIELD IF NOT EXISTS seat_number ON ticket TYPE string;
        DEFINE FIELD IF NOT EXISTS price ON ticket TYPE float;
        DEFINE FIELD IF NOT EXISTS status ON ticket TYPE string;
        DEFINE FIELD IF NOT EXISTS created_at ON ticket TYPE string;
        DEFINE INDEX IF NOT EXISTS idx_ticket_trip_seat ON ticket FIELDS trip, seat_number;
        DEFINE INDEX IF NOT EXISTS idx_ticket_created ON ticket FIELDS created_at;
        "#,
    )
    .await?
    .check()?;

    Ok(())
}

/// Remove every record, keeping the schema. Id sequences restart at 1.
pub async fn clear(db: &DbConn) -> Result<()> {
    db.query(
        r#"
        DELETE ticket;
        DELETE trip;
        DELETE route;
        DELETE train;
        DELETE station;
        DELETE counter;
        "#,
    )
    .await?
    .check()?;

    Ok(())
}

#[derive(Deserialize)]
struct Sequence {
    seq: i64,
}

/// Allocate the next integer id for `table`
pub async fn next_id(db: &DbConn, table: &'static str) -> Result<i64> {
    let sequence: Option<Sequence> = db
        .query("UPSERT type::thing('counter', $table) SET seq = (seq OR 0) + 1")
        .bind(("table", table))
        .await?
        .check()?
        .take(0)?;

    // UPSERT always yields the updated record
    Ok(sequence.map_or(1, |s| s.seq))
}

/// Timestamps are stored as fixed-width strings so that string order is time order
pub fn stored_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Years that render as four digits in [`stored_timestamp`]
pub const STORED_YEARS: RangeInclusive<i32> = 0..=9999;

pub fn is_storable(date: NaiveDate) -> bool {
    STORED_YEARS.contains(&date.year())
}

/// Deserialize an optional date, rejecting years outside [`STORED_YEARS`]
pub fn storable_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NaiveDate>::deserialize(deserializer)? {
        Some(date) if !is_storable(date) => Err(de::Error::custom(format!(
            "date {date} is outside years 0000-9999"
        ))),
        date => Ok(date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_timestamp_is_fixed_width() {
        let midnight = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let later = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_micro_opt(9, 5, 3, 250)
            .unwrap();

        assert_eq!(stored_timestamp(midnight), "2024-01-01T00:00:00.000000");
        assert_eq!(stored_timestamp(later), "2024-01-01T09:05:03.000250");
        assert!(stored_timestamp(midnight) < stored_timestamp(later));
    }

    #[test]
    fn test_five_digit_years_are_not_storable() {
        let last = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap();
        let next = last.succ_opt().unwrap();

        assert!(is_storable(NaiveDate::from_ymd_opt(0, 1, 1).unwrap()));
        assert!(is_storable(last));
        assert!(!is_storable(next));
        assert!(!is_storable(NaiveDate::MAX));
        // The stored form of a five-digit year would sort before every real timestamp
        assert!(stored_timestamp(next.and_hms_opt(0, 0, 0).unwrap()).as_str() < "2024");
    }

    #[tokio::test]
    async fn test_next_id_is_monotonic_per_table() {
        let db = connect_in_memory().await.unwrap();
        init_schema(&db).await.unwrap();

        assert_eq!(next_id(&db, "station").await.unwrap(), 1);
        assert_eq!(next_id(&db, "station").await.unwrap(), 2);
        assert_eq!(next_id(&db, "train").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let db = connect_in_memory().await.unwrap();
        init_schema(&db).await.unwrap();
        init_schema(&db).await.unwrap();
    }
}
