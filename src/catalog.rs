//! Stations, trains, routes and trips
//!
//! Validated inserts and simple reads. Ids come from [`db::next_id`].

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::analytics::filter::{day_start, Clause, Conjunction};
use crate::db::{self, stored_timestamp, DbConn};
use crate::error::{Error, Result};
use crate::models::{NewRoute, NewStation, NewTrain, NewTrip, Route, Station, Train, Trip};

const STATIONS: &str = "SELECT record::id(id) AS id, name, code FROM station";
const TRAINS: &str = "SELECT record::id(id) AS id, number, name FROM train";
const ROUTES: &str = r#"
    SELECT
        record::id(id) AS id,
        record::id(start_station) AS start_station_id,
        record::id(end_station) AS end_station_id
    FROM route"#;
const TRIPS: &str = r#"
    SELECT
        record::id(id) AS id,
        record::id(route) AS route_id,
        record::id(train) AS train_id,
        departure_time,
        arrival_time,
        base_price
    FROM trip"#;

async fn select_by_id<T>(
    db: &DbConn,
    select: &str,
    table: &'static str,
    id: i64,
) -> Result<Option<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let found: Option<T> = db
        .query(format!("{select} WHERE id = type::thing($table, $id)"))
        .bind(("table", table))
        .bind(("id", id))
        .await?
        .check()?
        .take(0)?;
    Ok(found)
}

async fn exists(db: &DbConn, table: &'static str, id: i64) -> Result<bool> {
    let ids: Vec<i64> = db
        .query("SELECT VALUE record::id(id) FROM type::thing($table, $id)")
        .bind(("table", table))
        .bind(("id", id))
        .await?
        .check()?
        .take(0)?;
    Ok(!ids.is_empty())
}

// ============================================================================
// Stations
// ============================================================================

pub async fn create_station(db: &DbConn, new: NewStation) -> Result<Station> {
    let taken: Vec<i64> = db
        .query("SELECT VALUE record::id(id) FROM station WHERE code = $code LIMIT 1")
        .bind(("code", new.code.clone()))
        .await?
        .check()?
        .take(0)?;
    if !taken.is_empty() {
        warn!(code = %new.code, "duplicate station code");
        return Err(Error::invalid("Station with this code already exists"));
    }

    let id = db::next_id(db, "station").await?;
    db.query("CREATE type::thing('station', $id) SET name = $name, code = $code RETURN NONE")
        .bind(("id", id))
        .bind(("name", new.name.clone()))
        .bind(("code", new.code.clone()))
        .await?
        .check()?;

    info!(id, code = %new.code, "created station");
    Ok(Station {
        id,
        name: new.name,
        code: new.code,
    })
}

pub async fn list_stations(db: &DbConn) -> Result<Vec<Station>> {
    let mut stations: Vec<Station> = db.query(STATIONS).await?.check()?.take(0)?;
    stations.sort_by_key(|s| s.id);
    Ok(stations)
}

pub async fn get_station(db: &DbConn, id: i64) -> Result<Station> {
    select_by_id(db, STATIONS, "station", id)
        .await?
        .ok_or(Error::NotFound("Station"))
}

/// Delete a station that no route refers to
pub async fn delete_station(db: &DbConn, id: i64) -> Result<()> {
    if !exists(db, "station", id).await? {
        return Err(Error::NotFound("Station"));
    }

    let referencing: Vec<i64> = db
        .query(
            "SELECT VALUE record::id(id) FROM route \
             WHERE start_station = type::thing('station', $id) \
             OR end_station = type::thing('station', $id)",
        )
        .bind(("id", id))
        .await?
        .check()?
        .take(0)?;
    if !referencing.is_empty() {
        warn!(id, routes = ?referencing, "refusing to delete station in use");
        return Err(Error::conflict(format!(
            "Station is used by {} route(s)",
            referencing.len()
        )));
    }

    db.query("DELETE type::thing('station', $id)")
        .bind(("id", id))
        .await?
        .check()?;

    info!(id, "deleted station");
    Ok(())
}

// ============================================================================
// Trains
// ============================================================================

pub async fn create_train(db: &DbConn, new: NewTrain) -> Result<Train> {
    let taken: Vec<i64> = db
        .query("SELECT VALUE record::id(id) FROM train WHERE number = $number LIMIT 1")
        .bind(("number", new.number.clone()))
        .await?
        .check()?
        .take(0)?;
    if !taken.is_empty() {
        warn!(number = %new.number, "duplicate train number");
        return Err(Error::invalid("Train with this number already exists"));
    }

    let id = db::next_id(db, "train").await?;
    db.query(
        "CREATE type::thing('train', $id) SET number = $number, name = $name OR NONE \
         RETURN NONE",
    )
    .bind(("id", id))
    .bind(("number", new.number.clone()))
    .bind(("name", new.name.clone()))
    .await?
    .check()?;

    info!(id, number = %new.number, "created train");
    Ok(Train {
        id,
        number: new.number,
        name: new.name,
    })
}

pub async fn list_trains(db: &DbConn) -> Result<Vec<Train>> {
    let mut trains: Vec<Train> = db.query(TRAINS).await?.check()?.take(0)?;
    trains.sort_by_key(|t| t.id);
    Ok(trains)
}

// ============================================================================
// Routes
// ============================================================================

pub async fn create_route(db: &DbConn, new: NewRoute) -> Result<Route> {
    if !exists(db, "station", new.start_station_id).await?
        || !exists(db, "station", new.end_station_id).await?
    {
        warn!(?new, "route references unknown station");
        return Err(Error::invalid("Start or end station does not exist"));
    }

    let id = db::next_id(db, "route").await?;
    db.query(
        "CREATE type::thing('route', $id) SET \
         start_station = type::thing('station', $start), \
         end_station = type::thing('station', $end) \
         RETURN NONE",
    )
    .bind(("id", id))
    .bind(("start", new.start_station_id))
    .bind(("end", new.end_station_id))
    .await?
    .check()?;

    info!(id, start = new.start_station_id, end = new.end_station_id, "created route");
    Ok(Route {
        id,
        start_station_id: new.start_station_id,
        end_station_id: new.end_station_id,
    })
}

pub async fn list_routes(db: &DbConn) -> Result<Vec<Route>> {
    let mut routes: Vec<Route> = db.query(ROUTES).await?.check()?.take(0)?;
    routes.sort_by_key(|r| r.id);
    Ok(routes)
}

// ============================================================================
// Trips
// ============================================================================

/// Optional filters for the trip search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TripQuery {
    pub start_station_id: Option<i64>,
    pub end_station_id: Option<i64>,
    #[serde(default, deserialize_with = "db::storable_date")]
    pub travel_date: Option<NaiveDate>,
}

impl TripQuery {
    pub fn validate(&self) -> Result<()> {
        match self.travel_date {
            Some(date) if !db::is_storable(date) => Err(Error::invalid(format!(
                "date {date} is outside years 0000-9999"
            ))),
            _ => Ok(()),
        }
    }

    /// Route stations match exactly; the travel date covers `[day, day + 1)`.
    /// The last storable day has no upper bound.
    pub fn conjunction(&self) -> Conjunction {
        let from = self.travel_date.map(|d| stored_timestamp(day_start(d)));
        let until = self
            .travel_date
            .and_then(|d| d.succ_opt())
            .filter(|next| db::is_storable(*next))
            .map(|next| stored_timestamp(day_start(next)));

        Conjunction::fold([
            self.start_station_id.map(|id| {
                Clause::new(
                    "route.start_station = type::thing('station', $start_station_id)",
                    "start_station_id",
                    id,
                )
            }),
            self.end_station_id.map(|id| {
                Clause::new(
                    "route.end_station = type::thing('station', $end_station_id)",
                    "end_station_id",
                    id,
                )
            }),
            from.map(|from| Clause::new("departure_time >= $day_start", "day_start", from)),
            until.map(|until| Clause::new("departure_time < $day_end", "day_end", until)),
        ])
    }
}

pub async fn create_trip(db: &DbConn, new: NewTrip) -> Result<Trip> {
    if !exists(db, "route", new.route_id).await? || !exists(db, "train", new.train_id).await? {
        warn!(
            route_id = new.route_id,
            train_id = new.train_id,
            "trip references unknown route or train"
        );
        return Err(Error::invalid("Route or train does not exist"));
    }
    if !db::is_storable(new.departure_time.date()) || !db::is_storable(new.arrival_time.date()) {
        warn!(departure = %new.departure_time, "trip outside storable years");
        return Err(Error::invalid("Trip times must fall in years 0000-9999"));
    }
    if new.arrival_time <= new.departure_time {
        warn!(
            departure = %new.departure_time,
            arrival = %new.arrival_time,
            "trip arrives before it departs"
        );
        return Err(Error::invalid("Arrival time must be after departure time"));
    }

    let id = db::next_id(db, "trip").await?;
    db.query(
        "CREATE type::thing('trip', $id) SET \
         route = type::thing('route', $route_id), \
         train = type::thing('train', $train_id), \
         departure_time = $departure_time, \
         arrival_time = $arrival_time, \
         base_price = $base_price \
         RETURN NONE",
    )
    .bind(("id", id))
    .bind(("route_id", new.route_id))
    .bind(("train_id", new.train_id))
    .bind(("departure_time", stored_timestamp(new.departure_time)))
    .bind(("arrival_time", stored_timestamp(new.arrival_time)))
    .bind(("base_price", new.base_price))
    .await?
    .check()?;

    info!(id, route_id = new.route_id, "created trip");
    get_trip(db, id).await
}

pub async fn get_trip(db: &DbConn, id: i64) -> Result<Trip> {
    select_by_id(db, TRIPS, "trip", id)
        .await?
        .ok_or(Error::NotFound("Trip"))
}

/// Trips matching `query`, earliest departure first
pub async fn list_trips(db: &DbConn, query: &TripQuery) -> Result<Vec<Trip>> {
    query.validate()?;
    let mut trips: Vec<Trip> = query
        .conjunction()
        .query(db, TRIPS)
        .await?
        .check()?
        .take(0)?;
    trips.sort_by(|a, b| {
        a.departure_time
            .cmp(&b.departure_time)
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(trips)
}

/// Distinct departure dates of trips running `start → end`, ascending
pub async fn available_dates(
    db: &DbConn,
    start_station_id: i64,
    end_station_id: i64,
) -> Result<Vec<NaiveDate>> {
    let query = TripQuery {
        start_station_id: Some(start_station_id),
        end_station_id: Some(end_station_id),
        travel_date: None,
    };
    let departures: Vec<NaiveDateTime> = query
        .conjunction()
        .query(db, "SELECT VALUE departure_time FROM trip")
        .await?
        .check()?
        .take(0)?;

    let dates: BTreeSet<NaiveDate> = departures.iter().map(NaiveDateTime::date).collect();
    Ok(dates.into_iter().collect())
}
