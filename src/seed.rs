//! Demo data: a small Ukrainian rail network with a week of sales

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::info;

use crate::catalog;
use crate::db::{self, DbConn};
use crate::error::Result;
use crate::models::{NewRoute, NewStation, NewTicket, NewTrain, NewTrip};
use crate::tickets;

const STATIONS: [(&str, &str); 5] = [
    ("Kyiv", "KYIV"),
    ("Lviv", "LVIV"),
    ("Odesa", "ODESA"),
    ("Kharkiv", "KHARKIV"),
    ("Dnipro", "DNIPRO"),
];

const TRAINS: [(&str, &str); 5] = [
    ("091K", "Kyiv - Lviv night"),
    ("092L", "Lviv - Kyiv night"),
    ("105K", "Kyiv - Odesa express"),
    ("706KH", "Kyiv - Kharkiv Intercity"),
    ("732D", "Kyiv - Dnipro Intercity"),
];

/// Station index pairs into [`STATIONS`]; route `i` is run by train `i`
const ROUTES: [(usize, usize); 5] = [(0, 1), (1, 0), (0, 2), (0, 3), (0, 4)];

const PASSENGERS: [&str; 8] = [
    "Ivan Petrenko",
    "Olena Koval",
    "Mariia Ivanchenko",
    "Andrii Shevchenko",
    "Svitlana Bondar",
    "Taras Kaiuk",
    "Oksana Lytvyn",
    "Mykhailo Hryniuk",
];

struct ScheduledTrip {
    route: usize,
    /// Days relative to the seeding date
    day: i64,
    departs: (u32, u32),
    duration_hours: i64,
    base_price: f64,
}

const fn trip(
    route: usize,
    day: i64,
    departs: (u32, u32),
    duration_hours: i64,
    base_price: f64,
) -> ScheduledTrip {
    ScheduledTrip {
        route,
        day,
        departs,
        duration_hours,
        base_price,
    }
}

const SCHEDULE: [ScheduledTrip; 11] = [
    trip(0, -5, (22, 30), 8, 700.0),
    trip(0, -3, (22, 30), 8, 750.0),
    trip(0, -1, (22, 30), 8, 800.0),
    trip(1, -4, (23, 0), 8, 680.0),
    trip(1, -2, (23, 0), 8, 720.0),
    trip(2, -7, (8, 0), 7, 900.0),
    trip(2, -1, (8, 0), 7, 950.0),
    trip(3, -6, (6, 0), 5, 650.0),
    trip(3, -2, (6, 0), 5, 700.0),
    trip(4, -5, (7, 30), 5, 600.0),
    trip(4, -1, (7, 30), 5, 650.0),
];

/// Counts of what [`populate`] created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub stations: usize,
    pub trains: usize,
    pub routes: usize,
    pub trips: usize,
    pub tickets: usize,
}

fn departure(today: NaiveDate, scheduled: &ScheduledTrip) -> NaiveDateTime {
    let (hour, minute) = scheduled.departs;
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    (today + Duration::days(scheduled.day)).and_time(time)
}

/// Fill the store with demo data scheduled around `today`.
///
/// Every trip gets 5 to 10 paid tickets bought 1 to 3 days before departure.
/// Passengers and price surcharges are drawn from an RNG seeded with
/// `rng_seed`, so the same seed yields the same sales.
pub async fn populate(
    db: &DbConn,
    today: NaiveDate,
    rng_seed: u64,
    reset: bool,
) -> Result<SeedReport> {
    if reset {
        db::clear(db).await?;
        info!("cleared existing data");
    }

    let mut rng = StdRng::seed_from_u64(rng_seed);
    let mut report = SeedReport::default();

    let mut stations = Vec::with_capacity(STATIONS.len());
    for (name, code) in STATIONS {
        let station = catalog::create_station(
            db,
            NewStation {
                name: name.to_string(),
                code: code.to_string(),
            },
        )
        .await?;
        stations.push(station);
    }
    report.stations = stations.len();

    let mut trains = Vec::with_capacity(TRAINS.len());
    for (number, name) in TRAINS {
        let train = catalog::create_train(
            db,
            NewTrain {
                number: number.to_string(),
                name: Some(name.to_string()),
            },
        )
        .await?;
        trains.push(train);
    }
    report.trains = trains.len();

    let mut routes = Vec::with_capacity(ROUTES.len());
    for (start, end) in ROUTES {
        let route = catalog::create_route(
            db,
            NewRoute {
                start_station_id: stations[start].id,
                end_station_id: stations[end].id,
            },
        )
        .await?;
        routes.push(route);
    }
    report.routes = routes.len();

    for (idx, scheduled) in SCHEDULE.iter().enumerate() {
        let departs = departure(today, scheduled);
        let trip = catalog::create_trip(
            db,
            NewTrip {
                route_id: routes[scheduled.route].id,
                train_id: trains[scheduled.route].id,
                departure_time: departs,
                arrival_time: departs + Duration::hours(scheduled.duration_hours),
                base_price: scheduled.base_price,
            },
        )
        .await?;
        report.trips += 1;

        let sold = 5 + idx % 6;
        for i in 0..sold {
            let passenger = PASSENGERS[rng.gen_range(0..PASSENGERS.len())];
            let surcharge = f64::from(rng.gen_range(0..=10u32)) * 15.0;
            tickets::create_ticket(
                db,
                NewTicket {
                    trip_id: trip.id,
                    passenger_name: passenger.to_string(),
                    seat_number: (10 + i).to_string(),
                    price: trip.base_price + surcharge,
                    created_at: Some(departs - Duration::days((i % 3 + 1) as i64)),
                },
            )
            .await?;
            report.tickets += 1;
        }
    }

    info!(?report, "seeded demo data");
    Ok(report)
}
