//! Sales analytics over the ticket → trip → route join
//!
//! Every report takes the store handle explicitly. Summary and the route
//! reports let the store count and sum per route; the day, direction and
//! detail reports load the matching ticket rows and fold them with the
//! functions in [`report`].

pub mod filter;
pub mod report;

use tracing::debug;

use crate::db::DbConn;
use crate::error::Result;

pub use filter::TicketFilter;
pub use report::{DayTotals, DirectionTotals, RouteTotals, Summary, TicketRow};

const JOINED_TICKETS: &str = r#"
    SELECT
        record::id(id) AS ticket_id,
        created_at,
        price,
        status,
        passenger_name,
        record::id(trip) AS trip_id,
        record::id(trip.route) AS route_id,
        record::id(trip.route.start_station) AS start_station_id,
        record::id(trip.route.end_station) AS end_station_id
    FROM ticket"#;

/// Ticket count and revenue per route, aggregated by the store
const ROUTE_TOTALS: &str = r#"
    SELECT
        record::id(trip.route) AS route_id,
        count() AS tickets,
        math::sum(price) AS revenue
    FROM ticket"#;

/// Joined rows for every ticket matching `filter`, in no particular order
pub async fn ticket_rows(db: &DbConn, filter: &TicketFilter) -> Result<Vec<TicketRow>> {
    filter.validate()?;
    let rows: Vec<TicketRow> = filter
        .conjunction()
        .query(db, JOINED_TICKETS)
        .await?
        .check()?
        .take(0)?;

    debug!(rows = rows.len(), ?filter, "loaded ticket rows");
    Ok(rows)
}

/// Per-route totals for tickets matching `filter`, in no particular order
pub async fn route_totals(db: &DbConn, filter: &TicketFilter) -> Result<Vec<RouteTotals>> {
    filter.validate()?;
    let routes: Vec<RouteTotals> = filter
        .conjunction()
        .query_then(db, ROUTE_TOTALS, " GROUP BY route_id")
        .await?
        .check()?
        .take(0)?;

    debug!(routes = routes.len(), ?filter, "loaded route totals");
    Ok(routes)
}

pub async fn summary(db: &DbConn, filter: &TicketFilter) -> Result<Summary> {
    let routes = route_totals(db, filter).await?;
    Ok(report::summarize(&routes))
}

pub async fn by_day(db: &DbConn, filter: &TicketFilter) -> Result<Vec<DayTotals>> {
    let rows = ticket_rows(db, filter).await?;
    Ok(report::by_day(&rows))
}

pub async fn by_route(db: &DbConn, filter: &TicketFilter) -> Result<Vec<RouteTotals>> {
    let routes = route_totals(db, filter).await?;
    Ok(report::ascending_routes(routes))
}

pub async fn by_direction(db: &DbConn, filter: &TicketFilter) -> Result<Vec<DirectionTotals>> {
    let rows = ticket_rows(db, filter).await?;
    Ok(report::by_direction(&rows))
}

/// Detail listing, newest first
pub async fn tickets(db: &DbConn, filter: &TicketFilter) -> Result<Vec<TicketRow>> {
    let rows = ticket_rows(db, filter).await?;
    Ok(report::newest_first(rows))
}

pub async fn top_routes(db: &DbConn, filter: &TicketFilter) -> Result<Vec<RouteTotals>> {
    let routes = route_totals(db, filter).await?;
    Ok(report::top_routes(routes, report::TOP_ROUTES_LIMIT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::db;
    use crate::error::Error;
    use crate::models::{NewRoute, NewStation, NewTicket, NewTrain, NewTrip};
    use crate::tickets;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    /// Stations 1..=3, route 1 = 1→2, route 2 = 2→3, one trip per route
    async fn setup() -> DbConn {
        let db = db::connect_in_memory().await.unwrap();
        db::init_schema(&db).await.unwrap();

        for (name, code) in [("Kyiv", "KYIV"), ("Lviv", "LVIV"), ("Odesa", "ODESA")] {
            catalog::create_station(&db, NewStation { name: name.into(), code: code.into() })
                .await
                .unwrap();
        }
        let train = catalog::create_train(&db, NewTrain { number: "091K".into(), name: None })
            .await
            .unwrap();
        for (start, end) in [(1, 2), (2, 3)] {
            let route = catalog::create_route(
                &db,
                NewRoute { start_station_id: start, end_station_id: end },
            )
            .await
            .unwrap();
            catalog::create_trip(
                &db,
                NewTrip {
                    route_id: route.id,
                    train_id: train.id,
                    departure_time: at(10, 8, 0, 0),
                    arrival_time: at(10, 15, 0, 0),
                    base_price: 100.0,
                },
            )
            .await
            .unwrap();
        }
        db
    }

    async fn sell(db: &DbConn, trip_id: i64, seat: &str, price: f64, created_at: NaiveDateTime) {
        tickets::create_ticket(
            db,
            NewTicket {
                trip_id,
                passenger_name: format!("Passenger {seat}"),
                seat_number: seat.into(),
                price,
                created_at: Some(created_at),
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_reports_over_sample_sales() {
        let db = setup().await;
        sell(&db, 1, "1", 100.0, at(1, 9, 0, 0)).await;
        sell(&db, 1, "2", 150.0, at(1, 18, 30, 0)).await;
        sell(&db, 2, "1", 200.0, at(2, 7, 0, 0)).await;

        let jan_first = TicketFilter::new().date_from(date(1)).date_to(date(1));
        assert_eq!(
            summary(&db, &jan_first).await.unwrap(),
            Summary {
                total_tickets: 2,
                total_revenue: 250.0,
                avg_price: 125.0,
                routes_sold: 1,
            }
        );

        let days = by_day(&db, &TicketFilter::new()).await.unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!((days[0].date, days[0].tickets, days[0].revenue), (date(1), 2, 250.0));
        assert_eq!((days[1].date, days[1].tickets, days[1].revenue), (date(2), 1, 200.0));

        let routes = by_route(&db, &TicketFilter::new()).await.unwrap();
        let route_ids: Vec<i64> = routes.iter().map(|r| r.route_id).collect();
        assert_eq!(route_ids, vec![1, 2]);

        let directions = by_direction(&db, &TicketFilter::new()).await.unwrap();
        assert_eq!(directions[0].start_station_id, 1);
        assert_eq!(directions[0].end_station_id, 2);
        assert_eq!(directions[1].start_station_id, 2);
        assert_eq!(directions[1].end_station_id, 3);
    }

    #[tokio::test]
    async fn test_date_range_is_inclusive_of_whole_days() {
        let db = setup().await;
        sell(&db, 1, "1", 10.0, at(1, 0, 0, 0)).await;
        sell(&db, 1, "2", 20.0, at(1, 23, 59, 59)).await;
        sell(&db, 1, "3", 40.0, at(2, 0, 0, 0)).await;

        let jan_first = TicketFilter::new().date_from(date(1)).date_to(date(1));
        let rows = tickets(&db, &jan_first).await.unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.ticket_id).collect();
        assert_eq!(ids, vec![2, 1]);

        let from_second = TicketFilter::new().date_from(date(2));
        assert_eq!(summary(&db, &from_second).await.unwrap().total_tickets, 1);
    }

    #[tokio::test]
    async fn test_station_filters_follow_the_route() {
        let db = setup().await;
        sell(&db, 1, "1", 100.0, at(1, 9, 0, 0)).await;
        sell(&db, 2, "1", 200.0, at(1, 9, 0, 0)).await;
        sell(&db, 2, "2", 300.0, at(1, 10, 0, 0)).await;

        let from_lviv = TicketFilter::new().start_station(2);
        let s = summary(&db, &from_lviv).await.unwrap();
        assert_eq!((s.total_tickets, s.total_revenue, s.routes_sold), (2, 500.0, 1));

        let to_lviv = TicketFilter::new().end_station(2);
        let rows = tickets(&db, &to_lviv).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].route_id, 1);
        assert_eq!(rows[0].trip_id, 1);
        assert_eq!((rows[0].start_station_id, rows[0].end_station_id), (1, 2));

        let nowhere = TicketFilter::new().start_station(1).end_station(3);
        assert!(tickets(&db, &nowhere).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_store_reports_zeroes() {
        let db = setup().await;
        let filter = TicketFilter::new();

        let s = summary(&db, &filter).await.unwrap();
        assert_eq!(s.total_tickets, 0);
        assert_eq!(s.total_revenue, 0.0);
        assert_eq!(s.avg_price, 0.0);
        assert_eq!(s.routes_sold, 0);
        assert!(by_day(&db, &filter).await.unwrap().is_empty());
        assert!(top_routes(&db, &filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_route_totals_come_from_the_store() {
        let db = setup().await;
        sell(&db, 2, "1", 80.5, at(1, 9, 0, 0)).await;
        sell(&db, 1, "1", 100.0, at(1, 9, 0, 0)).await;
        sell(&db, 2, "2", 19.5, at(2, 9, 0, 0)).await;

        let routes = by_route(&db, &TicketFilter::new()).await.unwrap();
        assert_eq!(
            routes,
            vec![
                RouteTotals {
                    route_id: 1,
                    tickets: 1,
                    revenue: 100.0,
                },
                RouteTotals {
                    route_id: 2,
                    tickets: 2,
                    revenue: 100.0,
                },
            ]
        );

        let top = top_routes(&db, &TicketFilter::new()).await.unwrap();
        let ids: Vec<i64> = top.iter().map(|r| r.route_id).collect();
        assert_eq!(ids, vec![2, 1]);

        let jan_second = TicketFilter::new().date_from(date(2));
        assert_eq!(
            route_totals(&db, &jan_second).await.unwrap(),
            vec![RouteTotals {
                route_id: 2,
                tickets: 1,
                revenue: 19.5,
            }]
        );
    }

    #[tokio::test]
    async fn test_unstorable_dates_are_rejected() {
        let db = setup().await;
        sell(&db, 1, "1", 100.0, at(1, 9, 0, 0)).await;

        let far = NaiveDate::from_ymd_opt(10000, 1, 1).unwrap();
        for filter in [TicketFilter::new().date_to(far), TicketFilter::new().date_from(far)] {
            assert!(matches!(summary(&db, &filter).await, Err(Error::Invalid(_))));
            assert!(matches!(tickets(&db, &filter).await, Err(Error::Invalid(_))));
        }
    }

    #[tokio::test]
    async fn test_summary_agrees_with_detail_listing() {
        let db = setup().await;
        for (i, price) in [120.5, 99.9, 310.0, 45.25].into_iter().enumerate() {
            let trip = if i % 2 == 0 { 1 } else { 2 };
            sell(&db, trip, &format!("{}", 10 + i), price, at(3 + i as u32, 12, 0, 0)).await;
        }

        for filter in [
            TicketFilter::new(),
            TicketFilter::new().date_from(date(4)),
            TicketFilter::new().date_to(date(4)).start_station(1),
        ] {
            let s = summary(&db, &filter).await.unwrap();
            let rows = tickets(&db, &filter).await.unwrap();
            let revenue: f64 = rows.iter().map(|r| r.price).sum();
            let per_day: i64 = by_day(&db, &filter).await.unwrap().iter().map(|d| d.tickets).sum();

            assert_eq!(s.total_tickets, rows.len() as i64);
            assert_eq!(per_day, s.total_tickets);
            assert!((s.total_revenue - revenue).abs() < 1e-9);
            if s.total_tickets > 0 {
                assert!((s.avg_price - s.total_revenue / s.total_tickets as f64).abs() < 1e-9);
            }
        }
    }
}
