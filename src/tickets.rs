//! Ticket sales: booking, lookup and cancellation

use chrono::Utc;
use tracing::{info, warn};

use crate::catalog;
use crate::db::{self, stored_timestamp, DbConn};
use crate::error::{Error, Result};
use crate::models::{NewTicket, Ticket, TicketStatus};

const TICKETS: &str = r#"
    SELECT
        record::id(id) AS id,
        record::id(trip) AS trip_id,
        passenger_name,
        seat_number,
        price,
        status,
        created_at
    FROM ticket"#;

/// Statuses of every ticket sold for `seat_number` on the trip
async fn seat_statuses(db: &DbConn, trip_id: i64, seat_number: &str) -> Result<Vec<TicketStatus>> {
    let statuses: Vec<TicketStatus> = db
        .query(
            "SELECT VALUE status FROM ticket \
             WHERE trip = type::thing('trip', $trip_id) AND seat_number = $seat_number",
        )
        .bind(("trip_id", trip_id))
        .bind(("seat_number", seat_number.to_owned()))
        .await?
        .check()?
        .take(0)?;
    Ok(statuses)
}

/// Sell a seat on a trip. The seat must not be held by a paid ticket.
pub async fn create_ticket(db: &DbConn, new: NewTicket) -> Result<Ticket> {
    match catalog::get_trip(db, new.trip_id).await {
        Ok(_) => {}
        Err(Error::NotFound(_)) => {
            warn!(trip_id = new.trip_id, "ticket for unknown trip");
            return Err(Error::invalid("Trip does not exist"));
        }
        Err(e) => return Err(e),
    }

    let statuses = seat_statuses(db, new.trip_id, &new.seat_number).await?;
    if statuses.into_iter().any(TicketStatus::holds_seat) {
        warn!(trip_id = new.trip_id, seat = %new.seat_number, "seat already taken");
        return Err(Error::invalid("Seat already booked for this trip"));
    }

    let created_at = new.created_at.unwrap_or_else(|| Utc::now().naive_utc());
    if !db::is_storable(created_at.date()) {
        warn!(%created_at, "ticket timestamp outside storable years");
        return Err(Error::invalid("Ticket time must fall in years 0000-9999"));
    }
    let id = db::next_id(db, "ticket").await?;
    db.query(
        "CREATE type::thing('ticket', $id) SET \
         trip = type::thing('trip', $trip_id), \
         passenger_name = $passenger_name, \
         seat_number = $seat_number, \
         price = $price, \
         status = $status, \
         created_at = $created_at \
         RETURN NONE",
    )
    .bind(("id", id))
    .bind(("trip_id", new.trip_id))
    .bind(("passenger_name", new.passenger_name))
    .bind(("seat_number", new.seat_number.clone()))
    .bind(("price", new.price))
    .bind(("status", TicketStatus::Paid.as_str()))
    .bind(("created_at", stored_timestamp(created_at)))
    .await?
    .check()?;

    info!(id, trip_id = new.trip_id, seat = %new.seat_number, "sold ticket");
    get_ticket(db, id).await
}

pub async fn get_ticket(db: &DbConn, id: i64) -> Result<Ticket> {
    let ticket: Option<Ticket> = db
        .query(format!("{TICKETS} WHERE id = type::thing('ticket', $id)"))
        .bind(("id", id))
        .await?
        .check()?
        .take(0)?;
    ticket.ok_or(Error::NotFound("Ticket"))
}

/// Mark a paid ticket cancelled, freeing its seat
pub async fn cancel_ticket(db: &DbConn, id: i64) -> Result<Ticket> {
    let ticket = get_ticket(db, id).await?;
    if ticket.status == TicketStatus::Cancelled {
        warn!(id, "ticket already cancelled");
        return Err(Error::conflict("Ticket is already cancelled"));
    }

    db.query("UPDATE type::thing('ticket', $id) SET status = $status RETURN NONE")
        .bind(("id", id))
        .bind(("status", TicketStatus::Cancelled.as_str()))
        .await?
        .check()?;

    info!(id, trip_id = ticket.trip_id, "cancelled ticket");
    Ok(Ticket {
        status: TicketStatus::Cancelled,
        ..ticket
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewRoute, NewStation, NewTrain, NewTrip};
    use chrono::{NaiveDate, NaiveDateTime};

    fn departure() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(7, 30, 0)
            .unwrap()
    }

    async fn setup() -> (DbConn, i64) {
        let db = db::connect_in_memory().await.unwrap();
        db::init_schema(&db).await.unwrap();

        let kyiv = NewStation {
            name: "Kyiv".into(),
            code: "KYIV".into(),
        };
        let lviv = NewStation {
            name: "Lviv".into(),
            code: "LVIV".into(),
        };
        let a = catalog::create_station(&db, kyiv).await.unwrap();
        let b = catalog::create_station(&db, lviv).await.unwrap();
        let new_route = NewRoute {
            start_station_id: a.id,
            end_station_id: b.id,
        };
        let route = catalog::create_route(&db, new_route).await.unwrap();
        let train = catalog::create_train(&db, NewTrain { number: "743K".into(), name: None })
            .await
            .unwrap();
        let trip = catalog::create_trip(
            &db,
            NewTrip {
                route_id: route.id,
                train_id: train.id,
                departure_time: departure(),
                arrival_time: departure() + chrono::Duration::hours(5),
                base_price: 620.0,
            },
        )
        .await
        .unwrap();
        (db, trip.id)
    }

    fn booking(trip_id: i64, passenger: &str, seat: &str) -> NewTicket {
        NewTicket {
            trip_id,
            passenger_name: passenger.into(),
            seat_number: seat.into(),
            price: 620.0,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_sold_ticket_is_paid() {
        let (db, trip_id) = setup().await;
        let mut new = booking(trip_id, "Olena", "14");
        new.created_at = Some(departure() - chrono::Duration::days(2));

        let ticket = create_ticket(&db, new).await.unwrap();
        assert_eq!(ticket.id, 1);
        assert_eq!(ticket.trip_id, trip_id);
        assert_eq!(ticket.status, TicketStatus::Paid);
        assert_eq!(ticket.created_at, departure() - chrono::Duration::days(2));
        assert_eq!(get_ticket(&db, ticket.id).await.unwrap(), ticket);
    }

    #[tokio::test]
    async fn test_created_at_defaults_to_now() {
        let (db, trip_id) = setup().await;
        let before = Utc::now().naive_utc();
        let ticket = create_ticket(&db, booking(trip_id, "Taras", "3")).await.unwrap();
        let after = Utc::now().naive_utc();

        assert!(ticket.created_at >= before - chrono::Duration::milliseconds(1));
        assert!(ticket.created_at <= after);
    }

    #[tokio::test]
    async fn test_five_digit_year_is_invalid() {
        let (db, trip_id) = setup().await;
        let mut new = booking(trip_id, "Olena", "2");
        new.created_at = NaiveDate::from_ymd_opt(10000, 1, 1).and_then(|d| d.and_hms_opt(9, 0, 0));

        let err = create_ticket(&db, new).await.unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
        assert!(matches!(get_ticket(&db, 1).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_trip_is_invalid() {
        let (db, _) = setup().await;
        let err = create_ticket(&db, booking(404, "Nobody", "1")).await.unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
    }

    #[tokio::test]
    async fn test_seat_is_freed_by_cancellation() {
        let (db, trip_id) = setup().await;
        let first = create_ticket(&db, booking(trip_id, "Olena", "7")).await.unwrap();

        let err = create_ticket(&db, booking(trip_id, "Taras", "7")).await.unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
        create_ticket(&db, booking(trip_id, "Taras", "8")).await.unwrap();

        let cancelled = cancel_ticket(&db, first.id).await.unwrap();
        assert_eq!(cancelled.status, TicketStatus::Cancelled);
        assert_eq!(get_ticket(&db, first.id).await.unwrap().status, TicketStatus::Cancelled);

        let rebooked = create_ticket(&db, booking(trip_id, "Taras", "7")).await.unwrap();
        assert_eq!(rebooked.status, TicketStatus::Paid);
    }

    #[tokio::test]
    async fn test_cancel_twice_or_missing() {
        let (db, trip_id) = setup().await;
        let ticket = create_ticket(&db, booking(trip_id, "Olena", "1")).await.unwrap();

        cancel_ticket(&db, ticket.id).await.unwrap();
        assert!(matches!(cancel_ticket(&db, ticket.id).await, Err(Error::Conflict(_))));
        assert!(matches!(cancel_ticket(&db, 99).await, Err(Error::NotFound("Ticket"))));
    }
}
