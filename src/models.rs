use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Railway station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: i64,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStation {
    pub name: String,
    pub code: String,
}

/// Rolling stock identified by its public number (e.g. "091K")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
    pub id: i64,
    pub number: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTrain {
    pub number: String,
    pub name: Option<String>,
}

/// Directed station pair. Several routes may share the same pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: i64,
    pub start_station_id: i64,
    pub end_station_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRoute {
    pub start_station_id: i64,
    pub end_station_id: i64,
}

/// A scheduled run of a train over a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: i64,
    pub route_id: i64,
    pub train_id: i64,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub base_price: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTrip {
    pub route_id: i64,
    pub train_id: i64,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub base_price: f64,
}

/// Ticket lifecycle. Only paid tickets hold their seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Paid,
    Cancelled,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Paid => "paid",
            TicketStatus::Cancelled => "cancelled",
        }
    }

    pub fn holds_seat(self) -> bool {
        matches!(self, TicketStatus::Paid)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub trip_id: i64,
    pub passenger_name: String,
    pub seat_number: String,
    pub price: f64,
    pub status: TicketStatus,
    pub created_at: NaiveDateTime,
}

/// Booking request. `created_at` defaults to the current UTC time.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTicket {
    pub trip_id: i64,
    pub passenger_name: String,
    pub seat_number: String,
    pub price: f64,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}
