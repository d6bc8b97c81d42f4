//! Grouping and aggregation over joined ticket rows
//!
//! Pure functions: the rows and route totals handed in are already filtered,
//! so every report here is just a fold plus an ordering policy.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::TicketStatus;

/// Number of entries returned by the top-routes report
pub const TOP_ROUTES_LIMIT: usize = 5;

/// A ticket denormalized with its trip and route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRow {
    pub ticket_id: i64,
    pub created_at: NaiveDateTime,
    pub price: f64,
    pub status: TicketStatus,
    pub passenger_name: String,
    pub trip_id: i64,
    pub route_id: i64,
    pub start_station_id: i64,
    pub end_station_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_tickets: i64,
    pub total_revenue: f64,
    pub avg_price: f64,
    pub routes_sold: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTotals {
    pub date: NaiveDate,
    pub tickets: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteTotals {
    pub route_id: i64,
    pub tickets: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionTotals {
    pub start_station_id: i64,
    pub end_station_id: i64,
    pub tickets: i64,
    pub revenue: f64,
}

/// Running count and price sum for one group
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Totals {
    tickets: i64,
    revenue: f64,
}

impl Totals {
    fn add(&mut self, price: f64) {
        self.tickets += 1;
        self.revenue += price;
    }
}

/// Group rows by `key`, ascending by key
fn group_by<'a, K, I, F>(rows: I, key: F) -> BTreeMap<K, Totals>
where
    K: Ord,
    I: IntoIterator<Item = &'a TicketRow>,
    F: Fn(&TicketRow) -> K,
{
    let mut groups: BTreeMap<K, Totals> = BTreeMap::new();
    for row in rows {
        groups.entry(key(row)).or_default().add(row.price);
    }
    groups
}

/// Overall totals from per-route totals
pub fn summarize<'a, I>(routes: I) -> Summary
where
    I: IntoIterator<Item = &'a RouteTotals>,
{
    let mut totals = Totals::default();
    let mut routes_sold = 0;
    for route in routes {
        totals.tickets += route.tickets;
        totals.revenue += route.revenue;
        routes_sold += 1;
    }

    let avg_price = if totals.tickets > 0 {
        totals.revenue / totals.tickets as f64
    } else {
        0.0
    };

    Summary {
        total_tickets: totals.tickets,
        total_revenue: totals.revenue,
        avg_price,
        routes_sold,
    }
}

/// Daily totals keyed by the calendar date of `created_at`
pub fn by_day<'a, I>(rows: I) -> Vec<DayTotals>
where
    I: IntoIterator<Item = &'a TicketRow>,
{
    group_by(rows, |row| row.created_at.date())
        .into_iter()
        .map(|(date, t)| DayTotals {
            date,
            tickets: t.tickets,
            revenue: t.revenue,
        })
        .collect()
}

/// Routes ascending by id
pub fn ascending_routes(mut routes: Vec<RouteTotals>) -> Vec<RouteTotals> {
    routes.sort_by_key(|r| r.route_id);
    routes
}

pub fn by_direction<'a, I>(rows: I) -> Vec<DirectionTotals>
where
    I: IntoIterator<Item = &'a TicketRow>,
{
    group_by(rows, |row| (row.start_station_id, row.end_station_id))
        .into_iter()
        .map(|((start_station_id, end_station_id), t)| DirectionTotals {
            start_station_id,
            end_station_id,
            tickets: t.tickets,
            revenue: t.revenue,
        })
        .collect()
}

/// Most-sold routes first; equal counts fall back to ascending route id
pub fn top_routes(mut routes: Vec<RouteTotals>, limit: usize) -> Vec<RouteTotals> {
    routes.sort_by(|a, b| {
        b.tickets
            .cmp(&a.tickets)
            .then_with(|| a.route_id.cmp(&b.route_id))
    });
    routes.truncate(limit);
    routes
}

/// Newest tickets first; equal timestamps fall back to descending ticket id
pub fn newest_first(mut rows: Vec<TicketRow>) -> Vec<TicketRow> {
    rows.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.ticket_id.cmp(&a.ticket_id))
    });
    rows
}
