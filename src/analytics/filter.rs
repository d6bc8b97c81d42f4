//! Optional report filters folded into a single conjunction
//!
//! Every report runs over tickets joined to their trip and route. A filter is
//! an ordered list of optional predicates; absent predicates add nothing, the
//! present ones are AND-ed together and rendered as a SurrealQL `WHERE`
//! clause with named parameter bindings.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use serde_json::Value;
use surrealdb::engine::local::Db;
use surrealdb::method::Query;

use crate::db::{is_storable, storable_date, stored_timestamp, DbConn};
use crate::error::{Error, Result};

/// Query parameters accepted by every analytics endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TicketFilter {
    #[serde(default, deserialize_with = "storable_date")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "storable_date")]
    pub date_to: Option<NaiveDate>,
    pub start_station_id: Option<i64>,
    pub end_station_id: Option<i64>,
}

/// One constraint over the ticket/trip/route join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    CreatedFrom(NaiveDateTime),
    CreatedUntil(NaiveDateTime),
    StartStation(i64),
    EndStation(i64),
}

/// A rendered predicate: SurrealQL condition plus the parameters it reads
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub condition: String,
    pub bindings: Vec<(&'static str, Value)>,
}

impl Clause {
    pub fn new(condition: impl Into<String>, name: &'static str, value: impl Into<Value>) -> Self {
        Self {
            condition: condition.into(),
            bindings: vec![(name, value.into())],
        }
    }
}

/// AND of zero or more clauses. Empty means "no constraint".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conjunction {
    clauses: Vec<Clause>,
}

impl Conjunction {
    /// Fold optional clauses, in order, skipping the absent ones
    pub fn fold<I>(clauses: I) -> Self
    where
        I: IntoIterator<Item = Option<Clause>>,
    {
        Self {
            clauses: clauses.into_iter().flatten().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// `" WHERE a AND b"`, or an empty string when unconstrained
    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            return String::new();
        }
        let conditions: Vec<&str> = self.clauses.iter().map(|c| c.condition.as_str()).collect();
        format!(" WHERE {}", conditions.join(" AND "))
    }

    pub fn bindings(&self) -> impl Iterator<Item = &(&'static str, Value)> {
        self.clauses.iter().flat_map(|c| c.bindings.iter())
    }

    /// Run `select` with this conjunction appended as its WHERE clause
    pub fn query<'r>(&self, db: &'r DbConn, select: &str) -> Query<'r, Db> {
        self.query_then(db, select, "")
    }

    /// As [`Conjunction::query`], with `tail` (e.g. a GROUP BY) after the WHERE clause
    pub fn query_then<'r>(&self, db: &'r DbConn, select: &str, tail: &str) -> Query<'r, Db> {
        let mut query = db.query(format!("{select}{}{tail}", self.where_clause()));
        for (name, value) in self.bindings() {
            query = query.bind((*name, value.clone()));
        }
        query
    }
}

/// Start of the calendar day
pub fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last representable microsecond of the calendar day
pub fn day_end(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_micro_opt(23, 59, 59, 999_999)
        .unwrap_or_else(|| day_start(date))
}

impl TicketFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date_from(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self
    }

    pub fn date_to(mut self, date: NaiveDate) -> Self {
        self.date_to = Some(date);
        self
    }

    pub fn start_station(mut self, id: i64) -> Self {
        self.start_station_id = Some(id);
        self
    }

    pub fn end_station(mut self, id: i64) -> Self {
        self.end_station_id = Some(id);
        self
    }

    /// Dates must fall in the years timestamps are stored with
    pub fn validate(&self) -> Result<()> {
        for date in [self.date_from, self.date_to].into_iter().flatten() {
            if !is_storable(date) {
                return Err(Error::invalid(format!("date {date} is outside years 0000-9999")));
            }
        }
        Ok(())
    }

    /// Predicates in application order; `None` where the filter is absent
    pub fn predicates(&self) -> [Option<Predicate>; 4] {
        [
            self.date_from.map(|d| Predicate::CreatedFrom(day_start(d))),
            self.date_to.map(|d| Predicate::CreatedUntil(day_end(d))),
            self.start_station_id.map(Predicate::StartStation),
            self.end_station_id.map(Predicate::EndStation),
        ]
    }

    pub fn conjunction(&self) -> Conjunction {
        Conjunction::fold(self.predicates().into_iter().map(|p| p.map(|p| p.clause())))
    }
}

impl Predicate {
    /// Render against a query whose base table is `ticket`
    pub fn clause(&self) -> Clause {
        match *self {
            Predicate::CreatedFrom(ts) => {
                Clause::new("created_at >= $date_from", "date_from", stored_timestamp(ts))
            }
            Predicate::CreatedUntil(ts) => {
                Clause::new("created_at <= $date_to", "date_to", stored_timestamp(ts))
            }
            Predicate::StartStation(id) => Clause::new(
                "trip.route.start_station = type::thing('station', $start_station_id)",
                "start_station_id",
                id,
            ),
            Predicate::EndStation(id) => Clause::new(
                "trip.route.end_station = type::thing('station', $end_station_id)",
                "end_station_id",
                id,
            ),
        }
    }
}
