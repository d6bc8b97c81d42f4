//! Train ticket sales, booking and sales analytics backed by SurrealDB

pub mod analytics;
pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod seed;
pub mod tickets;

pub use error::{Error, Result};
