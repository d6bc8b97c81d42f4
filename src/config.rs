//! Command line configuration for the API server

use clap::Parser;
use std::net::{IpAddr, SocketAddr};

use crate::db::{self, DbConn};

/// Origins the booking frontend is served from during development
pub const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://127.0.0.1:5173",
    "http://localhost:5173",
    "http://localhost:3000",
];

#[derive(Parser, Debug, Clone)]
#[command(name = "api_server")]
#[command(about = "Train tickets sales and analytics API")]
pub struct Config {
    /// Port to listen on
    #[arg(long, default_value = "8000")]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Path to the SurrealDB database
    #[arg(long, default_value = "data/train_tickets.db")]
    pub db_path: String,

    /// Use a throwaway in-memory database instead of --db-path
    #[arg(long)]
    pub memory: bool,

    /// Allowed CORS origin (repeatable)
    #[arg(long = "cors-origin")]
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Configured origins, or the development defaults when none were given
    pub fn allowed_origins(&self) -> Vec<String> {
        if self.cors_origins.is_empty() {
            DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect()
        } else {
            self.cors_origins.clone()
        }
    }

    /// Open the configured store and make sure the schema exists
    pub async fn open_store(&self) -> crate::error::Result<DbConn> {
        let db = if self.memory {
            db::connect_in_memory().await?
        } else {
            db::connect(&self.db_path).await?
        };
        db::init_schema(&db).await?;
        Ok(db)
    }
}
