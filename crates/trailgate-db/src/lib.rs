//! Data layer for Trailgate (`PostgreSQL` + NATS).
//!
//! `PostgreSQL` is the durable configuration store: it persists the tier
//! policy table and the per-destination capacity overrides. NATS carries
//! change notifications so every running instance refreshes its in-memory
//! snapshots after an administrator write commits.
//!
//! ```text
//! Administrator write
//!     |
//!     +-- persist ---------> PostgreSQL (PgConfigStore)
//!     +-- swap snapshot ---> in-memory table (trailgate-core)
//!     +-- notify ----------> NATS "trailgate.config.changed.*"
//!                                |
//!                                +--> other instances reload
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`config_store`] -- `ConfigStore` implementation over `PostgreSQL`
//! - [`notify`] -- NATS change notifications and the refresh task
//! - [`error`] -- Shared error types

pub mod config_store;
pub mod error;
pub mod notify;
pub mod postgres;

// Re-export primary types for convenience.
pub use config_store::PgConfigStore;
pub use error::DbError;
pub use notify::NatsNotifier;
pub use postgres::{PostgresConfig, PostgresPool};
