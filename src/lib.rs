//! # Parking Service
//!
//! Parking facility management: lots, spots and time-bounded reservations
//! with cost computation.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Core entities (lot, spot, reservation, user) and repository traits
//! - **application**: Spot registry, lot reconciler, reservation ledger,
//!   allocation and reporting services
//! - **infrastructure**: Storage (SeaORM/SQLite and in-memory)
//! - **interfaces**: REST API
//! - **shared**: Errors, retry with backoff, shutdown signal

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export storage types for easy access
pub use infrastructure::{
    init_database, DatabaseConfig, InMemoryRepositoryProvider, SeaOrmRepositoryProvider,
};

// Re-export API router
pub use interfaces::http::{create_api_router, ApiServices};
