//! Spot aggregate
//!
//! One parking space inside a lot. Occupancy changes go through
//! compare-and-set primitives on the repository.

pub mod model;
pub mod repository;

pub use model::{Spot, SpotStatus};
pub use repository::SpotRepository;
