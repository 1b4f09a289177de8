//! Lot aggregate
//!
//! A parking facility with an hourly price and a configured capacity.

pub mod model;
pub mod repository;

pub use model::{Lot, LotUpdate, NewLot};
pub use repository::LotRepository;
