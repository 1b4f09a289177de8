//! Lot administration, spot listings and occupancy

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
