//! User profiles and per-user reporting

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
