//! User aggregate
//!
//! Profile data only. Credentials live outside this service.

pub mod model;
pub mod repository;

pub use model::{NewUser, User, UserRole};
pub use repository::UserRepository;
