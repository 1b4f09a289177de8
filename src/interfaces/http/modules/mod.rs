pub mod bookings;
pub mod health;
pub mod lots;
pub mod metrics;
pub mod users;
