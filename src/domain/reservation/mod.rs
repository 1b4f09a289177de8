//! Reservation aggregate
//!
//! Contains the Reservation entity, the parking duration breakdown, and the
//! repository interface.

pub mod model;
pub mod repository;

pub use model::{NewReservation, ParkingDuration, Reservation};
pub use repository::ReservationRepository;
