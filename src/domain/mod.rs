//! Domain layer: entities and repository interfaces

pub mod lot;
pub mod repositories;
pub mod reservation;
pub mod spot;
pub mod user;

pub use lot::{Lot, LotRepository, LotUpdate, NewLot};
pub use repositories::{DomainResult, RepositoryProvider};
pub use reservation::{NewReservation, ParkingDuration, Reservation, ReservationRepository};
pub use spot::{Spot, SpotRepository, SpotStatus};
pub use user::{NewUser, User, UserRepository, UserRole};

pub use crate::shared::errors::DomainError;
