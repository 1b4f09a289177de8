//! Reservation repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::model::{NewReservation, Reservation};
use crate::domain::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Insert a new open reservation and return it with its assigned ID
    async fn create(&self, reservation: NewReservation) -> DomainResult<Reservation>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>>;

    /// Overwrite an existing reservation
    async fn update(&self, reservation: Reservation) -> DomainResult<()>;

    /// Atomically set end time and cost only if the reservation is still open.
    ///
    /// Returns `false` when it was already closed or does not exist.
    async fn close_if_open(
        &self,
        id: i32,
        ended_at: DateTime<Utc>,
        cost: Decimal,
    ) -> DomainResult<bool>;

    /// The open reservation holding `spot_id`, if any
    async fn find_open_for_spot(&self, spot_id: i32) -> DomainResult<Option<Reservation>>;

    /// All reservations of a user, newest first
    async fn find_by_user(&self, user_id: i32) -> DomainResult<Vec<Reservation>>;

    /// Open reservations across all spots
    async fn find_open(&self) -> DomainResult<Vec<Reservation>>;
}
