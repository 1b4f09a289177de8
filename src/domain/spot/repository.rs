//! Spot repository interface

use async_trait::async_trait;

use super::model::{Spot, SpotStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait SpotRepository: Send + Sync {
    /// Create Available spots in `lot_id` with the given sequential numbers
    async fn create_many(&self, lot_id: i32, numbers: &[i32]) -> DomainResult<Vec<Spot>>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Spot>>;

    /// All spots of a lot in insertion order (ascending ID)
    async fn find_by_lot(&self, lot_id: i32) -> DomainResult<Vec<Spot>>;

    /// Available spot of the lot with the lowest ID
    async fn find_first_available(&self, lot_id: i32) -> DomainResult<Option<Spot>>;

    async fn count_by_status(&self, lot_id: i32, status: SpotStatus) -> DomainResult<u64>;

    /// Atomically set the status to `to` only if it is currently `from`.
    ///
    /// Returns `false` when the spot does not exist or is not in `from`.
    async fn transition(&self, id: i32, from: SpotStatus, to: SpotStatus) -> DomainResult<bool>;

    /// Delete the spot only if it is Available at the moment of deletion.
    ///
    /// Returns `false` when the spot is Occupied or already gone.
    async fn delete_if_available(&self, id: i32) -> DomainResult<bool>;
}
