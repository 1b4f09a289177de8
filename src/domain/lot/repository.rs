//! Lot repository interface

use async_trait::async_trait;

use super::model::{Lot, NewLot};
use crate::domain::DomainResult;

#[async_trait]
pub trait LotRepository: Send + Sync {
    /// Insert a new lot and return it with its assigned ID
    async fn create(&self, lot: NewLot) -> DomainResult<Lot>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Lot>>;

    /// All lots ordered by ID
    async fn find_all(&self) -> DomainResult<Vec<Lot>>;

    async fn update(&self, lot: Lot) -> DomainResult<()>;

    /// Remove the lot together with its spots and reservation history
    async fn delete(&self, id: i32) -> DomainResult<()>;
}
