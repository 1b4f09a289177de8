//! Spot occupancy registry
//!
//! Status changes are confined to the spot's status field. Every transition
//! goes through the repository's compare-and-set primitive.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{DomainError, DomainResult, RepositoryProvider, Spot, SpotStatus};

pub struct SpotRegistry {
    repos: Arc<dyn RepositoryProvider>,
}

impl SpotRegistry {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Available spot of the lot with the lowest ID
    pub async fn find_available(&self, lot_id: i32) -> DomainResult<Spot> {
        self.repos
            .spots()
            .find_first_available(lot_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Available spot",
                field: "lot_id",
                value: lot_id.to_string(),
            })
    }

    /// Claim the spot. Returns `false` if it was not Available.
    pub async fn try_occupy(&self, spot_id: i32) -> DomainResult<bool> {
        self.repos
            .spots()
            .transition(spot_id, SpotStatus::Available, SpotStatus::Occupied)
            .await
    }

    pub async fn mark_occupied(&self, spot_id: i32) -> DomainResult<()> {
        self.set_status(spot_id, SpotStatus::Occupied).await
    }

    pub async fn mark_available(&self, spot_id: i32) -> DomainResult<()> {
        self.set_status(spot_id, SpotStatus::Available).await
    }

    pub async fn count_by_status(&self, lot_id: i32, status: SpotStatus) -> DomainResult<u64> {
        self.repos.spots().count_by_status(lot_id, status).await
    }

    pub async fn list(&self, lot_id: i32) -> DomainResult<Vec<Spot>> {
        self.repos.spots().find_by_lot(lot_id).await
    }

    /// Idempotent: no-op when the spot is already in `target`.
    async fn set_status(&self, spot_id: i32, target: SpotStatus) -> DomainResult<()> {
        let from = match target {
            SpotStatus::Available => SpotStatus::Occupied,
            SpotStatus::Occupied => SpotStatus::Available,
        };

        if self.repos.spots().transition(spot_id, from, target).await? {
            debug!(spot_id, status = %target, "Spot status changed");
            return Ok(());
        }

        match self.repos.spots().find_by_id(spot_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found("Spot", spot_id)),
        }
    }
}
