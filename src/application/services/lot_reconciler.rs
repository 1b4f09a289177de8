//! Lot sizing reconciler
//!
//! Keeps the spots of a lot in line with its configured capacity. Shrinking
//! is lenient: excess spots are taken tail-first, Available ones are deleted
//! and Occupied ones are left in place and reported as blocked.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use crate::domain::{DomainError, DomainResult, RepositoryProvider};

/// Result of a resize
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResizeOutcome {
    pub lot_id: i32,
    /// Capacity now stored on the lot (always the requested value)
    pub capacity: u32,
    /// IDs of spots created by a grow
    pub created: Vec<i32>,
    /// IDs of spots deleted by a shrink
    pub removed: Vec<i32>,
    /// IDs of Occupied spots a shrink could not delete
    pub blocked: Vec<i32>,
}

impl ResizeOutcome {
    pub fn has_conflicts(&self) -> bool {
        !self.blocked.is_empty()
    }
}

pub struct LotReconciler {
    repos: Arc<dyn RepositoryProvider>,
    locks: DashMap<i32, Arc<Mutex<()>>>,
}

impl LotReconciler {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self {
            repos,
            locks: DashMap::new(),
        }
    }

    /// Serializes structural changes (resize, delete) of one lot.
    /// Bookings do not take this lock; they rely on conditional updates.
    pub async fn lock_lot(&self, lot_id: i32) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(lot_id).or_default().clone();
        lock.lock_owned().await
    }

    pub async fn resize(&self, lot_id: i32, new_capacity: u32) -> DomainResult<ResizeOutcome> {
        let guard = self.lock_lot(lot_id).await;
        self.resize_locked(&guard, lot_id, new_capacity).await
    }

    /// Resize while the caller already holds [`lock_lot`](Self::lock_lot)
    /// for this lot.
    pub async fn resize_locked(
        &self,
        _guard: &OwnedMutexGuard<()>,
        lot_id: i32,
        new_capacity: u32,
    ) -> DomainResult<ResizeOutcome> {
        let mut lot = self
            .repos
            .lots()
            .find_by_id(lot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Lot", lot_id))?;

        lot.capacity = new_capacity;
        self.repos.lots().update(lot).await?;

        let spots = self.repos.spots().find_by_lot(lot_id).await?;
        let current = spots.len();
        let target = new_capacity as usize;

        let mut outcome = ResizeOutcome {
            lot_id,
            capacity: new_capacity,
            created: Vec::new(),
            removed: Vec::new(),
            blocked: Vec::new(),
        };

        if target > current {
            let next = spots.iter().map(|s| s.number).max().unwrap_or(0) + 1;
            let numbers: Vec<i32> = (next..next + (target - current) as i32).collect();
            let created = self.repos.spots().create_many(lot_id, &numbers).await?;
            outcome.created = created.into_iter().map(|s| s.id).collect();
        } else if target < current {
            for spot in spots.iter().rev().take(current - target) {
                // Status is re-checked by the storage at deletion time.
                if self.repos.spots().delete_if_available(spot.id).await? {
                    outcome.removed.push(spot.id);
                } else if self.repos.spots().find_by_id(spot.id).await?.is_some() {
                    outcome.blocked.push(spot.id);
                }
            }
        }

        if outcome.has_conflicts() {
            metrics::counter!("parking_resize_blocked_spots_total")
                .increment(outcome.blocked.len() as u64);
            warn!(
                lot_id,
                capacity = new_capacity,
                blocked = ?outcome.blocked,
                "Occupied spots blocked lot shrink"
            );
        }

        info!(
            lot_id,
            capacity = new_capacity,
            created = outcome.created.len(),
            removed = outcome.removed.len(),
            blocked = outcome.blocked.len(),
            "Lot resized"
        );

        Ok(outcome)
    }
}
