//! Lot administration
//!
//! Creation, profile updates and deletion of lots. Anything that changes the
//! number of spots goes through [`LotReconciler`].

use std::sync::Arc;

use tracing::{info, warn};

use super::lot_reconciler::{LotReconciler, ResizeOutcome};
use crate::domain::{
    DomainError, DomainResult, Lot, LotUpdate, NewLot, RepositoryProvider, SpotStatus,
};

/// Lot after an update, with the resize result when capacity changed
#[derive(Debug, Clone)]
pub struct LotUpdateOutcome {
    pub lot: Lot,
    pub resize: Option<ResizeOutcome>,
}

pub struct LotService {
    repos: Arc<dyn RepositoryProvider>,
    reconciler: Arc<LotReconciler>,
}

impl LotService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, reconciler: Arc<LotReconciler>) -> Self {
        Self { repos, reconciler }
    }

    /// Create a lot with `capacity` Available spots numbered from 1
    pub async fn create_lot(&self, new_lot: NewLot) -> DomainResult<Lot> {
        new_lot.validate()?;

        let lot = self.repos.lots().create(new_lot).await?;
        let numbers: Vec<i32> = (1..=lot.capacity as i32).collect();
        if let Err(e) = self.repos.spots().create_many(lot.id, &numbers).await {
            if let Err(undo) = self.repos.lots().delete(lot.id).await {
                warn!(lot_id = lot.id, error = %undo, "Failed to remove lot after spot creation error");
            }
            return Err(e);
        }

        info!(lot_id = lot.id, name = %lot.name, capacity = lot.capacity, "Lot created");
        Ok(lot)
    }

    pub async fn get_lot(&self, lot_id: i32) -> DomainResult<Lot> {
        self.repos
            .lots()
            .find_by_id(lot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Lot", lot_id))
    }

    pub async fn list_lots(&self) -> DomainResult<Vec<Lot>> {
        self.repos.lots().find_all().await
    }

    /// Profile fields and capacity change under the lot lock, so a
    /// concurrent resize never has its capacity overwritten.
    pub async fn update_lot(&self, lot_id: i32, update: LotUpdate) -> DomainResult<LotUpdateOutcome> {
        let guard = self.reconciler.lock_lot(lot_id).await;

        let mut lot = self.get_lot(lot_id).await?;
        lot.apply(&update)?;
        self.repos.lots().update(lot).await?;

        let resize = match update.capacity {
            Some(capacity) => Some(
                self.reconciler
                    .resize_locked(&guard, lot_id, capacity)
                    .await?,
            ),
            None => None,
        };
        drop(guard);

        let lot = self.get_lot(lot_id).await?;
        info!(lot_id, "Lot updated");
        Ok(LotUpdateOutcome { lot, resize })
    }

    /// Delete a lot and all its spots. Fails with `Conflict` while any spot
    /// is Occupied.
    ///
    /// Every spot is first claimed with a conditional update so that no
    /// booking can slip in between the check and the delete. If a claim
    /// fails the claimed spots are handed back and nothing is deleted.
    pub async fn delete_lot(&self, lot_id: i32) -> DomainResult<()> {
        let _guard = self.reconciler.lock_lot(lot_id).await;

        self.get_lot(lot_id).await?;

        let occupied = self
            .repos
            .spots()
            .count_by_status(lot_id, SpotStatus::Occupied)
            .await?;
        if occupied > 0 {
            return Err(DomainError::Conflict(format!(
                "Lot {} has {} occupied spot(s)",
                lot_id, occupied
            )));
        }

        let spots = self.repos.spots().find_by_lot(lot_id).await?;
        let mut claimed = Vec::with_capacity(spots.len());
        let mut blocked = None;

        for spot in &spots {
            match self
                .repos
                .spots()
                .transition(spot.id, SpotStatus::Available, SpotStatus::Occupied)
                .await
            {
                Ok(true) => claimed.push(spot.id),
                Ok(false) => {
                    blocked = Some(DomainError::Conflict(format!(
                        "Spot {} of lot {} became occupied",
                        spot.id, lot_id
                    )));
                    break;
                }
                Err(e) => {
                    blocked = Some(e);
                    break;
                }
            }
        }

        if let Some(err) = blocked {
            for spot_id in claimed {
                if let Err(e) = self
                    .repos
                    .spots()
                    .transition(spot_id, SpotStatus::Occupied, SpotStatus::Available)
                    .await
                {
                    warn!(lot_id, spot_id, error = %e, "Failed to hand back claimed spot");
                }
            }
            return Err(err);
        }

        self.repos.lots().delete(lot_id).await?;
        info!(lot_id, spots = spots.len(), "Lot deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::application::AllocationService;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    fn service() -> (Arc<dyn RepositoryProvider>, LotService) {
        let (repos, _, service) = service_with_reconciler();
        (repos, service)
    }

    fn service_with_reconciler() -> (Arc<dyn RepositoryProvider>, Arc<LotReconciler>, LotService) {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let reconciler = Arc::new(LotReconciler::new(repos.clone()));
        let service = LotService::new(repos.clone(), reconciler.clone());
        (repos, reconciler, service)
    }

    fn new_lot(capacity: u32) -> NewLot {
        NewLot {
            name: "Market Square".into(),
            address: "5 Market St".into(),
            pin_code: "700001".into(),
            price_per_hour: Decimal::new(2000, 2),
            capacity,
            description: Some("open air".into()),
        }
    }

    #[tokio::test]
    async fn create_lot_spawns_spots() {
        let (repos, service) = service();
        let lot = service.create_lot(new_lot(4)).await.unwrap();

        let spots = repos.spots().find_by_lot(lot.id).await.unwrap();
        assert_eq!(spots.len(), 4);
        assert_eq!(spots[0].label, "S001");
        assert!(spots.iter().all(|s| s.status == SpotStatus::Available));
    }

    #[tokio::test]
    async fn create_lot_rejects_invalid_price() {
        let (_, service) = service();
        let mut lot = new_lot(1);
        lot.price_per_hour = Decimal::ZERO;
        assert!(matches!(
            service.create_lot(lot).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn update_with_capacity_resizes() {
        let (repos, service) = service();
        let lot = service.create_lot(new_lot(3)).await.unwrap();

        let outcome = service
            .update_lot(
                lot.id,
                LotUpdate {
                    name: Some("Market Square East".into()),
                    capacity: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.lot.name, "Market Square East");
        assert_eq!(outcome.lot.capacity, 5);
        assert_eq!(outcome.resize.unwrap().created.len(), 2);
        assert_eq!(repos.spots().find_by_lot(lot.id).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn delete_with_occupied_spot_conflicts() {
        let (repos, service) = service();
        let lot = service.create_lot(new_lot(3)).await.unwrap();
        let spots = repos.spots().find_by_lot(lot.id).await.unwrap();
        repos
            .spots()
            .transition(spots[1].id, SpotStatus::Available, SpotStatus::Occupied)
            .await
            .unwrap();

        let err = service.delete_lot(lot.id).await.unwrap_err();

        assert!(matches!(err, DomainError::Conflict(_)));
        assert!(repos.lots().find_by_id(lot.id).await.unwrap().is_some());
        assert_eq!(
            repos
                .spots()
                .count_by_status(lot.id, SpotStatus::Available)
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn delete_all_available_removes_spots() {
        let (repos, service) = service();
        let lot = service.create_lot(new_lot(3)).await.unwrap();

        service.delete_lot(lot.id).await.unwrap();

        assert!(repos.lots().find_by_id(lot.id).await.unwrap().is_none());
        assert!(repos.spots().find_by_lot(lot.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found() {
        let (_, service) = service();
        assert!(matches!(
            service.delete_lot(8).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn update_waits_for_running_resize() {
        let (repos, reconciler, service) = service_with_reconciler();
        let service = Arc::new(service);
        let lot_id = service.create_lot(new_lot(5)).await.unwrap().id;

        let guard = reconciler.lock_lot(lot_id).await;
        let renaming = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .update_lot(
                        lot_id,
                        LotUpdate {
                            name: Some("Market Square North".into()),
                            ..Default::default()
                        },
                    )
                    .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!renaming.is_finished());

        reconciler.resize_locked(&guard, lot_id, 2).await.unwrap();
        drop(guard);

        let outcome = renaming.await.unwrap().unwrap();
        assert_eq!(outcome.lot.name, "Market Square North");
        assert_eq!(outcome.lot.capacity, 2);
        let stored = repos.lots().find_by_id(lot_id).await.unwrap().unwrap();
        assert_eq!(stored.capacity, 2);
        assert_eq!(repos.spots().find_by_lot(lot_id).await.unwrap().len(), 2);
    }

    struct Contended {
        repos: Arc<dyn RepositoryProvider>,
        lots: Arc<LotService>,
        allocation: Arc<AllocationService>,
        lot_id: i32,
    }

    async fn contended(capacity: u32, drivers: i32) -> Contended {
        use crate::application::{AllocationConfig, ReservationLedger, SpotRegistry};
        use crate::domain::{NewUser, UserRole};

        let (repos, _, lots) = service_with_reconciler();
        let registry = Arc::new(SpotRegistry::new(repos.clone()));
        let ledger = Arc::new(ReservationLedger::new(repos.clone(), registry.clone()));
        let allocation = Arc::new(AllocationService::new(
            repos.clone(),
            registry,
            ledger,
            AllocationConfig::default(),
        ));

        let lot_id = lots.create_lot(new_lot(capacity)).await.unwrap().id;
        for i in 0..drivers {
            repos
                .users()
                .create(NewUser {
                    username: format!("commuter{}", i),
                    email: format!("commuter{}@example.com", i),
                    role: UserRole::Regular,
                    vehicle_number: None,
                    pin_code: None,
                })
                .await
                .unwrap();
        }

        Contended {
            repos,
            lots: Arc::new(lots),
            allocation,
            lot_id,
        }
    }

    fn spawn_bookings(
        c: &Contended,
        drivers: i32,
    ) -> Vec<tokio::task::JoinHandle<DomainResult<crate::domain::Reservation>>> {
        (1..=drivers)
            .map(|user_id| {
                let allocation = c.allocation.clone();
                let lot_id = c.lot_id;
                tokio::spawn(async move { allocation.book(lot_id, user_id, Utc::now(), None).await })
            })
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn shrink_during_bookings_never_deletes_occupied_spot() {
        let c = contended(10, 16).await;
        let before: Vec<i32> = c
            .repos
            .spots()
            .find_by_lot(c.lot_id)
            .await
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        let excess: HashSet<i32> = before[3..].iter().copied().collect();

        let bookings = spawn_bookings(&c, 16);
        let shrink = {
            let lots = c.lots.clone();
            let lot_id = c.lot_id;
            tokio::spawn(async move {
                lots.update_lot(
                    lot_id,
                    LotUpdate {
                        capacity: Some(3),
                        ..Default::default()
                    },
                )
                .await
            })
        };
        for b in bookings {
            let _ = b.await.unwrap();
        }
        let resize = shrink.await.unwrap().unwrap().resize.unwrap();

        let touched: HashSet<i32> = resize
            .removed
            .iter()
            .chain(resize.blocked.iter())
            .copied()
            .collect();
        assert_eq!(touched, excess);
        assert_eq!(touched.len(), resize.removed.len() + resize.blocked.len());

        let spots = c.repos.spots().find_by_lot(c.lot_id).await.unwrap();
        let remaining: HashSet<i32> = spots.iter().map(|s| s.id).collect();
        assert!(resize.removed.iter().all(|id| !remaining.contains(id)));
        assert!(resize.blocked.iter().all(|id| remaining.contains(id)));

        let open = c.repos.reservations().find_open().await.unwrap();
        for r in &open {
            let spot = spots.iter().find(|s| s.id == r.spot_id);
            assert_eq!(spot.map(|s| s.status), Some(SpotStatus::Occupied));
        }
        let occupied = spots.iter().filter(|s| s.status == SpotStatus::Occupied).count();
        assert_eq!(occupied, open.len());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn delete_during_bookings_is_all_or_nothing() {
        let c = contended(4, 8).await;

        let bookings = spawn_bookings(&c, 8);
        let deleting = {
            let lots = c.lots.clone();
            let lot_id = c.lot_id;
            tokio::spawn(async move { lots.delete_lot(lot_id).await })
        };
        for b in bookings {
            let _ = b.await.unwrap();
        }
        let deleted = deleting.await.unwrap();

        let open = c.repos.reservations().find_open().await.unwrap();
        match deleted {
            Ok(()) => {
                assert!(c.repos.lots().find_by_id(c.lot_id).await.unwrap().is_none());
                assert!(c.repos.spots().find_by_lot(c.lot_id).await.unwrap().is_empty());
                assert!(open.is_empty());
            }
            Err(DomainError::Conflict(_)) => {
                let spots = c.repos.spots().find_by_lot(c.lot_id).await.unwrap();
                assert_eq!(spots.len(), 4);
                let occupied = spots.iter().filter(|s| s.status == SpotStatus::Occupied).count();
                assert_eq!(occupied, open.len());
                for r in &open {
                    assert!(spots.iter().any(|s| s.id == r.spot_id));
                }
            }
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
}
