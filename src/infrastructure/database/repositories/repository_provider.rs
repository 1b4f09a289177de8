//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::{
    LotRepository, RepositoryProvider, ReservationRepository, SpotRepository, UserRepository,
};

use super::lot_repository::SeaOrmLotRepository;
use super::reservation_repository::SeaOrmReservationRepository;
use super::spot_repository::SeaOrmSpotRepository;
use super::user_repository::SeaOrmUserRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let spot = repos.spots().find_first_available(lot_id).await?;
/// let open = repos.reservations().find_open().await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    lots: SeaOrmLotRepository,
    spots: SeaOrmSpotRepository,
    reservations: SeaOrmReservationRepository,
    users: SeaOrmUserRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            lots: SeaOrmLotRepository::new(db.clone()),
            spots: SeaOrmSpotRepository::new(db.clone()),
            reservations: SeaOrmReservationRepository::new(db.clone()),
            users: SeaOrmUserRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn lots(&self) -> &dyn LotRepository {
        &self.lots
    }

    fn spots(&self) -> &dyn SpotRepository {
        &self.spots
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    fn users(&self) -> &dyn UserRepository {
        &self.users
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;
    use crate::application::{
        AllocationConfig, AllocationService, LotReconciler, LotService, ReservationLedger,
        SpotRegistry, UserService,
    };
    use crate::domain::{NewLot, NewUser, SpotStatus, UserRole};
    use crate::infrastructure::database::repositories::test_support::memory_db;

    #[tokio::test]
    async fn booking_cycle_against_sqlite() {
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(memory_db().await));
        let registry = Arc::new(SpotRegistry::new(repos.clone()));
        let ledger = Arc::new(ReservationLedger::new(repos.clone(), registry.clone()));
        let allocation =
            AllocationService::new(repos.clone(), registry, ledger, AllocationConfig::default());
        let lots = LotService::new(repos.clone(), Arc::new(LotReconciler::new(repos.clone())));
        let users = UserService::new(repos.clone());

        let user = users
            .register(NewUser {
                username: "meera".into(),
                email: "meera@example.com".into(),
                role: UserRole::Regular,
                vehicle_number: Some("KA01AB1234".into()),
                pin_code: None,
            })
            .await
            .unwrap();
        let lot = lots
            .create_lot(NewLot {
                name: "Lakeside".into(),
                address: "Lake Rd".into(),
                pin_code: "560034".into(),
                price_per_hour: Decimal::TEN,
                capacity: 2,
                description: None,
            })
            .await
            .unwrap();

        let start = Utc.with_ymd_and_hms(2024, 5, 4, 8, 0, 0).unwrap();
        let r = allocation.book(lot.id, user.id, start, None).await.unwrap();
        assert_eq!(
            repos
                .spots()
                .count_by_status(lot.id, SpotStatus::Occupied)
                .await
                .unwrap(),
            1
        );

        let closed = allocation
            .release(r.id, start + Duration::minutes(90))
            .await
            .unwrap();
        assert_eq!(closed.reservation.cost, Some(Decimal::new(1500, 2)));
        assert!(!closed.already_closed);

        let again = allocation
            .release(r.id, start + Duration::hours(5))
            .await
            .unwrap();
        assert!(again.already_closed);
        assert_eq!(again.reservation.cost, Some(Decimal::new(1500, 2)));

        lots.delete_lot(lot.id).await.unwrap();
        assert!(repos.reservations().find_by_user(user.id).await.unwrap().is_empty());
    }

    fn lot_with_price(price_per_hour: Decimal) -> NewLot {
        NewLot {
            name: "Harbour".into(),
            address: "Dock St".into(),
            pin_code: "682001".into(),
            price_per_hour,
            capacity: 1,
            description: None,
        }
    }

    #[tokio::test]
    async fn lot_prices_are_stored_exactly_or_rejected() {
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(memory_db().await));
        let lots = LotService::new(repos.clone(), Arc::new(LotReconciler::new(repos.clone())));

        for bad in [
            Decimal::from_i128_with_scale(10i128.pow(27), 0),
            Decimal::new(4, 3),
            Decimal::new(10005, 3),
        ] {
            assert!(
                matches!(
                    lots.create_lot(lot_with_price(bad)).await,
                    Err(crate::domain::DomainError::Validation(_))
                ),
                "price {} accepted",
                bad
            );
        }
        assert!(repos.lots().find_all().await.unwrap().is_empty());

        let lot = lots
            .create_lot(lot_with_price(Decimal::new(1, 2)))
            .await
            .unwrap();
        let stored = lots.get_lot(lot.id).await.unwrap();
        assert_eq!(stored.price_per_hour, Decimal::new(1, 2));
        assert!(stored.price_per_hour > Decimal::ZERO);
    }
}
