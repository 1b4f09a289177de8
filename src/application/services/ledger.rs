//! Reservation ledger
//!
//! Opens and closes reservations and computes their cost. The spot status
//! and the reservation row change together: when the second write fails the
//! first one is undone before the error is returned.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};

use super::spot_registry::SpotRegistry;
use crate::domain::{
    DomainError, DomainResult, NewReservation, ParkingDuration, RepositoryProvider, Reservation,
};

/// A closed reservation with its display duration.
///
/// `already_closed` is set when the reservation had been closed before this
/// call; the stored end time and cost are returned unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedReservation {
    pub reservation: Reservation,
    pub duration: ParkingDuration,
    pub already_closed: bool,
}

/// Per-user aggregate used by reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub user_id: i32,
    pub total_bookings: u64,
    pub total_cost: Decimal,
    /// Sum over closed reservations only
    pub total_minutes: i64,
    /// Reservation count per lot name
    pub by_lot: BTreeMap<String, u64>,
}

pub struct ReservationLedger {
    repos: Arc<dyn RepositoryProvider>,
    registry: Arc<SpotRegistry>,
}

impl ReservationLedger {
    pub fn new(repos: Arc<dyn RepositoryProvider>, registry: Arc<SpotRegistry>) -> Self {
        Self { repos, registry }
    }

    pub async fn open(
        &self,
        spot_id: i32,
        user_id: i32,
        now: DateTime<Utc>,
        note: Option<String>,
    ) -> DomainResult<Reservation> {
        let spot = self
            .repos
            .spots()
            .find_by_id(spot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Spot", spot_id))?;

        let lot = self
            .repos
            .lots()
            .find_by_id(spot.lot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Lot", spot.lot_id))?;

        if !self.registry.try_occupy(spot_id).await? {
            return Err(DomainError::Conflict(format!(
                "Spot {} is not available",
                spot_id
            )));
        }

        // An open reservation on an Available spot means the two writes of an
        // earlier close went out of step. The spot stays Occupied.
        if let Some(existing) = self
            .repos
            .reservations()
            .find_open_for_spot(spot_id)
            .await?
        {
            warn!(
                spot_id,
                reservation_id = existing.id,
                "Available spot still held by an open reservation"
            );
            return Err(DomainError::Conflict(format!(
                "Spot {} is held by reservation {}",
                spot_id, existing.id
            )));
        }

        let created = self
            .repos
            .reservations()
            .create(NewReservation {
                spot_id,
                lot_id: lot.id,
                user_id,
                started_at: now,
                hourly_rate: lot.price_per_hour,
                note,
            })
            .await;

        match created {
            Ok(reservation) => {
                info!(
                    reservation_id = reservation.id,
                    spot_id,
                    lot_id = lot.id,
                    user_id,
                    "Reservation opened"
                );
                Ok(reservation)
            }
            Err(e) => {
                if let Err(undo) = self.registry.mark_available(spot_id).await {
                    error!(spot_id, error = %undo, "Failed to release spot after aborted open");
                }
                Err(e)
            }
        }
    }

    pub async fn close(
        &self,
        reservation_id: i32,
        now: DateTime<Utc>,
    ) -> DomainResult<ClosedReservation> {
        let original = self.find(reservation_id).await?;

        if !original.is_open() {
            return Ok(Self::already_closed(original));
        }

        let mut closed = original.clone();
        closed.close(now)?;
        let ended_at = closed.ended_at.unwrap_or(now);
        let cost = closed.cost.unwrap_or(Decimal::ZERO);

        if !self
            .repos
            .reservations()
            .close_if_open(reservation_id, ended_at, cost)
            .await?
        {
            // Lost a race against another close of the same reservation.
            let current = self.find(reservation_id).await?;
            return Ok(Self::already_closed(current));
        }

        match self.registry.mark_available(closed.spot_id).await {
            Ok(()) => {}
            Err(DomainError::NotFound { .. }) => {
                warn!(
                    reservation_id,
                    spot_id = closed.spot_id,
                    "Spot of closed reservation no longer exists"
                );
            }
            Err(e) => {
                if let Err(undo) = self.repos.reservations().update(original).await {
                    error!(reservation_id, error = %undo, "Failed to reopen reservation after aborted close");
                }
                return Err(e);
            }
        }

        let duration = closed
            .duration()
            .unwrap_or(ParkingDuration { hours: 0, minutes: 0 });

        info!(
            reservation_id,
            spot_id = closed.spot_id,
            user_id = closed.user_id,
            cost = %cost,
            duration = %duration,
            "Reservation closed"
        );

        Ok(ClosedReservation {
            reservation: closed,
            duration,
            already_closed: false,
        })
    }

    pub async fn find(&self, reservation_id: i32) -> DomainResult<Reservation> {
        self.repos
            .reservations()
            .find_by_id(reservation_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", reservation_id))
    }

    /// All reservations of a user, newest first
    pub async fn list_for_user(&self, user_id: i32) -> DomainResult<Vec<Reservation>> {
        self.repos.reservations().find_by_user(user_id).await
    }

    pub async fn summarize(&self, user_id: i32) -> DomainResult<Summary> {
        let reservations = self.repos.reservations().find_by_user(user_id).await?;

        let mut lot_names: HashMap<i32, String> = HashMap::new();
        let mut summary = Summary {
            user_id,
            total_bookings: reservations.len() as u64,
            total_cost: Decimal::ZERO,
            total_minutes: 0,
            by_lot: BTreeMap::new(),
        };

        for r in &reservations {
            if let Some(cost) = r.cost {
                summary.total_cost += cost;
            }
            if let Some(duration) = r.duration() {
                summary.total_minutes += duration.total_minutes();
            }

            if !lot_names.contains_key(&r.lot_id) {
                let name = match self.repos.lots().find_by_id(r.lot_id).await? {
                    Some(lot) => lot.name,
                    None => format!("Lot {}", r.lot_id),
                };
                lot_names.insert(r.lot_id, name);
            }
            if let Some(name) = lot_names.get(&r.lot_id) {
                *summary.by_lot.entry(name.clone()).or_insert(0) += 1;
            }
        }

        Ok(summary)
    }

    fn already_closed(reservation: Reservation) -> ClosedReservation {
        let duration = reservation
            .duration()
            .unwrap_or(ParkingDuration { hours: 0, minutes: 0 });
        ClosedReservation {
            reservation,
            duration,
            already_closed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewLot, SpotStatus};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use chrono::{Duration, TimeZone};

    struct Fixture {
        repos: Arc<dyn RepositoryProvider>,
        ledger: ReservationLedger,
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap()
    }

    async fn fixture() -> Fixture {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let registry = Arc::new(SpotRegistry::new(repos.clone()));
        let ledger = ReservationLedger::new(repos.clone(), registry);
        Fixture { repos, ledger }
    }

    async fn add_lot(repos: &Arc<dyn RepositoryProvider>, name: &str, price: Decimal) -> Vec<i32> {
        let lot = repos
            .lots()
            .create(NewLot {
                name: name.into(),
                address: "addr".into(),
                pin_code: "110001".into(),
                price_per_hour: price,
                capacity: 2,
                description: None,
            })
            .await
            .unwrap();
        repos
            .spots()
            .create_many(lot.id, &[1, 2])
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect()
    }

    #[tokio::test]
    async fn open_occupies_spot() {
        let f = fixture().await;
        let spots = add_lot(&f.repos, "North", Decimal::TEN).await;

        let r = f.ledger.open(spots[0], 1, t0(), None).await.unwrap();

        assert!(r.is_open());
        assert_eq!(r.started_at, t0());
        assert_eq!(r.hourly_rate, Decimal::TEN);
        let spot = f.repos.spots().find_by_id(spots[0]).await.unwrap().unwrap();
        assert_eq!(spot.status, SpotStatus::Occupied);
    }

    #[tokio::test]
    async fn open_on_spot_with_stray_open_reservation_conflicts() {
        let f = fixture().await;
        let spots = add_lot(&f.repos, "North", Decimal::TEN).await;
        let stray = f
            .repos
            .reservations()
            .create(NewReservation {
                spot_id: spots[0],
                lot_id: 1,
                user_id: 7,
                started_at: t0(),
                hourly_rate: Decimal::TEN,
                note: None,
            })
            .await
            .unwrap();

        let err = f.ledger.open(spots[0], 1, t0(), None).await.unwrap_err();

        assert!(matches!(err, DomainError::Conflict(_)));
        let spot = f.repos.spots().find_by_id(spots[0]).await.unwrap().unwrap();
        assert_eq!(spot.status, SpotStatus::Occupied);
        let open = f.repos.reservations().find_open().await.unwrap();
        assert_eq!(open.iter().map(|r| r.id).collect::<Vec<_>>(), vec![stray.id]);
    }

    #[tokio::test]
    async fn open_on_occupied_spot_conflicts() {
        let f = fixture().await;
        let spots = add_lot(&f.repos, "North", Decimal::TEN).await;
        f.ledger.open(spots[0], 1, t0(), None).await.unwrap();

        let err = f.ledger.open(spots[0], 2, t0(), None).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(f.ledger.list_for_user(2).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn close_computes_cost_and_frees_spot() {
        let f = fixture().await;
        let spots = add_lot(&f.repos, "North", Decimal::TEN).await;
        let r = f.ledger.open(spots[0], 1, t0(), None).await.unwrap();

        let closed = f
            .ledger
            .close(r.id, t0() + Duration::minutes(90))
            .await
            .unwrap();

        assert!(!closed.already_closed);
        assert_eq!(closed.reservation.cost, Some(Decimal::new(1500, 2)));
        assert_eq!(closed.duration.to_string(), "1 hr 30 min");
        let spot = f.repos.spots().find_by_id(spots[0]).await.unwrap().unwrap();
        assert_eq!(spot.status, SpotStatus::Available);
    }

    #[tokio::test]
    async fn close_twice_returns_first_result() {
        let f = fixture().await;
        let spots = add_lot(&f.repos, "North", Decimal::TEN).await;
        let r = f.ledger.open(spots[0], 1, t0(), None).await.unwrap();

        let first = f.ledger.close(r.id, t0() + Duration::hours(2)).await.unwrap();
        let second = f.ledger.close(r.id, t0() + Duration::hours(5)).await.unwrap();

        assert!(second.already_closed);
        assert_eq!(second.reservation.cost, first.reservation.cost);
        assert_eq!(second.reservation.ended_at, first.reservation.ended_at);
        assert_eq!(second.duration, first.duration);
    }

    #[tokio::test]
    async fn close_price_is_fixed_at_booking_time() {
        let f = fixture().await;
        let spots = add_lot(&f.repos, "North", Decimal::TEN).await;
        let r = f.ledger.open(spots[0], 1, t0(), None).await.unwrap();

        let mut lot = f.repos.lots().find_by_id(r.lot_id).await.unwrap().unwrap();
        lot.price_per_hour = Decimal::new(100, 0);
        f.repos.lots().update(lot).await.unwrap();

        let closed = f.ledger.close(r.id, t0() + Duration::hours(1)).await.unwrap();
        assert_eq!(closed.reservation.cost, Some(Decimal::new(1000, 2)));
    }

    #[tokio::test]
    async fn close_before_start_costs_nothing() {
        let f = fixture().await;
        let spots = add_lot(&f.repos, "North", Decimal::TEN).await;
        let r = f.ledger.open(spots[0], 1, t0(), None).await.unwrap();

        let closed = f
            .ledger
            .close(r.id, t0() - Duration::minutes(3))
            .await
            .unwrap();
        assert_eq!(closed.reservation.cost, Some(Decimal::ZERO));
        assert_eq!(closed.duration.total_minutes(), 0);
    }

    #[tokio::test]
    async fn close_unknown_is_not_found() {
        let f = fixture().await;
        assert!(matches!(
            f.ledger.close(99, t0()).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn summarize_aggregates_by_lot() {
        let f = fixture().await;
        let north = add_lot(&f.repos, "North", Decimal::TEN).await;
        let south = add_lot(&f.repos, "South", Decimal::new(5, 0)).await;

        let a = f.ledger.open(north[0], 1, t0(), None).await.unwrap();
        f.ledger.close(a.id, t0() + Duration::minutes(30)).await.unwrap();
        let b = f.ledger.open(south[0], 1, t0(), None).await.unwrap();
        f.ledger.close(b.id, t0() + Duration::hours(2)).await.unwrap();
        f.ledger.open(north[1], 1, t0(), None).await.unwrap();
        f.ledger.open(south[1], 2, t0(), None).await.unwrap();

        let summary = f.ledger.summarize(1).await.unwrap();

        assert_eq!(summary.total_bookings, 3);
        assert_eq!(summary.total_cost, Decimal::new(1500, 2));
        assert_eq!(summary.total_minutes, 150);
        assert_eq!(summary.by_lot.get("North"), Some(&2));
        assert_eq!(summary.by_lot.get("South"), Some(&1));
    }
}
