//! In-memory storage implementation
//!
//! Every conditional primitive runs while holding the DashMap shard lock of
//! the affected row, so check and write are atomic with respect to other
//! callers.

use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;

use crate::domain::{
    DomainError, DomainResult, Lot, LotRepository, NewLot, NewReservation, NewUser,
    RepositoryProvider, Reservation, ReservationRepository, Spot, SpotRepository, SpotStatus,
    User, UserRepository,
};

/// In-memory storage for development and testing
pub struct InMemoryRepositoryProvider {
    lots: DashMap<i32, Lot>,
    spots: DashMap<i32, Spot>,
    reservations: DashMap<i32, Reservation>,
    users: DashMap<i32, User>,
    lot_counter: AtomicI32,
    spot_counter: AtomicI32,
    reservation_counter: AtomicI32,
    user_counter: AtomicI32,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self {
            lots: DashMap::new(),
            spots: DashMap::new(),
            reservations: DashMap::new(),
            users: DashMap::new(),
            lot_counter: AtomicI32::new(1),
            spot_counter: AtomicI32::new(1),
            reservation_counter: AtomicI32::new(1),
            user_counter: AtomicI32::new(1),
        }
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn lots(&self) -> &dyn LotRepository {
        self
    }

    fn spots(&self) -> &dyn SpotRepository {
        self
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        self
    }

    fn users(&self) -> &dyn UserRepository {
        self
    }
}

#[async_trait]
impl LotRepository for InMemoryRepositoryProvider {
    async fn create(&self, lot: NewLot) -> DomainResult<Lot> {
        let id = self.lot_counter.fetch_add(1, Ordering::SeqCst);
        let lot = Lot {
            id,
            name: lot.name,
            address: lot.address,
            pin_code: lot.pin_code,
            price_per_hour: lot.price_per_hour,
            capacity: lot.capacity,
            description: lot.description,
            created_at: Utc::now(),
        };
        self.lots.insert(id, lot.clone());
        Ok(lot)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Lot>> {
        Ok(self.lots.get(&id).map(|l| l.clone()))
    }

    async fn find_all(&self) -> DomainResult<Vec<Lot>> {
        let mut lots: Vec<Lot> = self.lots.iter().map(|e| e.value().clone()).collect();
        lots.sort_by_key(|l| l.id);
        Ok(lots)
    }

    async fn update(&self, lot: Lot) -> DomainResult<()> {
        match self.lots.get_mut(&lot.id) {
            Some(mut existing) => {
                *existing = lot;
                Ok(())
            }
            None => Err(DomainError::not_found("Lot", lot.id)),
        }
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        self.lots
            .remove(&id)
            .ok_or_else(|| DomainError::not_found("Lot", id))?;
        self.spots.retain(|_, s| s.lot_id != id);
        self.reservations.retain(|_, r| r.lot_id != id);
        Ok(())
    }
}

#[async_trait]
impl SpotRepository for InMemoryRepositoryProvider {
    async fn create_many(&self, lot_id: i32, numbers: &[i32]) -> DomainResult<Vec<Spot>> {
        let created: Vec<Spot> = numbers
            .iter()
            .map(|&number| Spot {
                id: self.spot_counter.fetch_add(1, Ordering::SeqCst),
                lot_id,
                number,
                label: Spot::label_for(number),
                status: SpotStatus::Available,
            })
            .collect();
        for spot in &created {
            self.spots.insert(spot.id, spot.clone());
        }
        Ok(created)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Spot>> {
        Ok(self.spots.get(&id).map(|s| s.clone()))
    }

    async fn find_by_lot(&self, lot_id: i32) -> DomainResult<Vec<Spot>> {
        let mut spots: Vec<Spot> = self
            .spots
            .iter()
            .filter(|s| s.lot_id == lot_id)
            .map(|s| s.clone())
            .collect();
        spots.sort_by_key(|s| s.id);
        Ok(spots)
    }

    async fn find_first_available(&self, lot_id: i32) -> DomainResult<Option<Spot>> {
        Ok(self
            .spots
            .iter()
            .filter(|s| s.lot_id == lot_id && s.is_available())
            .min_by_key(|s| s.id)
            .map(|s| s.clone()))
    }

    async fn count_by_status(&self, lot_id: i32, status: SpotStatus) -> DomainResult<u64> {
        Ok(self
            .spots
            .iter()
            .filter(|s| s.lot_id == lot_id && s.status == status)
            .count() as u64)
    }

    async fn transition(&self, id: i32, from: SpotStatus, to: SpotStatus) -> DomainResult<bool> {
        match self.spots.get_mut(&id) {
            Some(mut spot) if spot.status == from => {
                spot.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_if_available(&self, id: i32) -> DomainResult<bool> {
        Ok(self
            .spots
            .remove_if(&id, |_, spot| spot.is_available())
            .is_some())
    }
}

#[async_trait]
impl ReservationRepository for InMemoryRepositoryProvider {
    async fn create(&self, r: NewReservation) -> DomainResult<Reservation> {
        let id = self.reservation_counter.fetch_add(1, Ordering::SeqCst);
        let reservation = Reservation {
            id,
            spot_id: r.spot_id,
            lot_id: r.lot_id,
            user_id: r.user_id,
            started_at: r.started_at,
            ended_at: None,
            hourly_rate: r.hourly_rate,
            cost: None,
            note: r.note,
        };
        self.reservations.insert(id, reservation.clone());
        Ok(reservation)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>> {
        Ok(self.reservations.get(&id).map(|r| r.clone()))
    }

    async fn update(&self, reservation: Reservation) -> DomainResult<()> {
        match self.reservations.get_mut(&reservation.id) {
            Some(mut existing) => {
                *existing = reservation;
                Ok(())
            }
            None => Err(DomainError::not_found("Reservation", reservation.id)),
        }
    }

    async fn close_if_open(
        &self,
        id: i32,
        ended_at: DateTime<Utc>,
        cost: Decimal,
    ) -> DomainResult<bool> {
        match self.reservations.get_mut(&id) {
            Some(mut r) if r.is_open() => {
                r.ended_at = Some(ended_at);
                r.cost = Some(cost);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_open_for_spot(&self, spot_id: i32) -> DomainResult<Option<Reservation>> {
        Ok(self
            .reservations
            .iter()
            .find(|r| r.spot_id == spot_id && r.is_open())
            .map(|r| r.clone()))
    }

    async fn find_by_user(&self, user_id: i32) -> DomainResult<Vec<Reservation>> {
        let mut list: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.clone())
            .collect();
        list.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.id.cmp(&a.id)));
        Ok(list)
    }

    async fn find_open(&self) -> DomainResult<Vec<Reservation>> {
        let mut list: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|r| r.is_open())
            .map(|r| r.clone())
            .collect();
        list.sort_by_key(|r| r.id);
        Ok(list)
    }
}

#[async_trait]
impl UserRepository for InMemoryRepositoryProvider {
    async fn create(&self, user: NewUser) -> DomainResult<User> {
        let id = self.user_counter.fetch_add(1, Ordering::SeqCst);
        let user = User {
            id,
            username: user.username,
            email: user.email,
            role: user.role,
            vehicle_number: user.vehicle_number,
            pin_code: user.pin_code,
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == username || u.email == email)
            .map(|u| u.clone()))
    }
}
