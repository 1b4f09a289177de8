//! Allocation service
//!
//! Picks a spot for a new booking and releases it on checkout. Booking does
//! not hold a lock across find and open: the ledger claims the spot with a
//! conditional update, and a caller that loses the race moves on to the next
//! Available spot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::ledger::{ClosedReservation, ReservationLedger};
use super::spot_registry::SpotRegistry;
use crate::domain::{DomainError, DomainResult, RepositoryProvider, Reservation};
use crate::shared::retry::{retry_with_backoff, RetryConfig};

/// Tunables for the allocation loop
#[derive(Debug, Clone)]
pub struct AllocationConfig {
    /// Conditional-update races tolerated before giving up on a booking
    pub max_attempts: u32,
    /// Retry policy for transient storage failures on release
    pub release_retry: RetryConfig,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 32,
            release_retry: RetryConfig::default(),
        }
    }
}

pub struct AllocationService {
    repos: Arc<dyn RepositoryProvider>,
    registry: Arc<SpotRegistry>,
    ledger: Arc<ReservationLedger>,
    config: AllocationConfig,
}

impl AllocationService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        registry: Arc<SpotRegistry>,
        ledger: Arc<ReservationLedger>,
        config: AllocationConfig,
    ) -> Self {
        Self {
            repos,
            registry,
            ledger,
            config,
        }
    }

    pub async fn book(
        &self,
        lot_id: i32,
        user_id: i32,
        now: DateTime<Utc>,
        note: Option<String>,
    ) -> DomainResult<Reservation> {
        if self.repos.users().find_by_id(user_id).await?.is_none() {
            return Err(DomainError::not_found("User", user_id));
        }
        if self.repos.lots().find_by_id(lot_id).await?.is_none() {
            return Err(DomainError::not_found("Lot", lot_id));
        }

        for attempt in 1..=self.config.max_attempts {
            let spot = match self.registry.find_available(lot_id).await {
                Ok(spot) => spot,
                Err(DomainError::NotFound { .. }) => {
                    metrics::counter!("parking_bookings_total", "outcome" => "full").increment(1);
                    warn!(lot_id, user_id, "No available spot");
                    return Err(DomainError::NoAvailableSpot { lot_id });
                }
                Err(e) => return Err(e),
            };

            match self.ledger.open(spot.id, user_id, now, note.clone()).await {
                Ok(reservation) => {
                    metrics::counter!("parking_bookings_total", "outcome" => "booked").increment(1);
                    info!(
                        lot_id,
                        user_id,
                        spot_id = spot.id,
                        spot = %spot.label,
                        reservation_id = reservation.id,
                        "Spot booked"
                    );
                    return Ok(reservation);
                }
                Err(DomainError::Conflict(_)) => {
                    debug!(lot_id, spot_id = spot.id, attempt, "Spot taken concurrently, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        // Every attempt lost its spot to another booking; spots may remain.
        metrics::counter!("parking_bookings_total", "outcome" => "contended").increment(1);
        warn!(
            lot_id,
            user_id,
            attempts = self.config.max_attempts,
            "Booking gave up under contention"
        );
        Err(DomainError::Conflict(format!(
            "Lot {} is busy, retry the booking",
            lot_id
        )))
    }

    pub async fn release(
        &self,
        reservation_id: i32,
        now: DateTime<Utc>,
    ) -> DomainResult<ClosedReservation> {
        let closed = retry_with_backoff(
            self.config.release_retry.clone(),
            || self.ledger.close(reservation_id, now),
            DomainError::is_transient,
            "release_reservation",
        )
        .await?;

        if !closed.already_closed {
            metrics::counter!("parking_releases_total").increment(1);
        }
        Ok(closed)
    }
}
