//! Reservation domain entity

use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::shared::errors::DomainError;

/// Whole hours and remaining minutes of a parking session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParkingDuration {
    pub hours: i64,
    pub minutes: i64,
}

impl ParkingDuration {
    /// Breakdown of `elapsed` floored to the minute. Negative spans count as zero.
    pub fn from_elapsed(elapsed: Duration) -> Self {
        let total_minutes = elapsed.num_minutes().max(0);
        Self {
            hours: total_minutes / 60,
            minutes: total_minutes % 60,
        }
    }

    pub fn total_minutes(&self) -> i64 {
        self.hours * 60 + self.minutes
    }
}

impl std::fmt::Display for ParkingDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} hr {} min", self.hours, self.minutes)
    }
}

/// Data required to open a reservation
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub spot_id: i32,
    pub lot_id: i32,
    pub user_id: i32,
    pub started_at: DateTime<Utc>,
    pub hourly_rate: Decimal,
    pub note: Option<String>,
}

/// A user's hold on a spot. Open while `ended_at` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: i32,
    pub spot_id: i32,
    pub lot_id: i32,
    pub user_id: i32,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Lot price per hour captured when the reservation was opened
    pub hourly_rate: Decimal,
    pub cost: Option<Decimal>,
    pub note: Option<String>,
}

impl Reservation {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Time parked until `now`, clamped at zero when the clock went backwards
    pub fn elapsed_until(&self, now: DateTime<Utc>) -> Duration {
        let elapsed = now - self.started_at;
        if elapsed < Duration::zero() {
            Duration::zero()
        } else {
            elapsed
        }
    }

    /// elapsed hours (from whole seconds) x hourly rate, rounded half away
    /// from zero to cents
    pub fn cost_until(&self, now: DateTime<Utc>) -> Result<Decimal, DomainError> {
        let seconds = Decimal::from(self.elapsed_until(now).num_seconds());
        let hours = seconds / Decimal::from(3_600);
        hours
            .checked_mul(self.hourly_rate)
            .map(|cost| cost.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
            .ok_or_else(|| {
                DomainError::Validation(format!(
                    "Cost of reservation {} is out of range",
                    self.id
                ))
            })
    }

    /// Duration of a closed reservation
    pub fn duration(&self) -> Option<ParkingDuration> {
        self.ended_at
            .map(|end| ParkingDuration::from_elapsed(self.elapsed_until(end)))
    }

    /// Close in place with the given end time. Leaves the reservation
    /// untouched when the cost cannot be computed.
    pub fn close(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        let end = now.max(self.started_at);
        self.cost = Some(self.cost_until(end)?);
        self.ended_at = Some(end);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn open_at(start: DateTime<Utc>, rate: Decimal) -> Reservation {
        Reservation {
            id: 1,
            spot_id: 1,
            lot_id: 1,
            user_id: 1,
            started_at: start,
            ended_at: None,
            hourly_rate: rate,
            cost: None,
            note: None,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn ninety_minutes_at_ten_per_hour() {
        let mut r = open_at(t0(), Decimal::TEN);
        r.close(t0() + Duration::minutes(90)).unwrap();

        assert_eq!(r.cost, Some(Decimal::new(1500, 2)));
        assert_eq!(r.duration().unwrap().to_string(), "1 hr 30 min");
        assert!(!r.is_open());
    }

    #[test]
    fn cost_rounds_to_cents() {
        // 10 minutes at 1.00/h = 0.1666.. -> 0.17
        let r = open_at(t0(), Decimal::ONE);
        assert_eq!(
            r.cost_until(t0() + Duration::minutes(10)).unwrap(),
            Decimal::new(17, 2)
        );
    }

    #[test]
    fn cost_ignores_sub_second_remainder() {
        let r = open_at(t0(), Decimal::new(3600, 0));
        let end = t0() + Duration::seconds(1) + Duration::milliseconds(999);
        assert_eq!(r.cost_until(end).unwrap(), Decimal::new(100, 2));
    }

    #[test]
    fn cost_overflow_is_an_error() {
        let mut r = open_at(t0(), Decimal::MAX);
        let err = r.close(t0() + Duration::days(365)).unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert!(r.is_open());
        assert!(r.cost.is_none());
    }

    #[test]
    fn negative_elapsed_is_zero_cost() {
        let mut r = open_at(t0(), Decimal::TEN);
        r.close(t0() - Duration::minutes(5)).unwrap();

        assert_eq!(r.cost, Some(Decimal::ZERO));
        assert_eq!(r.ended_at, Some(t0()));
        assert_eq!(r.duration().unwrap().total_minutes(), 0);
    }

    #[test]
    fn duration_floors_to_minute() {
        let d = ParkingDuration::from_elapsed(Duration::seconds(2 * 3600 + 5 * 60 + 59));
        assert_eq!(d, ParkingDuration { hours: 2, minutes: 5 });
        assert_eq!(d.to_string(), "2 hr 5 min");
    }

    #[test]
    fn open_reservation_has_no_duration() {
        let r = open_at(t0(), Decimal::TEN);
        assert!(r.is_open());
        assert!(r.duration().is_none());
    }
}
