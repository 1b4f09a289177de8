//! Booking DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::ClosedReservation;
use crate::domain::Reservation;

#[derive(Debug, Deserialize, Validate)]
pub struct BookingRequest {
    #[validate(range(min = 1))]
    pub lot_id: i32,
    #[validate(range(min = 1))]
    pub user_id: i32,
    #[validate(length(max = 255))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReservationResponse {
    pub id: i32,
    pub spot_id: i32,
    pub lot_id: i32,
    pub user_id: i32,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub hourly_rate: Decimal,
    pub cost: Option<Decimal>,
    /// "X hr Y min", closed reservations only
    pub duration: Option<String>,
    pub note: Option<String>,
}

impl From<Reservation> for ReservationResponse {
    fn from(r: Reservation) -> Self {
        Self {
            duration: r.duration().map(|d| d.to_string()),
            id: r.id,
            spot_id: r.spot_id,
            lot_id: r.lot_id,
            user_id: r.user_id,
            started_at: r.started_at,
            ended_at: r.ended_at,
            hourly_rate: r.hourly_rate,
            cost: r.cost,
            note: r.note,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReleaseResponse {
    pub reservation: ReservationResponse,
    pub duration: String,
    pub total_minutes: i64,
    /// True when an earlier release had already closed the reservation
    pub already_closed: bool,
}

impl From<ClosedReservation> for ReleaseResponse {
    fn from(closed: ClosedReservation) -> Self {
        Self {
            duration: closed.duration.to_string(),
            total_minutes: closed.duration.total_minutes(),
            already_closed: closed.already_closed,
            reservation: closed.reservation.into(),
        }
    }
}
