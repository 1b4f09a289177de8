//! Booking HTTP handlers
//!
//! The clock is read here; everything below takes `now` as a parameter.

use std::sync::Arc;

use axum::extract::{Path, State};
use chrono::Utc;

use crate::application::{AllocationService, ReservationLedger};
use crate::interfaces::http::common::{ok, ApiResult, ValidatedJson};

use super::dto::*;

#[derive(Clone)]
pub struct BookingState {
    pub allocation: Arc<AllocationService>,
    pub ledger: Arc<ReservationLedger>,
}

/// `POST /api/v1/bookings`
pub async fn create_booking(
    State(state): State<BookingState>,
    ValidatedJson(request): ValidatedJson<BookingRequest>,
) -> ApiResult<ReservationResponse> {
    let reservation = state
        .allocation
        .book(request.lot_id, request.user_id, Utc::now(), request.note)
        .await?;
    ok(reservation.into())
}

/// `GET /api/v1/reservations/{id}`
pub async fn get_reservation(
    State(state): State<BookingState>,
    Path(reservation_id): Path<i32>,
) -> ApiResult<ReservationResponse> {
    let reservation = state.ledger.find(reservation_id).await?;
    ok(reservation.into())
}

/// `POST /api/v1/reservations/{id}/release`
///
/// Releasing twice is not an error: the second call reports
/// `already_closed` with the stored values.
pub async fn release_reservation(
    State(state): State<BookingState>,
    Path(reservation_id): Path<i32>,
) -> ApiResult<ReleaseResponse> {
    let closed = state.allocation.release(reservation_id, Utc::now()).await?;
    ok(closed.into())
}
