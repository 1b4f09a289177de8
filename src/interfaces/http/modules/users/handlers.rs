//! User HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};

use crate::application::{MonthlyUsage, ReportingService, ReservationLedger, Summary, UserService};
use crate::interfaces::http::common::{ok, ApiResult, ValidatedJson};
use crate::interfaces::http::modules::bookings::ReservationResponse;

use super::dto::*;

#[derive(Clone)]
pub struct UserState {
    pub users: Arc<UserService>,
    pub ledger: Arc<ReservationLedger>,
    pub reporting: Arc<ReportingService>,
}

/// `POST /api/v1/users`
pub async fn register_user(
    State(state): State<UserState>,
    ValidatedJson(request): ValidatedJson<RegisterUserRequest>,
) -> ApiResult<UserResponse> {
    let user = state.users.register(request.into()).await?;
    ok(user.into())
}

/// `GET /api/v1/users/{id}`
pub async fn get_user(
    State(state): State<UserState>,
    Path(user_id): Path<i32>,
) -> ApiResult<UserResponse> {
    ok(state.users.get(user_id).await?.into())
}

/// `GET /api/v1/users/{id}/reservations[?open=true]`, newest first
pub async fn list_user_reservations(
    State(state): State<UserState>,
    Path(user_id): Path<i32>,
    Query(query): Query<ReservationListQuery>,
) -> ApiResult<Vec<ReservationResponse>> {
    state.users.get(user_id).await?;
    let reservations = state.ledger.list_for_user(user_id).await?;
    ok(reservations
        .into_iter()
        .filter(|r| !query.open || r.is_open())
        .map(ReservationResponse::from)
        .collect())
}

/// `GET /api/v1/users/{id}/summary`
pub async fn user_summary(
    State(state): State<UserState>,
    Path(user_id): Path<i32>,
) -> ApiResult<Summary> {
    state.users.get(user_id).await?;
    ok(state.ledger.summarize(user_id).await?)
}

/// `GET /api/v1/users/{id}/monthly`
pub async fn user_monthly_usage(
    State(state): State<UserState>,
    Path(user_id): Path<i32>,
) -> ApiResult<Vec<MonthlyUsage>> {
    state.users.get(user_id).await?;
    ok(state.reporting.monthly_usage(user_id).await?)
}
