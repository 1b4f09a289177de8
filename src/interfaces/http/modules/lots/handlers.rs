//! Lot HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};

use crate::application::{LotOccupancy, LotService, ReportingService, SpotRegistry};
use crate::interfaces::http::common::{ok, ApiResult, ValidatedJson};

use super::dto::*;

#[derive(Clone)]
pub struct LotState {
    pub lots: Arc<LotService>,
    pub registry: Arc<SpotRegistry>,
    pub reporting: Arc<ReportingService>,
}

/// `POST /api/v1/lots`
pub async fn create_lot(
    State(state): State<LotState>,
    ValidatedJson(request): ValidatedJson<CreateLotRequest>,
) -> ApiResult<LotResponse> {
    let lot = state.lots.create_lot(request.into()).await?;
    ok(lot.into())
}

/// `GET /api/v1/lots`
pub async fn list_lots(State(state): State<LotState>) -> ApiResult<Vec<LotResponse>> {
    let lots = state.lots.list_lots().await?;
    ok(lots.into_iter().map(LotResponse::from).collect())
}

/// `GET /api/v1/lots/occupancy`
pub async fn lot_occupancy(State(state): State<LotState>) -> ApiResult<Vec<LotOccupancy>> {
    ok(state.reporting.occupancy().await?)
}

/// `GET /api/v1/lots/{id}`
pub async fn get_lot(
    State(state): State<LotState>,
    Path(lot_id): Path<i32>,
) -> ApiResult<LotResponse> {
    ok(state.lots.get_lot(lot_id).await?.into())
}

/// `PUT /api/v1/lots/{id}`
pub async fn update_lot(
    State(state): State<LotState>,
    Path(lot_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateLotRequest>,
) -> ApiResult<LotUpdateResponse> {
    let outcome = state.lots.update_lot(lot_id, request.into()).await?;
    ok(outcome.into())
}

/// `DELETE /api/v1/lots/{id}`
pub async fn delete_lot(State(state): State<LotState>, Path(lot_id): Path<i32>) -> ApiResult<()> {
    state.lots.delete_lot(lot_id).await?;
    ok(())
}

/// `GET /api/v1/lots/{id}/spots`
pub async fn list_spots(
    State(state): State<LotState>,
    Path(lot_id): Path<i32>,
) -> ApiResult<Vec<SpotResponse>> {
    state.lots.get_lot(lot_id).await?;
    let spots = state.registry.list(lot_id).await?;
    ok(spots.into_iter().map(SpotResponse::from).collect())
}

/// `GET /api/v1/lots/{id}/spots/count?status=available|occupied`
pub async fn count_spots(
    State(state): State<LotState>,
    Path(lot_id): Path<i32>,
    Query(query): Query<SpotCountQuery>,
) -> ApiResult<SpotCountResponse> {
    let status = query.status()?;
    state.lots.get_lot(lot_id).await?;
    let count = state.registry.count_by_status(lot_id, status).await?;
    ok(SpotCountResponse {
        lot_id,
        status,
        count,
    })
}
