//! Lot DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::{LotUpdateOutcome, ResizeOutcome};
use crate::domain::{DomainError, Lot, LotUpdate, NewLot, Spot, SpotStatus};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLotRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub address: String,
    #[validate(length(min = 1, max = 6))]
    pub pin_code: String,
    pub price_per_hour: Decimal,
    #[validate(range(max = 10000))]
    pub capacity: u32,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

impl From<CreateLotRequest> for NewLot {
    fn from(r: CreateLotRequest) -> Self {
        NewLot {
            name: r.name,
            address: r.address,
            pin_code: r.pin_code,
            price_per_hour: r.price_per_hour,
            capacity: r.capacity,
            description: r.description,
        }
    }
}

/// Partial update; `capacity` triggers a resize
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateLotRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub address: Option<String>,
    #[validate(length(min = 1, max = 6))]
    pub pin_code: Option<String>,
    pub price_per_hour: Option<Decimal>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(range(max = 10000))]
    pub capacity: Option<u32>,
}

impl From<UpdateLotRequest> for LotUpdate {
    fn from(r: UpdateLotRequest) -> Self {
        LotUpdate {
            name: r.name,
            address: r.address,
            pin_code: r.pin_code,
            price_per_hour: r.price_per_hour,
            description: r.description,
            capacity: r.capacity,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LotResponse {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub pin_code: String,
    pub price_per_hour: Decimal,
    pub capacity: u32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Lot> for LotResponse {
    fn from(l: Lot) -> Self {
        Self {
            id: l.id,
            name: l.name,
            address: l.address,
            pin_code: l.pin_code,
            price_per_hour: l.price_per_hour,
            capacity: l.capacity,
            description: l.description,
            created_at: l.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LotUpdateResponse {
    pub lot: LotResponse,
    /// Present when the capacity was part of the update
    pub resize: Option<ResizeOutcome>,
}

impl From<LotUpdateOutcome> for LotUpdateResponse {
    fn from(o: LotUpdateOutcome) -> Self {
        Self {
            lot: o.lot.into(),
            resize: o.resize,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SpotResponse {
    pub id: i32,
    pub lot_id: i32,
    pub number: i32,
    pub label: String,
    pub status: SpotStatus,
}

impl From<Spot> for SpotResponse {
    fn from(s: Spot) -> Self {
        Self {
            id: s.id,
            lot_id: s.lot_id,
            number: s.number,
            label: s.label,
            status: s.status,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SpotCountQuery {
    /// `available` (default), `occupied`, or the stored codes `A` / `O`
    pub status: Option<String>,
}

impl SpotCountQuery {
    pub fn status(&self) -> Result<SpotStatus, DomainError> {
        match self.status.as_deref() {
            None => Ok(SpotStatus::Available),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "available" | "a" => Ok(SpotStatus::Available),
                "occupied" | "o" => Ok(SpotStatus::Occupied),
                _ => Err(DomainError::Validation(format!(
                    "Unknown spot status '{}'",
                    raw
                ))),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SpotCountResponse {
    pub lot_id: i32,
    pub status: SpotStatus,
    pub count: u64,
}
