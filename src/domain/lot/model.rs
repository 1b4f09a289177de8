//! Lot domain entity

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::shared::errors::DomainError;

/// Parking lot
#[derive(Debug, Clone, PartialEq)]
pub struct Lot {
    pub id: i32,
    /// Display name of the location
    pub name: String,
    pub address: String,
    pub pin_code: String,
    /// Price per started hour, always positive
    pub price_per_hour: Decimal,
    /// Configured number of spots. The actual spot count may exceed it
    /// after a shrink was blocked by occupied spots.
    pub capacity: u32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data required to create a lot
#[derive(Debug, Clone)]
pub struct NewLot {
    pub name: String,
    pub address: String,
    pub pin_code: String,
    pub price_per_hour: Decimal,
    pub capacity: u32,
    pub description: Option<String>,
}

impl NewLot {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation("Lot name must not be empty".into()));
        }
        validate_price(self.price_per_hour)
    }
}

/// Profile changes for an existing lot. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct LotUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub pin_code: Option<String>,
    pub price_per_hour: Option<Decimal>,
    pub description: Option<String>,
    pub capacity: Option<u32>,
}

impl Lot {
    /// Apply profile fields from `update`. Capacity is handled by the
    /// reconciler because it adds and removes spots.
    pub fn apply(&mut self, update: &LotUpdate) -> Result<(), DomainError> {
        if let Some(price) = update.price_per_hour {
            validate_price(price)?;
        }
        if matches!(&update.name, Some(name) if name.trim().is_empty()) {
            return Err(DomainError::Validation("Lot name must not be empty".into()));
        }

        if let Some(price) = update.price_per_hour {
            self.price_per_hour = price;
        }
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(address) = &update.address {
            self.address = address.clone();
        }
        if let Some(pin_code) = &update.pin_code {
            self.pin_code = pin_code.clone();
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        Ok(())
    }
}

/// Highest accepted price per hour
pub const MAX_PRICE_PER_HOUR: Decimal = Decimal::from_parts(10_000_000, 0, 0, false, 2);

/// Prices are whole cents in `(0, MAX_PRICE_PER_HOUR]`, so both storage
/// backends hold exactly the same amount.
fn validate_price(price: Decimal) -> Result<(), DomainError> {
    if price <= Decimal::ZERO {
        return Err(DomainError::Validation(format!(
            "Price per hour must be positive, got {}",
            price
        )));
    }
    if price > MAX_PRICE_PER_HOUR {
        return Err(DomainError::Validation(format!(
            "Price per hour must not exceed {}, got {}",
            MAX_PRICE_PER_HOUR, price
        )));
    }
    if price.normalize().scale() > 2 {
        return Err(DomainError::Validation(format!(
            "Price per hour must be in whole cents, got {}",
            price
        )));
    }
    Ok(())
}
