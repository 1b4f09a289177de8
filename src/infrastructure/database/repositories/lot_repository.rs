//! SeaORM implementation of LotRepository

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use super::{db_err, from_cents, to_cents};
use crate::domain::{DomainError, DomainResult, Lot, LotRepository, NewLot};
use crate::infrastructure::database::entities::{parking_lot, parking_spot, reservation};

pub struct SeaOrmLotRepository {
    db: DatabaseConnection,
}

impl SeaOrmLotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: parking_lot::Model) -> Lot {
    Lot {
        id: m.id,
        name: m.name,
        address: m.address,
        pin_code: m.pin_code,
        price_per_hour: from_cents(m.price_cents),
        capacity: m.capacity.max(0) as u32,
        description: m.description,
        created_at: m.created_at,
    }
}

fn capacity_column(capacity: u32) -> DomainResult<i32> {
    i32::try_from(capacity)
        .map_err(|_| DomainError::Validation(format!("Capacity too large: {}", capacity)))
}

// ── LotRepository impl ──────────────────────────────────────────

#[async_trait]
impl LotRepository for SeaOrmLotRepository {
    async fn create(&self, lot: NewLot) -> DomainResult<Lot> {
        debug!("Creating lot: {}", lot.name);

        let model = parking_lot::ActiveModel {
            name: Set(lot.name),
            address: Set(lot.address),
            pin_code: Set(lot.pin_code),
            price_cents: Set(to_cents(lot.price_per_hour)?),
            capacity: Set(capacity_column(lot.capacity)?),
            description: Set(lot.description),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = model.insert(&self.db).await.map_err(db_err)?;
        Ok(model_to_domain(model))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Lot>> {
        let model = parking_lot::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<Lot>> {
        let models = parking_lot::Entity::find()
            .order_by_asc(parking_lot::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn update(&self, lot: Lot) -> DomainResult<()> {
        debug!("Updating lot: {}", lot.id);

        let existing = parking_lot::Entity::find_by_id(lot.id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        if existing.is_none() {
            return Err(DomainError::not_found("Lot", lot.id));
        }

        let model = parking_lot::ActiveModel {
            id: Set(lot.id),
            name: Set(lot.name),
            address: Set(lot.address),
            pin_code: Set(lot.pin_code),
            price_cents: Set(to_cents(lot.price_per_hour)?),
            capacity: Set(capacity_column(lot.capacity)?),
            description: Set(lot.description),
            created_at: Set(lot.created_at),
        };
        model.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        debug!("Deleting lot: {}", id);

        // Children are removed explicitly so the result does not depend on
        // the connection having foreign key enforcement turned on.
        let txn = self.db.begin().await.map_err(db_err)?;

        reservation::Entity::delete_many()
            .filter(reservation::Column::LotId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        parking_spot::Entity::delete_many()
            .filter(parking_spot::Column::LotId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        let result = parking_lot::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(db_err)?;
            return Err(DomainError::not_found("Lot", id));
        }

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }
}
