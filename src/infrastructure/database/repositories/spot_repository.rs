//! SeaORM implementation of SpotRepository
//!
//! Status changes are single conditional `UPDATE`/`DELETE` statements, so
//! the database decides which of two concurrent callers wins.

use async_trait::async_trait;
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use super::db_err;
use crate::domain::{DomainError, DomainResult, Spot, SpotRepository, SpotStatus};
use crate::infrastructure::database::entities::parking_spot;

pub struct SeaOrmSpotRepository {
    db: DatabaseConnection,
}

impl SeaOrmSpotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: parking_spot::Model) -> DomainResult<Spot> {
    let status = SpotStatus::from_code(&m.status).ok_or_else(|| {
        DomainError::Storage(format!("Spot {} has unknown status '{}'", m.id, m.status))
    })?;
    Ok(Spot {
        id: m.id,
        lot_id: m.lot_id,
        number: m.number,
        label: m.label,
        status,
    })
}

fn models_to_domain(models: Vec<parking_spot::Model>) -> DomainResult<Vec<Spot>> {
    models.into_iter().map(model_to_domain).collect()
}

// ── SpotRepository impl ─────────────────────────────────────────

#[async_trait]
impl SpotRepository for SeaOrmSpotRepository {
    async fn create_many(&self, lot_id: i32, numbers: &[i32]) -> DomainResult<Vec<Spot>> {
        debug!("Creating {} spot(s) in lot {}", numbers.len(), lot_id);

        let txn = self.db.begin().await.map_err(db_err)?;
        let mut created = Vec::with_capacity(numbers.len());
        for &number in numbers {
            let model = parking_spot::ActiveModel {
                lot_id: Set(lot_id),
                number: Set(number),
                label: Set(Spot::label_for(number)),
                status: Set(SpotStatus::Available.as_code().to_string()),
                ..Default::default()
            };
            created.push(model.insert(&txn).await.map_err(db_err)?);
        }
        txn.commit().await.map_err(db_err)?;

        models_to_domain(created)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Spot>> {
        parking_spot::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_by_lot(&self, lot_id: i32) -> DomainResult<Vec<Spot>> {
        let models = parking_spot::Entity::find()
            .filter(parking_spot::Column::LotId.eq(lot_id))
            .order_by_asc(parking_spot::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models_to_domain(models)
    }

    async fn find_first_available(&self, lot_id: i32) -> DomainResult<Option<Spot>> {
        parking_spot::Entity::find()
            .filter(parking_spot::Column::LotId.eq(lot_id))
            .filter(parking_spot::Column::Status.eq(SpotStatus::Available.as_code()))
            .order_by_asc(parking_spot::Column::Id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn count_by_status(&self, lot_id: i32, status: SpotStatus) -> DomainResult<u64> {
        parking_spot::Entity::find()
            .filter(parking_spot::Column::LotId.eq(lot_id))
            .filter(parking_spot::Column::Status.eq(status.as_code()))
            .count(&self.db)
            .await
            .map_err(db_err)
    }

    async fn transition(&self, id: i32, from: SpotStatus, to: SpotStatus) -> DomainResult<bool> {
        debug!("Spot {} transition {} -> {}", id, from, to);

        let result = parking_spot::Entity::update_many()
            .col_expr(parking_spot::Column::Status, Expr::value(to.as_code()))
            .filter(parking_spot::Column::Id.eq(id))
            .filter(parking_spot::Column::Status.eq(from.as_code()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected == 1)
    }

    async fn delete_if_available(&self, id: i32) -> DomainResult<bool> {
        let result = parking_spot::Entity::delete_many()
            .filter(parking_spot::Column::Id.eq(id))
            .filter(parking_spot::Column::Status.eq(SpotStatus::Available.as_code()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected == 1)
    }
}
