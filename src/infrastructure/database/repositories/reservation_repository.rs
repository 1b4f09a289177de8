//! SeaORM implementation of ReservationRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::{db_err, from_cents, to_cents};
use crate::domain::{DomainError, DomainResult, NewReservation, Reservation, ReservationRepository};
use crate::infrastructure::database::entities::reservation;

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: reservation::Model) -> Reservation {
    Reservation {
        id: m.id,
        spot_id: m.spot_id,
        lot_id: m.lot_id,
        user_id: m.user_id,
        started_at: m.started_at,
        ended_at: m.ended_at,
        hourly_rate: from_cents(m.hourly_rate_cents),
        cost: m.cost_cents.map(from_cents),
        note: m.note,
    }
}

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn create(&self, r: NewReservation) -> DomainResult<Reservation> {
        debug!("Opening reservation: spot={} user={}", r.spot_id, r.user_id);

        let model = reservation::ActiveModel {
            spot_id: Set(r.spot_id),
            lot_id: Set(r.lot_id),
            user_id: Set(r.user_id),
            started_at: Set(r.started_at),
            ended_at: Set(None),
            hourly_rate_cents: Set(to_cents(r.hourly_rate)?),
            cost_cents: Set(None),
            note: Set(r.note),
            ..Default::default()
        };
        let model = model.insert(&self.db).await.map_err(db_err)?;
        Ok(model_to_domain(model))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>> {
        let model = reservation::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn update(&self, r: Reservation) -> DomainResult<()> {
        debug!("Updating reservation: {}", r.id);

        let existing = reservation::Entity::find_by_id(r.id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        if existing.is_none() {
            return Err(DomainError::not_found("Reservation", r.id));
        }

        let cost_cents = r.cost.map(to_cents).transpose()?;
        let model = reservation::ActiveModel {
            id: Set(r.id),
            spot_id: Set(r.spot_id),
            lot_id: Set(r.lot_id),
            user_id: Set(r.user_id),
            started_at: Set(r.started_at),
            ended_at: Set(r.ended_at),
            hourly_rate_cents: Set(to_cents(r.hourly_rate)?),
            cost_cents: Set(cost_cents),
            note: Set(r.note),
        };
        model.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn close_if_open(
        &self,
        id: i32,
        ended_at: DateTime<Utc>,
        cost: Decimal,
    ) -> DomainResult<bool> {
        debug!("Closing reservation: {}", id);

        let result = reservation::Entity::update_many()
            .col_expr(reservation::Column::EndedAt, Expr::value(ended_at))
            .col_expr(reservation::Column::CostCents, Expr::value(to_cents(cost)?))
            .filter(reservation::Column::Id.eq(id))
            .filter(reservation::Column::EndedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected == 1)
    }

    async fn find_open_for_spot(&self, spot_id: i32) -> DomainResult<Option<Reservation>> {
        let model = reservation::Entity::find()
            .filter(reservation::Column::SpotId.eq(spot_id))
            .filter(reservation::Column::EndedAt.is_null())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_user(&self, user_id: i32) -> DomainResult<Vec<Reservation>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::UserId.eq(user_id))
            .order_by_desc(reservation::Column::StartedAt)
            .order_by_desc(reservation::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn find_open(&self) -> DomainResult<Vec<Reservation>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::EndedAt.is_null())
            .order_by_asc(reservation::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}
