//! Create reservations table
//!
//! `spot_id` carries no foreign key so that closed reservations survive
//! the removal of their spot.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users::Users;
use super::m20240101_000002_create_parking_lots::ParkingLots;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reservations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reservations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reservations::SpotId).integer().not_null())
                    .col(ColumnDef::new(Reservations::LotId).integer().not_null())
                    .col(ColumnDef::new(Reservations::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(Reservations::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reservations::EndedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Reservations::HourlyRateCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reservations::CostCents).big_integer())
                    .col(ColumnDef::new(Reservations::Note).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_lot")
                            .from(Reservations::Table, Reservations::LotId)
                            .to(ParkingLots::Table, ParkingLots::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_user")
                            .from(Reservations::Table, Reservations::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_spot")
                    .table(Reservations::Table)
                    .col(Reservations::SpotId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_user")
                    .table(Reservations::Table)
                    .col(Reservations::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reservations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Reservations {
    Table,
    Id,
    SpotId,
    LotId,
    UserId,
    StartedAt,
    EndedAt,
    HourlyRateCents,
    CostCents,
    Note,
}
