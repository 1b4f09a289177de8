//! Create parking_spots table

use sea_orm_migration::prelude::*;

use super::m20240101_000002_create_parking_lots::ParkingLots;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingSpots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingSpots::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ParkingSpots::LotId).integer().not_null())
                    .col(ColumnDef::new(ParkingSpots::Number).integer().not_null())
                    .col(ColumnDef::new(ParkingSpots::Label).string_len(16).not_null())
                    .col(
                        ColumnDef::new(ParkingSpots::Status)
                            .string_len(1)
                            .not_null()
                            .default("A"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_parking_spots_lot")
                            .from(ParkingSpots::Table, ParkingSpots::LotId)
                            .to(ParkingLots::Table, ParkingLots::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Spot numbers are never reused inside a lot
        manager
            .create_index(
                Index::create()
                    .name("idx_parking_spots_lot_number")
                    .table(ParkingSpots::Table)
                    .col(ParkingSpots::LotId)
                    .col(ParkingSpots::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_spots_lot_status")
                    .table(ParkingSpots::Table)
                    .col(ParkingSpots::LotId)
                    .col(ParkingSpots::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingSpots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingSpots {
    Table,
    Id,
    LotId,
    Number,
    Label,
    Status,
}
