use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Driver::Table)
                    .if_not_exists()
                    .col(pk_auto(Driver::Id))
                    .col(integer(Driver::UserId).not_null().unique_key())
                    .col(string_len(Driver::VehicleType, 100).not_null())
                    .col(string_len(Driver::LicensePlate, 50).not_null())
                    .col(boolean(Driver::IsAvailable).not_null().default(true))
                    .col(double(Driver::Earnings).not_null().default(0.0))
                    .col(double(Driver::Ratings).not_null().default(0.0))
                    .col(integer(Driver::CompletedOrders).not_null().default(0))
                    .col(string_len_null(Driver::LiveLocation, 100))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_driver_user")
                            .from(Driver::Table, Driver::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Driver::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Driver {
    Table,
    Id,
    UserId,
    VehicleType,
    LicensePlate,
    IsAvailable,
    Earnings,
    Ratings,
    CompletedOrders,
    LiveLocation,
}
