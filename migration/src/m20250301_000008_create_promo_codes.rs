use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PromoCode::Table)
                    .if_not_exists()
                    .col(pk_auto(PromoCode::Id))
                    .col(string_len(PromoCode::Code, 50).not_null().unique_key())
                    .col(double(PromoCode::Discount).not_null())
                    .col(boolean(PromoCode::IsActive).not_null().default(true))
                    .col(
                        timestamp_with_time_zone(PromoCode::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PromoCode::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PromoCode {
    Table,
    Id,
    Code,
    Discount,
    IsActive,
    CreatedAt,
}
