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
                    .table(SupportTicket::Table)
                    .if_not_exists()
                    .col(pk_auto(SupportTicket::Id))
                    .col(integer(SupportTicket::UserId).not_null())
                    .col(string_len(SupportTicket::Subject, 200).not_null())
                    .col(text(SupportTicket::Message).not_null())
                    .col(string_len(SupportTicket::Status, 20).not_null().default("open"))
                    .col(text_null(SupportTicket::AdminReply))
                    .col(
                        timestamp_with_time_zone(SupportTicket::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_support_ticket_user")
                            .from(SupportTicket::Table, SupportTicket::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SupportTicket::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SupportTicket {
    Table,
    Id,
    UserId,
    Subject,
    Message,
    Status,
    AdminReply,
    CreatedAt,
}
