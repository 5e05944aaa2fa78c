//! Create activity table migration.

use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_user_table::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Activity::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Activity::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Activity::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Activity::Description).text())
                    .col(
                        ColumnDef::new(Activity::Difficulty)
                            .string_len(16)
                            .not_null()
                            .default("easy"),
                    )
                    .col(
                        ColumnDef::new(Activity::Tags)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(Activity::CreatedBy).string_len(32))
                    .col(
                        ColumnDef::new(Activity::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Activity::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_created_by")
                            .from(Activity::Table, Activity::CreatedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: catalog order
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_created_at")
                    .table(Activity::Table)
                    .col(Activity::CreatedAt)
                    .col(Activity::Id)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Activity::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Activity {
    Table,
    Id,
    Title,
    Description,
    Difficulty,
    Tags,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
