//! Create teacher table migration.

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
                    .table(Teacher::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Teacher::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Teacher::UserId).string_len(32).not_null().unique_key())
                    .col(ColumnDef::new(Teacher::Subject).string_len(128))
                    .col(
                        ColumnDef::new(Teacher::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teacher_user")
                            .from(Teacher::Table, Teacher::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Teacher::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Teacher {
    Table,
    Id,
    UserId,
    Subject,
    CreatedAt,
}
