//! Create recommendation table migration.

use sea_orm_migration::prelude::*;

use super::m20250301_000003_create_student_table::Student;
use super::m20250301_000004_create_activity_table::Activity;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Recommendation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Recommendation::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Recommendation::StudentId).string_len(32).not_null())
                    .col(ColumnDef::new(Recommendation::ActivityId).string_len(32).not_null())
                    .col(ColumnDef::new(Recommendation::Score).double().not_null())
                    .col(
                        ColumnDef::new(Recommendation::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Recommendation::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recommendation_student")
                            .from(Recommendation::Table, Recommendation::StudentId)
                            .to(Student::Table, Student::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recommendation_activity")
                            .from(Recommendation::Table, Recommendation::ActivityId)
                            .to(Activity::Table, Activity::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (student_id, activity_id) - one recommendation per pair
        manager
            .create_index(
                Index::create()
                    .name("idx_recommendation_student_activity_unique")
                    .table(Recommendation::Table)
                    .col(Recommendation::StudentId)
                    .col(Recommendation::ActivityId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: activity_id (for restrict checks on activity delete)
        manager
            .create_index(
                Index::create()
                    .name("idx_recommendation_activity_id")
                    .table(Recommendation::Table)
                    .col(Recommendation::ActivityId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Recommendation::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Recommendation {
    Table,
    Id,
    StudentId,
    ActivityId,
    Score,
    CreatedAt,
    UpdatedAt,
}
