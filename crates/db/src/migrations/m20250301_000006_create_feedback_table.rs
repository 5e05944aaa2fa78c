//! Create feedback table migration.

use sea_orm_migration::prelude::*;

use super::m20250301_000003_create_student_table::Student;
use super::m20250301_000004_create_activity_table::Activity;
use super::m20250301_000005_create_recommendation_table::Recommendation;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Feedback::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Feedback::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Feedback::RecommendationId).string_len(32).not_null())
                    .col(ColumnDef::new(Feedback::StudentId).string_len(32).not_null())
                    .col(ColumnDef::new(Feedback::ActivityId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Feedback::Rating)
                            .integer()
                            .not_null()
                            .check(Expr::col(Feedback::Rating).between(1, 5)),
                    )
                    .col(ColumnDef::new(Feedback::Helpful).boolean())
                    .col(ColumnDef::new(Feedback::Comment).text())
                    .col(ColumnDef::new(Feedback::CreatedBy).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Feedback::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Feedback::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feedback_recommendation")
                            .from(Feedback::Table, Feedback::RecommendationId)
                            .to(Recommendation::Table, Recommendation::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feedback_student")
                            .from(Feedback::Table, Feedback::StudentId)
                            .to(Student::Table, Student::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feedback_activity")
                            .from(Feedback::Table, Feedback::ActivityId)
                            .to(Activity::Table, Activity::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: activity_id (for per-activity summaries)
        manager
            .create_index(
                Index::create()
                    .name("idx_feedback_activity_id")
                    .table(Feedback::Table)
                    .col(Feedback::ActivityId)
                    .to_owned(),
            )
            .await?;

        // Index: recommendation_id
        manager
            .create_index(
                Index::create()
                    .name("idx_feedback_recommendation_id")
                    .table(Feedback::Table)
                    .col(Feedback::RecommendationId)
                    .to_owned(),
            )
            .await?;

        // Index: student_id
        manager
            .create_index(
                Index::create()
                    .name("idx_feedback_student_id")
                    .table(Feedback::Table)
                    .col(Feedback::StudentId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Feedback::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Feedback {
    Table,
    Id,
    RecommendationId,
    StudentId,
    ActivityId,
    Rating,
    Helpful,
    Comment,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
