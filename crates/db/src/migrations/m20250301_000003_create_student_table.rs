//! Create student table migration.

use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_user_table::User;
use super::m20250301_000002_create_teacher_table::Teacher;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Student::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Student::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Student::UserId).string_len(32).not_null().unique_key())
                    .col(ColumnDef::new(Student::TeacherId).string_len(32).not_null())
                    .col(ColumnDef::new(Student::Disability).string_len(64))
                    .col(ColumnDef::new(Student::LearningStyle).string_len(64))
                    .col(
                        ColumnDef::new(Student::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Student::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_student_user")
                            .from(Student::Table, Student::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_student_teacher")
                            .from(Student::Table, Student::TeacherId)
                            .to(Teacher::Table, Teacher::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: teacher_id (for listing a teacher's students)
        manager
            .create_index(
                Index::create()
                    .name("idx_student_teacher_id")
                    .table(Student::Table)
                    .col(Student::TeacherId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Student::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Student {
    Table,
    Id,
    UserId,
    TeacherId,
    Disability,
    LearningStyle,
    CreatedAt,
    UpdatedAt,
}
