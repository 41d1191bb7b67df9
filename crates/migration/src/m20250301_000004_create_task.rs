//! Create `task` table owned by `user`.
//!
//! `status` holds the string form of the task status enum; `revision` starts
//! at 1 and is bumped on each update.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Task::Table)
                    .if_not_exists()
                    .col(uuid(Task::Id).primary_key())
                    .col(uuid(Task::OwnerId).not_null())
                    .col(
                        ColumnDef::new(Task::Title)
                            .string_len(255)
                            .null(),
                    )
                    .col(text(Task::Description).not_null())
                    .col(string_len(Task::Status, 16).not_null().default("Pending"))
                    .col(integer(Task::Revision).not_null().default(1))
                    .col(timestamp_with_time_zone(Task::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Task::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_owner")
                            .from(Task::Table, Task::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Task::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Task {
    Table,
    Id,
    OwnerId,
    Title,
    Description,
    Status,
    Revision,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
