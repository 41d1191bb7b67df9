use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Session: lookups by owner when revoking
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_session_user")
                    .table(Session::Table)
                    .col(Session::UserId)
                    .to_owned(),
            )
            .await?;

        // Task: per-owner listing in insertion order
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_task_owner_created")
                    .table(Task::Table)
                    .col(Task::OwnerId)
                    .col(Task::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_task_owner_created").table(Task::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_session_user").table(Session::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Session { Table, UserId }

#[derive(DeriveIden)]
enum Task { Table, OwnerId, CreatedAt }
