//! Database-backed tests. They run only when `DATABASE_URL` points at a
//! Postgres instance and `SKIP_DB_TESTS` is unset.

use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

use crate::db::connect;

/// Task/session/user CRUD against Postgres
pub mod crud_tests;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

pub(crate) async fn test_db() -> anyhow::Result<Option<DatabaseConnection>> {
    if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() {
        return Ok(None);
    }
    MIGRATED
        .get_or_try_init(|| async {
            let db = connect().await?;
            migration::Migrator::up(&db, None).await?;
            Ok::<(), anyhow::Error>(())
        })
        .await?;
    Ok(Some(connect().await?))
}
