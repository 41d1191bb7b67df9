//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_user;
mod m20250301_000002_create_user_credentials;
mod m20250301_000003_create_session;
mod m20250301_000004_create_task;
mod m20250301_000005_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_user::Migration),
            Box::new(m20250301_000002_create_user_credentials::Migration),
            Box::new(m20250301_000003_create_session::Migration),
            Box::new(m20250301_000004_create_task::Migration),
            // Indexes should always be applied last
            Box::new(m20250301_000005_add_indexes::Migration),
        ]
    }
}
