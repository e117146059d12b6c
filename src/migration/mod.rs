//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_updated_at_trigger;
mod m20260301_000002_create_users;
mod m20260301_000003_create_roles;
mod m20260301_000004_create_models;
mod m20260301_000005_create_collects;
mod m20260301_000006_create_visit_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_updated_at_trigger::Migration),
            Box::new(m20260301_000002_create_users::Migration),
            Box::new(m20260301_000003_create_roles::Migration),
            Box::new(m20260301_000004_create_models::Migration),
            Box::new(m20260301_000005_create_collects::Migration),
            Box::new(m20260301_000006_create_visit_logs::Migration),
        ]
    }
}
