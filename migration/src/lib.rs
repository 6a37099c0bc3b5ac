pub use sea_orm_migration::prelude::*;

mod m20261002_000001_create_customers;
mod m20261002_000002_create_checklist_deadline_settings;
mod m20261002_000003_create_checklists;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261002_000001_create_customers::Migration),
            Box::new(m20261002_000002_create_checklist_deadline_settings::Migration),
            Box::new(m20261002_000003_create_checklists::Migration),
        ]
    }
}
