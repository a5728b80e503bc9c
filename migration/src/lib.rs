pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_organizations;
mod m20250301_000002_create_students;
mod m20250301_000003_create_classes;
mod m20250301_000004_create_credit_events;
mod m20250315_000001_create_financial_transactions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_organizations::Migration),
            Box::new(m20250301_000002_create_students::Migration),
            Box::new(m20250301_000003_create_classes::Migration),
            Box::new(m20250301_000004_create_credit_events::Migration),
            Box::new(m20250315_000001_create_financial_transactions::Migration),
        ]
    }
}
