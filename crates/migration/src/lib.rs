pub use sea_orm_migration::prelude::*;

mod m20260204_000001_managers_and_parcels;
mod m20260204_000002_developers;
mod m20260205_000003_parcels_developers;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260204_000001_managers_and_parcels::Migration),
            Box::new(m20260204_000002_developers::Migration),
            Box::new(m20260205_000003_parcels_developers::Migration),
        ]
    }
}
