pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_tariffs_table;
mod m20250301_000002_create_parties_table;
mod m20250301_000003_create_orders_table;
mod m20250301_000004_create_reservations_table;
mod m20250301_000005_create_system_settings_table;
mod m20250305_000001_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_tariffs_table::Migration),
            Box::new(m20250301_000002_create_parties_table::Migration),
            Box::new(m20250301_000003_create_orders_table::Migration),
            Box::new(m20250301_000004_create_reservations_table::Migration),
            Box::new(m20250301_000005_create_system_settings_table::Migration),
            Box::new(m20250305_000001_add_indexes::Migration),
        ]
    }
}
