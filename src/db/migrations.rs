pub mod m0001_stock_items;
pub mod m0002_customers;
pub mod m0003_companies;
pub mod m0004_assignments;
pub mod m0005_maintenance_items;

use sea_orm_migration::prelude::*;

pub struct Migrator;

impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m0001_stock_items::Migration),
            Box::new(m0002_customers::Migration),
            Box::new(m0003_companies::Migration),
            Box::new(m0004_assignments::Migration),
            Box::new(m0005_maintenance_items::Migration),
        ]
    }
}
