use sea_orm_migration::prelude::*;

mod m001_create_security_tables;
mod m002_create_registry_tables;
mod m003_create_mutation_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m001_create_security_tables::Migration),
            Box::new(m002_create_registry_tables::Migration),
            Box::new(m003_create_mutation_tables::Migration),
        ]
    }
}
