use sea_orm_migration::prelude::*;

mod m20261001_000001_credentials;
mod m20261003_000002_student_modules;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_credentials::Migration),
            Box::new(m20261003_000002_student_modules::Migration),
        ]
    }
}
