//! Sea-ORM migrations for the photo-store schema
//!
//! The number of applied migrations is the schema version. Later migrations
//! may only add or change indexes; stored rows must survive every upgrade.

pub use sea_orm_migration::prelude::*;

mod m20211125_000001_create_photostate_table;
mod m20211210_000001_add_expiration_index;

/// Schema version reached once every migration has run
pub const SCHEMA_VERSION: usize = 2;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20211125_000001_create_photostate_table::Migration),
            Box::new(m20211210_000001_add_expiration_index::Migration),
        ]
    }
}
