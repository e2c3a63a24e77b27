//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_user_table;
mod m20250101_000002_create_folder_table;
mod m20250101_000003_create_document_table;
mod m20250101_000004_create_document_version_table;
mod m20250101_000005_create_document_share_table;
mod m20250101_000006_create_document_collaborator_table;
mod m20250101_000007_create_media_attachment_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_user_table::Migration),
            Box::new(m20250101_000002_create_folder_table::Migration),
            Box::new(m20250101_000003_create_document_table::Migration),
            Box::new(m20250101_000004_create_document_version_table::Migration),
            Box::new(m20250101_000005_create_document_share_table::Migration),
            Box::new(m20250101_000006_create_document_collaborator_table::Migration),
            Box::new(m20250101_000007_create_media_attachment_table::Migration),
        ]
    }
}
