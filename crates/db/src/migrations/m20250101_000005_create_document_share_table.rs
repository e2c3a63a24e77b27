//! Create `document_share` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DocumentShare::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DocumentShare::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DocumentShare::DocumentId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentShare::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentShare::Token)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(DocumentShare::Permission)
                            .string_len(16)
                            .not_null()
                            .default("view"),
                    )
                    .col(
                        ColumnDef::new(DocumentShare::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DocumentShare::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_share_document")
                            .from(DocumentShare::Table, DocumentShare::DocumentId)
                            .to(Document::Table, Document::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_document_share_document_id")
                    .table(DocumentShare::Table)
                    .col(DocumentShare::DocumentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DocumentShare::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DocumentShare {
    Table,
    Id,
    DocumentId,
    UserId,
    Token,
    Permission,
    ExpiresAt,
    CreatedAt,
}

#[derive(Iden)]
enum Document {
    Table,
    Id,
}
