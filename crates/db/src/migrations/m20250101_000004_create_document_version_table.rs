//! Create `document_version` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DocumentVersion::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DocumentVersion::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DocumentVersion::DocumentId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentVersion::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentVersion::VersionNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentVersion::Title)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(DocumentVersion::Content).text().not_null())
                    .col(
                        ColumnDef::new(DocumentVersion::RenderedHtml)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentVersion::Size)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentVersion::WordCount)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentVersion::CharCount)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DocumentVersion::ChangeSummary).text().null())
                    .col(
                        ColumnDef::new(DocumentVersion::Operation)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentVersion::IsAutoSave)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DocumentVersion::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_version_document")
                            .from(DocumentVersion::Table, DocumentVersion::DocumentId)
                            .to(Document::Table, Document::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_version_user")
                            .from(DocumentVersion::Table, DocumentVersion::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (document_id, version_number) - two writers that
        // allocate the same number collide here instead of both succeeding
        manager
            .create_index(
                Index::create()
                    .name("idx_document_version_document_number")
                    .table(DocumentVersion::Table)
                    .col(DocumentVersion::DocumentId)
                    .col(DocumentVersion::VersionNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DocumentVersion::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DocumentVersion {
    Table,
    Id,
    DocumentId,
    UserId,
    VersionNumber,
    Title,
    Content,
    RenderedHtml,
    Size,
    WordCount,
    CharCount,
    ChangeSummary,
    Operation,
    IsAutoSave,
    CreatedAt,
}

#[derive(Iden)]
enum Document {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
