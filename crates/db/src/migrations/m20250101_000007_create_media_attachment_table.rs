//! Create `media_attachment` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MediaAttachment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MediaAttachment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MediaAttachment::DocumentId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MediaAttachment::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MediaAttachment::FileName)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MediaAttachment::StorageKey)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MediaAttachment::ContentType)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MediaAttachment::Size)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MediaAttachment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_media_attachment_document")
                            .from(MediaAttachment::Table, MediaAttachment::DocumentId)
                            .to(Document::Table, Document::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_media_attachment_document_id")
                    .table(MediaAttachment::Table)
                    .col(MediaAttachment::DocumentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MediaAttachment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum MediaAttachment {
    Table,
    Id,
    DocumentId,
    UserId,
    FileName,
    StorageKey,
    ContentType,
    Size,
    CreatedAt,
}

#[derive(Iden)]
enum Document {
    Table,
    Id,
}
