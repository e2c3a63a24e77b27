//! Create `document_collaborator` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DocumentCollaborator::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DocumentCollaborator::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DocumentCollaborator::DocumentId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentCollaborator::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentCollaborator::Role)
                            .string_len(16)
                            .not_null()
                            .default("viewer"),
                    )
                    .col(
                        ColumnDef::new(DocumentCollaborator::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_collaborator_document")
                            .from(DocumentCollaborator::Table, DocumentCollaborator::DocumentId)
                            .to(Document::Table, Document::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_collaborator_user")
                            .from(DocumentCollaborator::Table, DocumentCollaborator::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (document_id, user_id) - one role per user per document
        manager
            .create_index(
                Index::create()
                    .name("idx_document_collaborator_document_user")
                    .table(DocumentCollaborator::Table)
                    .col(DocumentCollaborator::DocumentId)
                    .col(DocumentCollaborator::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DocumentCollaborator::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum DocumentCollaborator {
    Table,
    Id,
    DocumentId,
    UserId,
    Role,
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
