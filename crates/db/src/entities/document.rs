//! Document entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Publication status of a document.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[sea_orm(string_value = "draft")]
    #[default]
    Draft,
    #[sea_orm(string_value = "published")]
    Published,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "document")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owner user ID
    #[sea_orm(indexed)]
    pub user_id: String,

    /// Containing folder (null for the top level)
    #[sea_orm(nullable, indexed)]
    pub folder_id: Option<String>,

    pub title: String,

    /// URL slug, derived from the title and the ID
    pub slug: String,

    /// Raw Markdown
    #[sea_orm(column_type = "Text")]
    pub content: String,

    #[sea_orm(column_type = "Text")]
    pub rendered_html: String,

    /// Content length in bytes
    pub size: i64,

    pub word_count: i32,

    pub char_count: i32,

    /// Number of the latest version
    pub version_number: i32,

    /// Tags (JSON array of strings)
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,

    pub status: DocumentStatus,

    #[sea_orm(default_value = false)]
    pub is_favorite: bool,

    #[sea_orm(default_value = false)]
    pub is_archived: bool,

    #[sea_orm(default_value = false)]
    pub is_trashed: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,

    /// Set when the document is moved to the trash
    #[sea_orm(nullable, indexed)]
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Tags as plain strings.
    #[must_use]
    pub fn tag_list(&self) -> Vec<String> {
        serde_json::from_value(self.tags.clone()).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::folder::Entity",
        from = "Column::FolderId",
        to = "super::folder::Column::Id",
        on_delete = "SetNull"
    )]
    Folder,

    #[sea_orm(has_many = "super::document_version::Entity")]
    Versions,

    #[sea_orm(has_many = "super::document_share::Entity")]
    Shares,

    #[sea_orm(has_many = "super::document_collaborator::Entity")]
    Collaborators,

    #[sea_orm(has_many = "super::media_attachment::Entity")]
    Attachments,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::folder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Folder.def()
    }
}

impl Related<super::document_version::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Versions.def()
    }
}

impl Related<super::document_share::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shares.def()
    }
}

impl Related<super::document_collaborator::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Collaborators.def()
    }
}

impl Related<super::media_attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl crate::trash::SoftDeletable for Entity {
    fn deleted_at_column() -> Self::Column {
        Column::DeletedAt
    }
}
