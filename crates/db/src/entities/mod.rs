//! Database entities.

pub mod document;
pub mod document_collaborator;
pub mod document_share;
pub mod document_version;
pub mod folder;
pub mod media_attachment;
pub mod user;

pub use document::Entity as Document;
pub use document_collaborator::Entity as DocumentCollaborator;
pub use document_share::Entity as DocumentShare;
pub use document_version::Entity as DocumentVersion;
pub use folder::Entity as Folder;
pub use media_attachment::Entity as MediaAttachment;
pub use user::Entity as User;
