//! Repositories.
//!
//! Reads go through the repository's own connection. Writes take a
//! [`sea_orm::ConnectionTrait`] so callers can run them inside a transaction.

mod document;
mod document_collaborator;
mod document_share;
mod document_version;
mod folder;
mod media_attachment;
mod user;

pub use document::{DocumentFilter, DocumentRepository};
pub use document_collaborator::DocumentCollaboratorRepository;
pub use document_share::DocumentShareRepository;
pub use document_version::DocumentVersionRepository;
pub use folder::FolderRepository;
pub use media_attachment::MediaAttachmentRepository;
pub use user::UserRepository;
