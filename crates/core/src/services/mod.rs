//! Business logic services.

#![allow(missing_docs)]

pub mod document;
pub mod document_version;
pub mod folder;
pub mod purge;
pub mod trash;

pub use document::{
    CreateDocumentInput, DocumentService, DuplicateDocumentInput, UpdateDocumentInput,
    normalize_tags, slugify,
};
pub use document_version::{
    DocumentVersionService, Snapshot, VersionComparison, VersionDiff, compare_versions,
};
pub use folder::{CreateFolderInput, FolderService, TrashedTree};
pub use purge::{FolderPurge, PurgedDocument, Purger};
pub use trash::{SweepReport, TrashService, retention_cutoff, sweepable_folders};

use serde::{Deserialize, Deserializer};

/// Page of a listing, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

impl PageRequest {
    /// Upper bound on `per_page`.
    pub const MAX_PER_PAGE: u64 = 100;

    #[must_use]
    pub const fn new(page: u64, per_page: u64) -> Self {
        Self { page, per_page }
    }

    /// Rows per page, clamped to `1..=MAX_PER_PAGE`.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.per_page.clamp(1, Self::MAX_PER_PAGE)
    }

    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page.max(1).saturating_sub(1).saturating_mul(self.limit())
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(default_page(), default_per_page())
    }
}

const fn default_page() -> u64 {
    1
}

const fn default_per_page() -> u64 {
    20
}

/// Deserialize a field that distinguishes "absent" from "null".
///
/// Use with `#[serde(default)]` on an `Option<Option<T>>`: a missing key
/// stays `None`, an explicit `null` becomes `Some(None)`.
pub(crate) fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
