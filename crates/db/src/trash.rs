//! Explicit soft-delete scopes.
//!
//! Trashed rows are never hidden implicitly. Every repository query over a
//! soft-deletable entity takes a [`TrashScope`] and applies it here.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Select};
use serde::{Deserialize, Serialize};

/// An entity whose rows carry a nullable `deleted_at` timestamp.
pub trait SoftDeletable: EntityTrait {
    /// The `deleted_at` column.
    fn deleted_at_column() -> Self::Column;
}

/// Which rows a query sees with respect to the trash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrashScope {
    /// Only rows that are not in the trash.
    #[default]
    ExcludeTrashed,
    /// All rows.
    WithTrashed,
    /// Only rows that are in the trash.
    OnlyTrashed,
}

impl TrashScope {
    /// Restrict a select to this scope.
    #[must_use]
    pub fn apply<E: SoftDeletable>(self, select: Select<E>) -> Select<E> {
        let column = E::deleted_at_column();
        match self {
            Self::ExcludeTrashed => select.filter(column.is_null()),
            Self::WithTrashed => select,
            Self::OnlyTrashed => select.filter(column.is_not_null()),
        }
    }

    /// Whether a row with the given `deleted_at` is visible in this scope.
    #[must_use]
    pub const fn admits<T>(self, deleted_at: Option<&T>) -> bool {
        match self {
            Self::ExcludeTrashed => deleted_at.is_none(),
            Self::WithTrashed => true,
            Self::OnlyTrashed => deleted_at.is_some(),
        }
    }
}
