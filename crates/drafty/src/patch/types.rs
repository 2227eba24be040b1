//! Core types for the patch module.

use thiserror::Error;

use drafty_value::{format_path, Value};

pub use drafty_value::{Key, Path};

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum PatchError {
    #[error("NOT_FOUND")]
    NotFound,
    #[error("INVALID_INDEX")]
    InvalidIndex,
    #[error("INVALID_TARGET")]
    InvalidTarget,
}

// ── Patch enum ────────────────────────────────────────────────────────────

/// A single edit operation with a path from the root of the document.
///
/// A `Replace` whose path ends in [`Key::Len`] adjusts a sequence's length
/// instead of replacing an element; the generator emits it when a sequence
/// shrank so the patch count stays proportional to the edit, not to the
/// sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    Add { path: Path, value: Value },
    Replace { path: Path, value: Value },
    Remove { path: Path },
}

impl Patch {
    /// Returns the operation name string.
    pub fn op_name(&self) -> &'static str {
        match self {
            Patch::Add { .. } => "add",
            Patch::Replace { .. } => "replace",
            Patch::Remove { .. } => "remove",
        }
    }

    /// Returns the path of the operation.
    pub fn path(&self) -> &[Key] {
        match self {
            Patch::Add { path, .. } => path,
            Patch::Replace { path, .. } => path,
            Patch::Remove { path } => path,
        }
    }

    /// Returns the carried value for `add`/`replace`.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Patch::Add { value, .. } => Some(value),
            Patch::Replace { value, .. } => Some(value),
            Patch::Remove { .. } => None,
        }
    }

    /// True when this operation substitutes the entire document.
    pub fn is_root_replace(&self) -> bool {
        matches!(self, Patch::Replace { path, .. } if path.is_empty())
    }
}

impl std::fmt::Display for Patch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Patch::Add { path, value } => write!(f, "add {} {value}", format_path(path)),
            Patch::Replace { path, value } => {
                write!(f, "replace {} {value}", format_path(path))
            }
            Patch::Remove { path } => write!(f, "remove {}", format_path(path)),
        }
    }
}
