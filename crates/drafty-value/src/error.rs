//! Errors for value-level editing operations.

use thiserror::Error;

use crate::value::Kind;

/// Error returned by the checked editing operations on [`crate::Value`].
#[derive(Debug, Error, PartialEq)]
pub enum ValueError {
    /// The container was frozen; frozen values refuse all edits.
    #[error("value is frozen and can no longer be mutated")]
    Frozen,

    /// The operation does not apply to this kind of value.
    #[error("{op} is not supported on a {kind} value")]
    WrongKind { op: &'static str, kind: Kind },

    /// A sequence index was out of range.
    #[error("index {index} is out of bounds (len {len})")]
    OutOfBounds { index: usize, len: usize },

    /// A map key was not a string, so the value has no JSON representation.
    #[error("map keys must be strings to be represented as JSON")]
    NonStringKey,
}
