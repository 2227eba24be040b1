//! Usage errors for the draft engine.
//!
//! Everything here is a usage error in the sense of the producer contract:
//! reported immediately, never retried internally, and fatal to the
//! producer call that triggered it (the owning session is revoked before
//! the error reaches the caller).

use thiserror::Error;

use drafty_value::{Key, Kind, ValueError};

/// Errors surfaced by draft operations and finalization.
#[derive(Debug, Error, PartialEq)]
pub enum DraftError {
    /// The draft's session has ended; drafts are only usable inside the
    /// producer call that created them.
    #[error("draft was revoked; drafts are only usable inside their producer session")]
    Revoked,

    /// A recipe returned a replacement value after also mutating its draft.
    #[error("recipe returned a replacement value and also modified its draft; either return a new value or modify the draft")]
    ReplacedAndMutated,

    /// A value was found to contain itself during finalization.
    #[error("self-referencing values are not supported")]
    CircularReference,

    /// Manual drafts require a draftable base.
    #[error("cannot draft a {0} value; drafts require a record, sequence, set, or map")]
    NotDraftable(Kind),

    /// The operation does not apply to this kind of draft.
    #[error("{op} is not supported on a {kind} draft")]
    KindMismatch { op: &'static str, kind: Kind },

    /// The key cannot address this kind of draft (for example a property
    /// name used against a sequence).
    #[error("key {key} cannot address a {kind} draft")]
    InvalidKey { key: Key, kind: Kind },

    /// A sequence index was out of range.
    #[error("index {index} is out of bounds (len {len})")]
    OutOfBounds { index: usize, len: usize },

    /// No child exists at the requested key.
    #[error("no value at key {0}")]
    Missing(Key),

    /// A value-level edit failed.
    #[error(transparent)]
    Value(#[from] ValueError),
}
