//! drafty — produce immutable state updates by mutating a temporary draft.
//!
//! A producer call wraps a base value in a draft, hands the draft to a
//! recipe for ordinary, direct mutation, and finalizes the result into a
//! new immutable value that shares every untouched subtree with the base.
//! Copies are made lazily, once per mutated node, no matter how many reads
//! and writes touch it; the same finalization walk can emit a forward and
//! inverse edit log for replay with [`apply_patches`].
//!
//! # Example
//!
//! ```
//! use drafty::{produce, value, Key};
//!
//! let base = value!([
//!     {"todo": "a", "done": true},
//!     {"todo": "b", "done": false},
//! ]);
//!
//! let next = produce(&base, |d| {
//!     d.push(value!({"todo": "c"}))?;
//!     d.child(1)?.set("done", true)?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! assert_eq!(next.len(), Some(3));
//! // The untouched element is shared with the base, by reference.
//! let kept = next.get(&Key::from(0)).cloned().unwrap();
//! let orig = base.get(&Key::from(0)).cloned().unwrap();
//! assert!(kept.same(&orig));
//! // The base itself is unchanged.
//! assert_eq!(base.len(), Some(2));
//! ```

pub mod draft;
pub mod error;
mod finalize;
pub mod patch;
pub mod producer;
mod scope;

pub use draft::Draft;
pub use error::DraftError;
pub use patch::{apply_op, Patch, PatchError};
pub use producer::{
    apply_patches, create_draft, finish_draft, finish_draft_with_patches, produce,
    produce_with_patches, ManualDraft, Outcome, Producer,
};
pub use scope::CopyStrategy;

// Re-export the data model so downstream code needs a single dependency.
pub use drafty_value::{
    format_path, freeze, from_json, is_frozen, to_json, Key, Kind, Number, Path, Value, ValueError,
    ValueMap, ValueObject, ValueSet,
};
pub use drafty_value::value;
