//! Edit-log patches: generation and replay.
//!
//! A producer session can derive a forward/inverse operation log from the
//! same walk that finalizes the draft tree. Applying the forward list in
//! order to the original base reproduces the finalized output; applying
//! the inverse list in reverse order to the output reproduces the base.
//!
//! # Operations
//!
//! `add`, `replace`, `remove`, each carrying a path of [`Key`]s from the
//! document root. A zero-length-path `replace` substitutes the whole
//! document; a `replace` path ending in [`Key::Len`] adjusts a sequence's
//! length.

pub mod apply;
pub(crate) mod generate;
pub mod types;

pub use apply::{apply_op, apply_patch};
pub use types::{Key, Patch, PatchError, Path};
