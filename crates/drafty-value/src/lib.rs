//! drafty-value — immutable value tree with structural sharing.
//!
//! The data model for the `drafty` producer engine: reference-counted
//! records, sequences, sets, and maps over opaque scalars, with cheap
//! clones, pointer-identity comparison ([`Value::same`]), host-level
//! freezing, a [`value!`] literal macro, and a JSON interchange codec.
//!
//! # Example
//!
//! ```
//! use drafty_value::{value, Key};
//!
//! let state = value!({"todos": [{"title": "a", "done": false}]});
//! let todos = state.get(&Key::from("todos")).cloned().unwrap();
//! assert_eq!(todos.len(), Some(1));
//! ```

pub mod error;
pub mod freeze;
pub mod json;
pub mod key;
mod macros;
pub mod number;
pub mod value;

pub use error::ValueError;
pub use freeze::{freeze, is_frozen};
pub use json::{from_json, to_json};
pub use key::{format_path, Key, Path};
pub use number::Number;
pub use value::{Kind, Sealed, Value, ValueMap, ValueObject, ValueSet};
