//! Keys and paths for addressing values inside a tree.

use std::fmt;

use crate::value::Value;

/// A single step used to address a child inside a container.
///
/// Records are addressed by property name, sequences by position, and sets
/// and maps by member value. [`Key::Len`] is the pseudo-key used by sequence
/// length-adjustment patches; it never addresses a stored child.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Record property name.
    Prop(String),
    /// Sequence position.
    Index(usize),
    /// Map key or set member.
    Item(Value),
    /// Sequence length pseudo-key.
    Len,
}

/// A path from the root of a value tree down to one of its children.
pub type Path = Vec<Key>;

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Prop(s) => write!(f, "{s}"),
            Key::Index(i) => write!(f, "{i}"),
            Key::Item(v) => write!(f, "{v}"),
            Key::Len => write!(f, "length"),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Prop(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Prop(s)
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i)
    }
}

impl From<Value> for Key {
    fn from(v: Value) -> Self {
        Key::Item(v)
    }
}

/// Render a path as a pointer-style string, one `/` per step.
///
/// The empty path renders as the empty string. This is a diagnostic
/// rendering, not a wire format; step text is not escaped.
///
/// # Example
///
/// ```
/// use drafty_value::key::{format_path, Key};
///
/// assert_eq!(format_path(&[]), "");
/// assert_eq!(format_path(&[Key::from("a"), Key::from(0)]), "/a/0");
/// ```
pub fn format_path(path: &[Key]) -> String {
    let mut out = String::new();
    for key in path {
        out.push('/');
        out.push_str(&key.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_variants() {
        assert_eq!(Key::from("done").to_string(), "done");
        assert_eq!(Key::from(3).to_string(), "3");
        assert_eq!(Key::Len.to_string(), "length");
    }

    #[test]
    fn path_rendering() {
        let path = vec![Key::from("todos"), Key::from(1), Key::from("done")];
        assert_eq!(format_path(&path), "/todos/1/done");
    }
}
