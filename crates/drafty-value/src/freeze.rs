//! Host-level freezing.
//!
//! Freezing flips an immutability bit carried inside a container's shared
//! payload: every clone that still shares the payload observes it, and the
//! checked editing API on [`Value`] fails with [`ValueError::Frozen`]
//! afterwards. Payload copies (for example the one-level copy a draft makes
//! before its first write) start life thawed.
//!
//! [`ValueError::Frozen`]: crate::ValueError::Frozen

use crate::value::Value;

/// Freeze a value. With `deep`, every draftable descendant reachable by
/// enumeration is frozen too. Scalars and already-frozen values are
/// skipped; an already-frozen container also terminates a deep walk, since
/// a frozen value cannot reach a thawed one that matters for safety.
///
/// # Example
///
/// ```
/// use drafty_value::{freeze, value, Key, Value};
///
/// let mut v = value!({"a": [1]});
/// freeze(&v, true);
/// assert!(v.is_frozen());
/// assert!(v.insert(Key::from("b"), Value::Null).is_err());
/// ```
pub fn freeze(value: &Value, deep: bool) {
    if !value.is_draftable() || value.is_frozen() {
        return;
    }
    value.mark_frozen();
    if deep {
        for key in value.keys() {
            if let Some(child) = value.get(&key) {
                freeze(child, true);
            }
        }
    }
}

/// Whether a value is frozen. Scalars are inherently immutable and always
/// report `true`.
pub fn is_frozen(value: &Value) -> bool {
    value.is_frozen()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;
    use crate::value;

    #[test]
    fn shallow_freeze_leaves_children_thawed() {
        let v = value!({"child": {"x": 1}});
        freeze(&v, false);
        assert!(is_frozen(&v));
        let child = v.get(&Key::from("child")).cloned().unwrap();
        assert!(!is_frozen(&child));
    }

    #[test]
    fn deep_freeze_reaches_descendants() {
        let v = value!({"child": {"grand": [1, 2]}});
        freeze(&v, true);
        let child = v.get(&Key::from("child")).cloned().unwrap();
        let grand = child.get(&Key::from("grand")).cloned().unwrap();
        assert!(is_frozen(&child));
        assert!(is_frozen(&grand));
    }

    #[test]
    fn scalars_are_always_frozen() {
        assert!(is_frozen(&value!(42)));
        assert!(is_frozen(&value!(null)));
    }

    #[test]
    fn copies_are_born_thawed() {
        let v = value!([1, 2]);
        freeze(&v, true);
        assert!(!v.shallow_copy().is_frozen());
    }
}
