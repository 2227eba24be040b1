//! Patch application.
//!
//! Operations mutate a working document in place. Because the value tree is
//! reference-counted, the navigation helpers clone only the spine they
//! touch, so applying a patch to a clone of a shared document preserves
//! structural sharing with the original for everything the patch misses.

use drafty_value::{Key, Kind, Number, Value};

use super::types::{Patch, PatchError};

// ── Path navigation ───────────────────────────────────────────────────────

/// Mutable navigation to the value at `path` (must exist).
fn get_mut_at<'a>(doc: &'a mut Value, path: &[Key]) -> Result<&'a mut Value, PatchError> {
    let mut cur = doc;
    for key in path {
        cur = Value::get_mut(cur, key).ok_or(PatchError::NotFound)?;
    }
    Ok(cur)
}

// ── Individual operation applicators ──────────────────────────────────────

fn apply_add(doc: &mut Value, path: &[Key], value: Value) -> Result<(), PatchError> {
    if path.is_empty() {
        *doc = value;
        return Ok(());
    }
    let (parent_path, key) = path.split_at(path.len() - 1);
    let key = &key[0];
    let parent = get_mut_at(doc, parent_path)?;
    match (parent.kind(), key) {
        (Kind::Object, Key::Prop(s)) => {
            if let Some(o) = parent.as_object_mut() {
                o.insert(s.clone(), value);
            }
            Ok(())
        }
        (Kind::Map, Key::Prop(s)) => {
            if let Some(m) = parent.as_map_mut() {
                m.insert(Value::from(s.as_str()), value);
            }
            Ok(())
        }
        (Kind::Map, Key::Item(k)) => {
            if let Some(m) = parent.as_map_mut() {
                m.insert(k.clone(), value);
            }
            Ok(())
        }
        (Kind::Array, Key::Index(i)) => {
            let i = *i;
            match parent.as_array_mut() {
                Some(arr) if i <= arr.len() => {
                    arr.insert(i, value);
                    Ok(())
                }
                _ => Err(PatchError::InvalidIndex),
            }
        }
        (Kind::Set, Key::Item(_)) => {
            if let Some(s) = parent.as_set_mut() {
                s.insert(value);
            }
            Ok(())
        }
        _ => Err(PatchError::InvalidTarget),
    }
}

fn apply_remove(doc: &mut Value, path: &[Key]) -> Result<Option<Value>, PatchError> {
    if path.is_empty() {
        return Err(PatchError::InvalidTarget);
    }
    let (parent_path, key) = path.split_at(path.len() - 1);
    let key = &key[0];
    let parent = get_mut_at(doc, parent_path)?;
    match (parent.kind(), key) {
        (Kind::Object, Key::Prop(s)) => parent
            .as_object_mut()
            .and_then(|o| o.shift_remove(s))
            .ok_or(PatchError::NotFound)
            .map(Some),
        (Kind::Map, Key::Prop(s)) => parent
            .as_map_mut()
            .and_then(|m| m.shift_remove(&Value::from(s.as_str())))
            .ok_or(PatchError::NotFound)
            .map(Some),
        (Kind::Map, Key::Item(k)) => parent
            .as_map_mut()
            .and_then(|m| m.shift_remove(k))
            .ok_or(PatchError::NotFound)
            .map(Some),
        (Kind::Set, Key::Item(k)) => parent
            .as_set_mut()
            .and_then(|s| s.shift_take(k))
            .ok_or(PatchError::NotFound)
            .map(Some),
        (Kind::Array, Key::Index(i)) => {
            let i = *i;
            match parent.as_array_mut() {
                Some(arr) if i < arr.len() => Ok(Some(arr.remove(i))),
                _ => Err(PatchError::NotFound),
            }
        }
        _ => Err(PatchError::InvalidTarget),
    }
}

fn apply_replace(doc: &mut Value, path: &[Key], value: Value) -> Result<(), PatchError> {
    if path.is_empty() {
        *doc = value;
        return Ok(());
    }
    let (parent_path, key) = path.split_at(path.len() - 1);
    let key = &key[0];
    if matches!(key, Key::Len) {
        return apply_set_len(doc, parent_path, &value);
    }
    let parent = get_mut_at(doc, parent_path)?;
    if !parent.has(key) {
        return Err(PatchError::NotFound);
    }
    match parent.get_mut(key) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        // Set members are not addressable in place.
        None => Err(PatchError::InvalidTarget),
    }
}

/// Length adjustment for sequences: truncate when shrinking, pad with
/// `null` when growing.
fn apply_set_len(doc: &mut Value, seq_path: &[Key], value: &Value) -> Result<(), PatchError> {
    let new_len = match value {
        Value::Number(Number::Int(i)) if *i >= 0 => *i as usize,
        _ => return Err(PatchError::InvalidTarget),
    };
    let target = get_mut_at(doc, seq_path)?;
    match target.as_array_mut() {
        Some(arr) => {
            if new_len <= arr.len() {
                arr.truncate(new_len);
            } else {
                arr.resize(new_len, Value::Null);
            }
            Ok(())
        }
        None => Err(PatchError::InvalidTarget),
    }
}

// ── Main apply functions ──────────────────────────────────────────────────

/// Apply a single operation to the document (in-place mutation).
pub fn apply_op(doc: &mut Value, patch: &Patch) -> Result<(), PatchError> {
    match patch {
        Patch::Add { path, value } => apply_add(doc, path, value.clone()),
        Patch::Replace { path, value } => apply_replace(doc, path, value.clone()),
        Patch::Remove { path } => apply_remove(doc, path).map(|_| ()),
    }
}

/// Replay a patch list against `base`, returning the resulting document.
///
/// A zero-length-path `replace` is a full-state substitution: the scan
/// starts from the last such operation and earlier patches are skipped.
pub fn apply_patch(base: &Value, patches: &[Patch]) -> Result<Value, PatchError> {
    let mut doc = base.clone();
    let mut start = 0;
    for (i, patch) in patches.iter().enumerate().rev() {
        if patch.is_root_replace() {
            if let Some(value) = patch.value() {
                doc = value.clone();
            }
            start = i + 1;
            break;
        }
    }
    for patch in &patches[start..] {
        apply_op(&mut doc, patch)?;
    }
    Ok(doc)
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use drafty_value::value;

    fn prop(s: &str) -> Key {
        Key::from(s)
    }

    #[test]
    fn add_to_record() {
        let mut doc = value!({"a": 1});
        apply_op(
            &mut doc,
            &Patch::Add {
                path: vec![prop("b")],
                value: value!(2),
            },
        )
        .unwrap();
        assert_eq!(doc, value!({"a": 1, "b": 2}));
    }

    #[test]
    fn add_into_sequence_shifts() {
        let mut doc = value!([1, 2, 3]);
        apply_op(
            &mut doc,
            &Patch::Add {
                path: vec![Key::Index(1)],
                value: value!(99),
            },
        )
        .unwrap();
        assert_eq!(doc, value!([1, 99, 2, 3]));
    }

    #[test]
    fn add_at_len_appends() {
        let mut doc = value!([1, 2]);
        apply_op(
            &mut doc,
            &Patch::Add {
                path: vec![Key::Index(2)],
                value: value!(3),
            },
        )
        .unwrap();
        assert_eq!(doc, value!([1, 2, 3]));
    }

    #[test]
    fn remove_from_record() {
        let mut doc = value!({"a": 1, "b": 2});
        apply_op(&mut doc, &Patch::Remove { path: vec![prop("a")] }).unwrap();
        assert_eq!(doc, value!({"b": 2}));
    }

    #[test]
    fn remove_missing_reports_not_found() {
        let mut doc = value!({"a": 1});
        let err = apply_op(&mut doc, &Patch::Remove { path: vec![prop("z")] }).unwrap_err();
        assert_eq!(err, PatchError::NotFound);
    }

    #[test]
    fn replace_nested_value() {
        let mut doc = value!({"a": {"b": 1}});
        apply_op(
            &mut doc,
            &Patch::Replace {
                path: vec![prop("a"), prop("b")],
                value: value!(9),
            },
        )
        .unwrap();
        assert_eq!(doc, value!({"a": {"b": 9}}));
    }

    #[test]
    fn replace_requires_an_existing_slot() {
        let mut doc = value!({"a": 1});
        let err = apply_op(
            &mut doc,
            &Patch::Replace {
                path: vec![prop("z")],
                value: value!(0),
            },
        )
        .unwrap_err();
        assert_eq!(err, PatchError::NotFound);
    }

    #[test]
    fn length_replace_truncates() {
        let mut doc = value!([1, 2, 3, 4]);
        apply_op(
            &mut doc,
            &Patch::Replace {
                path: vec![Key::Len],
                value: value!(2),
            },
        )
        .unwrap();
        assert_eq!(doc, value!([1, 2]));
    }

    #[test]
    fn root_replace_short_circuits() {
        let doc = value!({"a": 1});
        let patches = vec![
            Patch::Add {
                path: vec![prop("ignored")],
                value: value!(0),
            },
            Patch::Replace {
                path: vec![],
                value: value!({"fresh": true}),
            },
            Patch::Add {
                path: vec![prop("b")],
                value: value!(2),
            },
        ];
        let out = apply_patch(&doc, &patches).unwrap();
        assert_eq!(out, value!({"fresh": true, "b": 2}));
    }

    #[test]
    fn applying_shares_untouched_structure() {
        let doc = value!({"touched": {"x": 1}, "kept": {"y": 2}});
        let out = apply_patch(
            &doc,
            &[Patch::Replace {
                path: vec![prop("touched"), prop("x")],
                value: value!(5),
            }],
        )
        .unwrap();
        let kept_before = doc.get(&prop("kept")).cloned().unwrap();
        let kept_after = out.get(&prop("kept")).cloned().unwrap();
        assert!(kept_before.same(&kept_after));
    }
}
