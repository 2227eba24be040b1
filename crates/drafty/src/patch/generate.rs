//! Patch generation.
//!
//! Called by the finalizer for each modified node, outer nodes first, with
//! the node's path from the session root. Records and maps diff the keys
//! the session touched; sequences diff positionally and collapse a shrink
//! into a single length replace; sets are replaced atomically, since their
//! members have no stable address.
//!
//! Inverse operations are emitted so that applying the inverse list in
//! reverse order to the output reproduces the base exactly.

use std::collections::HashSet;

use indexmap::IndexMap;

use drafty_value::{Key, Kind, Path, Value};

use super::types::Patch;

/// `deep_covered` lists sequence positions already described by a child
/// draft's deep operations; the positional diff skips them.
pub(crate) fn generate_patches(
    base: &Value,
    copy: &Value,
    assigned: &IndexMap<Key, bool>,
    deep_covered: &HashSet<usize>,
    path: &[Key],
    patches: &mut Vec<Patch>,
    inverse: &mut Vec<Patch>,
) {
    match base.kind() {
        Kind::Array => generate_sequence_patches(base, copy, deep_covered, path, patches, inverse),
        Kind::Set => generate_set_patches(base, copy, path, patches, inverse),
        _ => generate_record_patches(base, copy, assigned, path, patches, inverse),
    }
}

fn join(path: &[Key], key: &Key) -> Path {
    let mut joined = path.to_vec();
    joined.push(key.clone());
    joined
}

/// Keyed containers: one operation per touched key that actually changed.
fn generate_record_patches(
    base: &Value,
    copy: &Value,
    assigned: &IndexMap<Key, bool>,
    path: &[Key],
    patches: &mut Vec<Patch>,
    inverse: &mut Vec<Patch>,
) {
    for (key, exists) in assigned {
        let orig = base.get(key);
        let value = copy.get(key);
        if *exists {
            match (orig, value) {
                (Some(orig), Some(value)) => {
                    // Reassigning an identical value is not a change.
                    if orig.same(value) {
                        continue;
                    }
                    let p = join(path, key);
                    patches.push(Patch::Replace {
                        path: p.clone(),
                        value: value.clone(),
                    });
                    inverse.push(Patch::Replace {
                        path: p,
                        value: orig.clone(),
                    });
                }
                (None, Some(value)) => {
                    let p = join(path, key);
                    patches.push(Patch::Add {
                        path: p.clone(),
                        value: value.clone(),
                    });
                    inverse.push(Patch::Remove { path: p });
                }
                _ => {}
            }
        } else if let Some(orig) = orig {
            let p = join(path, key);
            patches.push(Patch::Remove { path: p.clone() });
            inverse.push(Patch::Add {
                path: p,
                value: orig.clone(),
            });
        }
    }
}

/// Sequences: positional replaces over the common prefix, then either
/// trailing adds (grew) or one length replace (shrank).
fn generate_sequence_patches(
    base: &Value,
    copy: &Value,
    deep_covered: &HashSet<usize>,
    path: &[Key],
    patches: &mut Vec<Patch>,
    inverse: &mut Vec<Patch>,
) {
    let (Some(base), Some(copy)) = (base.as_array(), copy.as_array()) else {
        return;
    };
    let min_len = base.len().min(copy.len());
    for i in 0..min_len {
        if deep_covered.contains(&i) {
            continue;
        }
        if !base[i].same(&copy[i]) {
            let p = join(path, &Key::Index(i));
            patches.push(Patch::Replace {
                path: p.clone(),
                value: copy[i].clone(),
            });
            inverse.push(Patch::Replace {
                path: p,
                value: base[i].clone(),
            });
        }
    }
    if copy.len() > base.len() {
        for i in min_len..copy.len() {
            patches.push(Patch::Add {
                path: join(path, &Key::Index(i)),
                value: copy[i].clone(),
            });
        }
        inverse.push(Patch::Replace {
            path: join(path, &Key::Len),
            value: Value::from(base.len()),
        });
    } else if copy.len() < base.len() {
        patches.push(Patch::Replace {
            path: join(path, &Key::Len),
            value: Value::from(copy.len()),
        });
        // Descending, so that reverse-order application appends in
        // ascending, in-bounds order.
        for i in (min_len..base.len()).rev() {
            inverse.push(Patch::Add {
                path: join(path, &Key::Index(i)),
                value: base[i].clone(),
            });
        }
    }
}

/// Sets are atomic: membership changes replace the whole set.
fn generate_set_patches(
    base: &Value,
    copy: &Value,
    path: &[Key],
    patches: &mut Vec<Patch>,
    inverse: &mut Vec<Patch>,
) {
    if base == copy {
        return;
    }
    patches.push(Patch::Replace {
        path: path.to_vec(),
        value: copy.clone(),
    });
    inverse.push(Patch::Replace {
        path: path.to_vec(),
        value: base.clone(),
    });
}
