//! Finalization: converting a draft tree into a plain immutable value.
//!
//! Unmodified nodes resolve to their base reference unchanged; that single
//! rule is the structural-sharing guarantee. Modified nodes resolve to
//! their copy after every registered child draft has been finalized and
//! written back into it. The same walk performs the defensive
//! self-reference check, deep-freezes freshly attached plain containers,
//! fires the observer hooks, and (when the session tracks patches) emits
//! the edit log.
//!
//! Patch emission is outer-to-inner: a node's own operations precede the
//! deep operations of its children. Deep operations are only emitted for a
//! child whose slot still holds the value the child was drafted from
//! (always true for record keys that were never reassigned; checked
//! positionally for sequences, where edits can shift elements); any other
//! child is covered by its parent's shallow operation instead.

use std::collections::HashSet;

use drafty_value::{freeze, Key, Kind, Path, Value};

use crate::draft::write_slot;
use crate::error::DraftError;
use crate::patch::generate::generate_patches;
use crate::patch::Patch;
use crate::producer::{Outcome, Producer};
use crate::scope::{CopyStrategy, Scope, ROOT};

pub(crate) struct Finalizer<'a> {
    pub(crate) producer: &'a Producer,
    pub(crate) scope: &'a mut Scope,
}

impl Finalizer<'_> {
    /// Resolve a recipe's outcome into the session's final value.
    pub(crate) fn process_result(&mut self, outcome: Outcome) -> Result<Value, DraftError> {
        let root_modified = self.scope.node(ROOT).modified;
        match outcome {
            Outcome::Draft => {
                let path = self.scope.patches.is_some().then(Path::new);
                self.finalize_node(ROOT, path)
            }
            Outcome::Replace(value) => {
                if root_modified {
                    return Err(DraftError::ReplacedAndMutated);
                }
                self.check_cycles(&value)?;
                self.maybe_freeze(&value, true);
                self.record_root_replace(value.clone());
                Ok(value)
            }
            Outcome::Nothing => {
                if root_modified {
                    return Err(DraftError::ReplacedAndMutated);
                }
                self.record_root_replace(Value::Null);
                Ok(Value::Null)
            }
        }
    }

    fn record_root_replace(&mut self, value: Value) {
        let base = self.scope.node(ROOT).base.clone();
        if let Some(patches) = self.scope.patches.as_mut() {
            patches.push(Patch::Replace { path: Vec::new(), value });
        }
        if let Some(inverse) = self.scope.inverse_patches.as_mut() {
            inverse.push(Patch::Replace {
                path: Vec::new(),
                value: base,
            });
        }
    }

    /// Finalize one node. `path` is its location from the session root,
    /// present only while the session tracks patches.
    fn finalize_node(&mut self, idx: u32, path: Option<Path>) -> Result<Value, DraftError> {
        if !self.scope.node(idx).modified {
            let base = self.scope.node(idx).base.clone();
            self.scope.node_mut(idx).copy = None;
            self.maybe_freeze(&base, true);
            return Ok(base);
        }
        if self.scope.node(idx).finalized {
            let node = self.scope.node(idx);
            return Ok(node.copy.clone().unwrap_or_else(|| node.base.clone()));
        }
        self.scope.node_mut(idx).finalized = true;

        let children = std::mem::take(&mut self.scope.node_mut(idx).children);
        let assigned = std::mem::take(&mut self.scope.node_mut(idx).assigned);
        let base = self.scope.node(idx).base.clone();
        let mut copy = match self.scope.node_mut(idx).copy.take() {
            Some(copy) => copy,
            // A modified node always carries a copy; see Scope::mark_changed.
            None => base.shallow_copy(),
        };
        let kind = base.kind();

        let patches_mark = self.scope.patches.as_ref().map(|p| p.len());
        let inverse_mark = self.scope.inverse_patches.as_ref().map(|p| p.len());

        // Finalize registered children and write their results back into
        // the copy. A child gets deep patches only while its slot is
        // stable (still holding the value it was drafted from); shifted
        // sequence elements fall back to the parent's positional replace.
        let mut deep_covered: HashSet<usize> = HashSet::new();
        for (key, child_idx) in &children {
            if copy.get(key).is_none() {
                continue;
            }
            let stable = match key {
                Key::Index(_) => {
                    let child_base = &self.scope.node(*child_idx).base;
                    base.get(key).map(|b| b.same(child_base)).unwrap_or(false)
                }
                _ => !assigned.contains_key(key),
            };
            let child_path = match &path {
                Some(p) if kind != Kind::Set && stable => {
                    let mut joined = p.clone();
                    joined.push(key.clone());
                    Some(joined)
                }
                _ => None,
            };
            if child_path.is_some() {
                if let Key::Index(i) = key {
                    deep_covered.insert(*i);
                }
            }
            let value = self.finalize_node(*child_idx, child_path)?;
            write_slot(&mut copy, key.clone(), value);
        }

        // Emit this node's own operations, then rotate them ahead of the
        // children's deep operations so the log reads outer-to-inner.
        if let Some(p) = &path {
            let child_end = self.scope.patches.as_ref().map(|b| b.len());
            let inverse_child_end = self.scope.inverse_patches.as_ref().map(|b| b.len());
            if let (Some(patches), Some(inverse)) = (
                self.scope.patches.as_mut(),
                self.scope.inverse_patches.as_mut(),
            ) {
                generate_patches(&base, &copy, &assigned, &deep_covered, p, patches, inverse);
            }
            if let (Some(patches), Some(mark), Some(child_end)) =
                (self.scope.patches.as_mut(), patches_mark, child_end)
            {
                patches[mark..].rotate_left(child_end - mark);
            }
            if let (Some(inverse), Some(mark), Some(child_end)) = (
                self.scope.inverse_patches.as_mut(),
                inverse_mark,
                inverse_child_end,
            ) {
                inverse[mark..].rotate_left(child_end - mark);
            }
        }

        // Defensive walk of the copy: self-reference check, deep freeze of
        // freshly attached plain containers, assign hooks.
        for key in copy.keys() {
            let Some(value) = copy.get(&key) else { continue };
            let unchanged = base.get(&key).map(|b| value.same(b)).unwrap_or(false);
            if children.contains_key(&key) {
                if !unchanged && kind != Kind::Set {
                    self.hook_assign(&key, value);
                }
                continue;
            }
            if unchanged {
                continue;
            }
            if value.same(&copy) {
                return Err(DraftError::CircularReference);
            }
            if value.is_draftable() && !value.is_frozen() {
                self.check_cycles(value)?;
                self.maybe_freeze(value, true);
            }
            if kind != Kind::Set {
                self.hook_assign(&key, value);
            }
        }

        // Deletion bookkeeping. Exact under the lazy strategy via the
        // assigned map; best-effort base/copy key diff under the eager
        // strategy. Sets only change by whole-value replacement.
        if kind != Kind::Set {
            match self.scope.strategy {
                CopyStrategy::OnWrite => {
                    for (key, exists) in &assigned {
                        if !*exists {
                            self.hook_delete(key);
                        }
                    }
                }
                CopyStrategy::OnAccess => {
                    for key in base.keys() {
                        if !copy.has(&key) {
                            self.hook_delete(&key);
                        }
                    }
                }
            }
        }
        self.hook_copy(&base);

        self.maybe_freeze(&copy, false);
        self.scope.node_mut(idx).copy = Some(copy.clone());
        Ok(copy)
    }

    /// Walk a plain container looking for self-references. Frozen values
    /// are trusted not to contain anything that needs checking.
    fn check_cycles(&self, value: &Value) -> Result<(), DraftError> {
        if !value.is_draftable() || value.is_frozen() {
            return Ok(());
        }
        for key in value.keys() {
            if let Some(child) = value.get(&key) {
                if child.same(value) {
                    return Err(DraftError::CircularReference);
                }
                if child.is_draftable() && !child.is_frozen() {
                    self.check_cycles(child)?;
                }
            }
        }
        Ok(())
    }

    fn maybe_freeze(&self, value: &Value, deep: bool) {
        if self.producer.auto_freeze {
            freeze(value, deep);
        }
    }

    fn hook_assign(&self, key: &Key, value: &Value) {
        if let Some(hook) = &self.producer.on_assign {
            hook(key, value);
        }
    }

    fn hook_delete(&self, key: &Key) {
        if let Some(hook) = &self.producer.on_delete {
            hook(key);
        }
    }

    fn hook_copy(&self, base: &Value) {
        if let Some(hook) = &self.producer.on_copy {
            hook(base);
        }
    }
}
