//! The draft layer: copy-on-write views over base values.
//!
//! A [`Draft`] is a cursor over one node in its session's arena. Reads
//! resolve against the node's copy when one exists and against the base
//! otherwise; reading a draftable child through [`Draft::child`] lazily
//! wraps it as a child draft, registered once per key per session. The
//! first write to a node makes a one-level copy of its base and marks the
//! node and every ancestor modified, so finalization can tell exactly
//! which subtrees to rebuild and which to share.

use indexmap::IndexMap;

use drafty_value::{Key, Kind, Value};

use crate::error::DraftError;
use crate::scope::Scope;

// ── Node state ────────────────────────────────────────────────────────────

/// Per-node draft state. Lives in the session arena, never inside a
/// [`Value`].
pub(crate) struct DraftState {
    /// The wrapped original. Never mutated.
    pub(crate) base: Value,
    /// One-level copy of `base`, created on the first write (or on wrap,
    /// under the eager strategy). All reads and writes resolve against it
    /// once present.
    pub(crate) copy: Option<Value>,
    /// Whether this node or a descendant has been written to.
    pub(crate) modified: bool,
    /// Guards against finalizing a node twice.
    pub(crate) finalized: bool,
    /// Keys touched on this node: `true` if the key now exists in the
    /// copy, `false` if it was deleted. Sequences are excluded; the
    /// finalizer diffs them positionally.
    pub(crate) assigned: IndexMap<Key, bool>,
    /// Child drafts created under this node, at most one per key.
    pub(crate) children: IndexMap<Key, u32>,
    /// Owning parent, used for upward modified-propagation.
    pub(crate) parent: Option<u32>,
}

impl DraftState {
    pub(crate) fn new(base: Value, parent: Option<u32>) -> Self {
        DraftState {
            base,
            copy: None,
            modified: false,
            finalized: false,
            assigned: IndexMap::new(),
            children: IndexMap::new(),
            parent,
        }
    }

    /// The node's current view: copy if present, base otherwise.
    pub(crate) fn latest(&self) -> &Value {
        self.copy.as_ref().unwrap_or(&self.base)
    }

    /// Re-key registered children at or past a sequence position after an
    /// insertion or removal shifted elements by `delta`.
    pub(crate) fn shift_children(&mut self, from: usize, delta: isize) {
        if self.children.is_empty() {
            return;
        }
        let old = std::mem::take(&mut self.children);
        for (key, idx) in old {
            let key = match key {
                Key::Index(i) if i >= from => Key::Index((i as isize + delta) as usize),
                other => other,
            };
            self.children.insert(key, idx);
        }
    }
}

/// Write a value into a copy's slot, without change bookkeeping. Used by
/// draft writes and by the finalizer's child write-back.
pub(crate) fn write_slot(copy: &mut Value, key: Key, value: Value) {
    match key {
        Key::Prop(s) => {
            if let Some(o) = copy.as_object_mut() {
                o.insert(s, value);
            }
        }
        Key::Item(k) => {
            if let Some(m) = copy.as_map_mut() {
                m.insert(k, value);
            }
        }
        Key::Index(i) => {
            if let Some(arr) = copy.as_array_mut() {
                if i == arr.len() {
                    arr.push(value);
                } else if i < arr.len() {
                    arr[i] = value;
                }
            }
        }
        Key::Len => {}
    }
}

fn remove_slot(copy: &mut Value, key: &Key) -> Option<Value> {
    match key {
        Key::Prop(s) => copy.as_object_mut().and_then(|o| o.shift_remove(s)),
        Key::Item(v) => match copy {
            Value::Map(_) => copy.as_map_mut().and_then(|m| m.shift_remove(v)),
            Value::Set(_) => copy.as_set_mut().and_then(|s| s.shift_take(v)),
            _ => None,
        },
        Key::Index(i) => match copy.as_array_mut() {
            Some(arr) if *i < arr.len() => Some(arr.remove(*i)),
            _ => None,
        },
        Key::Len => None,
    }
}

// ── Draft cursor ──────────────────────────────────────────────────────────

/// A mutable view over one node of the session's value tree.
///
/// All mutation is explicit: [`Draft::set`], [`Draft::remove`],
/// [`Draft::push`] and friends. Navigation into a draftable child goes
/// through [`Draft::child`], which returns a cursor borrowing this one, so
/// the borrow checker enforces the session's single-writer discipline.
pub struct Draft<'s> {
    scope: &'s mut Scope,
    node: u32,
}

impl<'s> Draft<'s> {
    pub(crate) fn new(scope: &'s mut Scope, node: u32) -> Self {
        Draft { scope, node }
    }

    fn state(&self) -> &DraftState {
        self.scope.node(self.node)
    }

    /// A property key used against a map addresses the string-keyed entry.
    fn normalize_key(&self, key: Key) -> Key {
        match (self.state().latest().kind(), key) {
            (Kind::Map, Key::Prop(s)) => Key::Item(Value::from(s)),
            (_, key) => key,
        }
    }

    fn prepare_write(&mut self) {
        self.scope.mark_changed(self.node);
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    pub fn kind(&self) -> Kind {
        self.state().latest().kind()
    }

    pub fn len(&self) -> usize {
        self.state().latest().len().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this node (or a descendant) has been written to.
    pub fn is_modified(&self) -> bool {
        self.state().modified
    }

    /// The original value this draft wraps. Never reflects draft writes.
    pub fn base(&self) -> &Value {
        &self.state().base
    }

    /// Snapshot of the child at `key`, reflecting writes made through this
    /// session so far. Edits buffered in grandchild drafts deeper than one
    /// level are not folded in until finalization; use [`Draft::child`] to
    /// inspect nested drafts.
    pub fn get(&self, key: impl Into<Key>) -> Option<Value> {
        let key = self.normalize_key(key.into());
        if let Some(&child) = self.state().children.get(&key) {
            return Some(self.scope.node(child).latest().clone());
        }
        self.state().latest().get(&key).cloned()
    }

    pub fn has(&self, key: impl Into<Key>) -> bool {
        let key = self.normalize_key(key.into());
        self.state().latest().has(&key)
    }

    /// Child keys in container order, reflecting writes so far.
    pub fn keys(&self) -> Vec<Key> {
        self.state().latest().keys()
    }

    /// Membership test for sets (deep equality), also usable on sequences.
    pub fn contains(&self, value: &Value) -> bool {
        match self.state().latest() {
            Value::Set(s) => s.contains(value),
            Value::Array(a) => a.iter().any(|v| v == value),
            _ => false,
        }
    }

    /// Wrap the draftable child at `key` as a draft of its own,
    /// registering it with the session. A given key is wrapped at most
    /// once per session, so repeated calls return a cursor to the same
    /// node.
    pub fn child(&mut self, key: impl Into<Key>) -> Result<Draft<'_>, DraftError> {
        self.scope.assert_live()?;
        let key = self.normalize_key(key.into());
        if let Some(&idx) = self.state().children.get(&key) {
            return Ok(Draft::new(&mut *self.scope, idx));
        }
        if self.kind() == Kind::Set {
            // Set members are edited by membership (add/remove), not in
            // place.
            return Err(DraftError::KindMismatch {
                op: "child",
                kind: Kind::Set,
            });
        }
        let value = self
            .state()
            .latest()
            .get(&key)
            .cloned()
            .ok_or_else(|| DraftError::Missing(key.clone()))?;
        if !value.is_draftable() {
            return Err(DraftError::KindMismatch {
                op: "child",
                kind: value.kind(),
            });
        }
        let idx = self.scope.create_node(value, Some(self.node));
        self.scope.node_mut(self.node).children.insert(key, idx);
        Ok(Draft::new(&mut *self.scope, idx))
    }

    // ── Writes ────────────────────────────────────────────────────────────

    /// Assign `value` at `key`. For sequences an index equal to the
    /// current length appends. Assigning a value equal to the current one
    /// still routes through the write path; the finalizer's per-key
    /// comparison is what keeps it out of the change set.
    pub fn set(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Result<(), DraftError> {
        self.scope.assert_live()?;
        let key = self.normalize_key(key.into());
        let value = value.into();
        let kind = self.kind();
        let addressable = matches!(
            (&key, kind),
            (Key::Prop(_), Kind::Object) | (Key::Item(_), Kind::Map) | (Key::Index(_), Kind::Array)
        );
        if !addressable {
            return Err(match kind {
                Kind::Object | Kind::Map | Kind::Array => DraftError::InvalidKey { key, kind },
                _ => DraftError::KindMismatch { op: "set", kind },
            });
        }
        if let Key::Index(i) = &key {
            let len = self.len();
            if *i > len {
                return Err(DraftError::OutOfBounds { index: *i, len });
            }
        }
        self.prepare_write();
        let node = self.scope.node_mut(self.node);
        node.children.shift_remove(&key);
        if kind != Kind::Array {
            node.assigned.insert(key.clone(), true);
        }
        if let Some(copy) = node.copy.as_mut() {
            write_slot(copy, key, value);
        }
        Ok(())
    }

    /// Delete the child at `key`. Returns the removed value, or `None` if
    /// nothing was there. Sequence removal shifts later elements down and
    /// re-keys their drafts.
    pub fn remove(&mut self, key: impl Into<Key>) -> Result<Option<Value>, DraftError> {
        self.scope.assert_live()?;
        let key = self.normalize_key(key.into());
        let kind = self.kind();
        match kind {
            Kind::Object | Kind::Map | Kind::Set => {
                let addressable = matches!(
                    (&key, kind),
                    (Key::Prop(_), Kind::Object)
                        | (Key::Item(_), Kind::Map)
                        | (Key::Item(_), Kind::Set)
                );
                if !addressable {
                    return Err(DraftError::InvalidKey { key, kind });
                }
                if !self.state().latest().has(&key) {
                    return Ok(None);
                }
                let in_base = self.state().base.has(&key);
                self.prepare_write();
                let node = self.scope.node_mut(self.node);
                node.children.shift_remove(&key);
                if in_base {
                    node.assigned.insert(key.clone(), false);
                } else {
                    // Added then deleted in the same session: not a change.
                    node.assigned.shift_remove(&key);
                }
                Ok(node.copy.as_mut().and_then(|c| remove_slot(c, &key)))
            }
            Kind::Array => {
                let i = match key {
                    Key::Index(i) => i,
                    other => return Err(DraftError::InvalidKey { key: other, kind }),
                };
                if i >= self.len() {
                    return Ok(None);
                }
                self.prepare_write();
                let node = self.scope.node_mut(self.node);
                node.children.shift_remove(&Key::Index(i));
                node.shift_children(i + 1, -1);
                Ok(node.copy.as_mut().and_then(|c| remove_slot(c, &Key::Index(i))))
            }
            other => Err(DraftError::KindMismatch {
                op: "remove",
                kind: other,
            }),
        }
    }

    /// Append to a sequence.
    pub fn push(&mut self, value: impl Into<Value>) -> Result<(), DraftError> {
        self.scope.assert_live()?;
        if self.kind() != Kind::Array {
            return Err(DraftError::KindMismatch {
                op: "push",
                kind: self.kind(),
            });
        }
        self.prepare_write();
        let node = self.scope.node_mut(self.node);
        if let Some(arr) = node.copy.as_mut().and_then(|c| c.as_array_mut()) {
            arr.push(value.into());
        }
        Ok(())
    }

    /// Remove and return the last sequence element.
    pub fn pop(&mut self) -> Result<Option<Value>, DraftError> {
        self.scope.assert_live()?;
        if self.kind() != Kind::Array {
            return Err(DraftError::KindMismatch {
                op: "pop",
                kind: self.kind(),
            });
        }
        let len = self.len();
        if len == 0 {
            return Ok(None);
        }
        self.prepare_write();
        let node = self.scope.node_mut(self.node);
        node.children.shift_remove(&Key::Index(len - 1));
        Ok(node
            .copy
            .as_mut()
            .and_then(|c| c.as_array_mut())
            .and_then(|arr| arr.pop()))
    }

    /// Insert into a sequence at `index`, shifting later elements up and
    /// re-keying their drafts.
    pub fn insert(&mut self, index: usize, value: impl Into<Value>) -> Result<(), DraftError> {
        self.scope.assert_live()?;
        if self.kind() != Kind::Array {
            return Err(DraftError::KindMismatch {
                op: "insert",
                kind: self.kind(),
            });
        }
        let len = self.len();
        if index > len {
            return Err(DraftError::OutOfBounds { index, len });
        }
        self.prepare_write();
        let node = self.scope.node_mut(self.node);
        node.shift_children(index, 1);
        if let Some(arr) = node.copy.as_mut().and_then(|c| c.as_array_mut()) {
            arr.insert(index, value.into());
        }
        Ok(())
    }

    /// Add a member to a set. Returns whether the member was new.
    pub fn add(&mut self, value: impl Into<Value>) -> Result<bool, DraftError> {
        self.scope.assert_live()?;
        if self.kind() != Kind::Set {
            return Err(DraftError::KindMismatch {
                op: "add",
                kind: self.kind(),
            });
        }
        let value = value.into();
        self.prepare_write();
        let node = self.scope.node_mut(self.node);
        node.assigned.insert(Key::Item(value.clone()), true);
        Ok(node
            .copy
            .as_mut()
            .and_then(|c| c.as_set_mut())
            .map(|s| s.insert(value))
            .unwrap_or(false))
    }

    /// Remove every child.
    pub fn clear(&mut self) -> Result<(), DraftError> {
        self.scope.assert_live()?;
        let kind = self.kind();
        if !matches!(kind, Kind::Object | Kind::Map | Kind::Set | Kind::Array) {
            return Err(DraftError::KindMismatch { op: "clear", kind });
        }
        self.prepare_write();
        let node = self.scope.node_mut(self.node);
        node.children.clear();
        if kind != Kind::Array {
            let base_keys = node.base.keys();
            node.assigned.clear();
            for key in base_keys {
                node.assigned.insert(key, false);
            }
        }
        if let Some(copy) = node.copy.as_mut() {
            match copy {
                Value::Object(_) => {
                    if let Some(o) = copy.as_object_mut() {
                        o.clear();
                    }
                }
                Value::Map(_) => {
                    if let Some(m) = copy.as_map_mut() {
                        m.clear();
                    }
                }
                Value::Set(_) => {
                    if let Some(s) = copy.as_set_mut() {
                        s.clear();
                    }
                }
                Value::Array(_) => {
                    if let Some(a) = copy.as_array_mut() {
                        a.clear();
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}
