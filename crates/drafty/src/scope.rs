//! Producer sessions.
//!
//! A [`Scope`] is the bookkeeping context for one producer invocation. It
//! owns the arena of draft nodes created during the session, the optional
//! patch buffers, and the copy-strategy flag. Draft handles are indices
//! into the arena and can only be dereferenced through the scope, so a
//! foreign session can never reach another session's drafts; nesting
//! (a producer invoked while another runs) is the call stack itself, each
//! invocation entering an independent scope.

use drafty_value::Value;

use crate::draft::DraftState;
use crate::error::DraftError;
use crate::patch::Patch;

/// Index of the session's root draft in the arena.
pub(crate) const ROOT: u32 = 0;

/// When a draft node makes its one-level copy of the base.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CopyStrategy {
    /// Copy lazily, on the first write to the node. Deletion tracking is
    /// exact.
    #[default]
    OnWrite,
    /// Copy eagerly, when the node is first drafted. Trades extra copying
    /// for never needing a write trigger; deletion observers fall back to
    /// diffing base keys against copy keys.
    OnAccess,
}

/// One producer session: the draft arena plus patch buffers.
pub(crate) struct Scope {
    pub(crate) nodes: Vec<DraftState>,
    pub(crate) strategy: CopyStrategy,
    pub(crate) patches: Option<Vec<Patch>>,
    pub(crate) inverse_patches: Option<Vec<Patch>>,
    pub(crate) revoked: bool,
}

impl Scope {
    /// Enter a new session.
    pub(crate) fn enter(strategy: CopyStrategy) -> Self {
        Scope {
            nodes: Vec::new(),
            strategy,
            patches: None,
            inverse_patches: None,
            revoked: false,
        }
    }

    /// Start collecting patches; called before finalization when the
    /// caller asked for them.
    pub(crate) fn track_patches(&mut self) {
        self.patches = Some(Vec::new());
        self.inverse_patches = Some(Vec::new());
    }

    /// Wrap the session's root value. Must be the first node created.
    pub(crate) fn wrap_root(&mut self, base: Value) -> u32 {
        debug_assert!(self.nodes.is_empty());
        self.create_node(base, None)
    }

    /// Register a new draft node, eagerly copying when the strategy asks
    /// for it.
    pub(crate) fn create_node(&mut self, base: Value, parent: Option<u32>) -> u32 {
        let idx = self.nodes.len() as u32;
        let mut state = DraftState::new(base, parent);
        if self.strategy == CopyStrategy::OnAccess && state.base.is_draftable() {
            state.copy = Some(state.base.shallow_copy());
        }
        self.nodes.push(state);
        idx
    }

    pub(crate) fn node(&self, idx: u32) -> &DraftState {
        &self.nodes[idx as usize]
    }

    pub(crate) fn node_mut(&mut self, idx: u32) -> &mut DraftState {
        &mut self.nodes[idx as usize]
    }

    /// Fail if the session has been revoked.
    pub(crate) fn assert_live(&self) -> Result<(), DraftError> {
        if self.revoked {
            Err(DraftError::Revoked)
        } else {
            Ok(())
        }
    }

    /// Mark a node and its ancestors modified, creating each node's copy
    /// on the way up. Stops at the first already-modified ancestor, so the
    /// cost is bounded by the depth of the first modification.
    pub(crate) fn mark_changed(&mut self, idx: u32) {
        let mut cur = Some(idx);
        while let Some(i) = cur {
            let node = &mut self.nodes[i as usize];
            if node.modified {
                break;
            }
            node.modified = true;
            if node.copy.is_none() {
                node.copy = Some(node.base.shallow_copy());
            }
            cur = node.parent;
        }
    }

    /// Retire every draft the session produced. Any later access through a
    /// stale handle fails with [`DraftError::Revoked`].
    pub(crate) fn revoke(&mut self) {
        self.nodes.clear();
        self.revoked = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drafty_value::value;

    #[test]
    fn revoke_invalidates_the_session() {
        let mut scope = Scope::enter(CopyStrategy::OnWrite);
        scope.wrap_root(value!({"a": 1}));
        scope.revoke();
        assert_eq!(scope.assert_live(), Err(DraftError::Revoked));
        assert!(scope.nodes.is_empty());
    }

    #[test]
    fn mark_changed_propagates_and_short_circuits() {
        let mut scope = Scope::enter(CopyStrategy::OnWrite);
        let root = scope.wrap_root(value!({"child": {"x": 1}}));
        let child_base = scope.node(root).base.get(&"child".into()).cloned().unwrap();
        let child = scope.create_node(child_base, Some(root));

        scope.mark_changed(child);
        assert!(scope.node(child).modified);
        assert!(scope.node(root).modified);
        let root_copy = scope.node(root).copy.clone();
        assert!(root_copy.is_some());

        // A second propagation stops immediately and must not re-copy.
        scope.mark_changed(child);
        assert!(scope
            .node(root)
            .copy
            .as_ref()
            .zip(root_copy.as_ref())
            .map(|(a, b)| a.same(b))
            .unwrap_or(false));
    }

    #[test]
    fn eager_strategy_copies_on_creation() {
        let mut scope = Scope::enter(CopyStrategy::OnAccess);
        let root = scope.wrap_root(value!([1, 2]));
        assert!(scope.node(root).copy.is_some());
        assert!(!scope.node(root).modified);
    }
}
