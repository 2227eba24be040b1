//! Producer entry points.
//!
//! [`produce`] runs a recipe against a draft of the base value and returns
//! the finalized result; [`produce_with_patches`] additionally returns the
//! forward and inverse edit logs (hand them to whatever listener wants
//! them). The manual two-phase form — [`create_draft`] / [`finish_draft`]
//! — keeps the session open across suspension points: the
//! [`ManualDraft`] owns its scope, and finishing consumes it, so a draft
//! can neither outlive its session nor be finished twice.

use drafty_value::{freeze, Key, Value};

use crate::draft::Draft;
use crate::error::DraftError;
use crate::finalize::Finalizer;
use crate::patch::{apply_patch, Patch, PatchError};
use crate::scope::{CopyStrategy, Scope, ROOT};

// ── Recipe outcome ────────────────────────────────────────────────────────

/// What a recipe produced.
///
/// Returning `()` from a recipe converts to [`Outcome::Draft`] (use the
/// mutated draft); returning a [`Value`] converts to [`Outcome::Replace`].
/// [`Outcome::Nothing`] is the explicit "no result" sentinel: it deletes
/// the entire base and finalizes to [`Value::Null`].
#[derive(Debug)]
pub enum Outcome {
    /// Use the (possibly mutated) draft.
    Draft,
    /// Discard the draft and use this value instead. Combining this with
    /// draft mutation is a usage error.
    Replace(Value),
    /// Explicitly produce no value at all.
    Nothing,
}

impl From<()> for Outcome {
    fn from(_: ()) -> Self {
        Outcome::Draft
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Replace(value)
    }
}

// ── Producer ──────────────────────────────────────────────────────────────

type AssignHook = Box<dyn Fn(&Key, &Value)>;
type DeleteHook = Box<dyn Fn(&Key)>;
type CopyHook = Box<dyn Fn(&Value)>;

/// A configured producer.
///
/// The free functions in this module use a default-configured producer;
/// construct one explicitly to control auto-freezing, the copy strategy,
/// or to attach observer hooks.
pub struct Producer {
    pub(crate) auto_freeze: bool,
    pub(crate) copy_strategy: CopyStrategy,
    pub(crate) on_assign: Option<AssignHook>,
    pub(crate) on_delete: Option<DeleteHook>,
    pub(crate) on_copy: Option<CopyHook>,
}

impl Default for Producer {
    fn default() -> Self {
        Producer {
            // Release builds are the "production" environment marker:
            // auto-freeze is on everywhere else.
            auto_freeze: cfg!(debug_assertions),
            copy_strategy: CopyStrategy::default(),
            on_assign: None,
            on_delete: None,
            on_copy: None,
        }
    }
}

impl Producer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle deep-freezing of produced values.
    pub fn set_auto_freeze(&mut self, on: bool) {
        self.auto_freeze = on;
    }

    /// Select when draft nodes copy their base.
    pub fn set_copy_strategy(&mut self, strategy: CopyStrategy) {
        self.copy_strategy = strategy;
    }

    /// Observe every changed key during finalization.
    pub fn set_on_assign(&mut self, hook: impl Fn(&Key, &Value) + 'static) {
        self.on_assign = Some(Box::new(hook));
    }

    /// Observe every deleted key during finalization.
    pub fn set_on_delete(&mut self, hook: impl Fn(&Key) + 'static) {
        self.on_delete = Some(Box::new(hook));
    }

    /// Observe every node that was copied, once, at finalization.
    pub fn set_on_copy(&mut self, hook: impl Fn(&Value) + 'static) {
        self.on_copy = Some(Box::new(hook));
    }

    /// Run `recipe` against a draft of `base` and finalize the result.
    ///
    /// Unmodified subtrees of the result are reference-identical to their
    /// counterparts in `base`; if the recipe performs no writes at all,
    /// the result is `base` itself. If the recipe errors, the session is
    /// revoked and the error propagates unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use drafty::{produce, value};
    ///
    /// let base = value!({"count": 1});
    /// let next = produce(&base, |d| {
    ///     d.set("count", 2)?;
    ///     Ok(())
    /// })
    /// .unwrap();
    /// assert_eq!(next, value!({"count": 2}));
    /// assert_eq!(base, value!({"count": 1}));
    /// ```
    pub fn produce<F, O>(&self, base: &Value, recipe: F) -> Result<Value, DraftError>
    where
        F: FnOnce(&mut Draft<'_>) -> Result<O, DraftError>,
        O: Into<Outcome>,
    {
        let (value, _) = self.run(base, recipe, false)?;
        Ok(value)
    }

    /// Like [`Producer::produce`], returning the forward and inverse edit
    /// logs alongside the result.
    pub fn produce_with_patches<F, O>(
        &self,
        base: &Value,
        recipe: F,
    ) -> Result<(Value, Vec<Patch>, Vec<Patch>), DraftError>
    where
        F: FnOnce(&mut Draft<'_>) -> Result<O, DraftError>,
        O: Into<Outcome>,
    {
        let (value, logs) = self.run(base, recipe, true)?;
        let (patches, inverse) = logs.unwrap_or_default();
        Ok((value, patches, inverse))
    }

    fn run<F, O>(
        &self,
        base: &Value,
        recipe: F,
        track: bool,
    ) -> Result<(Value, Option<(Vec<Patch>, Vec<Patch>)>), DraftError>
    where
        F: FnOnce(&mut Draft<'_>) -> Result<O, DraftError>,
        O: Into<Outcome>,
    {
        let mut scope = Scope::enter(self.copy_strategy);
        scope.wrap_root(base.clone());
        let outcome = {
            let mut draft = Draft::new(&mut scope, ROOT);
            recipe(&mut draft)
        };
        let outcome = match outcome {
            Ok(outcome) => outcome.into(),
            Err(err) => {
                scope.revoke();
                return Err(err);
            }
        };
        if track {
            scope.track_patches();
        }
        let result = Finalizer {
            producer: self,
            scope: &mut scope,
        }
        .process_result(outcome);
        let value = match result {
            Ok(value) => value,
            Err(err) => {
                scope.revoke();
                return Err(err);
            }
        };
        let logs = scope.patches.take().zip(scope.inverse_patches.take());
        scope.revoke();
        Ok((value, logs))
    }

    /// Open a standalone draft session over `base`. Errors unless `base`
    /// is a record, sequence, set, or map.
    pub fn create_draft(&self, base: &Value) -> Result<ManualDraft, DraftError> {
        if !base.is_draftable() {
            return Err(DraftError::NotDraftable(base.kind()));
        }
        let mut scope = Scope::enter(self.copy_strategy);
        scope.wrap_root(base.clone());
        Ok(ManualDraft { scope })
    }

    /// Finalize a manual draft session. Consumes the draft; the session is
    /// revoked whether finalization succeeds or fails.
    pub fn finish_draft(&self, mut draft: ManualDraft) -> Result<Value, DraftError> {
        let result = Finalizer {
            producer: self,
            scope: &mut draft.scope,
        }
        .process_result(Outcome::Draft);
        draft.scope.revoke();
        result
    }

    /// Like [`Producer::finish_draft`], returning the edit logs.
    pub fn finish_draft_with_patches(
        &self,
        mut draft: ManualDraft,
    ) -> Result<(Value, Vec<Patch>, Vec<Patch>), DraftError> {
        draft.scope.track_patches();
        let result = Finalizer {
            producer: self,
            scope: &mut draft.scope,
        }
        .process_result(Outcome::Draft);
        let value = match result {
            Ok(value) => value,
            Err(err) => {
                draft.scope.revoke();
                return Err(err);
            }
        };
        let patches = draft.scope.patches.take().unwrap_or_default();
        let inverse = draft.scope.inverse_patches.take().unwrap_or_default();
        draft.scope.revoke();
        Ok((value, patches, inverse))
    }

    /// Replay a patch list against `base`, freezing the result when
    /// auto-freeze is on.
    pub fn apply_patches(&self, base: &Value, patches: &[Patch]) -> Result<Value, PatchError> {
        let result = apply_patch(base, patches)?;
        if self.auto_freeze {
            freeze(&result, true);
        }
        Ok(result)
    }
}

// ── Manual drafts ─────────────────────────────────────────────────────────

/// An owning handle for a two-phase draft session.
///
/// The session stays open for as long as the handle lives — across
/// suspension points if need be — and is closed by
/// [`Producer::finish_draft`] (or [`finish_draft`]), which consumes the
/// handle. Dropping the handle abandons the session.
pub struct ManualDraft {
    scope: Scope,
}

impl std::fmt::Debug for ManualDraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualDraft").finish_non_exhaustive()
    }
}

impl ManualDraft {
    /// Cursor to the session's root draft.
    pub fn draft(&mut self) -> Draft<'_> {
        Draft::new(&mut self.scope, ROOT)
    }

    /// The original value the session was opened over.
    pub fn base(&self) -> &Value {
        &self.scope.node(ROOT).base
    }
}

// ── Default-producer conveniences ─────────────────────────────────────────

/// [`Producer::produce`] with a default-configured producer.
pub fn produce<F, O>(base: &Value, recipe: F) -> Result<Value, DraftError>
where
    F: FnOnce(&mut Draft<'_>) -> Result<O, DraftError>,
    O: Into<Outcome>,
{
    Producer::new().produce(base, recipe)
}

/// [`Producer::produce_with_patches`] with a default-configured producer.
pub fn produce_with_patches<F, O>(
    base: &Value,
    recipe: F,
) -> Result<(Value, Vec<Patch>, Vec<Patch>), DraftError>
where
    F: FnOnce(&mut Draft<'_>) -> Result<O, DraftError>,
    O: Into<Outcome>,
{
    Producer::new().produce_with_patches(base, recipe)
}

/// [`Producer::create_draft`] with a default-configured producer.
pub fn create_draft(base: &Value) -> Result<ManualDraft, DraftError> {
    Producer::new().create_draft(base)
}

/// [`Producer::finish_draft`] with a default-configured producer.
pub fn finish_draft(draft: ManualDraft) -> Result<Value, DraftError> {
    Producer::new().finish_draft(draft)
}

/// [`Producer::finish_draft_with_patches`] with a default-configured
/// producer.
pub fn finish_draft_with_patches(
    draft: ManualDraft,
) -> Result<(Value, Vec<Patch>, Vec<Patch>), DraftError> {
    Producer::new().finish_draft_with_patches(draft)
}

/// Replay a patch list against `base` without any freezing. A
/// zero-length-path `replace` substitutes the whole state and
/// short-circuits earlier patches.
pub fn apply_patches(base: &Value, patches: &[Patch]) -> Result<Value, PatchError> {
    apply_patch(base, patches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use drafty_value::value;

    #[test]
    fn replace_outcome_discards_the_draft() {
        let base = value!({"a": 1});
        let next = produce(&base, |_| Ok(value!({"b": 2}))).unwrap();
        assert_eq!(next, value!({"b": 2}));
    }

    #[test]
    fn nothing_outcome_produces_null() {
        let base = value!({"a": 1});
        let next = produce(&base, |_| Ok(Outcome::Nothing)).unwrap();
        assert_eq!(next, Value::Null);
    }

    #[test]
    fn nothing_on_a_non_draftable_base_produces_null() {
        let next = produce(&value!(42), |_| Ok(Outcome::Nothing)).unwrap();
        assert_eq!(next, Value::Null);
    }

    #[test]
    fn scalar_base_supports_replacement_recipes() {
        let next = produce(&value!(1), |_| Ok(value!(2))).unwrap();
        assert_eq!(next, value!(2));
    }
}
