use drafty::{
    create_draft, finish_draft, finish_draft_with_patches, produce, produce_with_patches, value,
    CopyStrategy, Draft, DraftError, Key, Outcome, Producer, Value, ValueError,
};

use std::cell::Cell;
use std::rc::Rc;

// ── Structural sharing ────────────────────────────────────────────────────

#[test]
fn a_recipe_with_no_writes_returns_the_base_reference() {
    let base = value!({"a": {"b": 1}});
    let next = produce(&base, |_| Ok(())).unwrap();
    assert!(next.same(&base));
}

#[test]
fn reads_alone_do_not_break_sharing() {
    let base = value!({"a": {"b": 1}, "list": [1, 2]});
    let next = produce(&base, |d| {
        let _ = d.get("a");
        let _ = d.child("a")?.get("b");
        let _ = d.child("list")?.len();
        Ok(())
    })
    .unwrap();
    assert!(next.same(&base));
}

#[test]
fn siblings_of_a_mutated_subtree_are_shared() {
    let base = value!({"touched": {"x": 1}, "kept": {"y": 2}, "list": [1, 2, 3]});
    let next = produce(&base, |d| d.child("touched")?.set("x", 10)).unwrap();

    let kept = |v: &Value, k: &str| v.get(&Key::from(k)).cloned().unwrap();
    assert!(kept(&next, "kept").same(&kept(&base, "kept")));
    assert!(kept(&next, "list").same(&kept(&base, "list")));
    assert!(!kept(&next, "touched").same(&kept(&base, "touched")));
    assert_eq!(kept(&next, "touched"), value!({"x": 10}));
}

#[test]
fn the_base_is_unchanged_after_a_producer_call() {
    let base = value!({"a": 1, "nested": {"b": [1, 2]}});
    // An independent deep snapshot, sharing nothing with the base.
    let snapshot = drafty::from_json(&drafty::to_json(&base).unwrap());
    let _ = produce(&base, |d| {
        d.set("a", 99)?;
        d.child("nested")?.child("b")?.push(3)?;
        Ok(())
    })
    .unwrap();
    assert_eq!(base, snapshot);
}

#[test]
fn the_base_is_unchanged_when_the_recipe_errors() {
    let base = value!({"a": 1});
    let err = produce(&base, |d| {
        d.set("a", 2)?;
        Err::<(), _>(DraftError::Missing(Key::from("boom")))
    })
    .unwrap_err();
    assert_eq!(err, DraftError::Missing(Key::from("boom")));
    assert_eq!(base, value!({"a": 1}));
}

// ── The todo scenario ─────────────────────────────────────────────────────

#[test]
fn todo_scenario() {
    let base = value!([
        {"todo": "a", "done": true},
        {"todo": "b", "done": false},
    ]);

    let next = produce(&base, |d| {
        d.push(value!({"todo": "c"}))?;
        d.child(1)?.set("done", true)?;
        Ok(())
    })
    .unwrap();

    assert_eq!(next.len(), Some(3));
    let at = |v: &Value, i: usize| v.get(&Key::from(i)).cloned().unwrap();
    assert!(at(&next, 0).same(&at(&base, 0)));
    assert_eq!(at(&next, 1), value!({"todo": "b", "done": true}));
    assert_eq!(at(&next, 2), value!({"todo": "c"}));
    assert_eq!(base.len(), Some(2));
    assert_eq!(at(&base, 1), value!({"todo": "b", "done": false}));
}

// ── Replacement and the nothing sentinel ──────────────────────────────────

#[test]
fn returning_a_replacement_and_mutating_is_a_usage_error() {
    let base = value!({"a": 1});
    let err = produce(&base, |d| {
        d.set("a", 2)?;
        Ok(value!({"a": 3}))
    })
    .unwrap_err();
    assert_eq!(err, DraftError::ReplacedAndMutated);
}

#[test]
fn a_pure_replacement_is_finalized_and_returned() {
    let base = value!({"a": 1});
    let next = produce(&base, |_| Ok(value!({"b": [1, 2]}))).unwrap();
    assert_eq!(next, value!({"b": [1, 2]}));
}

#[test]
fn nothing_deletes_the_whole_state() {
    let base = value!({"a": 1});
    let next = produce(&base, |_| Ok(Outcome::Nothing)).unwrap();
    assert!(next.is_null());
}

// ── Deletion ──────────────────────────────────────────────────────────────

#[test]
fn removing_a_key_removes_it_from_the_result() {
    let base = value!({"gone": 1, "kept": 2});
    let (next, patches, _) = produce_with_patches(&base, |d| {
        d.remove("gone")?;
        Ok(())
    })
    .unwrap();
    assert!(!next.has(&Key::from("gone")));
    assert_eq!(next, value!({"kept": 2}));
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].op_name(), "remove");
    assert_eq!(patches[0].path(), &[Key::from("gone")]);
}

// ── Freeze enforcement ────────────────────────────────────────────────────

#[test]
fn auto_freeze_makes_results_reject_writes() {
    let mut producer = Producer::new();
    producer.set_auto_freeze(true);
    let base = value!({"a": {"b": 1}});
    let mut next = producer
        .produce(&base, |d| {
            let _ = d.child("a")?.get("b");
            d.set("a2", 1)
        })
        .unwrap();
    assert_eq!(
        next.insert(Key::from("c"), value!(1)),
        Err(ValueError::Frozen)
    );
    // A drafted-but-unmodified subtree is frozen deeply along with the
    // base reference it resolves to.
    let mut child = next.get(&Key::from("a")).cloned().unwrap();
    assert_eq!(
        child.insert(Key::from("c"), value!(1)),
        Err(ValueError::Frozen)
    );
}

#[test]
fn a_no_write_produce_freezes_the_base_itself() {
    let mut producer = Producer::new();
    producer.set_auto_freeze(true);
    let base = value!({"a": 1});
    let mut next = producer.produce(&base, |_| Ok(())).unwrap();
    assert!(next.same(&base));
    assert_eq!(
        next.insert(Key::from("b"), value!(2)),
        Err(ValueError::Frozen)
    );
}

#[test]
fn auto_freeze_off_leaves_results_editable() {
    let mut producer = Producer::new();
    producer.set_auto_freeze(false);
    let base = value!({"a": 1});
    let mut next = producer.produce(&base, |d| d.set("a", 2)).unwrap();
    assert!(next.insert(Key::from("b"), value!(3)).is_ok());
}

// ── Maps and sets ─────────────────────────────────────────────────────────

#[test]
fn map_drafts_support_arbitrary_keys() {
    let base = Value::map([(value!([1, 2]), value!("by-array")), (value!("s"), value!(1))]);
    let next = produce(&base, |d| {
        d.set(Key::Item(value!([1, 2])), "updated")?;
        d.set("s", 2)?;
        Ok(())
    })
    .unwrap();
    assert_eq!(
        next.get(&Key::Item(value!([1, 2]))),
        Some(&value!("updated"))
    );
    assert_eq!(next.get(&Key::from("s")), Some(&value!(2)));
}

#[test]
fn set_drafts_edit_membership() {
    let base = Value::set([value!(1), value!(2)]);
    let next = produce(&base, |d| {
        d.add(3)?;
        d.remove(Key::Item(value!(1)))?;
        Ok(())
    })
    .unwrap();
    assert_eq!(next, Value::set([value!(2), value!(3)]));
    assert_eq!(base, Value::set([value!(1), value!(2)]));
}

#[test]
fn unchanged_map_entries_are_shared() {
    let base = Value::map([
        (value!("touched"), value!({"x": 1})),
        (value!("kept"), value!({"y": 2})),
    ]);
    let next = produce(&base, |d| d.child("touched")?.set("x", 9)).unwrap();
    let kept_before = base.get(&Key::from("kept")).cloned().unwrap();
    let kept_after = next.get(&Key::from("kept")).cloned().unwrap();
    assert!(kept_before.same(&kept_after));
}

// ── Copy strategies ───────────────────────────────────────────────────────

#[test]
fn both_strategies_produce_identical_results_and_patches() {
    let base = value!({"a": {"b": 1}, "list": [1, 2, 3], "drop": true});
    let recipe = |d: &mut Draft| {
        d.child("a")?.set("b", 2)?;
        d.child("list")?.pop()?;
        d.remove("drop")?;
        d.set("new", "x")?;
        Ok(())
    };

    let mut lazy = Producer::new();
    lazy.set_copy_strategy(CopyStrategy::OnWrite);
    let mut eager = Producer::new();
    eager.set_copy_strategy(CopyStrategy::OnAccess);

    let (a, pa, ia) = lazy.produce_with_patches(&base, recipe).unwrap();
    let (b, pb, ib) = eager.produce_with_patches(&base, recipe).unwrap();
    assert_eq!(a, b);
    assert_eq!(pa, pb);
    assert_eq!(ia, ib);
}

#[test]
fn eager_strategy_still_shares_unmodified_subtrees() {
    let mut producer = Producer::new();
    producer.set_copy_strategy(CopyStrategy::OnAccess);
    let base = value!({"kept": {"y": 2}, "touched": {"x": 1}});
    let next = producer
        .produce(&base, |d| {
            // Access both children; only mutate one.
            let _ = d.child("kept")?.get("y");
            d.child("touched")?.set("x", 3)?;
            Ok(())
        })
        .unwrap();
    let kept_before = base.get(&Key::from("kept")).cloned().unwrap();
    let kept_after = next.get(&Key::from("kept")).cloned().unwrap();
    assert!(kept_before.same(&kept_after));
}

// ── Observer hooks ────────────────────────────────────────────────────────

#[test]
fn hooks_fire_during_finalization() {
    let assigns = Rc::new(Cell::new(0usize));
    let deletes = Rc::new(Cell::new(0usize));
    let copies = Rc::new(Cell::new(0usize));

    let mut producer = Producer::new();
    {
        let assigns = Rc::clone(&assigns);
        producer.set_on_assign(move |_, _| assigns.set(assigns.get() + 1));
    }
    {
        let deletes = Rc::clone(&deletes);
        producer.set_on_delete(move |_| deletes.set(deletes.get() + 1));
    }
    {
        let copies = Rc::clone(&copies);
        producer.set_on_copy(move |_| copies.set(copies.get() + 1));
    }

    let base = value!({"a": 1, "drop": 2, "nested": {"x": 1}});
    producer
        .produce(&base, |d| {
            d.set("a", 10)?;
            d.remove("drop")?;
            d.child("nested")?.set("x", 2)?;
            Ok(())
        })
        .unwrap();

    // "a" changed on the root, "x" changed on the nested node, and the
    // finalized nested node itself counts as an assign on the root.
    assert_eq!(assigns.get(), 3);
    assert_eq!(deletes.get(), 1);
    // Root and nested node were each copied once.
    assert_eq!(copies.get(), 2);
}

#[test]
fn no_op_reassignment_does_not_fire_assign_hooks() {
    let assigns = Rc::new(Cell::new(0usize));
    let mut producer = Producer::new();
    {
        let assigns = Rc::clone(&assigns);
        producer.set_on_assign(move |_, _| assigns.set(assigns.get() + 1));
    }
    let base = value!({"a": 1});
    producer.produce(&base, |d| d.set("a", 1)).unwrap();
    assert_eq!(assigns.get(), 0);
}

// ── Nesting ───────────────────────────────────────────────────────────────

#[test]
fn nested_producer_calls_run_in_independent_sessions() {
    let base = value!({"outer": 1});
    let other = value!({"inner": 1});
    let next = produce(&base, |d| {
        let inner = produce(&other, |di| di.set("inner", 2))
            .map_err(|_| DraftError::Missing(Key::from("inner")))?;
        d.set("outer", inner.get(&Key::from("inner")).cloned().unwrap_or(Value::Null))?;
        Ok(())
    })
    .unwrap();
    assert_eq!(next, value!({"outer": 2}));
    assert_eq!(other, value!({"inner": 1}));
}

// ── Manual two-phase drafts ───────────────────────────────────────────────

#[test]
fn manual_draft_spans_multiple_borrows() {
    let base = value!({"step": 0, "log": []});
    let mut manual = create_draft(&base).unwrap();
    manual.draft().set("step", 1).unwrap();
    // The session stays open between accesses.
    manual.draft().child("log").unwrap().push("one").unwrap();
    let next = finish_draft(manual).unwrap();
    assert_eq!(next, value!({"step": 1, "log": ["one"]}));
    assert_eq!(base, value!({"step": 0, "log": []}));
}

#[test]
fn manual_draft_with_patches() {
    let base = value!({"a": 1});
    let mut manual = create_draft(&base).unwrap();
    manual.draft().set("a", 2).unwrap();
    let (next, patches, inverse) = finish_draft_with_patches(manual).unwrap();
    assert_eq!(next, value!({"a": 2}));
    assert_eq!(patches.len(), 1);
    assert_eq!(inverse.len(), 1);
}

#[test]
fn manual_draft_requires_a_draftable_base() {
    let err = create_draft(&value!(5)).unwrap_err();
    assert!(matches!(err, DraftError::NotDraftable(_)));
}

#[test]
fn unmodified_manual_draft_returns_the_base() {
    let base = value!({"a": 1});
    let manual = create_draft(&base).unwrap();
    let next = finish_draft(manual).unwrap();
    assert!(next.same(&base));
}

// ── Drafts of scalars and missing children ────────────────────────────────

#[test]
fn drafting_a_scalar_child_is_rejected() {
    let base = value!({"n": 5});
    let err = produce(&base, |d| {
        d.child("n")?.set("x", 1)?;
        Ok(())
    })
    .unwrap_err();
    assert!(matches!(err, DraftError::KindMismatch { op: "child", .. }));
}

#[test]
fn drafting_a_missing_child_is_rejected() {
    let base = value!({});
    let err = produce(&base, |d| {
        d.child("ghost")?.set("x", 1)?;
        Ok(())
    })
    .unwrap_err();
    assert_eq!(err, DraftError::Missing(Key::from("ghost")));
}
