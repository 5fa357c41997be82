//! Integration tests for the timeline engine invariants.
//!
//! Drives generated sequences of add/remove/reorder calls and checks
//! placeholder uniqueness, dense ordering and derived-transition
//! correctness after every step.

use proptest::prelude::*;
use reelboard_core::frame::FrameAsset;
use reelboard_core::selection::Selection;
use reelboard_core::timeline::TimelineEngine;
use reelboard_core::transition::{TransitionStatus, TransitionUpdate};

/// One timeline edit. Positions are reduced modulo the current length so
/// shrinking keeps them meaningful.
#[derive(Debug, Clone)]
enum Edit {
    Add,
    Remove(usize),
    RemovePlaceholder,
    Reorder(usize, usize),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        2 => Just(Edit::Add),
        1 => (0_usize..32).prop_map(Edit::Remove),
        1 => Just(Edit::RemovePlaceholder),
        1 => (0_usize..32, 0_usize..32).prop_map(|(source, target)| Edit::Reorder(source, target)),
    ]
}

fn assert_structure(engine: &TimelineEngine) {
    engine.check_invariants().unwrap();

    let placeholders: Vec<_> = engine.frames().filter(|f| f.is_placeholder()).collect();
    assert_eq!(placeholders.len(), 1);
    assert_eq!(placeholders[0].order, engine.concrete_frames().len());
    assert!(engine.frames().last().unwrap().is_placeholder());

    let orders: Vec<_> = engine.concrete_frames().iter().map(|f| f.order).collect();
    assert_eq!(orders, (0..engine.concrete_frames().len()).collect::<Vec<_>>());

    let pairs: Vec<_> = engine
        .concrete_frames()
        .windows(2)
        .map(|w| (w[0].id, w[1].id))
        .collect();
    let derived: Vec<_> = engine
        .transitions()
        .iter()
        .map(|t| (t.from_frame_id, t.to_frame_id))
        .collect();
    assert_eq!(derived, pairs);
}

// ---------------------------------------------------------------------------
// Test: scenario from a single frame
// ---------------------------------------------------------------------------

#[test]
fn add_then_remove_scenario() {
    let mut engine = TimelineEngine::from_assets([FrameAsset::image("frame-1.svg", None)]);
    let first = engine.concrete_frames()[0].id;

    let added = engine.add_frame("a.png", None);

    assert_eq!(engine.concrete_frames().len(), 2);
    assert_eq!(engine.transitions().len(), 1);
    assert_eq!(engine.transitions()[0].status, TransitionStatus::Idle);
    assert!(engine.transitions()[0].prompt.is_empty());
    assert_eq!(engine.placeholder().order, 2);
    assert_eq!(engine.selection(), Selection::Frame(added));

    engine.remove_frame(first);

    assert_eq!(engine.concrete_frames().len(), 1);
    assert_eq!(engine.concrete_frames()[0].order, 0);
    assert!(engine.transitions().is_empty());
    assert_eq!(engine.placeholder().order, 1);
    assert_structure(&engine);
}

// ---------------------------------------------------------------------------
// Test: invariants hold over long mutation sequences
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn invariants_hold_over_random_sequences(edits in prop::collection::vec(edit(), 0..120)) {
        let mut engine = TimelineEngine::new();
        assert_structure(&engine);

        for (step, edit) in edits.into_iter().enumerate() {
            let len = engine.concrete_frames().len();
            match edit {
                Edit::Add => {
                    let id = engine.add_frame(&format!("{step}.png"), None);
                    prop_assert_eq!(engine.selection(), Selection::Frame(id));
                }
                Edit::Remove(idx) if len > 0 => {
                    let id = engine.concrete_frames()[idx % len].id;
                    prop_assert!(engine.remove_frame(id));
                }
                Edit::Remove(_) => {}
                Edit::RemovePlaceholder => {
                    let placeholder = engine.placeholder().id;
                    prop_assert!(!engine.remove_frame(placeholder));
                }
                Edit::Reorder(source, target) => {
                    let ids: Vec<_> = engine.transitions().iter().map(|t| t.id).collect();
                    for id in ids {
                        engine.update_transition(id, TransitionUpdate::status(TransitionStatus::Ready));
                    }

                    let source = source % (len + 1);
                    let applied = engine.reorder_frame(source, target);
                    prop_assert_eq!(applied, source < len);
                    if applied {
                        prop_assert!(engine
                            .transitions()
                            .iter()
                            .all(|t| t.status != TransitionStatus::Ready));
                    }
                }
            }
            assert_structure(&engine);
        }
    }
}

// ---------------------------------------------------------------------------
// Test: user fields survive while adjacency holds
// ---------------------------------------------------------------------------

#[test]
fn prompt_and_preview_survive_while_adjacent() {
    let mut engine = TimelineEngine::from_assets(
        ["a", "b", "c", "d"].map(|n| FrameAsset::image(format!("{n}.png"), None)),
    );
    let ids: Vec<_> = engine.concrete_frames().iter().map(|f| f.id).collect();
    let ab = engine.transition_between(ids[0], ids[1]).unwrap().id;
    engine.update_transition(
        ab,
        TransitionUpdate::status(TransitionStatus::Ready)
            .with_prompt("drone fly-through")
            .with_preview_url("https://cdn.example/ab.mp4")
            .with_task_id("task-ab"),
    );

    // c and d swap: a-b stays adjacent.
    engine.reorder_frame(2, 3);
    engine.add_frame("e.png", None);
    engine.remove_frame(ids[3]);

    let t = engine.transition(ab).unwrap();
    assert_eq!(t.prompt, "drone fly-through");
    assert_eq!(t.preview_url.as_deref(), Some("https://cdn.example/ab.mp4"));
    assert_eq!(t.task_id.as_deref(), Some("task-ab"));
    assert_eq!(t.status, TransitionStatus::NeedsRegenerate);

    // Splitting a and b drops the record and its fields.
    engine.reorder_frame(0, 2);
    assert!(engine.transition(ab).is_none());
    assert!(engine.transition_between(ids[0], ids[1]).is_none());
    assert!(engine.take_orphaned().contains(&ab));
    assert_structure(&engine);
}

// ---------------------------------------------------------------------------
// Test: reorder invalidation is global
// ---------------------------------------------------------------------------

#[test]
fn reorder_invalidates_every_surviving_ready_transition() {
    let mut engine = TimelineEngine::from_assets(
        ["a", "b", "c", "d", "e"].map(|n| FrameAsset::image(format!("{n}.png"), None)),
    );
    let ready: Vec<_> = engine.transitions().iter().map(|t| t.id).collect();
    for id in &ready {
        engine.update_transition(*id, TransitionUpdate::status(TransitionStatus::Ready));
    }

    engine.reorder_frame(4, 3);

    assert!(engine
        .transitions()
        .iter()
        .all(|t| t.status != TransitionStatus::Ready));
    let survivors: Vec<_> = engine
        .transitions()
        .iter()
        .filter(|t| ready.contains(&t.id))
        .collect();
    assert_eq!(survivors.len(), 2);
    assert!(survivors
        .iter()
        .all(|t| t.status == TransitionStatus::NeedsRegenerate));
}

// ---------------------------------------------------------------------------
// Test: independent engines do not share state
// ---------------------------------------------------------------------------

#[test]
fn engines_are_independent() {
    let mut left = TimelineEngine::new();
    let right = TimelineEngine::new();

    left.add_frame("a.png", None);

    assert_eq!(left.concrete_frames().len(), 1);
    assert!(right.concrete_frames().is_empty());
    assert_ne!(left.placeholder().id, right.placeholder().id);
}
