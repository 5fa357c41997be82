//! Timeline engine: the canonical in-memory editor state.
//!
//! [`TimelineEngine`] owns the ordered concrete frames, the trailing
//! placeholder, the derived transitions and the current selection. Every
//! public mutation is synchronous and leaves all invariants holding before
//! it returns:
//!
//! - exactly one placeholder exists and its order equals the concrete count;
//! - concrete orders are exactly `0..N`;
//! - transitions are exactly the adjacent concrete pairs, in order;
//! - the selection names an existing frame or transition, or nothing.
//!
//! Expected domain conditions (deleting the placeholder, unknown ids,
//! out-of-range orders) are no-ops reported through the return value.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::CoreError;
use crate::frame::{Frame, FrameAsset, FrameUpdate};
use crate::selection::Selection;
use crate::transition::{Transition, TransitionStatus, TransitionUpdate};
use crate::types::{FrameId, Metadata, TransitionId};

// ---------------------------------------------------------------------------
// Transition derivation
// ---------------------------------------------------------------------------

/// Result of re-deriving transitions from a frame order.
#[derive(Debug)]
pub struct SyncOutcome {
    /// One transition per adjacent concrete pair, in timeline order.
    pub transitions: Vec<Transition>,
    /// Previous transitions whose endpoints are no longer adjacent.
    pub dropped: Vec<Transition>,
}

/// Re-derive the transition list for `frames` (concrete frames, in order).
///
/// A previous transition is kept verbatim when it maps the exact
/// `(from, to)` pair; every other adjacent pair gets a fresh `idle`
/// transition.
pub fn sync_transitions(frames: &[Frame], previous: Vec<Transition>) -> SyncOutcome {
    let mut remaining = previous;
    let mut transitions = Vec::with_capacity(frames.len().saturating_sub(1));

    for pair in frames.windows(2) {
        let (from, to) = (pair[0].id, pair[1].id);
        let transition = match remaining.iter().position(|t| t.connects(from, to)) {
            Some(idx) => remaining.swap_remove(idx),
            None => Transition::between(from, to),
        };
        transitions.push(transition);
    }

    SyncOutcome {
        transitions,
        dropped: remaining,
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Read-only copy of the engine state for rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSnapshot {
    /// Concrete frames in order, followed by the placeholder.
    pub frames: Vec<Frame>,
    pub transitions: Vec<Transition>,
    pub selection: Selection,
    pub total_duration_ms: u64,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Most orphaned transition ids kept while nobody drains them.
pub const ORPHAN_BACKLOG_LIMIT: usize = 256;

#[derive(Debug, Clone)]
pub struct TimelineEngine {
    /// Concrete frames; `frames[i].order == i`.
    frames: Vec<Frame>,
    placeholder: Frame,
    transitions: Vec<Transition>,
    selection: Selection,
    /// Transitions dropped by re-derivation and not yet collected.
    orphaned: Vec<TransitionId>,
}

impl Default for TimelineEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineEngine {
    /// An empty timeline: no concrete frames, only the placeholder.
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            placeholder: Frame::placeholder(0),
            transitions: Vec::new(),
            selection: Selection::None,
            orphaned: Vec::new(),
        }
    }

    /// A timeline seeded with `assets`, selecting the first frame.
    pub fn from_assets(assets: impl IntoIterator<Item = FrameAsset>) -> Self {
        let mut engine = Self::new();
        engine.frames = assets
            .into_iter()
            .enumerate()
            .map(|(order, asset)| Frame::concrete(order, asset))
            .collect();
        engine.renumber();
        engine.rederive();
        engine.selection = engine
            .frames
            .first()
            .map_or(Selection::None, |f| Selection::Frame(f.id));
        engine.orphaned.clear();
        engine.debug_check();
        engine
    }

    // -- reads ---------------------------------------------------------------

    /// All frames in timeline order, the placeholder last.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> + '_ {
        self.frames.iter().chain(std::iter::once(&self.placeholder))
    }

    pub fn concrete_frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn placeholder(&self) -> &Frame {
        &self.placeholder
    }

    pub fn frame(&self, frame_id: FrameId) -> Option<&Frame> {
        self.frames().find(|f| f.id == frame_id)
    }

    pub fn frame_at(&self, order: usize) -> Option<&Frame> {
        self.frames.get(order)
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn transition(&self, transition_id: TransitionId) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.id == transition_id)
    }

    pub fn transition_between(&self, from: FrameId, to: FrameId) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.connects(from, to))
    }

    /// The two frames a transition bridges.
    pub fn endpoints(&self, transition_id: TransitionId) -> Option<(&Frame, &Frame)> {
        let transition = self.transition(transition_id)?;
        let from = self.frame(transition.from_frame_id)?;
        let to = self.frame(transition.to_frame_id)?;
        Some((from, to))
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn selected_frame(&self) -> Option<&Frame> {
        self.selection.frame_id().and_then(|id| self.frame(id))
    }

    pub fn selected_transition(&self) -> Option<&Transition> {
        self.selection
            .transition_id()
            .and_then(|id| self.transition(id))
    }

    /// Playback length: every concrete frame plus every transition clip.
    pub fn total_duration_ms(&self) -> u64 {
        let frames: u64 = self.frames.iter().map(|f| u64::from(f.duration_ms)).sum();
        let transitions: u64 = self
            .transitions
            .iter()
            .map(|t| u64::from(t.duration_ms))
            .sum();
        frames + transitions
    }

    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            frames: self.frames().cloned().collect(),
            transitions: self.transitions.clone(),
            selection: self.selection,
            total_duration_ms: self.total_duration_ms(),
        }
    }

    // -- frame mutations -----------------------------------------------------

    /// Append a concrete frame just before the placeholder and select it.
    pub fn add_frame(&mut self, asset_url: &str, thumbnail_url: Option<&str>) -> FrameId {
        self.add_frame_with_metadata(asset_url, thumbnail_url, Metadata::new())
    }

    /// Fill the placeholder slot with content produced elsewhere (upload,
    /// image generation), recording where it came from in `metadata`.
    pub fn add_frame_with_metadata(
        &mut self,
        asset_url: &str,
        thumbnail_url: Option<&str>,
        metadata: Metadata,
    ) -> FrameId {
        let asset = FrameAsset::image(asset_url, thumbnail_url);
        let mut frame = Frame::concrete(self.frames.len(), asset);
        frame.metadata = metadata;
        let id = frame.id;

        self.frames.push(frame);
        self.renumber();
        self.rederive();
        self.selection = Selection::Frame(id);

        self.debug_check();
        id
    }

    /// Merge `changes` into a concrete frame. The placeholder is content-less
    /// and cannot be updated.
    pub fn update_frame(&mut self, frame_id: FrameId, changes: FrameUpdate) -> bool {
        let Some(frame) = self.frames.iter_mut().find(|f| f.id == frame_id) else {
            return false;
        };
        frame.apply(changes);
        self.debug_check();
        true
    }

    /// Remove a concrete frame and select the new first frame.
    ///
    /// The placeholder and unknown ids are ignored.
    pub fn remove_frame(&mut self, frame_id: FrameId) -> bool {
        let Some(idx) = self.frames.iter().position(|f| f.id == frame_id) else {
            return false;
        };

        self.frames.remove(idx);
        self.renumber();
        self.rederive();
        self.selection = self
            .frames
            .first()
            .map_or(Selection::None, |f| Selection::Frame(f.id));

        self.debug_check();
        true
    }

    /// Move the concrete frame at `source_order` to `target_order`, shifting
    /// the frames in between.
    ///
    /// Targets past the end clamp to the last concrete slot. Every surviving
    /// `ready` transition is downgraded to `needs-regenerate`, including ones
    /// whose endpoints stayed adjacent and including a move onto the same
    /// slot. Only an out-of-range source is ignored.
    pub fn reorder_frame(&mut self, source_order: usize, target_order: usize) -> bool {
        if source_order >= self.frames.len() {
            return false;
        }
        let target_order = target_order.min(self.frames.len() - 1);

        if source_order != target_order {
            let frame = self.frames.remove(source_order);
            self.frames.insert(target_order, frame);
            self.renumber();
        }
        self.rederive();

        for transition in &mut self.transitions {
            if transition.status == TransitionStatus::Ready {
                transition.status = TransitionStatus::NeedsRegenerate;
            }
        }

        self.debug_check();
        true
    }

    // -- selection -----------------------------------------------------------

    /// Select a frame (placeholder included) or clear the selection.
    pub fn select_frame(&mut self, frame_id: Option<FrameId>) -> bool {
        match frame_id {
            None => self.selection = Selection::None,
            Some(id) if self.frame(id).is_some() => self.selection = Selection::Frame(id),
            Some(_) => return false,
        }
        true
    }

    /// Select a transition or clear the selection.
    pub fn select_transition(&mut self, transition_id: Option<TransitionId>) -> bool {
        match transition_id {
            None => self.selection = Selection::None,
            Some(id) if self.transition(id).is_some() => {
                self.selection = Selection::Transition(id)
            }
            Some(_) => return false,
        }
        true
    }

    // -- transition mutations ------------------------------------------------

    /// Merge `changes` into a transition. Endpoints and id are never touched.
    pub fn update_transition(&mut self, transition_id: TransitionId, changes: TransitionUpdate) -> bool {
        let Some(transition) = self.transitions.iter_mut().find(|t| t.id == transition_id) else {
            return false;
        };
        transition.apply(changes);
        true
    }

    /// Queue the transition between two frames and select it.
    ///
    /// Transitions only exist for adjacent pairs, so a pair without one is
    /// left alone.
    pub fn queue_transition(&mut self, from: FrameId, to: FrameId) -> Option<TransitionId> {
        let transition = self.transitions.iter_mut().find(|t| t.connects(from, to))?;
        transition.status = TransitionStatus::Queued;
        let id = transition.id;
        self.selection = Selection::Transition(id);
        Some(id)
    }

    /// User-triggered downgrade of a `ready` transition.
    pub fn mark_needs_regenerate(&mut self, transition_id: TransitionId) -> bool {
        match self.transitions.iter_mut().find(|t| t.id == transition_id) {
            Some(t) if t.status == TransitionStatus::Ready => {
                t.status = TransitionStatus::NeedsRegenerate;
                true
            }
            _ => false,
        }
    }

    /// Store an edited prompt without generating.
    ///
    /// The transition is marked `needs-regenerate` unless a generation is in
    /// flight, in which case only the prompt is stored.
    pub fn save_transition_draft(&mut self, transition_id: TransitionId, prompt: &str) -> bool {
        let Some(transition) = self.transitions.iter_mut().find(|t| t.id == transition_id) else {
            return false;
        };
        transition.prompt = prompt.to_string();
        if !transition.status.is_in_flight() {
            transition.status = TransitionStatus::NeedsRegenerate;
        }
        true
    }

    /// Ids of transitions dropped by re-derivation since the last call.
    ///
    /// Whoever runs generation against this engine drains it after each
    /// structural edit. Undrained ids are capped at
    /// [`ORPHAN_BACKLOG_LIMIT`], oldest first out.
    pub fn take_orphaned(&mut self) -> Vec<TransitionId> {
        std::mem::take(&mut self.orphaned)
    }

    // -- invariants ----------------------------------------------------------

    /// Verify every structural invariant of the timeline.
    pub fn check_invariants(&self) -> Result<(), CoreError> {
        let fail = |msg: String| Err(CoreError::Invariant(msg));

        if !self.placeholder.is_placeholder() {
            return fail("trailing slot is not a placeholder".into());
        }
        if self.placeholder.order != self.frames.len() {
            return fail(format!(
                "placeholder order {} != concrete count {}",
                self.placeholder.order,
                self.frames.len()
            ));
        }

        let mut ids = HashSet::new();
        for (idx, frame) in self.frames.iter().enumerate() {
            if frame.is_placeholder() {
                return fail(format!("placeholder found among concrete frames at {idx}"));
            }
            if frame.order != idx {
                return fail(format!("frame {} has order {} at position {idx}", frame.id, frame.order));
            }
            if frame.duration_ms == 0 {
                return fail(format!("frame {} has zero duration", frame.id));
            }
            if !ids.insert(frame.id) {
                return fail(format!("duplicate frame id {}", frame.id));
            }
        }
        if ids.contains(&self.placeholder.id) {
            return fail("placeholder id collides with a concrete frame".into());
        }

        let expected = self.frames.len().saturating_sub(1);
        if self.transitions.len() != expected {
            return fail(format!(
                "{} transitions for {} concrete frames",
                self.transitions.len(),
                self.frames.len()
            ));
        }
        for (pair, transition) in self.frames.windows(2).zip(&self.transitions) {
            if !transition.connects(pair[0].id, pair[1].id) {
                return fail(format!(
                    "transition {} does not connect adjacent frames {} -> {}",
                    transition.id, pair[0].id, pair[1].id
                ));
            }
        }

        let selection_valid = match self.selection {
            Selection::None => true,
            Selection::Frame(id) => self.frame(id).is_some(),
            Selection::Transition(id) => self.transition(id).is_some(),
        };
        if !selection_valid {
            return fail(format!("selection {:?} is dangling", self.selection));
        }

        Ok(())
    }

    // -- private helpers -----------------------------------------------------

    fn renumber(&mut self) {
        for (order, frame) in self.frames.iter_mut().enumerate() {
            frame.order = order;
        }
        self.placeholder.order = self.frames.len();
    }

    fn rederive(&mut self) {
        let previous = std::mem::take(&mut self.transitions);
        let outcome = sync_transitions(&self.frames, previous);
        self.transitions = outcome.transitions;
        self.orphaned.extend(outcome.dropped.iter().map(|t| t.id));
        if self.orphaned.len() > ORPHAN_BACKLOG_LIMIT {
            let excess = self.orphaned.len() - ORPHAN_BACKLOG_LIMIT;
            self.orphaned.drain(..excess);
        }

        if let Selection::Transition(id) = self.selection {
            if self.transition(id).is_none() {
                self.selection = Selection::None;
            }
        }
    }

    fn debug_check(&self) {
        debug_assert!(
            self.check_invariants().is_ok(),
            "{:?}",
            self.check_invariants()
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameStatus;

    fn engine_with(n: usize) -> TimelineEngine {
        TimelineEngine::from_assets((0..n).map(|i| FrameAsset::image(format!("{i}.png"), None)))
    }

    fn ids(engine: &TimelineEngine) -> Vec<FrameId> {
        engine.concrete_frames().iter().map(|f| f.id).collect()
    }

    // -- construction --------------------------------------------------------

    #[test]
    fn new_engine_has_only_placeholder() {
        let engine = TimelineEngine::new();
        assert!(engine.concrete_frames().is_empty());
        assert_eq!(engine.frames().count(), 1);
        assert_eq!(engine.placeholder().order, 0);
        assert!(engine.selection().is_none());
        engine.check_invariants().unwrap();
    }

    #[test]
    fn seeded_engine_selects_first_frame() {
        let engine = engine_with(3);
        assert_eq!(engine.transitions().len(), 2);
        assert_eq!(engine.selection(), Selection::Frame(engine.concrete_frames()[0].id));
        engine.check_invariants().unwrap();
    }

    // -- add_frame -----------------------------------------------------------

    #[test]
    fn add_frame_appends_before_placeholder_and_selects() {
        let mut engine = engine_with(1);
        let id = engine.add_frame("a.png", None);

        let orders: Vec<_> = engine.frames().map(|f| (f.order, f.is_placeholder())).collect();
        assert_eq!(orders, vec![(0, false), (1, false), (2, true)]);
        assert_eq!(engine.selection(), Selection::Frame(id));
        assert_eq!(engine.transitions().len(), 1);
        assert_eq!(engine.transitions()[0].status, TransitionStatus::Idle);
        assert_eq!(engine.transitions()[0].prompt, "");
    }

    #[test]
    fn add_frame_keeps_existing_transition() {
        let mut engine = engine_with(2);
        let tid = engine.transitions()[0].id;
        engine.update_transition(tid, TransitionUpdate::default().with_prompt("fly over"));

        engine.add_frame("c.png", Some("c-thumb.png"));

        assert_eq!(engine.transitions()[0].id, tid);
        assert_eq!(engine.transitions()[0].prompt, "fly over");
        assert!(engine.take_orphaned().is_empty());
    }

    #[test]
    fn add_frame_with_metadata_records_source() {
        let mut engine = TimelineEngine::new();
        let mut meta = Metadata::new();
        meta.insert("source".into(), "upload".into());

        let id = engine.add_frame_with_metadata("data:image/png;base64,AAAA", None, meta);

        assert_eq!(engine.frame(id).unwrap().metadata["source"], "upload");
    }

    // -- update_frame --------------------------------------------------------

    #[test]
    fn update_frame_merges_without_touching_order() {
        let mut engine = engine_with(2);
        let id = engine.concrete_frames()[1].id;

        assert!(engine.update_frame(id, FrameUpdate::default().status(FrameStatus::Failed)));

        let frame = engine.frame(id).unwrap();
        assert_eq!(frame.order, 1);
        assert_eq!(frame.status, FrameStatus::Failed);
        assert_eq!(frame.asset.url, "1.png");
    }

    #[test]
    fn update_frame_ignores_placeholder() {
        let mut engine = engine_with(1);
        let placeholder = engine.placeholder().id;
        let changes = FrameUpdate::default().asset(FrameAsset::image("x.png", None));

        assert!(!engine.update_frame(placeholder, changes));
        assert!(engine.placeholder().asset.url.is_empty());
    }

    // -- remove_frame --------------------------------------------------------

    #[test]
    fn remove_placeholder_is_noop() {
        let mut engine = engine_with(2);
        let before = engine.snapshot();

        assert!(!engine.remove_frame(engine.placeholder().id));

        assert_eq!(engine.snapshot().frames, before.frames);
        assert_eq!(engine.selection(), before.selection);
    }

    #[test]
    fn remove_unknown_frame_is_noop() {
        let mut engine = engine_with(2);
        assert!(!engine.remove_frame(FrameId::new()));
        assert_eq!(engine.concrete_frames().len(), 2);
    }

    #[test]
    fn remove_middle_frame_renumbers_and_orphans() {
        let mut engine = engine_with(3);
        let v = ids(&engine);
        let (a, b, c) = (v[0], v[1], v[2]);
        let ab = engine.transition_between(a, b).unwrap().id;
        let bc = engine.transition_between(b, c).unwrap().id;

        assert!(engine.remove_frame(b));

        assert_eq!(ids(&engine), vec![a, c]);
        assert_eq!(engine.frame(c).unwrap().order, 1);
        assert_eq!(engine.placeholder().order, 2);
        assert!(engine.transition_between(a, c).is_some());
        let mut orphaned = engine.take_orphaned();
        orphaned.sort_by_key(|id| id.to_string());
        let mut expected = vec![ab, bc];
        expected.sort_by_key(|id| id.to_string());
        assert_eq!(orphaned, expected);
        assert_eq!(engine.selection(), Selection::Frame(a));
    }

    #[test]
    fn remove_last_frame_clears_selection() {
        let mut engine = engine_with(1);
        let id = engine.concrete_frames()[0].id;

        assert!(engine.remove_frame(id));

        assert!(engine.selection().is_none());
        assert_eq!(engine.placeholder().order, 0);
    }

    // -- reorder_frame -------------------------------------------------------

    #[test]
    fn reorder_moves_frame_and_shifts_others() {
        let mut engine = engine_with(4);
        let v = ids(&engine);
        let (a, b, c, d) = (v[0], v[1], v[2], v[3]);

        assert!(engine.reorder_frame(0, 2));

        assert_eq!(ids(&engine), vec![b, c, a, d]);
        engine.check_invariants().unwrap();
    }

    #[test]
    fn reorder_clamps_target_past_end() {
        let mut engine = engine_with(3);
        let v = ids(&engine);
        let (a, b, c) = (v[0], v[1], v[2]);

        assert!(engine.reorder_frame(0, 99));

        assert_eq!(ids(&engine), vec![b, c, a]);
    }

    #[test]
    fn reorder_out_of_range_source_is_noop() {
        let mut engine = engine_with(3);
        let tid = engine.transitions()[0].id;
        engine.update_transition(tid, TransitionUpdate::status(TransitionStatus::Ready));

        assert!(!engine.reorder_frame(3, 0));

        assert_eq!(engine.transition(tid).unwrap().status, TransitionStatus::Ready);
    }

    #[test]
    fn undrained_orphans_are_capped() {
        let mut engine = engine_with(1);
        let mut dropped = Vec::new();
        for i in 0..ORPHAN_BACKLOG_LIMIT + 10 {
            let id = engine.add_frame(&format!("extra-{i}.png"), None);
            dropped.push(engine.transitions()[0].id);
            engine.remove_frame(id);
        }

        let orphaned = engine.take_orphaned();
        assert_eq!(orphaned.len(), ORPHAN_BACKLOG_LIMIT);
        assert_eq!(orphaned, dropped[10..]);
        assert!(engine.take_orphaned().is_empty());
    }

    #[test]
    fn reorder_onto_same_slot_still_invalidates_ready() {
        let mut engine = engine_with(3);
        let before = ids(&engine);
        let tid = engine.transitions()[0].id;
        engine.update_transition(
            tid,
            TransitionUpdate::status(TransitionStatus::Ready).with_preview_url("t0.mp4"),
        );

        assert!(engine.reorder_frame(1, 1));

        assert_eq!(ids(&engine), before);
        let t = engine.transition(tid).unwrap();
        assert_eq!(t.status, TransitionStatus::NeedsRegenerate);
        assert_eq!(t.preview_url.as_deref(), Some("t0.mp4"));
        assert!(engine.take_orphaned().is_empty());
    }

    #[test]
    fn reorder_degrades_ready_transitions_that_stay_adjacent() {
        let mut engine = engine_with(4);
        let v = ids(&engine);
        let (a, b, _, _) = (v[0], v[1], v[2], v[3]);
        let ab = engine.transition_between(a, b).unwrap().id;
        engine.update_transition(
            ab,
            TransitionUpdate::status(TransitionStatus::Ready).with_preview_url("ab.mp4"),
        );

        // a, b stay adjacent; c and d swap.
        assert!(engine.reorder_frame(3, 2));

        let t = engine.transition(ab).unwrap();
        assert_eq!(t.status, TransitionStatus::NeedsRegenerate);
        assert_eq!(t.preview_url.as_deref(), Some("ab.mp4"));
    }

    #[test]
    fn reorder_leaves_non_ready_statuses_alone() {
        let mut engine = engine_with(4);
        let tid = engine.transitions()[0].id;
        engine.update_transition(tid, TransitionUpdate::status(TransitionStatus::Failed));

        assert!(engine.reorder_frame(3, 2));

        assert_eq!(engine.transition(tid).unwrap().status, TransitionStatus::Failed);
    }

    #[test]
    fn reorder_drops_selected_transition_selection() {
        let mut engine = engine_with(3);
        let v = ids(&engine);
        let (a, b, _) = (v[0], v[1], v[2]);
        let ab = engine.transition_between(a, b).unwrap().id;
        engine.select_transition(Some(ab));

        engine.reorder_frame(0, 2);

        assert!(engine.selection().is_none());
        assert!(engine.take_orphaned().contains(&ab));
    }

    // -- selection -----------------------------------------------------------

    #[test]
    fn selecting_transition_clears_frame_and_back() {
        let mut engine = engine_with(2);
        let tid = engine.transitions()[0].id;
        let fid = engine.concrete_frames()[0].id;

        assert!(engine.select_transition(Some(tid)));
        assert_eq!(engine.selection(), Selection::Transition(tid));
        assert!(engine.selected_frame().is_none());

        assert!(engine.select_frame(Some(fid)));
        assert_eq!(engine.selection(), Selection::Frame(fid));
        assert!(engine.selected_transition().is_none());
    }

    #[test]
    fn select_unknown_ids_is_noop() {
        let mut engine = engine_with(2);
        let before = engine.selection();
        assert!(!engine.select_frame(Some(FrameId::new())));
        assert!(!engine.select_transition(Some(TransitionId::new())));
        assert_eq!(engine.selection(), before);
    }

    #[test]
    fn placeholder_is_selectable() {
        let mut engine = engine_with(1);
        let placeholder = engine.placeholder().id;
        assert!(engine.select_frame(Some(placeholder)));
        assert!(engine.selected_frame().unwrap().is_placeholder());
    }

    // -- transition mutations ------------------------------------------------

    #[test]
    fn queue_transition_selects_existing_pair() {
        let mut engine = engine_with(2);
        let v = ids(&engine);
        let (a, b) = (v[0], v[1]);

        let tid = engine.queue_transition(a, b).unwrap();

        assert_eq!(engine.transition(tid).unwrap().status, TransitionStatus::Queued);
        assert_eq!(engine.selection(), Selection::Transition(tid));
        assert_eq!(engine.queue_transition(a, b), Some(tid));
    }

    #[test]
    fn queue_transition_for_non_adjacent_pair_is_noop() {
        let mut engine = engine_with(3);
        let v = ids(&engine);
        let (a, _, c) = (v[0], v[1], v[2]);

        assert_eq!(engine.queue_transition(a, c), None);
        assert_eq!(engine.transitions().len(), 2);
    }

    #[test]
    fn mark_needs_regenerate_only_from_ready() {
        let mut engine = engine_with(2);
        let tid = engine.transitions()[0].id;

        assert!(!engine.mark_needs_regenerate(tid));

        engine.update_transition(tid, TransitionUpdate::status(TransitionStatus::Ready));
        assert!(engine.mark_needs_regenerate(tid));
        assert_eq!(engine.transition(tid).unwrap().status, TransitionStatus::NeedsRegenerate);
    }

    #[test]
    fn save_draft_marks_needs_regenerate_unless_in_flight() {
        let mut engine = engine_with(2);
        let tid = engine.transitions()[0].id;

        assert!(engine.save_transition_draft(tid, "slow dolly"));
        let t = engine.transition(tid).unwrap();
        assert_eq!(t.prompt, "slow dolly");
        assert_eq!(t.status, TransitionStatus::NeedsRegenerate);

        engine.update_transition(tid, TransitionUpdate::status(TransitionStatus::Running));
        assert!(engine.save_transition_draft(tid, "whip pan"));
        let t = engine.transition(tid).unwrap();
        assert_eq!(t.prompt, "whip pan");
        assert_eq!(t.status, TransitionStatus::Running);
    }

    // -- derived values ------------------------------------------------------

    #[test]
    fn total_duration_counts_frames_and_transitions() {
        let engine = engine_with(3);
        assert_eq!(engine.total_duration_ms(), 3 * 5000 + 2 * 5000);
    }

    #[test]
    fn sync_transitions_keeps_exact_pairs_only() {
        let engine = engine_with(3);
        let frames = engine.concrete_frames().to_vec();
        let previous = engine.transitions().to_vec();

        let reversed: Vec<Frame> = frames.iter().rev().cloned().collect();
        let outcome = sync_transitions(&reversed, previous.clone());

        assert_eq!(outcome.transitions.len(), 2);
        assert_eq!(outcome.dropped.len(), 2);
        assert!(outcome.transitions.iter().all(|t| t.status == TransitionStatus::Idle));
        assert!(outcome
            .transitions
            .iter()
            .all(|t| previous.iter().all(|p| p.id != t.id)));
    }

    #[test]
    fn snapshot_lists_placeholder_last() {
        let engine = engine_with(2);
        let snap = engine.snapshot();
        assert_eq!(snap.frames.len(), 3);
        assert!(snap.frames.last().unwrap().is_placeholder());
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["totalDurationMs"], 15000);
        assert_eq!(json["selection"]["type"], "frame");
    }
}
