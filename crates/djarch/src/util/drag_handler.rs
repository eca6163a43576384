//! Pointer-driven move/resize of timeline blocks.
//!
//! [`DragState::next`] is the whole state machine as a pure function of the committed state and
//! one pointer event. [`DragHandler`] wraps it and performs the side effects: grabbing and
//! releasing pointer capture, and queuing the commit command.

use djarch_command::{
    StateTracker,
    block::{BlockMove, BlockResize},
};
use djarch_lib::{
    Beat, Block, Id, MIN_BLOCK_LEN_BEATS, State,
    projection::beat_to_px,
    snap::{snap_beat_to_beat, snap_px_to_beat},
};

/// Width of the grab area at a block's right edge that starts a resize instead of a move.
pub const RESIZE_HANDLE_PX: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragMode {
    Move,
    Resize,
}

/// Which drag a pointer-down at `local_px` on `block` starts, if any.
pub fn hit_test(block: &Block, local_px: f64, px_per_beat: f64) -> Option<DragMode> {
    let left = beat_to_px(block.start_beat as f64, px_per_beat);
    let right = beat_to_px(block.end_beat() as f64, px_per_beat);
    if !(left..right).contains(&local_px) {
        return None;
    }
    if local_px >= right - RESIZE_HANDLE_PX {
        Some(DragMode::Resize)
    } else {
        Some(DragMode::Move)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub u64);

/// Where the timeline content sits on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    /// Client-space x of the scroll container's left edge.
    pub container_left_px: f64,
    pub scroll_left_px: f64,
    /// Fixed label column to the left of beat 0.
    pub gutter_px: f64,
}

impl Viewport {
    /// Maps a client-space x coordinate into timeline content space, floored at zero.
    pub fn local_px(&self, client_x: f64) -> f64 {
        let local = client_x - self.container_left_px + self.scroll_left_px - self.gutter_px;
        if local.is_finite() { local.max(0.0) } else { 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Down {
        pointer_id: PointerId,
        block_id: Id<Block>,
        mode: DragMode,
        client_x: f64,
    },
    Move {
        pointer_id: PointerId,
        client_x: f64,
    },
    Up {
        pointer_id: PointerId,
    },
    Cancel {
        pointer_id: PointerId,
    },
}

/// The uncommitted placement shown while a drag is in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub block_id: Id<Block>,
    pub mode: DragMode,
    pub pointer_id: PointerId,
    pub origin_start: Beat,
    pub origin_len: Beat,
    pub draft_start: Beat,
    pub draft_len: Beat,
    /// Distance from the block's left edge to where it was grabbed.
    pub pointer_offset_px: f64,
    /// Whether the draft could be committed as it stands. Only for display; dragging through
    /// invalid spots is allowed.
    pub is_valid: bool,
}

impl Draft {
    /// What a release right now would try to commit.
    pub fn candidate(&self) -> (Beat, Beat) {
        match self.mode {
            DragMode::Move => (snap_beat_to_beat(self.draft_start as f64), self.origin_len),
            DragMode::Resize => (self.origin_start, snap_beat_to_beat(self.draft_len as f64)),
        }
    }

    fn commit(&self, state: &State) -> Option<Commit> {
        let (next_start, next_len) = self.candidate();
        if !state.is_placement_valid(&self.block_id, next_start, next_len) {
            tracing::debug!(
                "discarding drag of {}: {next_start}..+{next_len} is not a valid placement",
                self.block_id
            );
            return None;
        }
        let block_id = self.block_id.clone();
        match self.mode {
            DragMode::Move if next_start != self.origin_start => Some(Commit::Move {
                block_id,
                start: next_start,
            }),
            DragMode::Resize if next_len != self.origin_len => Some(Commit::Resize {
                block_id,
                len: next_len,
            }),
            _ => None,
        }
    }
}

/// A drag that ended in an accepted placement.
#[derive(Debug, Clone, PartialEq)]
pub enum Commit {
    Move { block_id: Id<Block>, start: Beat },
    Resize { block_id: Id<Block>, len: Beat },
}

impl Commit {
    pub fn queue(self, tracker: &mut StateTracker) {
        match self {
            Commit::Move { block_id, start } => {
                tracker.add(BlockMove::new(block_id, start as f64));
            }
            Commit::Resize { block_id, len } => {
                tracker.add(BlockResize::new(block_id, len as f64));
            }
        }
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum DragEffect {
    Capture(PointerId),
    /// The drag ended. `commit` is `None` if the draft was discarded.
    Release {
        pointer_id: PointerId,
        commit: Option<Commit>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(Draft),
}

impl DragState {
    pub fn draft(&self) -> Option<&Draft> {
        match self {
            DragState::Idle => None,
            DragState::Dragging(draft) => Some(draft),
        }
    }

    /// Advances the state machine by one event. Events that don't apply (a second pointer-down,
    /// events from a pointer that doesn't own the drag, a pointer-down on a missing block) leave
    /// the state as it was.
    pub fn next(
        self,
        event: &PointerEvent,
        state: &State,
        viewport: &Viewport,
    ) -> (Self, Option<DragEffect>) {
        let px_per_beat = state.px_per_beat();
        match (self, event) {
            (
                DragState::Idle,
                PointerEvent::Down {
                    pointer_id,
                    block_id,
                    mode,
                    client_x,
                },
            ) => {
                let Some(block) = state.block(block_id) else {
                    tracing::debug!("pointer down on missing block {block_id}");
                    return (DragState::Idle, None);
                };
                let local_px = viewport.local_px(*client_x);
                let draft = Draft {
                    block_id: block_id.clone(),
                    mode: *mode,
                    pointer_id: *pointer_id,
                    origin_start: block.start_beat,
                    origin_len: block.length_beats,
                    draft_start: block.start_beat,
                    draft_len: block.length_beats,
                    pointer_offset_px: local_px
                        - beat_to_px(block.start_beat as f64, px_per_beat),
                    is_valid: state.is_block_placement_valid(block),
                };
                (
                    DragState::Dragging(draft),
                    Some(DragEffect::Capture(*pointer_id)),
                )
            }
            (
                DragState::Dragging(mut draft),
                PointerEvent::Move {
                    pointer_id,
                    client_x,
                },
            ) if draft.pointer_id == *pointer_id => {
                let local_px = viewport.local_px(*client_x);
                match draft.mode {
                    DragMode::Move => {
                        draft.draft_start =
                            snap_px_to_beat(local_px - draft.pointer_offset_px, px_per_beat);
                    }
                    DragMode::Resize => {
                        let end = snap_px_to_beat(local_px, px_per_beat);
                        draft.draft_len = (end - draft.origin_start).max(MIN_BLOCK_LEN_BEATS);
                    }
                }
                let (start, len) = draft.candidate();
                draft.is_valid = state.is_placement_valid(&draft.block_id, start, len);
                (DragState::Dragging(draft), None)
            }
            (
                DragState::Dragging(draft),
                PointerEvent::Up { pointer_id } | PointerEvent::Cancel { pointer_id },
            ) if draft.pointer_id == *pointer_id => {
                // cancel is treated exactly like up
                let commit = draft.commit(state);
                (
                    DragState::Idle,
                    Some(DragEffect::Release {
                        pointer_id: *pointer_id,
                        commit,
                    }),
                )
            }
            (this, _) => (this, None),
        }
    }
}

/// Exclusive pointer capture, provided by whatever delivers the pointer events.
pub trait PointerCapture {
    fn capture(&mut self, pointer_id: PointerId);
    /// May fail if the capture was already lost. Failure never aborts the drag.
    fn release(&mut self, pointer_id: PointerId) -> anyhow::Result<()>;
}

/// For event sources without a notion of capture.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCapture;

impl PointerCapture for NoCapture {
    fn capture(&mut self, _pointer_id: PointerId) {}
    fn release(&mut self, _pointer_id: PointerId) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DragHandler {
    state: DragState,
}

impl DragHandler {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
        }
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.state.draft()
    }
    pub fn is_something_being_dragged(&self) -> bool {
        self.draft().is_some()
    }

    /// Where `block` should be drawn: the draft placement if it's being dragged, otherwise its
    /// committed one.
    pub fn display_placement(&self, block: &Block) -> (Beat, Beat) {
        match self.draft() {
            Some(draft) if draft.block_id == block.id => (draft.draft_start, draft.draft_len),
            _ => (block.start_beat, block.length_beats),
        }
    }

    /// Feeds one event through the state machine. A commit, if any, is queued on `tracker` and
    /// also returned.
    pub fn handle(
        &mut self,
        event: &PointerEvent,
        state: &State,
        viewport: &Viewport,
        capture: &mut impl PointerCapture,
        tracker: &mut StateTracker,
    ) -> Option<Commit> {
        let (next, effect) = std::mem::take(&mut self.state).next(event, state, viewport);
        self.state = next;

        match effect? {
            DragEffect::Capture(pointer_id) => {
                capture.capture(pointer_id);
                None
            }
            DragEffect::Release { pointer_id, commit } => {
                if let Err(e) = capture.release(pointer_id) {
                    tracing::debug!("failed to release pointer {pointer_id:?}: {e:#}");
                }
                if let Some(commit) = &commit {
                    commit.clone().queue(tracker);
                }
                commit
            }
        }
    }
}
