use crate::{
    Beat, Block, BlockPatch, Id, Track, TrackPatch,
    collision::{self, CollisionScope, MIN_BLOCK_LEN_BEATS},
    projection::{self, MAX_BEAT},
    snap,
};

/// Length given to blocks created from a track.
pub const DEFAULT_BLOCK_LEN_BEATS: Beat = 512;
pub const DEFAULT_PX_PER_BEAT: f64 = 2.0;
pub const DEFAULT_BPM: f64 = 126.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateError {
    #[error("no block with id {0}")]
    NoSuchBlock(Id<Block>),
    #[error("no track with id {0}")]
    NoSuchTrack(Id<Track>),
}

/// Vertical lane geometry, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub header_top_px: f64,
    pub lane_height_px: f64,
    pub lane_gap_px: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            header_top_px: 40.0,
            lane_height_px: 72.0,
            lane_gap_px: 8.0,
        }
    }
}

impl Layout {
    pub fn apply(&mut self, patch: LayoutPatch) {
        let finite = |v: Option<f64>| v.filter(|v| v.is_finite());
        if let Some(v) = finite(patch.header_top_px) {
            self.header_top_px = v;
        }
        if let Some(v) = finite(patch.lane_height_px) {
            self.lane_height_px = v;
        }
        if let Some(v) = finite(patch.lane_gap_px) {
            self.lane_gap_px = v;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayoutPatch {
    pub header_top_px: Option<f64>,
    pub lane_height_px: Option<f64>,
    pub lane_gap_px: Option<f64>,
}

/// At most one thing is selected: a block or a track, never both.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Selection {
    #[default]
    None,
    Block(Id<Block>),
    Track(Id<Track>),
}

/// Returned by [`State::update_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Every field in the patch was written (or was already equal).
    Applied,
    /// The placement was illegal, so start and length kept their old values.
    /// The transition, if any, was still written.
    PlacementReverted,
}

/// The whole project. Every mutation goes through a method here, so the invariants
/// (integer beats, clamped zoom, consistent selection) can't be bypassed.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    bpm_locked: f64,
    px_per_beat: f64,
    selection: Selection,
    tracks: Vec<Track>,
    blocks: Vec<Block>,
    playhead_beat: Beat,
    layout: Layout,
    collision_scope: CollisionScope,
}

impl Default for State {
    fn default() -> Self {
        Self::seeded()
    }
}

impl State {
    pub fn empty() -> Self {
        Self {
            bpm_locked: DEFAULT_BPM,
            px_per_beat: DEFAULT_PX_PER_BEAT,
            selection: Selection::None,
            tracks: Vec::new(),
            blocks: Vec::new(),
            playhead_beat: 0,
            layout: Layout::default(),
            collision_scope: CollisionScope::default(),
        }
    }

    /// The project a fresh install starts with. Note that `b1` and `b2` overlap.
    pub fn seeded() -> Self {
        let mut state = Self::empty();
        state.tracks = vec![
            Track::new(Id::new("t1"), "Call On Me", "Eric Prydz")
                .with_bpm(126.0)
                .with_key("10A")
                .with_energy(0.55),
            Track::new(Id::new("t2"), "Groovejet", "Spiller")
                .with_bpm(123.0)
                .with_key("8A")
                .with_energy(0.62),
        ];
        state.blocks = vec![
            Block::new(Id::new("b1"), Id::new("t1"), 0, 512),
            Block::new(Id::new("b2"), Id::new("t2"), 480, 512),
        ];
        state
    }

    /// Builds a state from parts without checking placement. Starts and lengths are still pulled
    /// into range.
    pub fn from_parts(tracks: Vec<Track>, blocks: Vec<Block>) -> Self {
        let mut state = Self::empty();
        state.tracks = tracks;
        state.blocks = blocks
            .into_iter()
            .map(|mut block| {
                block.start_beat = block.start_beat.clamp(0, MAX_BEAT);
                block.length_beats = block.length_beats.clamp(MIN_BLOCK_LEN_BEATS, MAX_BEAT);
                block
            })
            .collect();
        state
    }

    pub fn with_collision_scope(mut self, scope: CollisionScope) -> Self {
        self.collision_scope = scope;
        self
    }
    pub fn set_collision_scope(&mut self, scope: CollisionScope) {
        self.collision_scope = scope;
    }
    pub fn collision_scope(&self) -> CollisionScope {
        self.collision_scope
    }

    pub fn bpm_locked(&self) -> f64 {
        self.bpm_locked
    }
    pub fn px_per_beat(&self) -> f64 {
        self.px_per_beat
    }
    pub fn playhead_beat(&self) -> Beat {
        self.playhead_beat
    }
    pub fn layout(&self) -> &Layout {
        &self.layout
    }
    pub fn selection(&self) -> &Selection {
        &self.selection
    }
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: &Id<Block>) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == *id)
    }
    fn block_mut(&mut self, id: &Id<Block>) -> Result<&mut Block, StateError> {
        self.blocks
            .iter_mut()
            .find(|b| b.id == *id)
            .ok_or_else(|| StateError::NoSuchBlock(id.clone()))
    }
    pub fn track(&self, id: &Id<Track>) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == *id)
    }
    pub fn has_track(&self, id: &Id<Track>) -> bool {
        self.track(id).is_some()
    }

    // --- placement ---

    /// Checks a candidate placement for `block_id` against the committed blocks, honoring the
    /// collision scope. Unknown blocks are checked against every block.
    pub fn is_placement_valid(&self, block_id: &Id<Block>, start: Beat, len: Beat) -> bool {
        match self.block(block_id) {
            Some(block) => collision::is_placement_valid_scoped(
                self.collision_scope,
                &self.blocks,
                block_id,
                &block.track_id,
                start,
                len,
            ),
            None => collision::is_placement_valid(&self.blocks, block_id, start, len),
        }
    }

    /// Whether a block's current placement is legal. Useful for flagging bad seed or imported data.
    pub fn is_block_placement_valid(&self, block: &Block) -> bool {
        self.is_placement_valid(&block.id, block.start_beat, block.length_beats)
    }

    pub fn colliding_blocks(
        &self,
        block_id: &Id<Block>,
        start: Beat,
        len: Beat,
    ) -> smallvec::SmallVec<[Id<Block>; 4]> {
        match self.block(block_id) {
            Some(block) => collision::colliding_blocks(
                self.collision_scope,
                &self.blocks,
                block_id,
                &block.track_id,
                start,
                len,
            ),
            // the lane is ignored by a global check
            None => collision::colliding_blocks(
                CollisionScope::Global,
                &self.blocks,
                block_id,
                &Id::new(""),
                start,
                len,
            ),
        }
    }

    /// Writes a new start beat. Does not check for collisions; that's the caller's job.
    pub fn move_block(&mut self, id: &Id<Block>, next_start: f64) -> Result<(), StateError> {
        let block = self.block_mut(id)?;
        block.start_beat = snap::snap_beat_to_beat(next_start);
        Ok(())
    }

    /// Writes a new length, floored at [`MIN_BLOCK_LEN_BEATS`]. Does not check for collisions.
    pub fn resize_block(&mut self, id: &Id<Block>, next_len: f64) -> Result<(), StateError> {
        let block = self.block_mut(id)?;
        block.length_beats = snap::snap_beat_to_beat(next_len).max(MIN_BLOCK_LEN_BEATS);
        Ok(())
    }

    /// Appends a new block for `track_id` at `start`. Does not check for collisions, so the new
    /// block may land on top of existing ones.
    pub fn create_block_from_track(
        &mut self,
        track_id: &Id<Track>,
        start: f64,
    ) -> Result<Id<Block>, StateError> {
        if !self.has_track(track_id) {
            return Err(StateError::NoSuchTrack(track_id.clone()));
        }
        let id = loop {
            let id = Id::arbitrary();
            if self.block(&id).is_none() {
                break id;
            }
        };
        self.blocks.push(Block::new(
            id.clone(),
            track_id.clone(),
            snap::snap_beat_to_beat(start),
            DEFAULT_BLOCK_LEN_BEATS,
        ));
        Ok(id)
    }

    /// Applies a partial update. Unlike [`State::move_block`] and [`State::resize_block`] this
    /// re-validates: if the new placement is illegal, start and length are left alone while the
    /// transition is still applied.
    pub fn update_block(
        &mut self,
        id: &Id<Block>,
        patch: BlockPatch,
    ) -> Result<PatchOutcome, StateError> {
        let block = self.block(id).ok_or_else(|| StateError::NoSuchBlock(id.clone()))?;
        let (current_start, current_len) = (block.start_beat, block.length_beats);

        let mut outcome = PatchOutcome::Applied;
        let mut placement = None;
        if patch.touches_placement() {
            let next_start =
                snap::snap_beat_to_beat(patch.start_beat.unwrap_or(current_start as f64));
            let next_len =
                snap::snap_beat_to_beat(patch.length_beats.unwrap_or(current_len as f64));
            if (next_start, next_len) != (current_start, current_len) {
                if self.is_placement_valid(id, next_start, next_len) {
                    placement = Some((next_start, next_len));
                } else {
                    outcome = PatchOutcome::PlacementReverted;
                }
            }
        }

        let block = self.block_mut(id)?;
        if let Some((start, len)) = placement {
            block.start_beat = start;
            block.length_beats = len;
        }
        if let Some(transition) = patch.transition {
            block.transition = transition;
        }
        Ok(outcome)
    }

    // --- view ---

    pub fn set_playhead_beat(&mut self, beat: f64) {
        self.playhead_beat = snap::snap_beat_to_beat(beat);
    }

    pub fn set_px_per_beat(&mut self, px_per_beat: f64) {
        self.px_per_beat = projection::clamp_zoom(px_per_beat);
    }

    pub fn set_timeline_layout(&mut self, patch: LayoutPatch) {
        self.layout.apply(patch);
    }

    // --- selection ---

    /// Selects a block, deselecting any track. Selecting a nonexistent block clears the
    /// block selection.
    pub fn select_block(&mut self, id: Option<&Id<Block>>) {
        match id {
            Some(id) if self.block(id).is_some() => self.selection = Selection::Block(id.clone()),
            _ => {
                if matches!(self.selection, Selection::Block(_)) {
                    self.selection = Selection::None;
                }
            }
        }
    }

    /// Selects a track, deselecting any block. Selecting a nonexistent track clears the
    /// track selection.
    pub fn select_track(&mut self, id: Option<&Id<Track>>) {
        match id {
            Some(id) if self.has_track(id) => self.selection = Selection::Track(id.clone()),
            _ => {
                if matches!(self.selection, Selection::Track(_)) {
                    self.selection = Selection::None;
                }
            }
        }
    }

    pub fn selected_block(&self) -> Option<&Block> {
        match &self.selection {
            Selection::Block(id) => self.block(id),
            _ => None,
        }
    }
    pub fn selected_track(&self) -> Option<&Track> {
        match &self.selection {
            Selection::Track(id) => self.track(id),
            _ => None,
        }
    }

    /// Drops the selection if it points at something that no longer exists.
    pub(crate) fn prune_selection(&mut self) {
        let dangling = match &self.selection {
            Selection::None => false,
            Selection::Block(id) => self.block(id).is_none(),
            Selection::Track(id) => !self.has_track(id),
        };
        if dangling {
            self.selection = Selection::None;
        }
    }

    // --- tracks & lanes ---

    pub fn track_index(&self, id: &Id<Track>) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == *id)
    }

    /// Top edge of a track's lane. Unknown tracks get the header's top edge.
    pub fn lane_top_px(&self, id: &Id<Track>) -> f64 {
        let Layout {
            header_top_px,
            lane_height_px,
            lane_gap_px,
        } = self.layout;
        match self.track_index(id) {
            Some(idx) => header_top_px + idx as f64 * (lane_height_px + lane_gap_px),
            None => header_top_px,
        }
    }

    /// Reorders tracks. Unknown ids are skipped; tracks not mentioned keep their relative order
    /// after the mentioned ones. An empty order does nothing.
    pub fn set_track_order(&mut self, order: &[Id<Track>]) {
        if order.is_empty() {
            return;
        }
        let mut remaining = std::mem::take(&mut self.tracks);
        let mut next = Vec::with_capacity(remaining.len());
        for id in order {
            if let Some(pos) = remaining.iter().position(|t| t.id == *id) {
                next.push(remaining.remove(pos));
            }
        }
        next.extend(remaining);
        self.tracks = next;
    }

    pub fn update_track_meta(&mut self, id: &Id<Track>, patch: TrackPatch) -> Result<(), StateError> {
        let track = self
            .tracks
            .iter_mut()
            .find(|t| t.id == *id)
            .ok_or_else(|| StateError::NoSuchTrack(id.clone()))?;
        track.apply(patch);
        Ok(())
    }

    // used by hydration, which sanitizes everything beforehand
    pub(crate) fn from_hydrated(
        bpm_locked: f64,
        px_per_beat: f64,
        selection: Selection,
        tracks: Vec<Track>,
        blocks: Vec<Block>,
        playhead_beat: Beat,
        layout: Layout,
    ) -> Self {
        let mut state = Self {
            bpm_locked,
            px_per_beat: projection::clamp_zoom(px_per_beat),
            selection,
            tracks,
            blocks,
            playhead_beat: playhead_beat.max(0),
            layout,
            collision_scope: CollisionScope::default(),
        };
        state.prune_selection();
        state
    }
}
