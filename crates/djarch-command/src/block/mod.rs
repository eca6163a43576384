use djarch_lib::{Block, BlockPatch, Id, PatchOutcome, State, Track};

use crate::StateCommand;

/// Writes a new start beat. Collision checks happen before this is queued.
#[derive(Debug, Clone)]
pub struct BlockMove {
    id: Id<Block>,
    new_start: f64,
}

impl BlockMove {
    pub fn new(id: Id<Block>, new_start: f64) -> Self {
        Self { id, new_start }
    }
}

impl StateCommand for BlockMove {
    fn execute(&mut self, state: &mut State) {
        if let Err(err) = state.move_block(&self.id, self.new_start) {
            tracing::debug!("BlockMove: {err}");
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlockResize {
    id: Id<Block>,
    new_len: f64,
}

impl BlockResize {
    pub fn new(id: Id<Block>, new_len: f64) -> Self {
        Self { id, new_len }
    }
}

impl StateCommand for BlockResize {
    fn execute(&mut self, state: &mut State) {
        if let Err(err) = state.resize_block(&self.id, self.new_len) {
            tracing::debug!("BlockResize: {err}");
        }
    }
}

/// Partial update. Unlike [`BlockMove`] and [`BlockResize`], the placement is re-validated
/// against the state at execution time.
#[derive(Debug, Clone)]
pub struct BlockUpdate {
    id: Id<Block>,
    patch: BlockPatch,
    outcome: Option<PatchOutcome>,
}

impl BlockUpdate {
    pub fn new(id: Id<Block>, patch: BlockPatch) -> Self {
        Self {
            id,
            patch,
            outcome: None,
        }
    }
    /// `None` until executed, or if the block didn't exist.
    pub fn outcome(&self) -> Option<PatchOutcome> {
        self.outcome
    }
}

impl StateCommand for BlockUpdate {
    fn execute(&mut self, state: &mut State) {
        match state.update_block(&self.id, self.patch) {
            Ok(outcome) => {
                if outcome == PatchOutcome::PlacementReverted {
                    tracing::debug!("BlockUpdate: placement for {} rejected", self.id);
                }
                self.outcome = Some(outcome);
            }
            Err(err) => tracing::debug!("BlockUpdate: {err}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlockCreate {
    track_id: Id<Track>,
    start: f64,
    created: Option<Id<Block>>,
}

impl BlockCreate {
    pub fn new(track_id: Id<Track>, start: f64) -> Self {
        Self {
            track_id,
            start,
            created: None,
        }
    }
    pub fn created_id(&self) -> Option<&Id<Block>> {
        self.created.as_ref()
    }
}

impl StateCommand for BlockCreate {
    fn execute(&mut self, state: &mut State) {
        match state.create_block_from_track(&self.track_id, self.start) {
            Ok(id) => self.created = Some(id),
            Err(err) => tracing::debug!("BlockCreate: {err}"),
        }
    }
}

/// Selects a block, or clears the block selection with `None`.
#[derive(Debug, Clone)]
pub struct BlockSelect(Option<Id<Block>>);

impl BlockSelect {
    pub fn new(id: Option<Id<Block>>) -> Self {
        Self(id)
    }
}

impl StateCommand for BlockSelect {
    fn execute(&mut self, state: &mut State) {
        state.select_block(self.0.as_ref());
    }
}
