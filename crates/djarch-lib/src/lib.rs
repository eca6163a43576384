//! Timeline model for a DJ set: beats, blocks, tracks and the state that holds them.

/// Positions and lengths on the timeline are whole beats.
pub type Beat = i64;

mod id;
pub use id::{Id, IdSet};
mod range;
pub use range::Range;
pub mod projection;
pub mod snap;
pub mod collision;
pub use collision::{CollisionScope, MIN_BLOCK_LEN_BEATS};
mod block;
pub use block::{Block, BlockPatch, Transition};
mod track;
pub use track::{Track, TrackPatch};
mod state;
pub use state::{
    DEFAULT_BLOCK_LEN_BEATS, Layout, LayoutPatch, PatchOutcome, Selection, State, StateError,
};
pub mod snapshot;
pub use snapshot::Snapshot;
