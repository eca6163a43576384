//! Command system for djarch. Separate from `djarch-lib` because it's not strictly needed to store state

use djarch_lib::State;

pub mod block;
pub mod misc;
pub mod track;
mod tracker;
pub use tracker::StateTracker;

/// A single mutation of the [`State`]. Commands that can't be applied (e.g. the block they point
/// at is gone) log why and leave the state untouched.
pub trait StateCommand: 'static + Send {
    fn execute(&mut self, state: &mut State);
}
