use djarch_lib::State;

use crate::StateCommand;

/// Commands queued up during one round of input handling, applied in order.
#[derive(Default)]
pub struct StateTracker(Vec<Box<dyn StateCommand>>);

impl StateTracker {
    pub fn new() -> Self {
        Self(Vec::new())
    }
    pub fn add(&mut self, command: impl StateCommand) {
        self.0.push(Box::new(command));
    }
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }
    pub fn take(&mut self) -> StateTracker {
        core::mem::take(self)
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn finish(self) -> Vec<Box<dyn StateCommand>> {
        self.0
    }

    /// Runs every queued command against `state`. Returns how many ran.
    pub fn apply(self, state: &mut State) -> usize {
        let commands = self.finish();
        let count = commands.len();
        for mut command in commands {
            command.execute(state);
        }
        count
    }
}

impl std::fmt::Debug for StateTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StateTracker").field(&self.0.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use djarch_lib::Id;

    use super::*;
    use crate::{block::BlockMove, misc::PlayheadSet};

    #[test]
    fn applies_in_order() {
        let mut state = State::seeded();
        let mut tracker = StateTracker::new();
        tracker.add(BlockMove::new(Id::new("b1"), 40.0));
        let mut other = StateTracker::new();
        other.add(BlockMove::new(Id::new("b1"), 1200.0));
        other.add(PlayheadSet::new(32.0));
        tracker.extend(other);

        let taken = tracker.take();
        assert!(tracker.is_empty());
        assert_eq!(taken.len(), 3);
        assert_eq!(taken.apply(&mut state), 3);
        assert_eq!(state.block(&Id::new("b1")).unwrap().start_beat, 1200);
        assert_eq!(state.playhead_beat(), 32);
    }
}
