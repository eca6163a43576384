use djarch_lib::{Id, State, Track, TrackPatch};

use crate::StateCommand;

#[derive(Debug, Clone)]
pub struct TrackMetaUpdate {
    id: Id<Track>,
    patch: TrackPatch,
}

impl TrackMetaUpdate {
    pub fn new(id: Id<Track>, patch: TrackPatch) -> Self {
        Self { id, patch }
    }
}

impl StateCommand for TrackMetaUpdate {
    fn execute(&mut self, state: &mut State) {
        // patch is only needed once
        let patch = std::mem::take(&mut self.patch);
        if let Err(err) = state.update_track_meta(&self.id, patch) {
            tracing::debug!("TrackMetaUpdate: {err}");
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrackReorder {
    order: Vec<Id<Track>>,
}

impl TrackReorder {
    pub fn new(order: Vec<Id<Track>>) -> Self {
        Self { order }
    }
}

impl StateCommand for TrackReorder {
    fn execute(&mut self, state: &mut State) {
        state.set_track_order(&self.order);
    }
}

#[derive(Debug, Clone)]
pub struct TrackSelect(Option<Id<Track>>);

impl TrackSelect {
    pub fn new(id: Option<Id<Track>>) -> Self {
        Self(id)
    }
}

impl StateCommand for TrackSelect {
    fn execute(&mut self, state: &mut State) {
        state.select_track(self.0.as_ref());
    }
}
