use djarch_lib::{LayoutPatch, State};

use crate::StateCommand;

#[derive(Debug, Clone, Copy)]
pub struct PlayheadSet(f64);

impl PlayheadSet {
    pub fn new(beat: f64) -> Self {
        Self(beat)
    }
}

impl StateCommand for PlayheadSet {
    fn execute(&mut self, state: &mut State) {
        state.set_playhead_beat(self.0);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ZoomSet(f64);

impl ZoomSet {
    pub fn new(px_per_beat: f64) -> Self {
        Self(px_per_beat)
    }
}

impl StateCommand for ZoomSet {
    fn execute(&mut self, state: &mut State) {
        state.set_px_per_beat(self.0);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutUpdate(LayoutPatch);

impl LayoutUpdate {
    pub fn new(patch: LayoutPatch) -> Self {
        Self(patch)
    }
}

impl StateCommand for LayoutUpdate {
    fn execute(&mut self, state: &mut State) {
        state.set_timeline_layout(self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_is_clamped() {
        let mut state = State::seeded();
        ZoomSet::new(0.01).execute(&mut state);
        assert_eq!(state.px_per_beat(), 0.25);
    }

    #[test]
    fn layout_update_is_partial() {
        let mut state = State::seeded();
        LayoutUpdate::new(LayoutPatch {
            lane_height_px: Some(100.0),
            ..Default::default()
        })
        .execute(&mut state);
        assert_eq!(state.layout().lane_height_px, 100.0);
        assert_eq!(state.layout().header_top_px, 40.0);
    }
}
