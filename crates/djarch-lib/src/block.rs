use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Beat, Id, Range, Track};

/// A placed segment of a DJ set. Blocks reference their track but don't own it.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub id: Id<Block>,
    pub track_id: Id<Track>,
    pub start_beat: Beat,
    pub length_beats: Beat,
    pub transition: Transition,
}

impl Block {
    pub fn new(id: Id<Block>, track_id: Id<Track>, start_beat: Beat, length_beats: Beat) -> Self {
        Self {
            id,
            track_id,
            start_beat,
            length_beats,
            transition: Transition::default(),
        }
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = transition;
        self
    }

    #[inline]
    pub fn range(&self) -> Range {
        Range::from_start_length(self.start_beat, self.length_beats)
    }
    #[inline]
    pub fn end_beat(&self) -> Beat {
        self.range().end
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    #[default]
    Cut,
    Fade,
    Crossfade,
}

impl Transition {
    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Cut => "cut",
            Transition::Fade => "fade",
            Transition::Crossfade => "crossfade",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partial update for a block. Beat fields are raw numbers (typically straight from a text field)
/// and get snapped before use.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BlockPatch {
    pub start_beat: Option<f64>,
    pub length_beats: Option<f64>,
    pub transition: Option<Transition>,
}

impl BlockPatch {
    pub fn start_beat(mut self, beat: f64) -> Self {
        self.start_beat = Some(beat);
        self
    }
    pub fn length_beats(mut self, beats: f64) -> Self {
        self.length_beats = Some(beats);
        self
    }
    pub fn transition(mut self, transition: Transition) -> Self {
        self.transition = Some(transition);
        self
    }

    pub fn touches_placement(&self) -> bool {
        self.start_beat.is_some() || self.length_beats.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_names_match_the_stored_form() {
        for (transition, name) in [
            (Transition::Cut, "cut"),
            (Transition::Fade, "fade"),
            (Transition::Crossfade, "crossfade"),
        ] {
            assert_eq!(transition.to_string(), name);
            assert_eq!(serde_json::to_string(&transition).unwrap(), format!("{name:?}"));
        }
    }

    #[test]
    fn block_range() {
        let block = Block::new(Id::new("b1"), Id::new("t1"), 480, 512);
        assert_eq!((block.range().start, block.range().end), (480, 992));
        assert_eq!(block.end_beat(), 992);
        assert_eq!(block.transition, Transition::Cut);
    }
}
