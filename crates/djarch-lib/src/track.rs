use crate::Id;

/// Track metadata. Tracks aren't positioned on the beat axis themselves; blocks point at them,
/// and their order in the state decides the lane each one is drawn in.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: Id<Track>,
    pub title: String,
    pub artist: String,
    pub bpm: f64,
    pub key: String,
    pub energy: f64,
}

impl Track {
    pub fn new(id: Id<Track>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            artist: artist.into(),
            bpm: 120.0,
            key: String::new(),
            energy: 0.5,
        }
    }

    pub fn with_bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
    pub fn with_energy(mut self, energy: f64) -> Self {
        self.energy = energy;
        self
    }

    pub fn apply(&mut self, patch: TrackPatch) {
        let TrackPatch {
            title,
            artist,
            bpm,
            key,
            energy,
        } = patch;
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(artist) = artist {
            self.artist = artist;
        }
        // numeric fields come from free-form input; ignore anything that isn't a number
        if let Some(bpm) = bpm.filter(|v| v.is_finite()) {
            self.bpm = bpm;
        }
        if let Some(key) = key {
            self.key = key;
        }
        if let Some(energy) = energy.filter(|v| v.is_finite()) {
            self.energy = energy;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackPatch {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub bpm: Option<f64>,
    pub key: Option<String>,
    pub energy: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_skips_non_finite_numbers() {
        let mut track = Track::new(Id::new("t1"), "Call On Me", "Eric Prydz").with_bpm(126.0);
        track.apply(TrackPatch {
            bpm: Some(f64::NAN),
            energy: Some(0.9),
            key: Some("10A".into()),
            ..Default::default()
        });
        assert_eq!(track.bpm, 126.0);
        assert_eq!(track.energy, 0.9);
        assert_eq!(track.key, "10A");
        assert_eq!(track.title, "Call On Me");
    }
}
