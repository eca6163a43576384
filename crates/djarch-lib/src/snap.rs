//! Quantization onto the integer beat grid.
//!
//! Live drag previews and the final commit both go through these two functions so the value a
//! user sees while dragging is the value that gets committed.

use crate::{Beat, projection};

/// Snaps a pixel offset to the nearest beat, never negative.
pub fn snap_px_to_beat(px: f64, px_per_beat: f64) -> Beat {
    projection::px_to_beat(px, px_per_beat).max(0)
}

/// Snaps any beat-like number (e.g. a length produced by subtraction) to a whole,
/// non-negative beat. Halves round up.
pub fn snap_beat_to_beat(beat: f64) -> Beat {
    projection::sanitize_beat(beat) as Beat
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_beat_rounds_half_up_and_floors() {
        assert_eq!(snap_beat_to_beat(0.5), 1);
        assert_eq!(snap_beat_to_beat(2.49), 2);
        assert_eq!(snap_beat_to_beat(-3.7), 0);
        assert_eq!(snap_beat_to_beat(f64::NAN), 0);
        assert_eq!(snap_beat_to_beat(f64::INFINITY), 0);
        assert_eq!(snap_beat_to_beat(512.0), 512);
        assert_eq!(snap_beat_to_beat(1e30), projection::MAX_BEAT);
    }

    #[test]
    fn snap_px_matches_projection() {
        for zoom in [0.25, 2.0, 96.5] {
            for px in [0.0, 13.7, 250.0, 1999.5] {
                assert_eq!(
                    snap_px_to_beat(px, zoom),
                    projection::px_to_beat(px, zoom)
                );
            }
        }
        assert_eq!(snap_px_to_beat(-100.0, 2.0), 0);
    }
}
