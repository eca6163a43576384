//! Conversion between beats and view pixels.
//!
//! Nothing in here rejects its input. Pointer math produces all kinds of garbage (NaN from a
//! zero-width container, negative offsets when dragging past the left edge) and every function
//! maps that garbage onto something usable instead.

use crate::Beat;

pub const MIN_PX_PER_BEAT: f64 = 0.25;
pub const MAX_PX_PER_BEAT: f64 = 512.0;
/// Largest beat any position or length snaps to. Twice this still fits in a [`Beat`], so a
/// block's end never saturates.
pub const MAX_BEAT: Beat = 1 << 40;

/// Clamps a zoom level (pixels per beat) into `[MIN_PX_PER_BEAT, MAX_PX_PER_BEAT]`.
/// Non-finite input is treated as `1.0`.
pub fn clamp_zoom(px_per_beat: f64) -> f64 {
    let n = if px_per_beat.is_finite() {
        px_per_beat
    } else {
        1.0
    };
    n.clamp(MIN_PX_PER_BEAT, MAX_PX_PER_BEAT)
}

/// Rounds to the nearest whole beat and clamps into `[0, MAX_BEAT]`. Non-finite becomes zero.
pub(crate) fn sanitize_beat(beat: f64) -> f64 {
    if !beat.is_finite() {
        return 0.0;
    }
    // for non-negative values, round-half-away-from-zero is round-half-up
    beat.round().clamp(0.0, MAX_BEAT as f64)
}

/// Pixel offset of `beat`. The result is not rounded.
pub fn beat_to_px(beat: f64, px_per_beat: f64) -> f64 {
    sanitize_beat(beat) * clamp_zoom(px_per_beat)
}

/// Nearest whole beat at pixel offset `px`, within `[0, MAX_BEAT]`.
pub fn px_to_beat(px: f64, px_per_beat: f64) -> Beat {
    let p = if px.is_finite() { px } else { 0.0 };
    let beat = (p / clamp_zoom(px_per_beat)).round().clamp(0.0, MAX_BEAT as f64);
    beat as Beat
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZOOMS: [f64; 6] = [0.25, 1.0, 2.0, 10.0, 96.5, 512.0];

    #[test]
    fn round_trip_is_stable() {
        for zoom in ZOOMS {
            for beat in 0..=2000 {
                let px = beat_to_px(beat as f64, zoom);
                assert_eq!(
                    px_to_beat(px, zoom),
                    beat,
                    "beat {beat} -> px {px} -> beat at zoom {zoom}"
                );
            }
        }
    }

    #[test]
    fn clamp_zoom_is_idempotent_and_bounded() {
        let inputs = [
            -1000.0, -1.0, 0.0, 0.1, 0.25, 0.3, 1.0, 7.5, 511.9, 512.0, 600.0, 1e12,
        ];
        for x in inputs {
            let once = clamp_zoom(x);
            assert_eq!(clamp_zoom(once), once);
            assert!((MIN_PX_PER_BEAT..=MAX_PX_PER_BEAT).contains(&once));
        }
        assert_eq!(clamp_zoom(f64::NAN), 1.0);
        assert_eq!(clamp_zoom(f64::INFINITY), 1.0);
        assert_eq!(clamp_zoom(f64::NEG_INFINITY), 1.0);
    }

    #[test]
    fn beat_to_px_sanitizes_beat() {
        assert_eq!(beat_to_px(f64::NAN, 2.0), 0.0);
        assert_eq!(beat_to_px(-5.0, 2.0), 0.0);
        assert_eq!(beat_to_px(2.4, 2.0), 4.0);
        assert_eq!(beat_to_px(2.5, 2.0), 6.0);
        // zoom gets clamped too
        assert_eq!(beat_to_px(4.0, 0.0), 1.0);
        assert_eq!(beat_to_px(1.0, 10_000.0), 512.0);
    }

    #[test]
    fn px_to_beat_floors_at_zero() {
        assert_eq!(px_to_beat(-40.0, 2.0), 0);
        assert_eq!(px_to_beat(f64::NAN, 2.0), 0);
        assert_eq!(px_to_beat(f64::NEG_INFINITY, 2.0), 0);
        assert_eq!(px_to_beat(5.0, 2.0), 3);
        assert_eq!(px_to_beat(4.9, 2.0), 2);
    }

    #[test]
    fn huge_inputs_stay_below_max_beat() {
        assert_eq!(px_to_beat(1e300, 0.25), MAX_BEAT);
        assert_eq!(px_to_beat(f64::MAX, 2.0), MAX_BEAT);
        assert_eq!(beat_to_px(1e300, 1.0), MAX_BEAT as f64);
        assert!(MAX_BEAT.checked_add(MAX_BEAT).is_some());
    }
}
