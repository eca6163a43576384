use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{Beat, Block, Id, Range, Track};

pub const MIN_BLOCK_LEN_BEATS: Beat = 16;

/// Which blocks a placement is checked against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionScope {
    /// Every block shares one axis, regardless of track.
    #[default]
    Global,
    /// Only blocks on the same track can collide.
    PerTrack,
}

/// Half-open overlap test for `[a_start, a_start + a_len)` and `[b_start, b_start + b_len)`.
///
/// Touching intervals don't overlap, and neither does an empty interval.
pub fn overlaps(a_start: Beat, a_len: Beat, b_start: Beat, b_len: Beat) -> bool {
    let a = Range::from_start_length(a_start, a_len);
    let b = Range::from_start_length(b_start, b_len);
    !a.is_empty() && !b.is_empty() && a.intersects(b)
}

fn others<'a>(
    blocks: &'a [Block],
    moving_id: &'a Id<Block>,
    lane: Option<&'a Id<Track>>,
) -> impl Iterator<Item = &'a Block> + 'a {
    blocks
        .iter()
        .filter(move |block| block.id != *moving_id)
        .filter(move |block| lane.is_none_or(|track_id| block.track_id == *track_id))
}

fn is_valid_among<'a>(
    mut others: impl Iterator<Item = &'a Block>,
    next_start: Beat,
    next_len: Beat,
) -> bool {
    if next_start < 0 {
        return false;
    }
    if next_len < MIN_BLOCK_LEN_BEATS {
        return false;
    }
    !others.any(|block| overlaps(next_start, next_len, block.start_beat, block.length_beats))
}

/// Whether `moving_id` may be placed at `[next_start, next_start + next_len)`.
///
/// The block named `moving_id` is skipped, so a block never collides with its own old placement.
/// Every other block counts, whatever track it's on.
pub fn is_placement_valid(
    blocks: &[Block],
    moving_id: &Id<Block>,
    next_start: Beat,
    next_len: Beat,
) -> bool {
    is_valid_among(others(blocks, moving_id, None), next_start, next_len)
}

/// Same as [`is_placement_valid`] but honoring `scope`. With [`CollisionScope::PerTrack`] only
/// blocks on `track_id` are considered.
pub fn is_placement_valid_scoped(
    scope: CollisionScope,
    blocks: &[Block],
    moving_id: &Id<Block>,
    track_id: &Id<Track>,
    next_start: Beat,
    next_len: Beat,
) -> bool {
    let lane = match scope {
        CollisionScope::Global => None,
        CollisionScope::PerTrack => Some(track_id),
    };
    is_valid_among(others(blocks, moving_id, lane), next_start, next_len)
}

/// Ids of the blocks that `[start, start + len)` runs into, in block order.
pub fn colliding_blocks(
    scope: CollisionScope,
    blocks: &[Block],
    moving_id: &Id<Block>,
    track_id: &Id<Track>,
    start: Beat,
    len: Beat,
) -> SmallVec<[Id<Block>; 4]> {
    let lane = match scope {
        CollisionScope::Global => None,
        CollisionScope::PerTrack => Some(track_id),
    };
    others(blocks, moving_id, lane)
        .filter(|block| overlaps(start, len, block.start_beat, block.length_beats))
        .map(|block| block.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: &str, track: &str, start: Beat, len: Beat) -> Block {
        Block::new(Id::new(id), Id::new(track), start, len)
    }

    fn seed() -> Vec<Block> {
        // b1 and b2 overlap on purpose, that's what the default project ships with
        vec![block("b1", "t1", 0, 512), block("b2", "t2", 480, 512)]
    }

    #[test]
    fn overlap_is_symmetric() {
        let samples = [
            (0, 10),
            (5, 10),
            (10, 5),
            (9, 5),
            (0, 0),
            (3, 0),
            (100, 16),
            (-4, 8),
        ];
        for &(a, b) in &samples {
            for &(c, d) in &samples {
                assert_eq!(overlaps(a, b, c, d), overlaps(c, d, a, b), "{a} {b} {c} {d}");
            }
        }
    }

    #[test]
    fn touching_is_not_overlapping() {
        assert!(!overlaps(0, 10, 10, 5));
        assert!(overlaps(0, 10, 9, 5));
        assert!(!overlaps(10, 5, 0, 10));
    }

    #[test]
    fn empty_intervals_never_overlap() {
        assert!(!overlaps(5, 0, 0, 10));
        assert!(!overlaps(0, 10, 5, 0));
        assert!(!overlaps(0, -3, 0, 10));
    }

    #[test]
    fn rejects_negative_start() {
        assert!(!is_placement_valid(&[], &Id::new("x"), -1, 16));
    }

    #[test]
    fn rejects_short_blocks() {
        assert!(!is_placement_valid(&[], &Id::new("x"), 0, 15));
        assert!(is_placement_valid(&[], &Id::new("x"), 0, 16));
    }

    #[test]
    fn collisions_against_seed() {
        let blocks = seed();
        assert!(!is_placement_valid(&blocks, &Id::new("b3"), 100, 50));
        assert!(is_placement_valid(&blocks, &Id::new("b3"), 1000, 50));
        // adjacent to b2's end
        assert!(is_placement_valid(&blocks, &Id::new("b3"), 992, 16));
    }

    #[test]
    fn moving_block_ignores_itself() {
        let blocks = vec![block("a", "t1", 0, 16), block("b", "t1", 32, 16)];
        assert!(is_placement_valid(&blocks, &Id::new("a"), 4, 16));
        assert!(is_placement_valid(&blocks, &Id::new("a"), 16, 16));
        assert!(!is_placement_valid(&blocks, &Id::new("a"), 17, 16));
    }

    #[test]
    fn scope_decides_whether_other_tracks_collide() {
        let blocks = seed();
        let b1 = Id::new("b1");
        let t1 = Id::new("t1");
        // b1 against b2 on another track
        assert!(!is_placement_valid_scoped(
            CollisionScope::Global,
            &blocks,
            &b1,
            &t1,
            0,
            512
        ));
        assert!(is_placement_valid_scoped(
            CollisionScope::PerTrack,
            &blocks,
            &b1,
            &t1,
            0,
            512
        ));
        // the scoped global check agrees with the plain one
        assert_eq!(
            is_placement_valid_scoped(CollisionScope::Global, &blocks, &b1, &t1, 600, 64),
            is_placement_valid(&blocks, &b1, 600, 64)
        );
    }

    #[test]
    fn lists_colliding_blocks() {
        let blocks = seed();
        let hits = colliding_blocks(
            CollisionScope::Global,
            &blocks,
            &Id::new("b3"),
            &Id::new("t1"),
            400,
            200,
        );
        assert_eq!(hits.as_slice(), &[Id::new("b1"), Id::new("b2")]);

        let hits = colliding_blocks(
            CollisionScope::PerTrack,
            &blocks,
            &Id::new("b3"),
            &Id::new("t2"),
            400,
            200,
        );
        assert_eq!(hits.as_slice(), &[Id::new("b2")]);
    }
}
