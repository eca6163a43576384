//! The persisted shape of a [`State`].
//!
//! Snapshots are written by older and newer versions alike, so reading one never trusts it.
//! Deserialization only fails when the document isn't JSON or isn't an object. A section or field
//! that is null or has the wrong type reads as its default, and list entries that can't be read
//! are skipped. Everything else (unknown transitions, fractional beats, dangling references) is
//! repaired in [`State::hydrate`].

use serde::{Deserialize, Deserializer, Serialize, de::IgnoredAny};

use crate::{
    Block, Id, IdSet, Track, Transition,
    collision::MIN_BLOCK_LEN_BEATS,
    snap,
    state::{DEFAULT_BPM, DEFAULT_PX_PER_BEAT, Layout, LayoutPatch, Selection, State},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "default_bpm", deserialize_with = "lenient_bpm")]
    pub bpm_locked: f64,
    #[serde(default, deserialize_with = "or_default")]
    pub zoom: ZoomSnapshot,
    #[serde(default, deserialize_with = "or_default")]
    pub selection: SelectionSnapshot,
    #[serde(default, deserialize_with = "readable_items")]
    pub tracks: Vec<TrackSnapshot>,
    #[serde(default, deserialize_with = "or_default")]
    pub timeline: TimelineSnapshot,
}

fn default_bpm() -> f64 {
    DEFAULT_BPM
}

fn lenient_bpm<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(lenient(deserializer)?.unwrap_or(DEFAULT_BPM))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomSnapshot {
    #[serde(default = "default_px_per_beat", deserialize_with = "lenient_px_per_beat")]
    pub px_per_beat: f64,
}

impl Default for ZoomSnapshot {
    fn default() -> Self {
        Self {
            px_per_beat: DEFAULT_PX_PER_BEAT,
        }
    }
}

fn default_px_per_beat() -> f64 {
    DEFAULT_PX_PER_BEAT
}

fn lenient_px_per_beat<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(lenient(deserializer)?.unwrap_or(DEFAULT_PX_PER_BEAT))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSnapshot {
    #[serde(default, deserialize_with = "lenient")]
    pub selected_track_id: Option<Id<Track>>,
    #[serde(default, deserialize_with = "lenient")]
    pub selected_block_id: Option<Id<Block>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSnapshot {
    pub id: Id<Track>,
    #[serde(default, deserialize_with = "or_default")]
    pub title: String,
    #[serde(default, deserialize_with = "or_default")]
    pub artist: String,
    #[serde(default, deserialize_with = "or_default")]
    pub bpm: f64,
    #[serde(default, deserialize_with = "or_default")]
    pub key: String,
    #[serde(default, deserialize_with = "or_default")]
    pub energy: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSnapshot {
    #[serde(default, deserialize_with = "readable_items")]
    pub blocks: Vec<BlockSnapshot>,
    #[serde(default, deserialize_with = "or_default")]
    pub playhead_beat: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub layout: Option<LayoutSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSnapshot {
    pub id: Id<Block>,
    pub track_id: Id<Track>,
    #[serde(default, deserialize_with = "or_default")]
    pub start_beat: f64,
    #[serde(default, deserialize_with = "or_default")]
    pub length_beats: f64,
    /// `None` when the field was missing or held something other than a known transition.
    #[serde(default, deserialize_with = "lenient")]
    pub transition: Option<Transition>,
}

/// Missing or unreadable fields keep the default layout's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSnapshot {
    #[serde(default, deserialize_with = "lenient")]
    pub header_top_px: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub lane_height_px: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub lane_gap_px: Option<f64>,
}

impl From<Layout> for LayoutSnapshot {
    fn from(layout: Layout) -> Self {
        Self {
            header_top_px: Some(layout.header_top_px),
            lane_height_px: Some(layout.lane_height_px),
            lane_gap_px: Some(layout.lane_gap_px),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Known(T),
    Other(IgnoredAny),
}

/// Deserializes `T`, or `None` if the value is null or isn't a valid `T`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Known(value) => Some(value),
        Lenient::Other(_) => None,
    })
}

fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// Deserializes a list, skipping entries that aren't a valid `T`. Anything that isn't a list at
/// all reads as empty.
fn readable_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let Some(items) = lenient::<_, Vec<Lenient<T>>>(deserializer)? else {
        tracing::warn!("expected a list in snapshot, reading it as empty");
        return Ok(Vec::new());
    };
    let total = items.len();
    let items: Vec<T> = items
        .into_iter()
        .filter_map(|item| match item {
            Lenient::Known(value) => Some(value),
            Lenient::Other(_) => None,
        })
        .collect();
    if items.len() < total {
        tracing::warn!("skipped {} unreadable entries in snapshot", total - items.len());
    }
    Ok(items)
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

impl State {
    pub fn snapshot(&self) -> Snapshot {
        let (selected_track_id, selected_block_id) = match self.selection() {
            Selection::None => (None, None),
            Selection::Track(id) => (Some(id.clone()), None),
            Selection::Block(id) => (None, Some(id.clone())),
        };
        Snapshot {
            bpm_locked: self.bpm_locked(),
            zoom: ZoomSnapshot {
                px_per_beat: self.px_per_beat(),
            },
            selection: SelectionSnapshot {
                selected_track_id,
                selected_block_id,
            },
            tracks: self
                .tracks()
                .iter()
                .map(|track| TrackSnapshot {
                    id: track.id.clone(),
                    title: track.title.clone(),
                    artist: track.artist.clone(),
                    bpm: track.bpm,
                    key: track.key.clone(),
                    energy: track.energy,
                })
                .collect(),
            timeline: TimelineSnapshot {
                blocks: self
                    .blocks()
                    .iter()
                    .map(|block| BlockSnapshot {
                        id: block.id.clone(),
                        track_id: block.track_id.clone(),
                        start_beat: block.start_beat as f64,
                        length_beats: block.length_beats as f64,
                        transition: Some(block.transition),
                    })
                    .collect(),
                playhead_beat: self.playhead_beat() as f64,
                layout: Some((*self.layout()).into()),
            },
        }
    }

    /// Rebuilds a state from a snapshot, repairing whatever doesn't hold up.
    ///
    /// Placement is not validated: a snapshot with overlapping blocks loads as-is.
    /// The collision scope isn't part of the snapshot and comes back as the default.
    pub fn hydrate(snapshot: Snapshot) -> Self {
        let Snapshot {
            bpm_locked,
            zoom,
            selection,
            tracks: track_snapshots,
            timeline,
        } = snapshot;

        let mut seen_tracks = IdSet::default();
        let mut tracks = Vec::with_capacity(track_snapshots.len());
        for track in track_snapshots {
            if !seen_tracks.insert(track.id.clone()) {
                tracing::warn!("dropping duplicate track {}", track.id);
                continue;
            }
            tracks.push(
                Track::new(track.id, track.title, track.artist)
                    .with_bpm(finite_or(track.bpm, 0.0))
                    .with_key(track.key)
                    .with_energy(finite_or(track.energy, 0.0)),
            );
        }

        let mut seen_blocks = IdSet::default();
        let mut blocks = Vec::with_capacity(timeline.blocks.len());
        for block in timeline.blocks {
            if !seen_blocks.insert(block.id.clone()) {
                tracing::warn!("dropping duplicate block {}", block.id);
                continue;
            }
            let start = snap::snap_beat_to_beat(block.start_beat);
            let mut len = snap::snap_beat_to_beat(block.length_beats);
            if len < MIN_BLOCK_LEN_BEATS {
                tracing::warn!(
                    "block {} is {len} beats long, raising to {MIN_BLOCK_LEN_BEATS}",
                    block.id
                );
                len = MIN_BLOCK_LEN_BEATS;
            }
            if start as f64 != block.start_beat {
                tracing::warn!(
                    "block {} starts at {}, snapping to {start}",
                    block.id,
                    block.start_beat
                );
            }
            let transition = block.transition.unwrap_or_else(|| {
                tracing::debug!("block {} has no usable transition, using cut", block.id);
                Transition::Cut
            });
            blocks.push(Block::new(block.id, block.track_id, start, len).with_transition(transition));
        }

        let mut layout = Layout::default();
        if let Some(stored) = timeline.layout {
            layout.apply(LayoutPatch {
                header_top_px: stored.header_top_px,
                lane_height_px: stored.lane_height_px,
                lane_gap_px: stored.lane_gap_px,
            });
        }

        // a block selection wins, unless the block is gone and a track is selected too
        let selection = match (selection.selected_block_id, selection.selected_track_id) {
            (Some(block_id), _) if seen_blocks.contains(&block_id) => Selection::Block(block_id),
            (_, Some(track_id)) => Selection::Track(track_id),
            _ => Selection::None,
        };

        State::from_hydrated(
            finite_or(bpm_locked, DEFAULT_BPM),
            zoom.px_per_beat,
            selection,
            tracks,
            blocks,
            snap::snap_beat_to_beat(timeline.playhead_beat),
            layout,
        )
    }
}
