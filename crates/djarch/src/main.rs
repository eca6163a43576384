use anyhow::Result;
use djarch::{
    Editor,
    config::{default_config_path, load_config},
    storage::FileStore,
};
use djarch_lib::projection::beat_to_px;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config_path = std::env::args_os()
        .nth(1)
        .map(Into::into)
        .unwrap_or_else(default_config_path);
    let config = load_config(&config_path);

    let store = FileStore::new(config.storage_dir());
    tracing::info!("project storage in {}", store.dir().display());
    let editor = Editor::open(store, &config)?;

    let state = editor.state();
    for block in state.blocks() {
        if !state.is_block_placement_valid(block) {
            let others = state.colliding_blocks(&block.id, block.start_beat, block.length_beats);
            tracing::warn!("block {} overlaps {others:?}", block.id);
        }
    }

    for track in state.tracks() {
        println!(
            "{:>6.0}px  {} - {} ({} bpm, {}, energy {:.2})",
            state.lane_top_px(&track.id),
            track.artist,
            track.title,
            track.bpm,
            track.key,
            track.energy
        );
        for block in state.blocks().iter().filter(|b| b.track_id == track.id) {
            println!(
                "        {} beats {}..{} ({}px..{}px), {}",
                block.id,
                block.start_beat,
                block.end_beat(),
                beat_to_px(block.start_beat as f64, state.px_per_beat()),
                beat_to_px(block.end_beat() as f64, state.px_per_beat()),
                block.transition
            );
        }
    }

    Ok(())
}
