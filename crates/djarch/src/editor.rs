use djarch_command::{
    StateCommand, StateTracker,
    block::{BlockCreate, BlockMove, BlockResize, BlockSelect, BlockUpdate},
    misc::{LayoutUpdate, PlayheadSet, ZoomSet},
    track::{TrackMetaUpdate, TrackReorder, TrackSelect},
};
use djarch_lib::{Block, BlockPatch, Id, LayoutPatch, PatchOutcome, State, Track, TrackPatch};

use crate::{
    config::AppConfig,
    persistence::{Persister, ProjectOrigin, open_project},
    storage::KvStore,
    util::{
        Commit, DragHandler, DragMode, PointerCapture, PointerEvent, PointerId, Viewport, hit_test,
    },
};

/// Owns the project state and everything that's allowed to change it.
///
/// All mutations run as commands. After each one that actually ran, the new snapshot goes to the
/// persister (if there is one).
pub struct Editor {
    state: State,
    drag_handler: DragHandler,
    viewport: Viewport,
    persister: Option<Persister>,
}

impl Editor {
    pub fn new(state: State) -> Self {
        Self {
            state,
            drag_handler: DragHandler::new(),
            viewport: Viewport::default(),
            persister: None,
        }
    }
    pub fn with_persister(mut self, persister: Persister) -> Self {
        self.persister = Some(persister);
        self
    }

    /// Opens the project configured in `config` and persists further changes to `store`.
    ///
    /// A project that loaded is written back right away in its repaired form. An unreadable one
    /// isn't, since that would replace it with the default set.
    pub fn open(mut store: impl KvStore + 'static, config: &AppConfig) -> anyhow::Result<Self> {
        let (state, origin) = open_project(&mut store, &config.storage_key);
        let state = state.with_collision_scope(config.collision_scope);
        let persister =
            Persister::spawn(store, config.storage_key.clone(), config.persist_debounce())?;
        let editor = Self::new(state).with_persister(persister);
        if origin != ProjectOrigin::Unreadable {
            editor.persist();
        }
        Ok(editor)
    }

    pub fn state(&self) -> &State {
        &self.state
    }
    pub fn drag_handler(&self) -> &DragHandler {
        &self.drag_handler
    }
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Hands the current snapshot to the persister.
    pub fn persist(&self) {
        if let Some(persister) = &self.persister {
            persister.notify(self.state.snapshot());
        }
    }

    pub fn apply(&mut self, tracker: StateTracker) {
        if tracker.is_empty() {
            return;
        }
        let count = tracker.apply(&mut self.state);
        tracing::trace!("applied {count} commands");
        self.persist();
    }

    fn run<C: StateCommand>(&mut self, mut command: C) -> C {
        command.execute(&mut self.state);
        self.persist();
        command
    }

    // --- pointer input ---

    /// Starts a drag if `client_x` lands on `block_id`. Returns the mode the drag started in.
    pub fn pointer_down(
        &mut self,
        pointer_id: PointerId,
        block_id: &Id<Block>,
        client_x: f64,
        capture: &mut impl PointerCapture,
    ) -> Option<DragMode> {
        let block = self.state.block(block_id)?;
        let local_px = self.viewport.local_px(client_x);
        let mode = hit_test(block, local_px, self.state.px_per_beat())?;
        let event = PointerEvent::Down {
            pointer_id,
            block_id: block_id.clone(),
            mode,
            client_x,
        };
        self.handle_pointer(&event, capture);
        self.drag_handler
            .draft()
            .is_some_and(|draft| draft.pointer_id == pointer_id && draft.block_id == *block_id)
            .then_some(mode)
    }

    pub fn handle_pointer(
        &mut self,
        event: &PointerEvent,
        capture: &mut impl PointerCapture,
    ) -> Option<Commit> {
        let mut tracker = StateTracker::new();
        let commit = self.drag_handler.handle(
            event,
            &self.state,
            &self.viewport,
            capture,
            &mut tracker,
        );
        self.apply(tracker);
        commit
    }

    // --- commands ---

    /// Writes a start beat without collision checks. Prefer [`Editor::update_block`] for
    /// untrusted input.
    pub fn move_block(&mut self, id: Id<Block>, beat: f64) {
        self.run(BlockMove::new(id, beat));
    }
    /// Writes a length without collision checks.
    pub fn resize_block(&mut self, id: Id<Block>, len: f64) {
        self.run(BlockResize::new(id, len));
    }
    pub fn update_block(&mut self, id: Id<Block>, patch: BlockPatch) -> Option<PatchOutcome> {
        self.run(BlockUpdate::new(id, patch)).outcome()
    }
    pub fn create_block_from_track(&mut self, track_id: Id<Track>, beat: f64) -> Option<Id<Block>> {
        self.run(BlockCreate::new(track_id, beat)).created_id().cloned()
    }
    pub fn set_playhead_beat(&mut self, beat: f64) {
        self.run(PlayheadSet::new(beat));
    }
    pub fn set_px_per_beat(&mut self, px_per_beat: f64) {
        self.run(ZoomSet::new(px_per_beat));
    }
    pub fn set_timeline_layout(&mut self, patch: LayoutPatch) {
        self.run(LayoutUpdate::new(patch));
    }
    pub fn select_block(&mut self, id: Option<Id<Block>>) {
        self.run(BlockSelect::new(id));
    }
    pub fn select_track(&mut self, id: Option<Id<Track>>) {
        self.run(TrackSelect::new(id));
    }
    pub fn update_track_meta(&mut self, id: Id<Track>, patch: TrackPatch) {
        self.run(TrackMetaUpdate::new(id, patch));
    }
    pub fn set_track_order(&mut self, order: Vec<Id<Track>>) {
        self.run(TrackReorder::new(order));
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use djarch_lib::{CollisionScope, Transition};

    use super::*;
    use crate::{
        persistence::{UNREADABLE_SUFFIX, load_project},
        storage::MemoryStore,
        util::NoCapture,
    };

    fn config() -> AppConfig {
        AppConfig {
            storage_key: "project".into(),
            persist_debounce_ms: 30_000,
            collision_scope: CollisionScope::PerTrack,
            ..Default::default()
        }
    }

    #[test]
    fn open_writes_back_the_repaired_project() {
        let mut store = MemoryStore::new();
        let json = r#"{"selection":null,"tracks":[{"id":"t9","title":"One More Time","bpm":null}],"timeline":{"blocks":[{"id":"u1","trackId":"t9","startBeat":64,"lengthBeats":128,"transition":"fade"}],"playheadBeat":0}}"#;
        store.put("project", json).unwrap();

        let editor = Editor::open(store.clone(), &config()).unwrap();
        assert_eq!(editor.state().collision_scope(), CollisionScope::PerTrack);
        assert!(editor.state().block(&Id::new("u1")).is_some());
        drop(editor);

        assert_eq!(store.put_count(), 2);
        let state = State::hydrate(load_project(&store, "project").unwrap().unwrap());
        let u1 = state.block(&Id::new("u1")).unwrap();
        assert_eq!((u1.start_beat, u1.transition), (64, Transition::Fade));
        assert_eq!(state.track(&Id::new("t9")).unwrap().title, "One More Time");
    }

    #[test]
    fn open_leaves_unreadable_project_alone() {
        let mut store = MemoryStore::new();
        store.put("project", "{\"tracks\": [").unwrap();

        let editor = Editor::open(store.clone(), &config()).unwrap();
        assert_eq!(editor.state().blocks(), State::seeded().blocks());
        drop(editor);

        assert_eq!(store.get("project").unwrap().as_deref(), Some("{\"tracks\": ["));
        let backup = format!("project{UNREADABLE_SUFFIX}");
        assert_eq!(store.get(&backup).unwrap().as_deref(), Some("{\"tracks\": ["));
    }

    #[test]
    fn commands_reach_the_store() {
        let store = MemoryStore::new();
        let persister =
            Persister::spawn(store.clone(), "project", Duration::from_secs(30)).unwrap();
        let mut editor = Editor::new(State::seeded()).with_persister(persister);

        let id = editor
            .create_block_from_track(Id::new("t2"), 4000.0)
            .unwrap();
        assert_eq!(
            editor.update_block(id.clone(), BlockPatch::default().transition(Transition::Fade)),
            Some(PatchOutcome::Applied)
        );
        editor.select_block(Some(id.clone()));
        drop(editor);

        let state = State::hydrate(load_project(&store, "project").unwrap().unwrap());
        assert_eq!(state.selected_block().map(|b| b.transition), Some(Transition::Fade));
        assert_eq!(state.block(&id).map(|b| b.start_beat), Some(4000));
    }

    #[test]
    fn pointer_down_picks_mode_from_position() {
        let mut editor = Editor::new(State::seeded());
        // b2 covers [960, 1984) at 2 px per beat
        let b2 = Id::new("b2");
        assert_eq!(editor.pointer_down(PointerId(1), &b2, 100.0, &mut NoCapture), None);
        assert_eq!(
            editor.pointer_down(PointerId(1), &b2, 1980.0, &mut NoCapture),
            Some(DragMode::Resize)
        );
        // already dragging
        assert_eq!(editor.pointer_down(PointerId(2), &b2, 1000.0, &mut NoCapture), None);
        let cancel = PointerEvent::Cancel {
            pointer_id: PointerId(1),
        };
        editor.handle_pointer(&cancel, &mut NoCapture);
        assert!(!editor.drag_handler().is_something_being_dragged());
        assert_eq!(
            editor.pointer_down(PointerId(2), &b2, 1000.0, &mut NoCapture),
            Some(DragMode::Move)
        );
    }
}
