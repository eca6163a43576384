//! Write-behind persistence.
//!
//! The editor hands every new snapshot to a [`Persister`]. A background thread waits until
//! snapshots stop arriving for the debounce interval and then writes only the latest one.
//! Failures are logged and otherwise ignored: the in-memory state is always authoritative.

use std::{thread, time::Duration};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use djarch_lib::{Snapshot, State};

use crate::storage::KvStore;

pub struct Persister {
    tx: Option<Sender<Snapshot>>,
    join_handle: Option<thread::JoinHandle<()>>,
}

impl Persister {
    pub fn spawn(
        store: impl KvStore + 'static,
        key: impl Into<String>,
        debounce: Duration,
    ) -> Result<Self> {
        let key = key.into();
        let (tx, rx) = crossbeam_channel::unbounded();
        let join_handle = thread::Builder::new()
            .name("djarch persister".into())
            .spawn(move || persister_loop(rx, store, key, debounce))
            .context("failed to spawn persister thread")?;
        tracing::info!("persister started ({}ms debounce)", debounce.as_millis());

        Ok(Self {
            tx: Some(tx),
            join_handle: Some(join_handle),
        })
    }

    /// Queues `snapshot` to be written once things quiet down.
    pub fn notify(&self, snapshot: Snapshot) {
        let Some(tx) = &self.tx else { return };
        if tx.send(snapshot).is_err() {
            tracing::warn!("persister thread is gone, snapshot dropped");
        }
    }
}

impl Drop for Persister {
    fn drop(&mut self) {
        // closing the channel makes the worker flush whatever is pending and exit
        drop(self.tx.take());
        if let Some(join_handle) = self.join_handle.take() {
            if join_handle.join().is_err() {
                tracing::warn!("persister thread panicked");
            }
        }
        tracing::info!("persister stopped");
    }
}

struct Writer<S> {
    store: S,
    key: String,
    last_written: Option<Snapshot>,
}

impl<S: KvStore> Writer<S> {
    fn write(&mut self, snapshot: Snapshot) {
        if self.last_written.as_ref() == Some(&snapshot) {
            tracing::trace!("snapshot unchanged, skipping write");
            return;
        }
        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("failed to serialize snapshot: {e}");
                return;
            }
        };
        match self.store.put(&self.key, &json) {
            Ok(()) => {
                tracing::debug!("wrote snapshot {:?} ({} bytes)", self.key, json.len());
                self.last_written = Some(snapshot);
            }
            Err(e) => tracing::warn!("failed to persist snapshot {:?}: {e:#}", self.key),
        }
    }
}

fn persister_loop<S: KvStore>(rx: Receiver<Snapshot>, store: S, key: String, debounce: Duration) {
    let mut writer = Writer {
        store,
        key,
        last_written: None,
    };
    let mut pending = None;

    loop {
        match pending.take() {
            None => match rx.recv() {
                Ok(snapshot) => pending = Some(snapshot),
                Err(_) => break,
            },
            Some(snapshot) => match rx.recv_timeout(debounce) {
                // newer snapshot supersedes the pending one and restarts the wait
                Ok(newer) => pending = Some(newer),
                Err(RecvTimeoutError::Timeout) => writer.write(snapshot),
                Err(RecvTimeoutError::Disconnected) => {
                    writer.write(snapshot);
                    break;
                }
            },
        }
    }
}

/// Appended to the storage key to get the key an unparseable snapshot is moved to.
pub const UNREADABLE_SUFFIX: &str = "_unreadable";

fn parse_snapshot(key: &str, json: &str) -> Result<Snapshot> {
    serde_json::from_str(json).with_context(|| format!("stored snapshot {key:?} is malformed"))
}

/// Reads and parses the snapshot stored under `key`, if there is one.
pub fn load_project(store: &dyn KvStore, key: &str) -> Result<Option<Snapshot>> {
    let Some(json) = store.get(key)? else {
        return Ok(None);
    };
    parse_snapshot(key, &json).map(Some)
}

/// Where the state returned by [`open_project`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectOrigin {
    Stored,
    /// Nothing stored yet. The state is the default set.
    Missing,
    /// Something is stored but couldn't be read. The state is the default set and the stored
    /// snapshot must not be overwritten with it.
    Unreadable,
}

/// Loads and hydrates the project stored under `key`, falling back to the default set.
///
/// A snapshot that isn't valid JSON is copied to `<key>_unreadable` first, so later writes to
/// `key` don't destroy the only copy.
pub fn open_project(store: &mut dyn KvStore, key: &str) -> (State, ProjectOrigin) {
    let json = match store.get(key) {
        Ok(Some(json)) => json,
        Ok(None) => {
            tracing::info!("no saved project, starting from the default set");
            return (State::seeded(), ProjectOrigin::Missing);
        }
        Err(e) => {
            tracing::warn!("{e:#}, starting from the default set");
            return (State::seeded(), ProjectOrigin::Unreadable);
        }
    };
    match parse_snapshot(key, &json) {
        Ok(snapshot) => {
            tracing::info!("loaded project {key:?}");
            (State::hydrate(snapshot), ProjectOrigin::Stored)
        }
        Err(e) => {
            tracing::warn!("{e:#}, starting from the default set");
            let backup = format!("{key}{UNREADABLE_SUFFIX}");
            match store.put(&backup, &json) {
                Ok(()) => tracing::warn!("kept a copy of the unreadable snapshot as {backup:?}"),
                Err(e) => tracing::warn!("failed to keep a copy of the unreadable snapshot: {e:#}"),
            }
            (State::seeded(), ProjectOrigin::Unreadable)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use djarch_lib::{Id, State};

    use super::*;
    use crate::storage::MemoryStore;

    const KEY: &str = "project_state_v1";

    #[test]
    fn coalesces_bursts() {
        let store = MemoryStore::new();
        let persister = Persister::spawn(store.clone(), KEY, Duration::from_secs(30)).unwrap();

        let mut state = State::seeded();
        for beat in [10.0, 20.0, 30.0] {
            state.set_playhead_beat(beat);
            persister.notify(state.snapshot());
        }
        // dropping flushes without waiting out the debounce
        drop(persister);

        assert_eq!(store.put_count(), 1);
        let loaded = load_project(&store, KEY).unwrap().unwrap();
        assert_eq!(State::hydrate(loaded).playhead_beat(), 30);
    }

    #[test]
    fn skips_unchanged_snapshots() {
        let store = MemoryStore::new();
        let persister = Persister::spawn(store.clone(), KEY, Duration::from_millis(1)).unwrap();
        let snapshot = State::seeded().snapshot();

        persister.notify(snapshot.clone());
        thread::sleep(Duration::from_millis(200));
        persister.notify(snapshot);
        drop(persister);

        assert_eq!(store.put_count(), 1);
    }

    struct FailingStore(Arc<AtomicUsize>);

    impl KvStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }
        fn put(&mut self, _key: &str, _value: &str) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("disk on fire")
        }
    }

    #[test]
    fn failures_are_swallowed() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let persister = Persister::spawn(
            FailingStore(attempts.clone()),
            KEY,
            Duration::from_millis(1),
        )
        .unwrap();

        let mut state = State::seeded();
        persister.notify(state.snapshot());
        thread::sleep(Duration::from_millis(200));
        // the worker keeps going after a failed write
        state.select_block(Some(&Id::new("b1")));
        persister.notify(state.snapshot());
        drop(persister);

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn load_reports_missing_and_malformed() {
        let mut store = MemoryStore::new();
        assert!(load_project(&store, KEY).unwrap().is_none());
        store.put(KEY, "{ not json").unwrap();
        assert!(load_project(&store, KEY).is_err());
    }

    #[test]
    fn open_project_backs_up_unparseable_snapshots() {
        let mut store = MemoryStore::new();
        let (state, origin) = open_project(&mut store, KEY);
        assert_eq!((state, origin), (State::seeded(), ProjectOrigin::Missing));

        store.put(KEY, "[1, 2").unwrap();
        let (state, origin) = open_project(&mut store, KEY);
        assert_eq!((state, origin), (State::seeded(), ProjectOrigin::Unreadable));
        let backup = format!("{KEY}{UNREADABLE_SUFFIX}");
        assert_eq!(store.get(&backup).unwrap().as_deref(), Some("[1, 2"));
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("[1, 2"));
    }

    #[test]
    fn open_project_repairs_partial_snapshots() {
        let mut store = MemoryStore::new();
        let json = r#"{"selection":null,"zoom":null,"tracks":[{"id":"t9","bpm":null}],"timeline":{"blocks":[{"id":"u1","trackId":"t9","startBeat":64,"lengthBeats":128,"transition":"fade"}]}}"#;
        store.put(KEY, json).unwrap();
        let (state, origin) = open_project(&mut store, KEY);
        assert_eq!(origin, ProjectOrigin::Stored);
        assert_eq!(state.block(&Id::new("u1")).map(|b| b.start_beat), Some(64));
        assert!(state.track(&Id::new("t9")).is_some());
    }
}
