use std::{
    fmt::{self, Debug, Display},
    hash::{BuildHasher, Hash, Hasher},
    marker::PhantomData,
    sync::Arc,
};

use ahash::{AHasher, HashSet, RandomState};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

fn new_hasher() -> AHasher {
    static RANDOM_STATE: std::sync::LazyLock<RandomState> =
        std::sync::LazyLock::new(RandomState::new);

    RANDOM_STATE.build_hasher()
}

fn arbitrary_impl() -> u64 {
    use std::cell::Cell;
    thread_local! {
        static COUNTER: Cell<u64> = const { Cell::new(0) };
    }

    COUNTER.set(COUNTER.get() + 1);
    let mut hasher = new_hasher();
    (COUNTER.get(), std::thread::current().id()).hash(&mut hasher);
    hasher.finish()
}

// Ids end up in persisted snapshots, so unlike a hash they have to survive a restart.
// The <T> keeps an Id<Block> from being passed where an Id<Track> is expected.
pub struct Id<T = ()>(Arc<str>, PhantomData<T>);

impl<T> Id<T> {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(Arc::from(raw.as_ref()), PhantomData)
    }

    /// A fresh id. Unique within the process, and practically unique across runs
    /// since the hasher is randomly seeded.
    pub fn arbitrary() -> Self {
        Self::new(format!("{:016x}", arbitrary_impl()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T> Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id::<{}>({:?})", std::any::type_name::<T>(), self.0)
    }
}

impl<T> Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl<T> Eq for Id<T> {}

impl<T> PartialEq<str> for Id<T> {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}
impl<T> PartialEq<&str> for Id<T> {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone(), PhantomData)
    }
}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}

pub type IdSet<T> = HashSet<Id<T>>;
