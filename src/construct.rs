use std::sync::{Arc, Mutex};

// used to keep the one-to-one mapping between items and their assigned ids
use bimap::BiMap;

// other keepers use HashSet or HashMap
use core::hash::{BuildHasherDefault, Hasher};
use std::collections::HashSet;
use std::collections::hash_set::Iter;
use std::hash::Hash;
use seahash::SeaHasher;

// used to print out readable forms of an id
use std::fmt;

// ------------- RepositoryId -------------
pub type IdHasher = BuildHasherDefault<SeaHasher>;
pub type OtherHasher = BuildHasherDefault<SeaHasher>;

pub const GENESIS: u64 = 0;

/// Identity of an item kept by a data mapper.
///
/// Ids are only handed out by an [`IdGenerator`], so two ids are equal iff
/// they identify the same item. [`RepositoryId::EMPTY`] sorts before every
/// generated id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RepositoryId(u64);

impl RepositoryId {
    pub const EMPTY: RepositoryId = RepositoryId(GENESIS);

    // Host mappers restoring items use this together with IdGenerator::retain.
    pub fn new(value: u64) -> Self {
        Self(value)
    }
    pub fn is_empty(&self) -> bool {
        self.0 == GENESIS
    }
    pub fn value(&self) -> u64 {
        self.0
    }
}
impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            write!(f, "#empty")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}
impl fmt::Debug for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RepositoryId({})", self)
    }
}

#[derive(Debug)]
pub struct IdGenerator {
    lower_bound: u64,
    retained: HashSet<RepositoryId, IdHasher>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            lower_bound: GENESIS,
            retained: HashSet::<RepositoryId, IdHasher>::default(),
        }
    }
    // A mapper restoring items from elsewhere has to retain their ids,
    // so that generated ids never collide with restored ones.
    pub fn retain(&mut self, id: RepositoryId) {
        if id.is_empty() {
            return;
        }
        self.retained.insert(id);
        if id.0 > self.lower_bound {
            self.lower_bound = id.0;
        }
    }
    pub fn check(&self, id: RepositoryId) -> Option<RepositoryId> {
        self.retained.get(&id).cloned()
    }
    // Released ids are forgotten but never handed out again.
    pub fn release(&mut self, id: RepositoryId) -> bool {
        self.retained.remove(&id)
    }
    pub fn release_all(&mut self) {
        self.retained.clear();
    }
    pub fn generate(&mut self) -> RepositoryId {
        self.lower_bound += 1;
        let id = RepositoryId(self.lower_bound);
        self.retained.insert(id);
        id
    }
    pub fn iter(&self) -> Iter<'_, RepositoryId> {
        self.retained.iter()
    }
    pub fn len(&self) -> usize {
        self.retained.len()
    }
    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// ------------- Item -------------
pub type ItemRef<T> = Arc<Mutex<T>>;

// Items are kept by the identity of their handle, not by their content,
// since content changes while the item stays the same.
struct Keepsake<T>(ItemRef<T>);

impl<T> PartialEq for Keepsake<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl<T> Eq for Keepsake<T> {}
impl<T> Hash for Keepsake<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

pub struct ItemKeeper<T> {
    kept: BiMap<RepositoryId, Keepsake<T>>,
}
impl<T> ItemKeeper<T> {
    pub fn new() -> Self {
        Self { kept: BiMap::new() }
    }
    pub fn keep(&mut self, id: RepositoryId, item: ItemRef<T>) {
        self.kept.insert(id, Keepsake(item));
    }
    pub fn item(&self, id: RepositoryId) -> Option<ItemRef<T>> {
        self.kept.get_by_left(&id).map(|keepsake| Arc::clone(&keepsake.0))
    }
    pub fn id(&self, item: &ItemRef<T>) -> Option<RepositoryId> {
        self.kept.get_by_right(&Keepsake(Arc::clone(item))).copied()
    }
    pub fn contains(&self, id: RepositoryId) -> bool {
        self.kept.contains_left(&id)
    }
    pub fn forget(&mut self, id: RepositoryId) -> Option<ItemRef<T>> {
        self.kept.remove_by_left(&id).map(|(_, keepsake)| keepsake.0)
    }
    pub fn clear(&mut self) {
        self.kept.clear();
    }
    // ascending, so that evaluation order does not depend on hashing
    pub fn ids(&self) -> Vec<RepositoryId> {
        let mut ids: Vec<RepositoryId> = self.kept.left_values().copied().collect();
        ids.sort_unstable();
        ids
    }
    pub fn entries(&self) -> Vec<(RepositoryId, ItemRef<T>)> {
        let mut entries: Vec<(RepositoryId, ItemRef<T>)> = self
            .kept
            .iter()
            .map(|(id, keepsake)| (*id, Arc::clone(&keepsake.0)))
            .collect();
        entries.sort_unstable_by_key(|(id, _)| *id);
        entries
    }
    pub fn len(&self) -> usize {
        self.kept.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}

impl<T> Default for ItemKeeper<T> {
    fn default() -> Self {
        Self::new()
    }
}
