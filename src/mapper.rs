//! The repository abstraction and its in-memory reference implementation.

use std::sync::{Arc, Mutex, Weak};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, trace};

use crate::construct::{IdGenerator, ItemKeeper, ItemRef, RepositoryId};
use crate::error::{lock, RecordCacheError, Result};
use crate::query::Query;
use crate::result::ResultSet;
use crate::token::RecordToken;

/// CRUD over items keyed by [`RepositoryId`], plus query evaluation.
///
/// Item identity is the identity of the [`ItemRef`] handle handed out by
/// [`DataMapper::create_item`]. Mutating calls advance
/// [`DataMapper::last_modified`].
pub trait DataMapper<T> {
    fn create_item(&self) -> Result<ItemRef<T>>;
    fn count_all_items(&self) -> Result<usize>;
    fn get_id(&self, item: &ItemRef<T>) -> Result<RepositoryId>;
    fn get_item(&self, id: RepositoryId) -> Result<ItemRef<T>>;
    fn contains_id(&self, id: RepositoryId) -> Result<bool>;
    fn get_all_item_ids(&self) -> Result<Vec<RepositoryId>>;
    fn delete_item(&self, item: &ItemRef<T>) -> Result<()>;
    fn delete_item_by_id(&self, id: RepositoryId) -> Result<()>;
    fn delete_all_items(&self) -> Result<()>;
    fn save_item(&self, item: &ItemRef<T>) -> Result<()>;
    fn save_items(&self, items: &[ItemRef<T>]) -> Result<()>;
    /// Evaluates `query` over every item. The result set is not sorted.
    fn get_items_matching(&self, query: &dyn Query<T>) -> Result<ResultSet<T>>;
    fn last_modified(&self) -> Result<DateTime<Utc>>;
    fn can_query(&self) -> bool;
    fn can_persist(&self) -> bool;
}

/// True if both handles point at the same mapper instance.
pub fn same_mapper<T>(a: &Arc<dyn DataMapper<T>>, b: &Arc<dyn DataMapper<T>>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

// ------------- MemoryDataMapper -------------
pub struct MemoryDataMapper<T> {
    id_generator: Mutex<IdGenerator>,
    item_keeper: Mutex<ItemKeeper<T>>,
    last_modified: Mutex<DateTime<Utc>>,
    // tokens and result sets hold on to the mapper that produced them
    me: Weak<MemoryDataMapper<T>>,
}

impl<T: Default + 'static> MemoryDataMapper<T> {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            id_generator: Mutex::new(IdGenerator::new()),
            item_keeper: Mutex::new(ItemKeeper::new()),
            last_modified: Mutex::new(DateTime::<Utc>::MIN_UTC),
            me: me.clone(),
        })
    }
    fn handle(&self) -> Result<Arc<dyn DataMapper<T>>> {
        match self.me.upgrade() {
            Some(me) => {
                let handle: Arc<dyn DataMapper<T>> = me;
                Ok(handle)
            }
            None => Err(RecordCacheError::Invariant(
                "memory data mapper used while being dropped".to_string(),
            )),
        }
    }
    // strictly increasing, even when the clock does not move between calls
    fn touch(&self) -> Result<()> {
        let mut last_modified = lock(&self.last_modified, "last modified")?;
        let now = Utc::now();
        *last_modified = if now > *last_modified {
            now
        } else {
            *last_modified + Duration::microseconds(1)
        };
        Ok(())
    }
    fn known_id(&self, id: RepositoryId) -> Result<RepositoryId> {
        if id.is_empty() {
            return Err(RecordCacheError::NullArgument("id"));
        }
        if lock(&self.item_keeper, "item keeper")?.contains(id) {
            Ok(id)
        } else {
            Err(RecordCacheError::UnknownId(id))
        }
    }
}

impl<T: Default + 'static> DataMapper<T> for MemoryDataMapper<T> {
    fn create_item(&self) -> Result<ItemRef<T>> {
        let item: ItemRef<T> = Arc::new(Mutex::new(T::default()));
        let id = lock(&self.id_generator, "id generator")?.generate();
        lock(&self.item_keeper, "item keeper")?.keep(id, Arc::clone(&item));
        self.touch()?;
        debug!(%id, "created item");
        Ok(item)
    }
    fn count_all_items(&self) -> Result<usize> {
        Ok(lock(&self.item_keeper, "item keeper")?.len())
    }
    fn get_id(&self, item: &ItemRef<T>) -> Result<RepositoryId> {
        lock(&self.item_keeper, "item keeper")?
            .id(item)
            .ok_or(RecordCacheError::UnknownItem)
    }
    fn get_item(&self, id: RepositoryId) -> Result<ItemRef<T>> {
        if id.is_empty() {
            return Err(RecordCacheError::NullArgument("id"));
        }
        lock(&self.item_keeper, "item keeper")?
            .item(id)
            .ok_or(RecordCacheError::UnknownId(id))
    }
    fn contains_id(&self, id: RepositoryId) -> Result<bool> {
        Ok(lock(&self.item_keeper, "item keeper")?.contains(id))
    }
    fn get_all_item_ids(&self) -> Result<Vec<RepositoryId>> {
        Ok(lock(&self.item_keeper, "item keeper")?.ids())
    }
    fn delete_item(&self, item: &ItemRef<T>) -> Result<()> {
        let id = self.get_id(item)?;
        self.delete_item_by_id(id)
    }
    fn delete_item_by_id(&self, id: RepositoryId) -> Result<()> {
        let id = self.known_id(id)?;
        lock(&self.item_keeper, "item keeper")?.forget(id);
        lock(&self.id_generator, "id generator")?.release(id);
        self.touch()?;
        debug!(%id, "deleted item");
        Ok(())
    }
    fn delete_all_items(&self) -> Result<()> {
        let count = {
            let mut item_keeper = lock(&self.item_keeper, "item keeper")?;
            let count = item_keeper.len();
            item_keeper.clear();
            count
        };
        lock(&self.id_generator, "id generator")?.release_all();
        self.touch()?;
        debug!(count, "deleted all items");
        Ok(())
    }
    // Nothing to write for an in-memory mapper, but the item has to be known.
    fn save_item(&self, item: &ItemRef<T>) -> Result<()> {
        let id = self.get_id(item)?;
        self.touch()?;
        trace!(%id, "saved item");
        Ok(())
    }
    fn save_items(&self, items: &[ItemRef<T>]) -> Result<()> {
        for item in items {
            self.get_id(item)?;
        }
        self.touch()?;
        trace!(count = items.len(), "saved items");
        Ok(())
    }
    fn get_items_matching(&self, query: &dyn Query<T>) -> Result<ResultSet<T>> {
        let handle = self.handle()?;
        // evaluate outside the keeper lock, queries may take a while
        let entries = lock(&self.item_keeper, "item keeper")?.entries();
        let mut tokens = Vec::new();
        for (id, item) in entries {
            let rows = {
                let guard = lock(&*item, "item")?;
                query.results(&guard)?
            };
            trace!(%id, rows = rows.len(), "evaluated query");
            for row in rows {
                tokens.push(RecordToken::new(Arc::clone(&handle), id, row)?);
            }
        }
        debug!(label = %query.unique_label(), tokens = tokens.len(), "items matching");
        Ok(ResultSet::new(handle, tokens))
    }
    fn last_modified(&self) -> Result<DateTime<Utc>> {
        Ok(*lock(&self.last_modified, "last modified")?)
    }
    fn can_query(&self) -> bool {
        true
    }
    fn can_persist(&self) -> bool {
        false
    }
}
