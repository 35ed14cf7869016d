//! Sorted caches of query results that are kept in step with the mapper one
//! item at a time.
//!
//! The mapper does not notify anybody. Whoever creates, changes or deletes
//! an item calls the matching hook on the caches (or on a
//! [`ResultSetCacheManager`], which fans the call out to all of its caches).

use std::collections::HashMap;
use std::sync::Arc;

// used to know which ids are represented in a cache at all
use roaring::RoaringTreemap;
use tracing::{debug, trace};

use crate::construct::{ItemRef, OtherHasher, RepositoryId};
use crate::error::{lock, RecordCacheError, Result};
use crate::mapper::{same_mapper, DataMapper};
use crate::query::{Query, QueryRef};
use crate::result::ResultSet;
use crate::sorted::SortedListAllowsDuplicates;
use crate::token::{RecordToken, RecordTokenComparer, SortDefinition};

// ------------- ResultSetCache -------------
pub struct ResultSetCache<T> {
    mapper: Arc<dyn DataMapper<T>>,
    sorted: SortedListAllowsDuplicates<RecordToken<T>, RecordTokenComparer>,
    queries: Vec<QueryRef<T>>,
    cached_ids: RoaringTreemap,
}

impl<T> ResultSetCache<T> {
    /// An empty cache ordered by repository id.
    pub fn new(mapper: Arc<dyn DataMapper<T>>) -> Self {
        Self::with_comparer(mapper, RecordTokenComparer::by_repository_id())
    }
    pub fn with_sort(mapper: Arc<dyn DataMapper<T>>, sort_definitions: &[SortDefinition]) -> Result<Self> {
        let comparer = RecordTokenComparer::new(sort_definitions.iter().cloned())?;
        Ok(Self::with_comparer(mapper, comparer))
    }
    pub fn seeded(
        mapper: Arc<dyn DataMapper<T>>,
        sort_definitions: &[SortDefinition],
        result_set: ResultSet<T>,
        query: QueryRef<T>,
    ) -> Result<Self> {
        let mut cache = Self::with_sort(mapper, sort_definitions)?;
        cache.add(result_set, query)?;
        Ok(cache)
    }
    fn with_comparer(mapper: Arc<dyn DataMapper<T>>, comparer: RecordTokenComparer) -> Self {
        Self {
            mapper,
            sorted: SortedListAllowsDuplicates::new(comparer),
            queries: Vec::new(),
            cached_ids: RoaringTreemap::new(),
        }
    }

    /// Registers `query` for later updates and inserts every token of `result_set`.
    pub fn add(&mut self, result_set: ResultSet<T>, query: QueryRef<T>) -> Result<()> {
        if !same_mapper(result_set.mapper(), &self.mapper) {
            return Err(RecordCacheError::MapperMismatch);
        }
        let count = result_set.len();
        for token in result_set {
            self.insert(token);
        }
        debug!(label = %query.unique_label(), tokens = count, "added query to cache");
        self.queries.push(query);
        Ok(())
    }

    /// Re-evaluates every registered query for `item` and replaces its tokens.
    ///
    /// The fresh tokens are computed before anything is removed, so a failing
    /// query leaves the cache as it was.
    pub fn update_item_in_cache(&mut self, item: &ItemRef<T>) -> Result<()> {
        let (id, fresh) = self.evaluate_item(item)?;
        self.commit(id, fresh);
        Ok(())
    }
    pub fn delete_item_from_cache(&mut self, item: &ItemRef<T>) -> Result<()> {
        let id = self.mapper.get_id(item)?;
        self.delete_known_id(id);
        Ok(())
    }
    pub fn delete_item_from_cache_by_id(&mut self, id: RepositoryId) -> Result<()> {
        if id.is_empty() {
            return Err(RecordCacheError::NullArgument("id"));
        }
        if !self.mapper.contains_id(id)? {
            return Err(RecordCacheError::UnknownId(id));
        }
        self.delete_known_id(id);
        Ok(())
    }
    /// Empties the cache; the mapper is left alone.
    pub fn delete_all_items_from_cache(&mut self) {
        self.sorted.clear();
        self.cached_ids.clear();
    }
    pub fn get_result_set(&self) -> ResultSet<T> {
        ResultSet::new(Arc::clone(&self.mapper), self.sorted.iter().cloned())
    }

    pub fn contains(&self, token: &RecordToken<T>) -> bool {
        self.sorted.contains(token)
    }
    pub fn len(&self) -> usize {
        self.sorted.len()
    }
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }
    pub fn queries(&self) -> &[QueryRef<T>] {
        &self.queries
    }
    pub fn sort_definitions(&self) -> &[SortDefinition] {
        self.sorted.comparer().sort_definitions()
    }
    pub fn mapper(&self) -> &Arc<dyn DataMapper<T>> {
        &self.mapper
    }

    // read-only half of an update, nothing changes until `commit`
    pub(crate) fn evaluate_item(&self, item: &ItemRef<T>) -> Result<(RepositoryId, Vec<RecordToken<T>>)> {
        let id = self.mapper.get_id(item)?;
        let guard = lock(&**item, "item")?;
        let mut tokens = Vec::new();
        for query in &self.queries {
            for row in query.results(&guard)? {
                tokens.push(RecordToken::new(Arc::clone(&self.mapper), id, row)?);
            }
        }
        Ok((id, tokens))
    }
    pub(crate) fn commit(&mut self, id: RepositoryId, fresh: Vec<RecordToken<T>>) {
        let removed = self.remove_tokens(id);
        let added = fresh.len();
        for token in fresh {
            self.insert(token);
        }
        trace!(%id, removed, added, "updated item in cache");
    }
    fn insert(&mut self, token: RecordToken<T>) {
        self.cached_ids.insert(token.id().value());
        self.sorted.add(token);
    }
    fn remove_tokens(&mut self, id: RepositoryId) -> usize {
        if !self.cached_ids.remove(id.value()) {
            return 0;
        }
        self.sorted.retain(|token| token.id() != id)
    }
    pub(crate) fn delete_known_id(&mut self, id: RepositoryId) {
        let removed = self.remove_tokens(id);
        trace!(%id, removed, "deleted item from cache");
    }
}

// ------------- ResultSetCacheManager -------------
pub struct ResultSetCacheManager<T> {
    mapper: Arc<dyn DataMapper<T>>,
    caches: HashMap<String, ResultSetCache<T>, OtherHasher>,
}

impl<T> ResultSetCacheManager<T> {
    pub fn new(mapper: Arc<dyn DataMapper<T>>) -> Self {
        Self {
            mapper,
            caches: HashMap::default(),
        }
    }
    pub fn add(&mut self, label: impl Into<String>, cache: ResultSetCache<T>) -> Result<()> {
        let label = label.into();
        if !same_mapper(cache.mapper(), &self.mapper) {
            return Err(RecordCacheError::MapperMismatch);
        }
        if self.caches.contains_key(&label) {
            return Err(RecordCacheError::DuplicateLabel(label));
        }
        debug!(%label, tokens = cache.len(), "registered cache");
        self.caches.insert(label, cache);
        Ok(())
    }
    /// Registers a cache for `query`, labeled by its unique label and sorted
    /// by its sort definitions, seeded with `result_set`.
    pub fn add_query(&mut self, query: QueryRef<T>, result_set: ResultSet<T>) -> Result<()> {
        if !same_mapper(result_set.mapper(), &self.mapper) {
            return Err(RecordCacheError::MapperMismatch);
        }
        let mut sort_definitions = query.sort_definitions();
        if sort_definitions.is_empty() {
            sort_definitions.push(SortDefinition::by_repository_id());
        }
        let label = query.unique_label();
        let cache = ResultSetCache::seeded(Arc::clone(&self.mapper), &sort_definitions, result_set, query)?;
        self.add(label, cache)
    }
    pub fn get(&self, label: &str) -> Option<&ResultSetCache<T>> {
        self.caches.get(label)
    }
    pub fn get_mut(&mut self, label: &str) -> Option<&mut ResultSetCache<T>> {
        self.caches.get_mut(label)
    }
    pub fn remove(&mut self, label: &str) -> Option<ResultSetCache<T>> {
        self.caches.remove(label)
    }
    pub fn contains(&self, label: &str) -> bool {
        self.caches.contains_key(label)
    }
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.caches.keys().map(String::as_str).collect();
        labels.sort_unstable();
        labels
    }
    pub fn len(&self) -> usize {
        self.caches.len()
    }
    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
    pub fn mapper(&self) -> &Arc<dyn DataMapper<T>> {
        &self.mapper
    }

    pub fn add_item_to_caches(&mut self, item: &ItemRef<T>) -> Result<()> {
        self.update_item_in_caches(item)
    }
    /// Every cache is evaluated before any is changed, so a failing query
    /// leaves all caches as they were.
    pub fn update_item_in_caches(&mut self, item: &ItemRef<T>) -> Result<()> {
        let mut pending = Vec::with_capacity(self.caches.len());
        for (label, cache) in &self.caches {
            let (id, fresh) = cache.evaluate_item(item)?;
            pending.push((label.clone(), id, fresh));
        }
        for (label, id, fresh) in pending {
            match self.caches.get_mut(&label) {
                Some(cache) => cache.commit(id, fresh),
                None => return Err(RecordCacheError::Invariant(format!("cache '{label}' vanished during update"))),
            }
        }
        debug!(caches = self.caches.len(), "updated item in caches");
        Ok(())
    }
    pub fn delete_item_from_caches(&mut self, item: &ItemRef<T>) -> Result<()> {
        let id = self.mapper.get_id(item)?;
        self.delete_item_from_caches_by_id(id)
    }
    pub fn delete_item_from_caches_by_id(&mut self, id: RepositoryId) -> Result<()> {
        // all caches share the mapper, one check covers them
        if id.is_empty() {
            return Err(RecordCacheError::NullArgument("id"));
        }
        if !self.mapper.contains_id(id)? {
            return Err(RecordCacheError::UnknownId(id));
        }
        for cache in self.caches.values_mut() {
            cache.delete_known_id(id);
        }
        debug!(%id, caches = self.caches.len(), "deleted item from caches");
        Ok(())
    }
    pub fn delete_all_items_from_caches(&mut self) {
        for cache in self.caches.values_mut() {
            cache.delete_all_items_from_cache();
        }
        debug!(caches = self.caches.len(), "cleared caches");
    }
}
