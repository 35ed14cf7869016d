//! Queries turn one item into zero or more labeled-field rows.
//!
//! A [`Query`] is pure: it only looks at the item it is given. Besides its
//! rows it declares how those rows should be ordered ([`SortDefinition`]s),
//! a label identifying it for caching, and which rows count as having no
//! value ([`Query::is_unpopulated`]).
//!
//! The combinators in [`QueryExt`] build new queries out of existing ones and
//! never change the queries they are built from:
//! * [`QueryExt::join_inner`] – per-item cross product of two queries' rows.
//! * [`QueryExt::merge`] – rows of both queries, the second renamed onto the first.
//! * [`QueryExt::get_alternative`] – the first query's rows unless none is populated.
//! * [`QueryExt::remap_keys`] – renames fields.
//! * [`QueryExt::strip_all_unpopulated_entries`] / [`QueryExt::strip_duplicates`] – row filters.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::construct::OtherHasher;
use crate::datatype::Fields;
use crate::error::{RecordCacheError, Result};
use crate::token::SortDefinition;

pub trait Query<T> {
    fn results(&self, item: &T) -> Result<Vec<Fields>>;
    fn sort_definitions(&self) -> Vec<SortDefinition>;
    fn unique_label(&self) -> String;
    fn is_unpopulated(&self, _row: &Fields) -> bool {
        false
    }
}

pub type QueryRef<T> = Arc<dyn Query<T>>;

impl<T, Q: Query<T> + ?Sized> Query<T> for Arc<Q> {
    fn results(&self, item: &T) -> Result<Vec<Fields>> {
        (**self).results(item)
    }
    fn sort_definitions(&self) -> Vec<SortDefinition> {
        (**self).sort_definitions()
    }
    fn unique_label(&self) -> String {
        (**self).unique_label()
    }
    fn is_unpopulated(&self, row: &Fields) -> bool {
        (**self).is_unpopulated(row)
    }
}

// ------------- KeyMap -------------
/// Field renames, from the name a query produces to the name wanted.
///
/// A renamed field replaces a field of the row that already carries the
/// target name. When several names map to one target, the name that sorts
/// last wins, and [`KeyMap::inverse`] maps the target back to that name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyMap {
    map: BTreeMap<String, String>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.insert(from, to);
        self
    }
    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.map.insert(from.into(), to.into());
    }
    pub fn get(&self, from: &str) -> Option<&str> {
        self.map.get(from).map(String::as_str)
    }
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.map.values().map(String::as_str)
    }
    pub fn inverse(&self) -> KeyMap {
        Self {
            map: self.map.iter().map(|(from, to)| (to.clone(), from.clone())).collect(),
        }
    }
    pub fn len(&self) -> usize {
        self.map.len()
    }
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
    // unknown fields keep their name
    fn rename(&self, row: Fields) -> Fields {
        let (renamed, kept): (Vec<_>, Vec<_>) = row.into_iter().partition(|(name, _)| self.map.contains_key(name));
        let mut row: Fields = kept.into_iter().collect();
        for (name, value) in renamed {
            if let Some(to) = self.map.get(&name) {
                row.insert(to.clone(), value);
            }
        }
        row
    }
    // every field must be renamed
    fn rename_strictly(&self, row: Fields) -> Result<Fields> {
        row.into_iter()
            .map(|(name, value)| match self.map.get(&name) {
                Some(to) => Ok((to.clone(), value)),
                None => Err(RecordCacheError::UnmappedField(name)),
            })
            .collect()
    }
    fn rename_sort_definitions(&self, definitions: Vec<SortDefinition>) -> Vec<SortDefinition> {
        definitions
            .into_iter()
            .map(|definition| match self.map.get(definition.field()) {
                Some(to) => definition.renamed(to.clone()),
                None => definition,
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut key_map = KeyMap::new();
        for (from, to) in iter {
            key_map.insert(from, to);
        }
        key_map
    }
}

impl fmt::Display for KeyMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let renames: Vec<String> = self.map.iter().map(|(from, to)| format!("{}->{}", from, to)).collect();
        write!(f, "{}", renames.join(","))
    }
}

// ------------- DelegateQuery -------------
type ResultsFn<T> = dyn Fn(&T) -> Result<Vec<Fields>> + Send + Sync;
type UnpopulatedFn = dyn Fn(&Fields) -> bool + Send + Sync;

/// A query assembled from closures.
pub struct DelegateQuery<T> {
    label: String,
    sort_definitions: Vec<SortDefinition>,
    results: Box<ResultsFn<T>>,
    unpopulated: Option<Box<UnpopulatedFn>>,
}

impl<T> DelegateQuery<T> {
    pub fn new<F>(label: impl Into<String>, sort_definitions: Vec<SortDefinition>, results: F) -> Self
    where
        F: Fn(&T) -> Result<Vec<Fields>> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            sort_definitions,
            results: Box::new(results),
            unpopulated: None,
        }
    }
    pub fn with_unpopulated<F>(mut self, unpopulated: F) -> Self
    where
        F: Fn(&Fields) -> bool + Send + Sync + 'static,
    {
        self.unpopulated = Some(Box::new(unpopulated));
        self
    }
}

impl<T> Query<T> for DelegateQuery<T> {
    fn results(&self, item: &T) -> Result<Vec<Fields>> {
        (self.results)(item)
    }
    fn sort_definitions(&self) -> Vec<SortDefinition> {
        self.sort_definitions.clone()
    }
    fn unique_label(&self) -> String {
        self.label.clone()
    }
    fn is_unpopulated(&self, row: &Fields) -> bool {
        self.unpopulated.as_ref().is_some_and(|unpopulated| unpopulated(row))
    }
}

// ------------- JoinInner -------------
pub struct JoinInner<T> {
    first: QueryRef<T>,
    second: QueryRef<T>,
}

impl<T> Query<T> for JoinInner<T> {
    fn results(&self, item: &T) -> Result<Vec<Fields>> {
        let first_rows = self.first.results(item)?;
        let second_rows = self.second.results(item)?;
        let mut joined = Vec::with_capacity(first_rows.len() * second_rows.len());
        for second_row in &second_rows {
            for first_row in &first_rows {
                let mut row = first_row.clone();
                // colliding fields take the second query's value
                row.extend(second_row.iter().map(|(name, value)| (name.clone(), value.clone())));
                joined.push(row);
            }
        }
        trace!(label = %self.unique_label(), rows = joined.len(), "joined");
        Ok(joined)
    }
    fn sort_definitions(&self) -> Vec<SortDefinition> {
        let mut definitions = self.first.sort_definitions();
        definitions.extend(self.second.sort_definitions());
        definitions
    }
    fn unique_label(&self) -> String {
        format!("{}.JoinInner.{}", self.first.unique_label(), self.second.unique_label())
    }
    fn is_unpopulated(&self, row: &Fields) -> bool {
        self.first.is_unpopulated(row) || self.second.is_unpopulated(row)
    }
}

// ------------- Merge -------------
pub struct Merge<T> {
    first: QueryRef<T>,
    second: QueryRef<T>,
    key_map: KeyMap,
}

impl<T> Query<T> for Merge<T> {
    fn results(&self, item: &T) -> Result<Vec<Fields>> {
        let mut rows = self.first.results(item)?;
        if let Some(first_row) = rows.first() {
            if let Some(missing) = self.key_map.targets().find(|target| !first_row.contains_key(*target)) {
                return Err(RecordCacheError::MissingTargetField(missing.to_string()));
            }
        }
        for row in self.second.results(item)? {
            rows.push(self.key_map.rename_strictly(row)?);
        }
        Ok(rows)
    }
    fn sort_definitions(&self) -> Vec<SortDefinition> {
        let mut definitions = self.first.sort_definitions();
        definitions.extend(self.key_map.rename_sort_definitions(self.second.sort_definitions()));
        definitions
    }
    fn unique_label(&self) -> String {
        format!("{}.Merge.{}", self.first.unique_label(), self.second.unique_label())
    }
    fn is_unpopulated(&self, row: &Fields) -> bool {
        self.first.is_unpopulated(row)
    }
}

// ------------- Alternative -------------
pub struct Alternative<T> {
    preferred: QueryRef<T>,
    fallback: QueryRef<T>,
}

impl<T> Query<T> for Alternative<T> {
    fn results(&self, item: &T) -> Result<Vec<Fields>> {
        let preferred_rows = self.preferred.results(item)?;
        if preferred_rows.iter().any(|row| !self.preferred.is_unpopulated(row)) {
            return Ok(preferred_rows);
        }
        let fallback_rows = self.fallback.results(item)?;
        if fallback_rows.iter().any(|row| !self.fallback.is_unpopulated(row)) {
            return Ok(fallback_rows);
        }
        Ok(preferred_rows)
    }
    fn sort_definitions(&self) -> Vec<SortDefinition> {
        let mut definitions = self.preferred.sort_definitions();
        definitions.extend(self.fallback.sort_definitions());
        definitions
    }
    fn unique_label(&self) -> String {
        format!("{}.GetAlternative.{}", self.preferred.unique_label(), self.fallback.unique_label())
    }
    fn is_unpopulated(&self, row: &Fields) -> bool {
        self.preferred.is_unpopulated(row)
    }
}

// ------------- RemapKeys -------------
pub struct RemapKeys<T> {
    inner: QueryRef<T>,
    key_map: KeyMap,
}

impl<T> Query<T> for RemapKeys<T> {
    fn results(&self, item: &T) -> Result<Vec<Fields>> {
        Ok(self
            .inner
            .results(item)?
            .into_iter()
            .map(|row| self.key_map.rename(row))
            .collect())
    }
    fn sort_definitions(&self) -> Vec<SortDefinition> {
        self.key_map.rename_sort_definitions(self.inner.sort_definitions())
    }
    fn unique_label(&self) -> String {
        format!("{}.RemapKeys({})", self.inner.unique_label(), self.key_map)
    }
    fn is_unpopulated(&self, row: &Fields) -> bool {
        self.inner.is_unpopulated(&self.key_map.inverse().rename(row.clone()))
    }
}

// ------------- StripUnpopulated -------------
pub struct StripUnpopulated<T> {
    inner: QueryRef<T>,
}

impl<T> Query<T> for StripUnpopulated<T> {
    fn results(&self, item: &T) -> Result<Vec<Fields>> {
        let mut rows = self.inner.results(item)?;
        rows.retain(|row| !self.inner.is_unpopulated(row));
        Ok(rows)
    }
    fn sort_definitions(&self) -> Vec<SortDefinition> {
        self.inner.sort_definitions()
    }
    fn unique_label(&self) -> String {
        format!("{}.StripAllUnpopulatedEntries", self.inner.unique_label())
    }
    fn is_unpopulated(&self, row: &Fields) -> bool {
        self.inner.is_unpopulated(row)
    }
}

// ------------- StripDuplicates -------------
pub struct StripDuplicates<T> {
    inner: QueryRef<T>,
}

impl<T> Query<T> for StripDuplicates<T> {
    fn results(&self, item: &T) -> Result<Vec<Fields>> {
        let mut rows = self.inner.results(item)?;
        let mut seen: HashSet<Fields, OtherHasher> = HashSet::default();
        rows.retain(|row| seen.insert(row.clone()));
        Ok(rows)
    }
    fn sort_definitions(&self) -> Vec<SortDefinition> {
        self.inner.sort_definitions()
    }
    fn unique_label(&self) -> String {
        format!("{}.StripDuplicates", self.inner.unique_label())
    }
    fn is_unpopulated(&self, row: &Fields) -> bool {
        self.inner.is_unpopulated(row)
    }
}

// ------------- Combinators -------------
pub trait QueryExt<T: 'static>: Query<T> + Sized + 'static {
    fn into_query_ref(self) -> QueryRef<T> {
        Arc::new(self)
    }
    fn join_inner(self, other: impl Query<T> + 'static) -> JoinInner<T> {
        JoinInner {
            first: self.into_query_ref(),
            second: Arc::new(other),
        }
    }
    fn merge(self, other: impl Query<T> + 'static, key_map: KeyMap) -> Merge<T> {
        Merge {
            first: self.into_query_ref(),
            second: Arc::new(other),
            key_map,
        }
    }
    fn get_alternative(self, other: impl Query<T> + 'static) -> Alternative<T> {
        Alternative {
            preferred: self.into_query_ref(),
            fallback: Arc::new(other),
        }
    }
    fn remap_keys(self, key_map: KeyMap) -> RemapKeys<T> {
        RemapKeys {
            inner: self.into_query_ref(),
            key_map,
        }
    }
    fn strip_all_unpopulated_entries(self) -> StripUnpopulated<T> {
        StripUnpopulated {
            inner: self.into_query_ref(),
        }
    }
    fn strip_duplicates(self) -> StripDuplicates<T> {
        StripDuplicates {
            inner: self.into_query_ref(),
        }
    }
}

impl<T: 'static, Q: Query<T> + Sized + 'static> QueryExt<T> for Q {}
