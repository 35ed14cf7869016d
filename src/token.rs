//! Result rows and the comparison strategy used wherever rows are ordered.
//!
//! A [`RecordToken`] is one labeled-field row produced by a query for one
//! item. It refers back to its item only by [`RepositoryId`] and keeps a handle
//! to the data mapper that can resolve the item on demand.
//!
//! A [`RecordTokenComparer`] orders tokens by a list of [`SortDefinition`]s and
//! falls back to the token ids, which makes it a total order.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Index;
use std::sync::Arc;

use crate::construct::{ItemRef, RepositoryId};
use crate::datatype::{FieldValue, Fields};
use crate::error::{RecordCacheError, Result};
use crate::mapper::DataMapper;

static NULL: FieldValue = FieldValue::Null;

// ------------- SortDefinition -------------
pub type FieldComparer = Arc<dyn Fn(&FieldValue, &FieldValue) -> Ordering + Send + Sync>;

#[derive(Clone)]
pub struct SortDefinition {
    field: String,
    comparer: FieldComparer,
}

impl SortDefinition {
    /// Field name that compares token ids instead of looking up a field.
    pub const REPOSITORY_ID: &'static str = "RepositoryId";

    pub fn new<F>(field: impl Into<String>, comparer: F) -> Self
    where
        F: Fn(&FieldValue, &FieldValue) -> Ordering + Send + Sync + 'static,
    {
        Self {
            field: field.into(),
            comparer: Arc::new(comparer),
        }
    }
    pub fn ascending(field: impl Into<String>) -> Self {
        Self::new(field, |x, y| x.cmp(y))
    }
    pub fn descending(field: impl Into<String>) -> Self {
        Self::new(field, |x, y| y.cmp(x))
    }
    pub fn by_repository_id() -> Self {
        Self::ascending(Self::REPOSITORY_ID)
    }
    // same comparer, other field
    pub fn renamed(&self, field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            comparer: Arc::clone(&self.comparer),
        }
    }
    pub fn field(&self) -> &str {
        &self.field
    }
    pub fn compare(&self, x: &FieldValue, y: &FieldValue) -> Ordering {
        (self.comparer)(x, y)
    }
}
impl fmt::Debug for SortDefinition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SortDefinition").field("field", &self.field).finish_non_exhaustive()
    }
}

// ------------- RecordTokenComparer -------------
#[derive(Clone, Debug)]
pub struct RecordTokenComparer {
    sort_definitions: Arc<[SortDefinition]>,
}

impl RecordTokenComparer {
    pub fn new(sort_definitions: impl IntoIterator<Item = SortDefinition>) -> Result<Self> {
        let sort_definitions: Vec<SortDefinition> = sort_definitions.into_iter().collect();
        if sort_definitions.is_empty() {
            return Err(RecordCacheError::NoSortDefinitions);
        }
        Ok(Self {
            sort_definitions: sort_definitions.into(),
        })
    }
    pub fn by_repository_id() -> Self {
        Self {
            sort_definitions: Arc::from(vec![SortDefinition::by_repository_id()]),
        }
    }
    pub fn sort_definitions(&self) -> &[SortDefinition] {
        &self.sort_definitions
    }
    pub fn compare<T>(&self, x: &RecordToken<T>, y: &RecordToken<T>) -> Ordering {
        for definition in self.sort_definitions.iter() {
            let ordering = definition.compare(
                &x.sort_value(definition.field()),
                &y.sort_value(definition.field()),
            );
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        // total order, so sorted containers behave deterministically with duplicates
        x.id().cmp(&y.id())
    }
}

// ------------- RecordToken -------------
pub struct RecordToken<T> {
    id: RepositoryId,
    fields: Arc<Fields>,
    mapper: Arc<dyn DataMapper<T>>,
}

impl<T> RecordToken<T> {
    pub fn new(mapper: Arc<dyn DataMapper<T>>, id: RepositoryId, fields: Fields) -> Result<Self> {
        if id.is_empty() {
            return Err(RecordCacheError::NullArgument("id"));
        }
        Ok(Self {
            id,
            fields: Arc::new(fields),
            mapper,
        })
    }
    pub fn id(&self) -> RepositoryId {
        self.id
    }
    /// The value of `field`, or `FieldValue::Null` when the row has no such field.
    pub fn get(&self, field: &str) -> &FieldValue {
        self.fields.get(field).unwrap_or(&NULL)
    }
    pub fn contains_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }
    pub fn fields(&self) -> &Fields {
        &self.fields
    }
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
    pub fn mapper(&self) -> &Arc<dyn DataMapper<T>> {
        &self.mapper
    }
    /// Resolves the item this row was produced from.
    pub fn real_object(&self) -> Result<ItemRef<T>> {
        self.mapper.get_item(self.id)
    }
    fn sort_value(&self, field: &str) -> Cow<'_, FieldValue> {
        if field == SortDefinition::REPOSITORY_ID {
            Cow::Owned(FieldValue::Id(self.id))
        } else {
            Cow::Borrowed(self.get(field))
        }
    }
}

impl<T> Clone for RecordToken<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            fields: Arc::clone(&self.fields),
            mapper: Arc::clone(&self.mapper),
        }
    }
}
impl<T> Index<&str> for RecordToken<T> {
    type Output = FieldValue;
    fn index(&self, field: &str) -> &FieldValue {
        self.get(field)
    }
}
impl<T> PartialEq for RecordToken<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.fields == other.fields
    }
}
impl<T> Eq for RecordToken<T> {}
impl<T> Hash for RecordToken<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.fields.hash(state);
    }
}
// Only a tie-breaker; result ordering is the job of RecordTokenComparer.
impl<T> Ord for RecordToken<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id
            .cmp(&other.id)
            .then_with(|| self.fields.len().cmp(&other.fields.len()))
            .then_with(|| self.fields.keys().cmp(other.fields.keys()))
            .then_with(|| self.fields.values().cmp(other.fields.values()))
    }
}
impl<T> PartialOrd for RecordToken<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> fmt::Debug for RecordToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RecordToken")
            .field("id", &self.id)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}
impl<T> fmt::Display for RecordToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = String::new();
        for (name, value) in self.fields.iter() {
            s += &format!("{}: {}, ", name, value);
        }
        s.truncate(s.trim_end_matches(", ").len());
        write!(f, "{} {{{}}}", self.id, s)
    }
}
