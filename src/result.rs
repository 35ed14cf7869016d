use std::ops::{Index, Range};
use std::slice::Iter;
use std::sync::Arc;

use crate::construct::{ItemRef, RepositoryId};
use crate::datatype::FieldValue;
use crate::error::Result;
use crate::mapper::DataMapper;
use crate::token::{RecordToken, RecordTokenComparer, SortDefinition};

/// A snapshot of the tokens produced by evaluating one query over one
/// mapper's items. It does not follow later changes to the items.
pub struct ResultSet<T> {
    results: Vec<RecordToken<T>>,
    mapper: Arc<dyn DataMapper<T>>,
}

impl<T> ResultSet<T> {
    pub fn new(mapper: Arc<dyn DataMapper<T>>, results: impl IntoIterator<Item = RecordToken<T>>) -> Self {
        Self {
            results: results.into_iter().collect(),
            mapper,
        }
    }
    pub fn mapper(&self) -> &Arc<dyn DataMapper<T>> {
        &self.mapper
    }
    pub fn len(&self) -> usize {
        self.results.len()
    }
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
    pub fn get(&self, index: usize) -> Option<&RecordToken<T>> {
        self.results.get(index)
    }
    pub fn iter(&self) -> Iter<'_, RecordToken<T>> {
        self.results.iter()
    }
    pub fn ids(&self) -> impl Iterator<Item = RepositoryId> + '_ {
        self.results.iter().map(RecordToken::id)
    }
    pub fn tokens(&self) -> &[RecordToken<T>] {
        &self.results
    }
    pub fn into_tokens(self) -> Vec<RecordToken<T>> {
        self.results
    }
    pub fn remove_all<P: FnMut(&RecordToken<T>) -> bool>(&mut self, mut matches: P) -> usize {
        let before = self.results.len();
        self.results.retain(|token| !matches(token));
        before - self.results.len()
    }

    // ------------- by predicate -------------
    pub fn find_first<P: FnMut(&RecordToken<T>) -> bool>(&self, matches: P) -> Option<&RecordToken<T>> {
        self.find_first_index(matches).map(|index| &self.results[index])
    }
    pub fn find_first_within<P: FnMut(&RecordToken<T>) -> bool>(
        &self,
        range: Range<usize>,
        matches: P,
    ) -> Option<&RecordToken<T>> {
        self.find_first_index_within(range, matches).map(|index| &self.results[index])
    }
    pub fn find_first_index<P: FnMut(&RecordToken<T>) -> bool>(&self, matches: P) -> Option<usize> {
        self.results.iter().position(matches)
    }
    /// Searches `range` only; a range reaching past the end finds nothing.
    pub fn find_first_index_within<P: FnMut(&RecordToken<T>) -> bool>(
        &self,
        range: Range<usize>,
        matches: P,
    ) -> Option<usize> {
        let start = range.start;
        self.results
            .get(range)?
            .iter()
            .position(matches)
            .map(|offset| start + offset)
    }

    // ------------- by id -------------
    pub fn find_first_by_id(&self, id: RepositoryId) -> Option<&RecordToken<T>> {
        self.find_first(|token| token.id() == id)
    }
    pub fn find_first_index_by_id(&self, id: RepositoryId) -> Option<usize> {
        self.find_first_index(|token| token.id() == id)
    }
    pub fn find_first_index_by_id_within(&self, id: RepositoryId, range: Range<usize>) -> Option<usize> {
        self.find_first_index_within(range, |token| token.id() == id)
    }

    // ------------- by item -------------
    pub fn find_first_by_item(&self, item: &ItemRef<T>) -> Result<Option<&RecordToken<T>>> {
        let id = self.mapper.get_id(item)?;
        Ok(self.find_first_by_id(id))
    }
    pub fn find_first_index_by_item(&self, item: &ItemRef<T>) -> Result<Option<usize>> {
        let id = self.mapper.get_id(item)?;
        Ok(self.find_first_index_by_id(id))
    }
    pub fn find_first_index_by_item_within(&self, item: &ItemRef<T>, range: Range<usize>) -> Result<Option<usize>> {
        let id = self.mapper.get_id(item)?;
        Ok(self.find_first_index_by_id_within(id, range))
    }

    // ------------- by token -------------
    pub fn find_first_index_of_token(&self, token: &RecordToken<T>) -> Option<usize> {
        self.find_first_index(|candidate| candidate == token)
    }
    pub fn find_first_index_of_token_within(&self, token: &RecordToken<T>, range: Range<usize>) -> Option<usize> {
        self.find_first_index_within(range, |candidate| candidate == token)
    }

    // ------------- ordering -------------
    /// Stable sort by the given definitions, ties broken by id.
    pub fn sort(&mut self, sort_definitions: &[SortDefinition]) -> Result<()> {
        let comparer = RecordTokenComparer::new(sort_definitions.iter().cloned())?;
        self.sort_by_comparer(&comparer);
        Ok(())
    }
    pub fn sort_by_comparer(&mut self, comparer: &RecordTokenComparer) {
        self.results.sort_by(|x, y| comparer.compare(x, y));
    }
    pub fn sort_by_repository_id(&mut self) {
        self.sort_by_comparer(&RecordTokenComparer::by_repository_id());
    }

    /// Within every group of tokens sharing an id, removes the tokens whose
    /// `field` satisfies `can_be_removed`, but only if the group keeps at least
    /// one token that does not. Groups made only of removable tokens stay.
    pub fn coalesce<P: Fn(&FieldValue) -> bool>(&mut self, field: &str, can_be_removed: P) {
        let mut order: Vec<usize> = (0..self.results.len()).collect();
        order.sort_by_key(|index| self.results[*index].id());

        let mut doomed = vec![false; self.results.len()];
        let mut removable: Vec<usize> = Vec::new();
        let mut has_valid_entry = false;
        let mut previous: Option<RepositoryId> = None;
        for index in order {
            let token = &self.results[index];
            if previous.is_some_and(|id| id != token.id()) {
                if has_valid_entry {
                    for doomed_index in &removable {
                        doomed[*doomed_index] = true;
                    }
                }
                removable.clear();
                has_valid_entry = false;
            }
            if can_be_removed(token.get(field)) {
                removable.push(index);
            } else {
                has_valid_entry = true;
            }
            previous = Some(token.id());
        }
        if has_valid_entry {
            for doomed_index in &removable {
                doomed[*doomed_index] = true;
            }
        }

        let mut position = 0;
        self.results.retain(|_| {
            let keep = !doomed[position];
            position += 1;
            keep
        });
    }
}

impl<T> Clone for ResultSet<T> {
    fn clone(&self) -> Self {
        Self {
            results: self.results.clone(),
            mapper: Arc::clone(&self.mapper),
        }
    }
}

impl<T> Index<usize> for ResultSet<T> {
    type Output = RecordToken<T>;
    fn index(&self, index: usize) -> &RecordToken<T> {
        &self.results[index]
    }
}

impl<'a, T> IntoIterator for &'a ResultSet<T> {
    type Item = &'a RecordToken<T>;
    type IntoIter = Iter<'a, RecordToken<T>>;
    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

impl<T> IntoIterator for ResultSet<T> {
    type Item = RecordToken<T>;
    type IntoIter = std::vec::IntoIter<RecordToken<T>>;
    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<T> std::fmt::Debug for ResultSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_list().entries(self.results.iter()).finish()
    }
}
