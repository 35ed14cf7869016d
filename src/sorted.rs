use std::cmp::Ordering;
use std::ops::Index;
use std::slice::Iter;

use crate::token::{RecordToken, RecordTokenComparer};

/// Ordering strategy for a [`SortedListAllowsDuplicates`].
pub trait Comparer<V> {
    fn compare(&self, x: &V, y: &V) -> Ordering;
}

impl<V, F> Comparer<V> for F
where
    F: Fn(&V, &V) -> Ordering,
{
    fn compare(&self, x: &V, y: &V) -> Ordering {
        self(x, y)
    }
}

impl<T> Comparer<RecordToken<T>> for RecordTokenComparer {
    fn compare(&self, x: &RecordToken<T>, y: &RecordToken<T>) -> Ordering {
        RecordTokenComparer::compare(self, x, y)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NaturalOrder;

impl<V: Ord> Comparer<V> for NaturalOrder {
    fn compare(&self, x: &V, y: &V) -> Ordering {
        x.cmp(y)
    }
}

/// A list kept sorted by its comparer in which any number of equal elements
/// may coexist.
///
/// Equal elements stay adjacent in the order they were added: a new element
/// is placed after the last element it compares equal to.
#[derive(Clone, Debug)]
pub struct SortedListAllowsDuplicates<V, C> {
    items: Vec<V>,
    comparer: C,
}

impl<V, C: Comparer<V>> SortedListAllowsDuplicates<V, C> {
    pub fn new(comparer: C) -> Self {
        Self {
            items: Vec::new(),
            comparer,
        }
    }
    pub fn with_capacity(comparer: C, capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            comparer,
        }
    }
    /// Inserts `item` and returns the index it landed at.
    pub fn add(&mut self, item: V) -> usize {
        let append = match self.items.last() {
            None => true,
            Some(last) => self.comparer.compare(&item, last) == Ordering::Greater,
        };
        if append {
            self.items.push(item);
            return self.items.len() - 1;
        }
        // first element strictly greater, i.e. right after the run of equals
        let index = self
            .items
            .partition_point(|kept| self.comparer.compare(kept, &item) != Ordering::Greater);
        self.items.insert(index, item);
        index
    }
    /// True if an element equal to `item` under the comparer is present.
    pub fn contains(&self, item: &V) -> bool {
        self.binary_search(item).is_ok()
    }
    pub fn binary_search(&self, item: &V) -> Result<usize, usize> {
        self.items
            .binary_search_by(|kept| self.comparer.compare(kept, item))
    }
    pub fn remove_at(&mut self, index: usize) -> Option<V> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }
    // removal never breaks the ordering
    pub fn retain<F: FnMut(&V) -> bool>(&mut self, keep: F) -> usize {
        let before = self.items.len();
        self.items.retain(keep);
        before - self.items.len()
    }
    pub fn clear(&mut self) {
        self.items.clear();
    }
    pub fn get(&self, index: usize) -> Option<&V> {
        self.items.get(index)
    }
    pub fn first(&self) -> Option<&V> {
        self.items.first()
    }
    pub fn last(&self) -> Option<&V> {
        self.items.last()
    }
    pub fn iter(&self) -> Iter<'_, V> {
        self.items.iter()
    }
    pub fn as_slice(&self) -> &[V] {
        &self.items
    }
    pub fn comparer(&self) -> &C {
        &self.comparer
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<V, C> Index<usize> for SortedListAllowsDuplicates<V, C> {
    type Output = V;
    fn index(&self, index: usize) -> &V {
        &self.items[index]
    }
}

impl<'a, V, C> IntoIterator for &'a SortedListAllowsDuplicates<V, C> {
    type Item = &'a V;
    type IntoIter = Iter<'a, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
