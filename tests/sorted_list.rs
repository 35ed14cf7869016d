use std::cmp::Ordering;

use proptest::prelude::*;
use recordcache::sorted::{Comparer, NaturalOrder, SortedListAllowsDuplicates};

#[test]
fn keeps_elements_in_order() {
    let mut list = SortedListAllowsDuplicates::new(NaturalOrder);
    for value in [5, 1, 4, 2, 3] {
        list.add(value);
    }
    assert_eq!(list.as_slice(), &[1, 2, 3, 4, 5]);
    assert_eq!(list.first(), Some(&1));
    assert_eq!(list.last(), Some(&5));
}

#[test]
fn add_returns_the_insertion_index() {
    let mut list = SortedListAllowsDuplicates::new(NaturalOrder);
    assert_eq!(list.add(10), 0);
    assert_eq!(list.add(20), 1);
    assert_eq!(list.add(15), 1);
    assert_eq!(list.add(5), 0);
    assert_eq!(list.as_slice(), &[5, 10, 15, 20]);
}

#[test]
fn duplicates_stay_in_insertion_order() {
    // compare by the key only, the label tells the copies apart
    let by_key = |x: &(i32, &'static str), y: &(i32, &'static str)| x.0.cmp(&y.0);
    let mut list = SortedListAllowsDuplicates::new(by_key);
    list.add((2, "first"));
    list.add((1, "one"));
    list.add((2, "second"));
    list.add((3, "three"));
    list.add((2, "third"));
    let labels: Vec<&str> = list.iter().map(|(_, label)| *label).collect();
    assert_eq!(labels, vec!["one", "first", "second", "third", "three"]);
}

#[test]
fn custom_comparer_reverses_order() {
    let mut list = SortedListAllowsDuplicates::with_capacity(|x: &i32, y: &i32| y.cmp(x), 4);
    for value in [1, 3, 2, 3] {
        list.add(value);
    }
    assert_eq!(list.as_slice(), &[3, 3, 2, 1]);
    assert_eq!(list.comparer().compare(&1, &2), Ordering::Greater);
}

#[test]
fn contains_and_search() {
    let mut list = SortedListAllowsDuplicates::new(NaturalOrder);
    for value in [2, 4, 6] {
        list.add(value);
    }
    assert!(list.contains(&4));
    assert!(!list.contains(&5));
    assert_eq!(list.binary_search(&5), Err(2));
}

#[test]
fn removal_keeps_order() {
    let mut list = SortedListAllowsDuplicates::new(NaturalOrder);
    for value in [3, 1, 2, 2, 5] {
        list.add(value);
    }
    assert_eq!(list.retain(|value| *value != 2), 2);
    assert_eq!(list.remove_at(0), Some(1));
    assert_eq!(list.remove_at(10), None);
    assert_eq!(list.as_slice(), &[3, 5]);
    assert_eq!(list[1], 5);
    list.clear();
    assert!(list.is_empty());
}

proptest! {
    #[test]
    fn any_sequence_of_adds_stays_sorted(keys in prop::collection::vec(0u8..8, 0..64)) {
        // the position records insertion order among equal keys
        let by_key = |x: &(u8, usize), y: &(u8, usize)| x.0.cmp(&y.0);
        let mut list = SortedListAllowsDuplicates::new(by_key);
        for (position, key) in keys.iter().enumerate() {
            let index = list.add((*key, position));
            prop_assert_eq!(list.as_slice()[index], (*key, position));
        }
        prop_assert_eq!(list.len(), keys.len());
        for pair in list.as_slice().windows(2) {
            prop_assert!(pair[0].0 <= pair[1].0);
            if pair[0].0 == pair[1].0 {
                prop_assert!(pair[0].1 < pair[1].1);
            }
        }
    }
}
