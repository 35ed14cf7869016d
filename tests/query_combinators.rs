mod common;

use common::*;
use recordcache::datatype::{FieldValue, Fields};
use recordcache::error::RecordCacheError;
use recordcache::fields;
use recordcache::mapper::DataMapper;
use recordcache::query::{DelegateQuery, KeyMap, Query, QueryExt};
use recordcache::token::SortDefinition;

#[test]
fn field1_query_sorts_ascending() {
    let s = setup();
    set_field1(&s.item1, &[1, 2]);
    set_field2(&s.item1, &[0, 0, 0]);
    set_field1(&s.item2, &[3, 4]);
    set_field2(&s.item2, &[0, 0, 0]);
    let results = sorted_results(&s.mapper, &Field1Query);
    assert_eq!(column(&results, "Field1"), ints(&[1, 2, 3, 4]));
}

#[test]
fn field1_query_keeps_duplicate_values() {
    let s = setup();
    set_field1(&s.item1, &[1, 2]);
    set_field1(&s.item2, &[3, 1]);
    let results = sorted_results(&s.mapper, &Field1Query);
    assert_eq!(column(&results, "Field1"), ints(&[1, 1, 2, 3]));
    // equal values fall back to id order
    let first = s.mapper.get_id(&s.item1).unwrap();
    let second = s.mapper.get_id(&s.item2).unwrap();
    assert_eq!(results[0].id(), first);
    assert_eq!(results[1].id(), second);
}

#[test]
fn field2_query_sorts_descending() {
    let s = setup();
    set_field2(&s.item1, &[1, 3, 5]);
    set_field2(&s.item2, &[4, 2, 5]);
    let results = sorted_results(&s.mapper, &Field2Query);
    assert_eq!(column(&results, "Field2"), ints(&[5, 5, 4, 3, 2, 1]));
}

#[test]
fn join_inner_returns_product_per_item() {
    let s = setup();
    set_field1(&s.item1, &[1, 2]);
    set_field2(&s.item1, &[1, 4, 5]);
    set_field1(&s.item2, &[1, 2]);
    let query = Field1Query.join_inner(Field2Query);
    let results = s.mapper.get_items_matching(&query).unwrap();
    // 2 x 3 for the first item, 2 x 1 (the null row) for the second
    assert_eq!(results.len(), 8);
    let first = s.mapper.get_id(&s.item1).unwrap();
    assert_eq!(results.ids().filter(|id| *id == first).count(), 6);
}

#[test]
fn join_inner_with_stripped_empty_side_has_no_rows() {
    let s = setup();
    set_field1(&s.item1, &[1, 2]);
    set_field1(&s.item2, &[1, 2]);
    let query = Field1Query.join_inner(Field2Query.strip_all_unpopulated_entries());
    let results = s.mapper.get_items_matching(&query).unwrap();
    assert!(results.is_empty());
}

#[test]
fn join_inner_only_joins_rows_of_the_same_item() {
    let s = setup();
    set_field1(&s.item1, &[1]);
    set_field2(&s.item1, &[2]);
    set_field1(&s.item2, &[3]);
    set_field2(&s.item2, &[4]);
    let query = Field1Query.join_inner(Field2Query);
    let results = sorted_results(&s.mapper, &query);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["Field1"], FieldValue::Integer(1));
    assert_eq!(results[0]["Field2"], FieldValue::Integer(2));
    assert_eq!(results[1]["Field1"], FieldValue::Integer(3));
    assert_eq!(results[1]["Field2"], FieldValue::Integer(4));
}

#[test]
fn join_inner_sorts_by_first_query_then_second() {
    let s = setup();
    set_field1(&s.item1, &[1, 4]);
    set_field2(&s.item1, &[1, 3, 6]);
    set_field1(&s.item2, &[3, 2]);
    set_field2(&s.item2, &[4, 2, 5]);
    let query = Field1Query.join_inner(Field2Query);
    let results = sorted_results(&s.mapper, &query);
    assert_eq!(results.len(), 12);
    let pairs: Vec<(FieldValue, FieldValue)> = results
        .iter()
        .take(6)
        .map(|token| (token["Field1"].clone(), token["Field2"].clone()))
        .collect();
    let expected: Vec<(FieldValue, FieldValue)> = [(1, 6), (1, 3), (1, 1), (2, 5), (2, 4), (2, 2)]
        .into_iter()
        .map(|(a, b)| (FieldValue::Integer(a), FieldValue::Integer(b)))
        .collect();
    assert_eq!(pairs, expected);
}

#[test]
fn join_inner_colliding_fields_take_second_value() {
    let s = setup();
    set_field2(&s.item1, &[1, 4, 5]);
    let query = Field2Query.join_inner(Field2Query);
    let results = s.mapper.get_items_matching(&query).unwrap();
    let first = s.mapper.get_id(&s.item1).unwrap();
    let values: Vec<FieldValue> = results
        .iter()
        .filter(|token| token.id() == first)
        .map(|token| token["Field2"].clone())
        .collect();
    assert_eq!(values, ints(&[1, 1, 1, 4, 4, 4, 5, 5, 5]));
    // the empty second item joins its null row with itself
    assert_eq!(results.len(), 10);
}

#[test]
fn merge_returns_rows_of_both_queries() {
    let s = setup();
    set_field1(&s.item1, &[1, 4]);
    set_field2(&s.item1, &[1, 3, 6]);
    set_field1(&s.item2, &[3, 2]);
    set_field2(&s.item2, &[4, 2, 5]);
    let query = Field1Query.merge(Field2Query, KeyMap::new().with("Field2", "Field1"));
    let results = s.mapper.get_items_matching(&query).unwrap();
    assert_eq!(results.len(), 10);
    let first = s.mapper.get_id(&s.item1).unwrap();
    assert_eq!(results.ids().filter(|id| *id == first).count(), 5);
    assert!(results.iter().all(|token| token.contains_field("Field1") && !token.contains_field("Field2")));
}

#[test]
fn merge_sorts_by_first_query() {
    let s = setup();
    set_field1(&s.item1, &[1, 4]);
    set_field2(&s.item1, &[1, 9, 6]);
    set_field1(&s.item2, &[3, 7]);
    set_field2(&s.item2, &[4, 2, 5]);
    let query = Field2Query.merge(Field1Query, KeyMap::new().with("Field1", "Field2"));
    let results = sorted_results(&s.mapper, &query);
    assert_eq!(column(&results, "Field2"), ints(&[9, 7, 6, 5, 4, 4, 3, 2, 1, 1]));
}

#[test]
fn merge_sort_definitions_are_renamed() {
    let query = Field1Query.merge(Field2Query, KeyMap::new().with("Field2", "Field1"));
    let fields: Vec<String> = query
        .sort_definitions()
        .iter()
        .map(|definition| definition.field().to_string())
        .collect();
    assert_eq!(fields, vec!["Field1".to_string(), "Field1".to_string()]);
}

#[test]
fn merge_with_unmapped_field_fails() {
    let s = setup();
    set_field1(&s.item1, &[1]);
    set_field2(&s.item1, &[2]);
    let query = Field1Query.merge(Field2Query, KeyMap::new());
    let error = s.mapper.get_items_matching(&query).unwrap_err();
    assert_eq!(error, RecordCacheError::UnmappedField("Field2".to_string()));
}

#[test]
fn merge_with_missing_target_field_fails() {
    let s = setup();
    set_field1(&s.item1, &[1]);
    set_field2(&s.item1, &[2]);
    let query = Field1Query.merge(Field2Query, KeyMap::new().with("Field2", "Elsewhere"));
    let error = s.mapper.get_items_matching(&query).unwrap_err();
    assert_eq!(error, RecordCacheError::MissingTargetField("Elsewhere".to_string()));
}

#[test]
fn get_alternative_falls_back_when_preferred_is_empty() {
    let s = setup();
    set_field2(&s.item1, &[3, 1]);
    set_field2(&s.item2, &[4]);
    let query = Field1Query.get_alternative(Field2Query.remap_keys(KeyMap::new().with("Field2", "Field1")));
    let results = sorted_results(&s.mapper, &query);
    assert_eq!(column(&results, "Field1"), ints(&[1, 3, 4]));
}

#[test]
fn get_alternative_mixes_sources_in_one_ordering() {
    let s = setup();
    set_field1(&s.item1, &[1, 3]);
    set_field2(&s.item2, &[2]);
    let query = Field1Query.get_alternative(Field2Query.remap_keys(KeyMap::new().with("Field2", "Field1")));
    let results = sorted_results(&s.mapper, &query);
    assert_eq!(column(&results, "Field1"), ints(&[1, 2, 3]));
}

#[test]
fn get_alternative_prefers_populated_first_query() {
    let s = setup();
    set_field1(&s.item1, &[1]);
    set_field2(&s.item1, &[9]);
    set_field1(&s.item2, &[3]);
    set_field2(&s.item2, &[4]);
    let query = Field1Query.get_alternative(Field2Query);
    let results = sorted_results(&s.mapper, &query);
    assert_eq!(column(&results, "Field1"), ints(&[1, 3]));
    assert!(results.iter().all(|token| !token.contains_field("Field2")));
}

#[test]
fn get_alternative_with_both_empty_returns_unpopulated_rows() {
    let s = setup();
    let query = Field1Query.get_alternative(Field2Query);
    let results = s.mapper.get_items_matching(&query).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(column(&results, "Field1"), vec![FieldValue::Null, FieldValue::Null]);
}

#[test]
fn strip_unpopulated_removes_null_rows() {
    let s = setup();
    let results = s
        .mapper
        .get_items_matching(&Field1Query.strip_all_unpopulated_entries())
        .unwrap();
    assert!(results.is_empty());
}

#[test]
fn strip_duplicates_keeps_one_of_each_row() {
    let s = setup();
    set_field1(&s.item1, &[1, 1, 2]);
    set_field2(&s.item1, &[1, 3]);
    let query = Field1Query
        .merge(Field2Query, KeyMap::new().with("Field2", "Field1"))
        .strip_all_unpopulated_entries()
        .strip_duplicates();
    let results = sorted_results(&s.mapper, &query);
    assert_eq!(column(&results, "Field1"), ints(&[1, 2, 3]));
}

#[test]
fn remap_keys_leaves_unknown_fields_alone() {
    let query = DelegateQuery::new("Pair", vec![SortDefinition::ascending("a")], |_: &SimpleObject| {
        Ok(vec![fields! { "a" => 1, "b" => 2 }])
    })
    .remap_keys(KeyMap::new().with("a", "c"));
    let rows = query.results(&SimpleObject::default()).unwrap();
    assert_eq!(rows, vec![fields! { "c" => 1, "b" => 2 }]);
    assert_eq!(query.sort_definitions()[0].field(), "c");
}

#[test]
fn strip_duplicates_keeps_first_occurrence_order() {
    let query = DelegateQuery::new("Repeats", Vec::new(), |_: &SimpleObject| {
        Ok([3, 1, 3, 2, 1].iter().map(|value| fields! { "v" => *value }).collect())
    })
    .strip_duplicates();
    let rows = query.results(&SimpleObject::default()).unwrap();
    let expected: Vec<Fields> = [3, 1, 2].iter().map(|value| fields! { "v" => *value }).collect();
    assert_eq!(rows, expected);
}

#[test]
fn remap_keys_renamed_field_replaces_existing_one() {
    // "z" sorts after "a", so row order cannot decide the winner
    let query = DelegateQuery::new("Clash", Vec::new(), |_: &SimpleObject| {
        Ok(vec![fields! { "a" => 1, "z" => 9 }])
    })
    .remap_keys(KeyMap::new().with("a", "z"));
    let rows = query.results(&SimpleObject::default()).unwrap();
    assert_eq!(rows, vec![fields! { "z" => 1 }]);

    let query = DelegateQuery::new("Clash", Vec::new(), |_: &SimpleObject| {
        Ok(vec![fields! { "a" => 1, "m" => 5 }])
    })
    .remap_keys(KeyMap::new().with("m", "a"));
    let rows = query.results(&SimpleObject::default()).unwrap();
    assert_eq!(rows, vec![fields! { "a" => 5 }]);
}

#[test]
fn remap_keys_many_to_one_keeps_last_source() {
    let key_map = KeyMap::new().with("a", "t").with("b", "t");
    assert_eq!(key_map.inverse().get("t"), Some("b"));
    assert_eq!(key_map.inverse().len(), 1);
    let query = DelegateQuery::new("Both", Vec::new(), |_: &SimpleObject| {
        Ok(vec![fields! { "a" => 1, "b" => 2 }])
    })
    .remap_keys(key_map);
    let rows = query.results(&SimpleObject::default()).unwrap();
    assert_eq!(rows, vec![fields! { "t" => 2 }]);
}

#[test]
fn remap_keys_checks_unpopulated_under_source_names() {
    let query = Field2Query.remap_keys(KeyMap::new().with("Field2", "Field1"));
    assert!(query.is_unpopulated(&fields! { "Field1" => FieldValue::Null }));
    assert!(!query.is_unpopulated(&fields! { "Field1" => 3 }));
}

#[test]
fn combinators_leave_their_operands_untouched() {
    let s = setup();
    set_field1(&s.item1, &[1, 2]);
    set_field2(&s.item1, &[5]);
    let join = Field1Query.join_inner(Field2Query);
    let _ = s.mapper.get_items_matching(&join).unwrap();
    let plain = s.mapper.get_items_matching(&Field1Query).unwrap();
    // two rows for the first item, the null row for the second
    assert_eq!(plain.len(), 3);
    assert!(plain.iter().all(|token| token.field_count() == 1));
}

#[test]
fn unique_labels_describe_the_composition() {
    assert_eq!(Field1Query.join_inner(Field2Query).unique_label(), "Field1Query.JoinInner.Field2Query");
    assert_eq!(
        Field1Query.merge(Field2Query, KeyMap::new().with("Field2", "Field1")).unique_label(),
        "Field1Query.Merge.Field2Query"
    );
    assert_eq!(Field1Query.get_alternative(Field2Query).unique_label(), "Field1Query.GetAlternative.Field2Query");
    assert_eq!(
        Field2Query.remap_keys(KeyMap::new().with("Field2", "Field1")).unique_label(),
        "Field2Query.RemapKeys(Field2->Field1)"
    );
    assert_eq!(
        Field1Query.strip_all_unpopulated_entries().strip_duplicates().unique_label(),
        "Field1Query.StripAllUnpopulatedEntries.StripDuplicates"
    );
}

#[test]
fn delegate_query_uses_its_closures() {
    let query = DelegateQuery::new("Sizes", vec![SortDefinition::descending("Size")], |item: &SimpleObject| {
        Ok(vec![fields! { "Size" => item.field1.len() as i64 }])
    })
    .with_unpopulated(|row: &Fields| row.get("Size") == Some(&FieldValue::Integer(0)));
    let item = SimpleObject {
        field1: vec![7, 8],
        field2: Vec::new(),
    };
    assert_eq!(query.results(&item).unwrap(), vec![fields! { "Size" => 2 }]);
    assert_eq!(query.unique_label(), "Sizes");
    assert!(query.is_unpopulated(&fields! { "Size" => 0 }));
    assert!(!query.is_unpopulated(&fields! { "Size" => 2 }));
}

#[test]
fn key_map_from_pairs() {
    let key_map: KeyMap = [("x", "y"), ("a", "b")].into_iter().collect();
    assert_eq!(key_map.len(), 2);
    assert_eq!(key_map.get("x"), Some("y"));
    assert_eq!(key_map.inverse().get("b"), Some("a"));
    assert_eq!(key_map.to_string(), "a->b,x->y");
}
