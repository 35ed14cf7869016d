#![allow(dead_code)]

use std::sync::Arc;

use recordcache::construct::ItemRef;
use recordcache::datatype::{FieldValue, Fields};
use recordcache::error::Result;
use recordcache::fields;
use recordcache::mapper::{DataMapper, MemoryDataMapper};
use recordcache::query::Query;
use recordcache::result::ResultSet;
use recordcache::token::SortDefinition;

#[derive(Default, Debug)]
pub struct SimpleObject {
    pub field1: Vec<i64>,
    pub field2: Vec<i64>,
}

// one row per value, or a single null row when the field is empty
fn rows(name: &str, values: &[i64]) -> Vec<Fields> {
    if values.is_empty() {
        return vec![fields! { name => FieldValue::Null }];
    }
    values.iter().map(|value| fields! { name => *value }).collect()
}

pub struct Field1Query;
impl Query<SimpleObject> for Field1Query {
    fn results(&self, item: &SimpleObject) -> Result<Vec<Fields>> {
        Ok(rows("Field1", &item.field1))
    }
    fn sort_definitions(&self) -> Vec<SortDefinition> {
        vec![SortDefinition::ascending("Field1")]
    }
    fn unique_label(&self) -> String {
        "Field1Query".to_string()
    }
    fn is_unpopulated(&self, row: &Fields) -> bool {
        row.get("Field1").is_none_or(FieldValue::is_null)
    }
}

pub struct Field2Query;
impl Query<SimpleObject> for Field2Query {
    fn results(&self, item: &SimpleObject) -> Result<Vec<Fields>> {
        Ok(rows("Field2", &item.field2))
    }
    fn sort_definitions(&self) -> Vec<SortDefinition> {
        vec![SortDefinition::descending("Field2")]
    }
    fn unique_label(&self) -> String {
        "Field2Query".to_string()
    }
    fn is_unpopulated(&self, row: &Fields) -> bool {
        row.get("Field2").is_none_or(FieldValue::is_null)
    }
}

pub struct Setup {
    pub mapper: Arc<MemoryDataMapper<SimpleObject>>,
    pub item1: ItemRef<SimpleObject>,
    pub item2: ItemRef<SimpleObject>,
}

pub fn setup() -> Setup {
    let mapper = MemoryDataMapper::<SimpleObject>::new();
    let item1 = mapper.create_item().unwrap();
    let item2 = mapper.create_item().unwrap();
    Setup { mapper, item1, item2 }
}

pub fn handle(mapper: &Arc<MemoryDataMapper<SimpleObject>>) -> Arc<dyn DataMapper<SimpleObject>> {
    mapper.clone()
}

pub fn set_field1(item: &ItemRef<SimpleObject>, values: &[i64]) {
    item.lock().unwrap().field1 = values.to_vec();
}

pub fn set_field2(item: &ItemRef<SimpleObject>, values: &[i64]) {
    item.lock().unwrap().field2 = values.to_vec();
}

/// Evaluates `query` and sorts the result by the query's own sort definitions.
pub fn sorted_results(mapper: &Arc<MemoryDataMapper<SimpleObject>>, query: &dyn Query<SimpleObject>) -> ResultSet<SimpleObject> {
    let mut results = mapper.get_items_matching(query).unwrap();
    results.sort(&query.sort_definitions()).unwrap();
    results
}

pub fn column(results: &ResultSet<SimpleObject>, field: &str) -> Vec<FieldValue> {
    results.iter().map(|token| token[field].clone()).collect()
}

pub fn ints(values: &[i64]) -> Vec<FieldValue> {
    values.iter().map(|value| FieldValue::Integer(*value)).collect()
}
