//! Recordcache – an in-memory record-query and caching engine.
//!
//! Items of any default-constructible type are kept by a *data mapper* and
//! identified by a [`construct::RepositoryId`]. *Queries* turn one item into
//! zero or more rows of labeled fields; evaluating a query over every item
//! of a mapper yields a [`result::ResultSet`] of [`token::RecordToken`]s,
//! each pointing back at the item it came from.
//!
//! ## Modules
//! * [`construct`] – Repository ids, their generator and the item keeper.
//! * [`datatype`] – [`datatype::FieldValue`], the loosely typed value of a field,
//!   and [`datatype::Fields`], one row.
//! * [`token`] – Record tokens, sort definitions and the token comparer.
//! * [`sorted`] – A sorted list that keeps duplicates in insertion order.
//! * [`query`] – The [`query::Query`] trait and its combinators
//!   (join, merge, alternative, key remapping, row filters).
//! * [`mapper`] – The [`mapper::DataMapper`] trait and the in-memory
//!   [`mapper::MemoryDataMapper`].
//! * [`result`] – Result sets: search, sort and coalesce.
//! * [`cache`] – Result set caches kept up to date item by item, and a
//!   manager fanning changes out to a named set of caches.
//! * [`settings`] – Layered settings for the demo driver.
//!
//! ## Keeping caches current
//! Nothing observes the mapper. The code that creates, changes or deletes an
//! item is expected to call the matching cache hook afterwards (before the
//! mapper forgets the item, in the case of deletion). A cache then
//! re-evaluates its queries for that one item only.
//!
//! ## Quick Start
//! ```
//! use std::sync::Arc;
//! use recordcache::{fields, datatype::{FieldValue, Fields}, error::Result};
//! use recordcache::mapper::{DataMapper, MemoryDataMapper};
//! use recordcache::query::{DelegateQuery, Query, QueryRef};
//! use recordcache::cache::ResultSetCache;
//! use recordcache::token::SortDefinition;
//!
//! #[derive(Default)]
//! struct Word { spelling: String }
//!
//! let mapper = MemoryDataMapper::<Word>::new();
//! let word = mapper.create_item().unwrap();
//! word.lock().unwrap().spelling = "apple".to_string();
//!
//! let query: QueryRef<Word> = Arc::new(DelegateQuery::new(
//!     "Spelling",
//!     vec![SortDefinition::ascending("Spelling")],
//!     |word: &Word| -> Result<Vec<Fields>> { Ok(vec![fields! { "Spelling" => word.spelling.as_str() }]) },
//! ));
//! let mut cache = ResultSetCache::<Word>::with_sort(mapper.clone(), &query.sort_definitions()).unwrap();
//! cache.add(mapper.get_items_matching(&query).unwrap(), Arc::clone(&query)).unwrap();
//!
//! word.lock().unwrap().spelling = "banana".to_string();
//! cache.update_item_in_cache(&word).unwrap();
//! assert_eq!(cache.get_result_set()[0]["Spelling"], FieldValue::from("banana"));
//! ```

pub mod construct;
pub mod datatype;
pub mod error;
pub mod token;
pub mod sorted;
pub mod query;
pub mod mapper;
pub mod result;
pub mod cache;
pub mod settings;
