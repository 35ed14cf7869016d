//! Demo driver: keeps a few cached views over a small in-memory dictionary in
//! step while entries are created, edited and deleted.

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use recordcache::cache::{ResultSetCache, ResultSetCacheManager};
use recordcache::datatype::Fields;
use recordcache::error::{lock, Result};
use recordcache::fields;
use recordcache::mapper::{DataMapper, MemoryDataMapper};
use recordcache::query::{KeyMap, Query, QueryExt, QueryRef};
use recordcache::settings::Settings;
use recordcache::token::SortDefinition;

#[derive(Default, Debug)]
struct Entry {
    headword: Option<String>,
    citation: Option<String>,
    senses: Vec<String>,
}

// one row per sense
struct SenseQuery;
impl Query<Entry> for SenseQuery {
    fn results(&self, entry: &Entry) -> Result<Vec<Fields>> {
        if entry.senses.is_empty() {
            return Ok(vec![fields! { "Gloss" => None::<String> }]);
        }
        Ok(entry
            .senses
            .iter()
            .enumerate()
            .map(|(index, gloss)| fields! { "Gloss" => gloss.as_str(), "Sense" => index as i64 + 1 })
            .collect())
    }
    fn sort_definitions(&self) -> Vec<SortDefinition> {
        vec![SortDefinition::ascending("Gloss"), SortDefinition::ascending("Sense")]
    }
    fn unique_label(&self) -> String {
        "SenseQuery".to_string()
    }
    fn is_unpopulated(&self, row: &Fields) -> bool {
        row.get("Gloss").is_none_or(|gloss| gloss.is_null())
    }
}

struct HeadwordQuery;
impl Query<Entry> for HeadwordQuery {
    fn results(&self, entry: &Entry) -> Result<Vec<Fields>> {
        Ok(vec![fields! { "Form" => entry.headword.clone() }])
    }
    fn sort_definitions(&self) -> Vec<SortDefinition> {
        vec![SortDefinition::ascending("Form")]
    }
    fn unique_label(&self) -> String {
        "HeadwordQuery".to_string()
    }
    fn is_unpopulated(&self, row: &Fields) -> bool {
        row.get("Form").is_none_or(|form| form.is_null())
    }
}

struct CitationQuery;
impl Query<Entry> for CitationQuery {
    fn results(&self, entry: &Entry) -> Result<Vec<Fields>> {
        Ok(vec![fields! { "Citation" => entry.citation.clone() }])
    }
    fn sort_definitions(&self) -> Vec<SortDefinition> {
        vec![SortDefinition::ascending("Citation")]
    }
    fn unique_label(&self) -> String {
        "CitationQuery".to_string()
    }
    fn is_unpopulated(&self, row: &Fields) -> bool {
        row.get("Citation").is_none_or(|citation| citation.is_null())
    }
}

fn print_cache(manager: &ResultSetCacheManager<Entry>, label: &str) {
    if let Some(cache) = manager.get(label) {
        info!(%label, tokens = cache.len(), "cache contents");
        for token in cache.get_result_set().iter() {
            info!("  {}", token);
        }
    }
}

fn run(settings: &Settings) -> Result<()> {
    let mapper = MemoryDataMapper::<Entry>::new();
    let handle: Arc<dyn DataMapper<Entry>> = mapper.clone();

    let mut entries = Vec::new();
    for n in 0..settings.demo.items {
        let entry = mapper.create_item()?;
        {
            let mut guard = lock(&*entry, "entry")?;
            guard.headword = Some(format!("word{}", n));
            guard.senses = (0..settings.demo.senses_per_item)
                .map(|s| format!("meaning {}.{}", n, s))
                .collect();
        }
        entries.push(entry);
    }

    // a headword, or the citation form when there is no headword
    let display: QueryRef<Entry> = Arc::new(
        HeadwordQuery.get_alternative(CitationQuery.remap_keys(KeyMap::new().with("Citation", "Form"))),
    );
    let senses: QueryRef<Entry> = Arc::new(HeadwordQuery.join_inner(SenseQuery).strip_all_unpopulated_entries());

    let mut manager = ResultSetCacheManager::new(Arc::clone(&handle));
    manager.add_query(Arc::clone(&display), mapper.get_items_matching(&display)?)?;
    manager.add_query(Arc::clone(&senses), mapper.get_items_matching(&senses)?)?;
    let mut by_id = ResultSetCache::new(Arc::clone(&handle));
    by_id.add(mapper.get_items_matching(&SenseQuery)?, Arc::new(SenseQuery))?;
    manager.add("SensesById", by_id)?;

    for label in manager.labels() {
        print_cache(&manager, label);
    }

    if let Some(first) = entries.first() {
        {
            let mut guard = lock(&**first, "entry")?;
            guard.headword = None;
            guard.citation = Some("citation form".to_string());
            guard.senses.push("an extra meaning".to_string());
        }
        mapper.save_item(first)?;
        manager.update_item_in_caches(first)?;
    }
    if let Some(last) = entries.last() {
        manager.delete_item_from_caches(last)?;
        mapper.delete_item(last)?;
    }
    let fresh = mapper.create_item()?;
    manager.add_item_to_caches(&fresh)?;

    for label in manager.labels() {
        print_cache(&manager, label);
    }
    let items = mapper.count_all_items()?;
    let last_modified = mapper.last_modified()?;
    info!(items, %last_modified, "done");
    Ok(())
}

fn main() -> ExitCode {
    let file = std::env::args().nth(1);
    let settings = match Settings::load(file.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .init();
    info!(?settings, "starting");
    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            warn!(error = %e, "demo failed");
            ExitCode::FAILURE
        }
    }
}
