use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

pub const DEFAULT_FILE: &str = "recordcache";
pub const ENV_PREFIX: &str = "RECORDCACHE";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DemoSettings {
    pub items: usize,
    pub senses_per_item: usize,
}

/// Settings of the demo driver. Defaults, then an optional file, then
/// `RECORDCACHE__*` environment variables (`RECORDCACHE__DEMO__ITEMS=10`).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub log_filter: String,
    pub demo: DemoSettings,
}

impl Settings {
    pub fn load(file: Option<&str>) -> Result<Self> {
        let settings = Config::builder()
            .set_default("log_filter", "info")?
            .set_default("demo.items", 3)?
            .set_default("demo.senses_per_item", 2)?
            .add_source(File::with_name(file.unwrap_or(DEFAULT_FILE)).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
