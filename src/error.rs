
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

use crate::construct::RepositoryId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordCacheError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Missing argument: {0}")]
    NullArgument(&'static str),
    #[error("Unknown identity {0}: the item must exist in the repository before this operation")]
    UnknownId(RepositoryId),
    #[error("Unknown item: the item must exist in the repository before this operation")]
    UnknownItem,
    #[error("Schema mismatch: the second query produced the unmapped field '{0}'")]
    UnmappedField(String),
    #[error("Schema mismatch: the first query's results lack the target field '{0}'")]
    MissingTargetField(String),
    #[error("Config error: a record token comparer needs at least one sort definition")]
    NoSortDefinitions,
    #[error("The result set or cache was built from a different data mapper")]
    MapperMismatch,
    #[error("A cache labeled '{0}' is already registered")]
    DuplicateLabel(String),
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, RecordCacheError>;

// Helper conversions
impl From<config::ConfigError> for RecordCacheError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}

/// Locks `mutex`, reporting a poisoned lock as [`RecordCacheError::Lock`].
pub fn lock<'a, X>(mutex: &'a Mutex<X>, what: &str) -> Result<MutexGuard<'a, X>> {
    mutex
        .lock()
        .map_err(|e| RecordCacheError::Lock(format!("{what}: {e}")))
}
