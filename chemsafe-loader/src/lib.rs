//! chemsafe-loader library interface
//!
//! Resolves a chemical substance's safety data from external sources into
//! the canonical SQLite store, and imports canonical statement texts.

pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod importer;
pub mod registry;
pub mod render;
pub mod resolver;
pub mod sources;

pub use crate::error::{LoaderError, LoaderResult};
pub use crate::resolver::SubstanceResolver;

use crate::config::LoaderConfig;
use crate::db::{SqliteStore, SubstanceStore};
use crate::fetch::{Fetcher, HttpFetcher};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Wire a resolver over the database with the configured sources and HTTP transport
pub fn build_resolver(pool: SqlitePool, config: &LoaderConfig) -> LoaderResult<SubstanceResolver> {
    let store: Arc<dyn SubstanceStore> = Arc::new(SqliteStore::new(pool));
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.fetch)?);
    let sources = sources::build_sources(&config.sources, &config.urls, fetcher.clone());
    Ok(SubstanceResolver::new(store, fetcher, sources))
}
