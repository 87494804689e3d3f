//! Substance resolver
//!
//! Resolution of one search term:
//! 1. Canonical store lookup by CAS number, formula, pubchem id or name
//!    substring. A hit is returned without any network access.
//! 2. Otherwise each configured source is tried in order. Every candidate
//!    link is normalized, fetched and extracted; failures confined to one
//!    candidate are logged and the candidate is skipped.
//! 3. Extracted substances are checked against the store by composite key
//!    and only new ones are queued. Each pass commits its own batch once
//!    per source.
//! 4. The first successful candidate (in result order) is returned; the
//!    others are still stored.
//!
//! Concurrent passes never share a batch. A substance stored meanwhile by
//! another pass is found again by the composite re-check inside the commit
//! and reused.

use crate::db::{Entity, SubstanceStore};
use crate::error::{LoaderError, LoaderResult};
use crate::fetch::{normalize_uri, Fetcher};
use crate::registry::ReferenceRegistry;
use crate::sources::{ScrapedSubstance, SubstanceSource};
use chemsafe_common::{text, Substance};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a successful candidate ended up in the store
enum Outcome {
    /// Already stored before this pass
    Existing(Substance),
    /// Queued; index into the substances returned by `commit`
    Queued(usize),
}

pub struct SubstanceResolver {
    store: Arc<dyn SubstanceStore>,
    fetcher: Arc<dyn Fetcher>,
    sources: Vec<Arc<dyn SubstanceSource>>,
}

impl SubstanceResolver {
    pub fn new(
        store: Arc<dyn SubstanceStore>,
        fetcher: Arc<dyn Fetcher>,
        sources: Vec<Arc<dyn SubstanceSource>>,
    ) -> Self {
        Self {
            store,
            fetcher,
            sources,
        }
    }

    /// Names of the configured sources, in the order they are tried
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Resolve a search term to one substance
    ///
    /// `Ok(None)` is the normal "not found" outcome. Errors are reserved for
    /// failures of the store itself; per-candidate and per-source problems
    /// only show up in the log.
    pub async fn resolve(&self, term: &str) -> LoaderResult<Option<Substance>> {
        let term = text::trim(term);
        if term.is_empty() {
            debug!("Empty search term");
            return Ok(None);
        }

        if let Some(existing) = self.store.find_by_any(term).await? {
            info!(term = %term, id = ?existing.id, name = %existing.name, "Found in store");
            return Ok(Some(existing));
        }

        for source in &self.sources {
            match self.resolve_from(source.as_ref(), term).await {
                Ok(Some(substance)) => {
                    info!(term = %term, source = source.name(), id = ?substance.id, name = %substance.name, "Resolved");
                    return Ok(Some(substance));
                }
                Ok(None) => {
                    info!(term = %term, source = source.name(), "No usable result");
                }
                Err(e) if e.is_candidate_scoped() => {
                    warn!(term = %term, source = source.name(), error = %e, "Source failed, trying next");
                }
                Err(e) => return Err(e),
            }
        }

        info!(term = %term, "Substance not found");
        Ok(None)
    }

    async fn resolve_from(&self, source: &dyn SubstanceSource, term: &str) -> LoaderResult<Option<Substance>> {
        let candidates = source.search(term).await?;
        if candidates.is_empty() {
            return Ok(None);
        }
        debug!(source = source.name(), candidates = candidates.len(), "Processing candidates");

        let mut registry = ReferenceRegistry::new(self.store.as_ref());
        let mut outcomes = Vec::new();

        for candidate in &candidates {
            let scraped = match self.load_candidate(source, candidate).await {
                Ok(scraped) => scraped,
                Err(e) if e.is_candidate_scoped() => {
                    warn!(source = source.name(), candidate = %candidate, error = %e, "Skipping candidate");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let substance = compose(&mut registry, scraped).await?;
            match self.find_stored(&substance).await? {
                Some(existing) => {
                    debug!(id = ?existing.id, name = %existing.name, "Candidate already stored");
                    outcomes.push(Outcome::Existing(existing));
                }
                None => {
                    debug!(name = %substance.name, source = %substance.source, "Queueing new substance");
                    outcomes.push(Outcome::Queued(registry.pending().substance_count()));
                    registry.queue(Entity::Substance(substance));
                }
            }
        }

        let stored = self.store.commit(registry.into_pending()).await?;

        let Some(first) = outcomes.into_iter().next() else {
            return Ok(None);
        };
        match first {
            Outcome::Existing(substance) => Ok(Some(substance)),
            Outcome::Queued(index) => stored.into_iter().nth(index).map(Some).ok_or_else(|| {
                LoaderError::Store(chemsafe_common::Error::Internal(format!(
                    "Committed substance {} missing from commit result",
                    index
                )))
            }),
        }
    }

    async fn load_candidate(&self, source: &dyn SubstanceSource, candidate: &str) -> LoaderResult<ScrapedSubstance> {
        let uri = normalize_uri(candidate, source.base_url())?;
        let content = self.fetcher.fetch(&uri).await?;
        source.extract(&uri, &content)
    }

    /// Stored copy of a freshly scraped substance, if any
    ///
    /// A substance without any composite key field is matched by exact name
    /// instead, since an all-empty key would match every bare record.
    async fn find_stored(&self, substance: &Substance) -> LoaderResult<Option<Substance>> {
        let key = substance.composite_key();
        let existing = if key.is_empty() {
            self.store.find_by_name(&substance.name).await?
        } else {
            self.store.find_by_composite(&key).await?
        };
        Ok(existing)
    }
}

/// Turn scraped fields into a transient substance with shared references
async fn compose(registry: &mut ReferenceRegistry<'_>, scraped: ScrapedSubstance) -> LoaderResult<Substance> {
    let statements = registry.resolve_statements(&scraped.statement_codes).await?;
    let symbols = registry.resolve_symbols(&scraped.symbol_codes).await?;

    let mut substance = Substance::new(&scraped.name, &scraped.source)
        .with_statements(statements)
        .with_symbols(symbols);
    substance.formula = trimmed(scraped.formula);
    substance.pubchem_id = scraped.pubchem_id;
    substance.cas_number = trimmed(scraped.cas_number);
    substance.signal_word = trimmed(scraped.signal_word);
    substance.ridadr = trimmed(scraped.ridadr);
    substance.wgk_germany = scraped.wgk_germany;
    substance.rtecs = trimmed(scraped.rtecs);
    Ok(substance)
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.as_deref().and_then(text::non_empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use async_trait::async_trait;
    use chemsafe_common::db::init_in_memory;
    use chemsafe_common::StatementType;

    #[tokio::test]
    async fn test_compose_trims_and_resolves() {
        let store = SqliteStore::new(init_in_memory().await.unwrap());
        let mut registry = ReferenceRegistry::new(&store);

        let scraped = ScrapedSubstance {
            source: "https://example.com/p/1".to_string(),
            name: "\u{A0}Toluene ".to_string(),
            formula: Some(" C7H8\u{A0}".to_string()),
            rtecs: Some(" ".to_string()),
            statement_codes: vec!["H225".into(), "P210".into(), "H225".into()],
            symbol_codes: vec!["GHS02".into()],
            ..Default::default()
        };
        let substance = compose(&mut registry, scraped).await.unwrap();

        assert_eq!(substance.name, "Toluene");
        assert_eq!(substance.formula.as_deref(), Some("C7H8"));
        assert_eq!(substance.rtecs, None);
        assert_eq!(substance.statements.len(), 2);
        assert_eq!(substance.statements_of_type(StatementType::Hazard).count(), 1);
        assert_eq!(substance.symbols.len(), 1);
    }

    struct Offline;

    #[async_trait]
    impl Fetcher for Offline {
        async fn fetch(&self, uri: &str) -> LoaderResult<String> {
            Err(LoaderError::Fetch {
                uri: uri.to_string(),
                reason: "offline".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_blank_term_is_not_found() {
        let store = Arc::new(SqliteStore::new(init_in_memory().await.unwrap()));
        let resolver = SubstanceResolver::new(store, Arc::new(Offline), Vec::new());
        assert!(resolver.resolve(" \u{A0} ").await.unwrap().is_none());
    }
}
