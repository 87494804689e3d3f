//! External substance sources
//!
//! Each source implements the same two-step capability:
//! - `search`: term → ordered candidate links (relative or absolute)
//! - `extract`: fetched content → [`ScrapedSubstance`]
//!
//! Extraction is pure. Turning codes into shared Statement/Symbol entities
//! and deduplicating against the store happens in the resolver.
//!
//! # Sources
//! 1. **vendor_catalog** - chemical vendor product pages (HTML)
//! 2. **hazard_gateway** - hazardous substance database documents (HTML)
//! 3. **knowledge_base** - structured knowledge base entities (JSON)

pub mod hazard_gateway;
pub mod html;
pub mod knowledge_base;
pub mod vendor_catalog;

pub use hazard_gateway::HazardGateway;
pub use knowledge_base::KnowledgeBase;
pub use vendor_catalog::VendorCatalog;

use crate::error::{LoaderError, LoaderResult};
use crate::fetch::Fetcher;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

static INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid integer pattern"));

/// Upper bound on candidates kept from one result page
pub const MAX_CANDIDATES: usize = 5;

/// Substance fields as read from one source page, before reference resolution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedSubstance {
    /// Normalized URI the content was fetched from
    pub source: String,
    pub name: String,
    pub formula: Option<String>,
    pub pubchem_id: Option<i64>,
    pub cas_number: Option<String>,
    pub signal_word: Option<String>,
    pub ridadr: Option<String>,
    pub wgk_germany: Option<i64>,
    pub rtecs: Option<String>,
    /// GHS symbol names, in page order
    pub symbol_codes: Vec<String>,
    /// H/P statement codes, in page order
    pub statement_codes: Vec<String>,
}

/// One external source of substance data
#[async_trait]
pub trait SubstanceSource: Send + Sync {
    /// Source name for provenance and logging
    fn name(&self) -> &'static str;

    /// Base URL that scraped links are normalized against
    fn base_url(&self) -> &str;

    /// Ordered candidate links for a search term; empty when nothing matched
    async fn search(&self, term: &str) -> LoaderResult<Vec<String>>;

    /// Read a candidate's fields from its fetched content
    fn extract(&self, uri: &str, content: &str) -> LoaderResult<ScrapedSubstance>;
}

/// Narrow an oversized result list to at most [`MAX_CANDIDATES`]
///
/// Repeatedly keeps the elements at even positions. This is a coarse,
/// deterministic sample, not a relevance ranking.
pub fn reduce<T>(mut candidates: Vec<T>) -> Vec<T> {
    while candidates.len() > MAX_CANDIDATES {
        candidates = candidates
            .into_iter()
            .enumerate()
            .filter(|(i, _)| i % 2 == 0)
            .map(|(_, candidate)| candidate)
            .collect();
    }
    candidates
}

/// Configurable source selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    VendorCatalog,
    HazardGateway,
    KnowledgeBase,
}

impl SourceKind {
    pub const DEFAULT_ORDER: [SourceKind; 3] = [
        SourceKind::VendorCatalog,
        SourceKind::HazardGateway,
        SourceKind::KnowledgeBase,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::VendorCatalog => "vendor-catalog",
            SourceKind::HazardGateway => "hazard-gateway",
            SourceKind::KnowledgeBase => "knowledge-base",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vendor-catalog" | "vendor" | "sigma-aldrich" | "sigma" => Ok(SourceKind::VendorCatalog),
            "hazard-gateway" | "gateway" | "gestis" => Ok(SourceKind::HazardGateway),
            "knowledge-base" | "kb" | "wikidata" => Ok(SourceKind::KnowledgeBase),
            other => Err(LoaderError::Parse(format!("Unknown source kind: {}", other))),
        }
    }
}

/// Base URLs for the source variants
#[derive(Debug, Clone)]
pub struct SourceUrls {
    pub vendor_catalog: String,
    pub hazard_gateway: String,
    pub knowledge_base: String,
}

impl Default for SourceUrls {
    fn default() -> Self {
        Self {
            vendor_catalog: vendor_catalog::DEFAULT_BASE_URL.to_string(),
            hazard_gateway: hazard_gateway::DEFAULT_BASE_URL.to_string(),
            knowledge_base: knowledge_base::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Instantiate the configured sources in order
pub fn build_sources(
    kinds: &[SourceKind],
    urls: &SourceUrls,
    fetcher: Arc<dyn Fetcher>,
) -> Vec<Arc<dyn SubstanceSource>> {
    kinds
        .iter()
        .map(|kind| -> Arc<dyn SubstanceSource> {
            match kind {
                SourceKind::VendorCatalog => {
                    Arc::new(VendorCatalog::new(fetcher.clone(), &urls.vendor_catalog))
                }
                SourceKind::HazardGateway => {
                    Arc::new(HazardGateway::new(fetcher.clone(), &urls.hazard_gateway))
                }
                SourceKind::KnowledgeBase => {
                    Arc::new(KnowledgeBase::new(fetcher.clone(), &urls.knowledge_base))
                }
            }
        })
        .collect()
}

/// URL-encode a search term for a query string
pub(crate) fn encode_term(term: &str) -> String {
    url::form_urlencoded::byte_serialize(term.as_bytes()).collect()
}

/// First integer in free text, e.g. "WGK 3" → 3
///
/// Best effort: text without digits (or out of range) yields `None`.
pub(crate) fn first_integer(text: &str) -> Option<i64> {
    INTEGER_RE
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

/// Run query URLs in order until one yields candidates
///
/// A query whose fetch fails, or whose body does not parse, is logged and the
/// next one is tried. The result is empty when every readable query matched
/// nothing; an error is returned only when no query could be read at all.
pub(crate) async fn search_in_order<F>(
    source: &'static str,
    fetcher: &dyn Fetcher,
    queries: &[String],
    parse: F,
) -> LoaderResult<Vec<String>>
where
    F: Fn(&str) -> LoaderResult<Vec<String>> + Send + Sync,
{
    let mut last_error = None;
    let mut reached = false;

    for query in queries {
        match fetcher.fetch(query).await {
            Ok(content) => match parse(&content) {
                Ok(links) => {
                    reached = true;
                    info!(source, query = %query, results = links.len(), "Search results");
                    if !links.is_empty() {
                        return Ok(links);
                    }
                }
                Err(e) => {
                    warn!(source, query = %query, error = %e, "Unreadable search response");
                    last_error = Some(e);
                }
            },
            Err(e) => {
                warn!(source, query = %query, error = %e, "Search request failed");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if !reached => Err(e),
        _ => Ok(Vec::new()),
    }
}
