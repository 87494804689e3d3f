//! Structured knowledge base (entity JSON API)
//!
//! Search goes through the entity search endpoint, falling back to the
//! full-text search. Each hit becomes an entity-data document link.
//! Safety codes are not exposed as plain codes there, so substances from
//! this source carry no statements or symbols.

use super::{encode_term, reduce, search_in_order, ScrapedSubstance, SubstanceSource};
use crate::error::{LoaderError, LoaderResult};
use crate::fetch::Fetcher;
use async_trait::async_trait;
use chemsafe_common::text;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://www.wikidata.org";

const LANGUAGE: &str = "en";
const SEARCH_LIMIT: usize = 10;

const PROP_FORMULA: &str = "P274";
const PROP_CAS: &str = "P231";
const PROP_PUBCHEM: &str = "P662";
const PROP_RTECS: &str = "P657";

pub struct KnowledgeBase {
    fetcher: Arc<dyn Fetcher>,
    base_url: String,
}

impl KnowledgeBase {
    pub fn new(fetcher: Arc<dyn Fetcher>, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn entity_search_url(&self, term: &str) -> String {
        format!(
            "{}/w/api.php?action=wbsearchentities&format=json&language={}&uselang={}&type=item&limit={}&search={}",
            self.base_url,
            LANGUAGE,
            LANGUAGE,
            SEARCH_LIMIT,
            encode_term(term)
        )
    }

    fn text_search_url(&self, term: &str) -> String {
        format!(
            "{}/w/api.php?action=query&list=search&format=json&srlimit={}&srsearch={}",
            self.base_url,
            SEARCH_LIMIT,
            encode_term(term)
        )
    }
}

#[async_trait]
impl SubstanceSource for KnowledgeBase {
    fn name(&self) -> &'static str {
        "knowledge-base"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn search(&self, term: &str) -> LoaderResult<Vec<String>> {
        let queries = [self.entity_search_url(term), self.text_search_url(term)];
        search_in_order(self.name(), self.fetcher.as_ref(), &queries, parse_search_results).await
    }

    fn extract(&self, uri: &str, content: &str) -> LoaderResult<ScrapedSubstance> {
        extract_entity(uri, content)
    }
}

#[derive(Debug, Deserialize)]
struct EntitySearchResponse {
    #[serde(default)]
    search: Vec<EntityHit>,
}

#[derive(Debug, Deserialize)]
struct EntityHit {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    query: TextSearchQuery,
}

#[derive(Debug, Deserialize)]
struct TextSearchQuery {
    #[serde(default)]
    search: Vec<TextHit>,
}

#[derive(Debug, Deserialize)]
struct TextHit {
    title: String,
}

/// Either search response shape
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Text(TextSearchResponse),
    Entity(EntitySearchResponse),
}

#[derive(Debug, Deserialize)]
struct EntityDocument {
    #[serde(default)]
    entities: HashMap<String, Entity>,
}

#[derive(Debug, Deserialize)]
struct Entity {
    #[serde(default)]
    labels: HashMap<String, Label>,
    #[serde(default)]
    claims: HashMap<String, Vec<Claim>>,
}

#[derive(Debug, Deserialize)]
struct Label {
    value: String,
}

#[derive(Debug, Deserialize)]
struct Claim {
    mainsnak: Snak,
    #[serde(default)]
    rank: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snak {
    #[serde(default)]
    datavalue: Option<DataValue>,
}

#[derive(Debug, Deserialize)]
struct DataValue {
    value: serde_json::Value,
}

impl Entity {
    /// First non-deprecated string value of a property
    fn string_claim(&self, property: &str) -> Option<String> {
        self.claims
            .get(property)?
            .iter()
            .filter(|claim| claim.rank.as_deref() != Some("deprecated"))
            .filter_map(|claim| claim.mainsnak.datavalue.as_ref())
            .find_map(|dv| dv.value.as_str().and_then(text::non_empty))
    }
}

/// Entity-data links for the hits of either search endpoint
pub fn parse_search_results(content: &str) -> LoaderResult<Vec<String>> {
    let ids: Vec<String> = match serde_json::from_str::<SearchResponse>(content)? {
        SearchResponse::Entity(response) => response.search.into_iter().map(|hit| hit.id).collect(),
        SearchResponse::Text(response) => response.query.search.into_iter().map(|hit| hit.title).collect(),
    };
    Ok(reduce(ids)
        .into_iter()
        .filter_map(|id| text::non_empty(&id))
        .map(|id| format!("/wiki/Special:EntityData/{}.json", id))
        .collect())
}

/// Fold Unicode subscript digits to ASCII ("C₆H₆" → "C6H6")
pub fn fold_subscripts(formula: &str) -> String {
    formula
        .chars()
        .map(|c| match c {
            '\u{2080}'..='\u{2089}' => char::from(b'0' + (c as u32 - 0x2080) as u8),
            other => other,
        })
        .collect()
}

/// Read an entity-data document
pub fn extract_entity(uri: &str, content: &str) -> LoaderResult<ScrapedSubstance> {
    let document: EntityDocument = serde_json::from_str(content)?;
    let entity = document
        .entities
        .into_values()
        .next()
        .ok_or_else(|| LoaderError::missing(uri, "entity"))?;

    let formula = entity.string_claim(PROP_FORMULA).map(|f| fold_subscripts(&f));
    let pubchem_id = entity.string_claim(PROP_PUBCHEM).and_then(|raw| match raw.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            debug!(uri = %uri, value = %raw, "Ignoring non-numeric PubChem id");
            None
        }
    });

    let label = entity
        .labels
        .get(LANGUAGE)
        .and_then(|label| text::non_empty(&label.value));
    let name = match (label, &formula) {
        (Some(label), _) => label,
        (None, Some(formula)) => {
            warn!(uri = %uri, formula = %formula, "No English label, using formula as name");
            formula.clone()
        }
        (None, None) => return Err(LoaderError::missing(uri, "label and formula")),
    };

    Ok(ScrapedSubstance {
        source: uri.to_string(),
        name,
        formula,
        pubchem_id,
        cas_number: entity.string_claim(PROP_CAS),
        rtecs: entity.string_claim(PROP_RTECS),
        ..Default::default()
    })
}
