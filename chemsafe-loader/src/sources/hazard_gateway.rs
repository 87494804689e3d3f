//! Hazardous substance database gateway
//!
//! Documents are loosely structured tables: bold labels in one cell, the
//! value in a following cell. Statement codes are picked out of the phrase
//! text by pattern since the cells hold full sentences.

use super::html::{element_text, first_text, labelled_value, selector};
use super::{encode_term, first_integer, reduce, search_in_order, ScrapedSubstance, SubstanceSource};
use crate::error::{LoaderError, LoaderResult};
use crate::fetch::Fetcher;
use async_trait::async_trait;
use chemsafe_common::text;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "http://gestis-en.itrust.de";

const SEARCH_PATH: &str =
    "/nxt/gateway.dll/gestis_en/000000.xml?f=templates$fn=default.htm$vid=gestiseng:sdbeng$3.0";

const HAZARD_LABEL: &str = "Hazard Statement - H-phrases:";
const PRECAUTIONARY_LABEL: &str = "Precautionary Statement - P-phrases:";
const SIGNAL_WORD_LABEL: &str = "Signal Word:";

/// H/P/EUH codes, including "+"-joined combinations such as "P305+P351+P338"
static STATEMENT_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:EUH\d{3}|[HP]\d{3}[A-Za-z]{0,2})(?:\s*\+\s*[HP]\d{3}[A-Za-z]{0,2})*")
        .expect("valid statement code pattern")
});

static CAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{2,7}-\d{2}-\d\b").expect("valid CAS pattern"));

pub struct HazardGateway {
    fetcher: Arc<dyn Fetcher>,
    base_url: String,
}

impl HazardGateway {
    pub fn new(fetcher: Arc<dyn Fetcher>, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self, query: &str) -> String {
        format!("{}{}&qeingabe={}", self.base_url, SEARCH_PATH, encode_term(query))
    }
}

#[async_trait]
impl SubstanceSource for HazardGateway {
    fn name(&self) -> &'static str {
        "hazard-gateway"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exact query first, then a trailing-wildcard query
    async fn search(&self, term: &str) -> LoaderResult<Vec<String>> {
        let queries = [self.search_url(term), self.search_url(&format!("{}*", term))];
        search_in_order(self.name(), self.fetcher.as_ref(), &queries, parse_search_results).await
    }

    fn extract(&self, uri: &str, content: &str) -> LoaderResult<ScrapedSubstance> {
        extract_document(uri, content)
    }
}

pub fn parse_search_results(content: &str) -> LoaderResult<Vec<String>> {
    let document = Html::parse_document(content);
    let links = selector("td.hit-title a")?;

    let anchors: Vec<ElementRef> = document.select(&links).collect();
    Ok(reduce(anchors)
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .filter_map(text::non_empty)
        .collect())
}

/// Read a substance document
pub fn extract_document(uri: &str, content: &str) -> LoaderResult<ScrapedSubstance> {
    let document = Html::parse_document(content);
    let root = document.root_element();

    let name = first_text(&root, "h1.stoffname")?.ok_or_else(|| LoaderError::missing(uri, "h1.stoffname"))?;

    let mut statement_codes = codes_in(labelled_value(&root, HAZARD_LABEL)?.as_deref());
    statement_codes.extend(codes_in(labelled_value(&root, PRECAUTIONARY_LABEL)?.as_deref()));
    if statement_codes.is_empty() {
        warn!(uri = %uri, "No statement codes in document");
    }

    Ok(ScrapedSubstance {
        source: uri.to_string(),
        name,
        formula: first_text(&root, "td span.acsf")?,
        cas_number: cas_number(&document)?,
        signal_word: labelled_value(&root, SIGNAL_WORD_LABEL)?
            .and_then(|word| text::non_empty(word.trim_matches('"'))),
        wgk_germany: wgk(&document)?,
        symbol_codes: symbol_names(&document)?,
        statement_codes,
        ..Default::default()
    })
}

fn codes_in(phrases: Option<&str>) -> Vec<String> {
    phrases
        .map(|p| {
            STATEMENT_CODE_RE
                .find_iter(p)
                .map(|m| text::collapse_whitespace(m.as_str()))
                .collect()
        })
        .unwrap_or_default()
}

/// GHS pictograms, named after their image files ("…/GHS02.gif" → "GHS02")
fn symbol_names(document: &Html) -> LoaderResult<Vec<String>> {
    let images = selector("img")?;
    let mut names = Vec::new();
    for img in document.select(&images) {
        let Some(src) = img.value().attr("src") else {
            continue;
        };
        let file = src.rsplit('/').next().unwrap_or(src);
        let stem = text::trim(file.split('.').next().unwrap_or(file));
        if stem.starts_with("GH") && !names.iter().any(|n| n == stem) {
            names.push(stem.to_string());
        }
    }
    Ok(names)
}

fn cas_number(document: &Html) -> LoaderResult<Option<String>> {
    let tables = selector("table.stoffnummern")?;
    let Some(table) = document.select(&tables).next() else {
        debug!("No substance number table");
        return Ok(None);
    };
    Ok(labelled_value(&table, "CAS")?
        .as_deref()
        .and_then(|value| CAS_RE.find(value))
        .map(|m| m.as_str().to_string()))
}

fn wgk(document: &Html) -> LoaderResult<Option<i64>> {
    let cells = selector("td")?;
    Ok(document
        .select(&cells)
        .map(|cell| element_text(&cell))
        .find_map(|t| t.find("WGK").map(|at| t[at + 3..].to_string()))
        .as_deref()
        .and_then(first_integer))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"
        <html><body>
        <h1 class="stoffname">Benzene</h1>
        <table class="stoffnummern">
          <tr><td><b>CAS No:</b></td><td><span>71-43-2</span></td></tr>
          <tr><td><b>EC No:</b></td><td><span>200-753-7</span></td></tr>
        </table>
        <table><tr><td>Formula:</td><td><span class="acsf">C<sub>6</sub>H<sub>6</sub></span></td></tr></table>
        <table>
          <tr><td><img src="/images/GHS02.gif"><img src="/images/GHS08.gif"><img src="/images/logo.png"></td></tr>
          <tr><td><b>Signal Word:</b></td><td>"Danger"</td></tr>
        </table>
        <table><tbody>
          <tr><td><b>Hazard Statement - H-phrases:</b></td></tr>
          <tr><td>H225: Highly flammable liquid and vapour. H304: May be fatal if swallowed.
                  H315: Causes skin irritation.</td></tr>
        </tbody></table>
        <table><tbody>
          <tr><td><b>Precautionary Statement - P-phrases:</b></td></tr>
          <tr><td>P201: Obtain special instructions. P305+P351+P338: IF IN EYES: Rinse.</td></tr>
        </tbody></table>
        <table><tr><td>Water hazard class: WGK 3 - highly hazardous to water</td></tr></table>
        </body></html>
    "#;

    #[test]
    fn test_extract_document_fields() {
        let s = extract_document("http://gestis-en.itrust.de/doc/010060", DOCUMENT).unwrap();

        assert_eq!(s.name, "Benzene");
        assert_eq!(s.formula.as_deref(), Some("C6H6"));
        assert_eq!(s.cas_number.as_deref(), Some("71-43-2"));
        assert_eq!(s.signal_word.as_deref(), Some("Danger"));
        assert_eq!(s.symbol_codes, vec!["GHS02", "GHS08"]);
        assert_eq!(s.wgk_germany, Some(3));
        assert_eq!(s.statement_codes, vec!["H225", "H304", "H315", "P201", "P305+P351+P338"]);
        assert!(s.pubchem_id.is_none());
    }

    #[test]
    fn test_missing_title_fails() {
        let err = extract_document("http://x/doc", "<html><body><p>empty</p></body></html>").unwrap_err();
        assert!(matches!(err, LoaderError::MissingData { .. }));
    }

    #[test]
    fn test_optional_fields_absent() {
        let s = extract_document("http://x/doc", r#"<h1 class="stoffname">Water</h1>"#).unwrap();
        assert_eq!(s.name, "Water");
        assert!(s.formula.is_none());
        assert!(s.cas_number.is_none());
        assert!(s.wgk_germany.is_none());
        assert!(s.statement_codes.is_empty());
    }

    #[test]
    fn test_search_results() {
        let html = r#"<table>
            <tr><td class="hit-title"><a href="/nxt/gateway.dll/gestis_en/010060.xml">BENZENE</a></td></tr>
            <tr><td class="hit-title"><a href="/nxt/gateway.dll/gestis_en/010070.xml">BENZENE SOLUTION</a></td></tr>
            <tr><td class="other"><a href="/help">Help</a></td></tr>
        </table>"#;
        assert_eq!(
            parse_search_results(html).unwrap(),
            vec!["/nxt/gateway.dll/gestis_en/010060.xml", "/nxt/gateway.dll/gestis_en/010070.xml"]
        );
    }

    #[test]
    fn test_codes_in_ignores_prose() {
        assert_eq!(codes_in(Some("Highly flammable (see H225) and EUH066.")), vec!["H225", "EUH066"]);
        assert!(codes_in(Some("HP 100 printer")).is_empty());
        assert!(codes_in(None).is_empty());
    }
}
