//! Chemical vendor catalog
//!
//! Search pages list products under `.viewProducts` links. A product page
//! carries a `.productInfo` block of labelled rows and an optional
//! `.safetyBox` with the GHS data.

use super::html::{element_text, first_text, selector};
use super::{encode_term, first_integer, reduce, search_in_order, ScrapedSubstance, SubstanceSource};
use crate::error::{LoaderError, LoaderResult};
use crate::fetch::Fetcher;
use async_trait::async_trait;
use chemsafe_common::text;
use scraper::{ElementRef, Html};
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://www.sigmaaldrich.com";

/// Catalog sections searched, narrowest first
const SEARCH_FOCUS: [&str; 2] = ["buildingblocks", "products"];

const RESULT_LINKS: &str = "#searchBasedNavigation_widget .infoContainer .viewProducts a";

#[derive(Debug, Clone, Copy, PartialEq)]
enum InfoField {
    CasNumber,
    PubchemId,
    Formula,
}

/// Row labels, matched in order by case-insensitive prefix
const ROW_LABELS: [(&str, InfoField); 4] = [
    ("cas number", InfoField::CasNumber),
    ("pubchem", InfoField::PubchemId),
    ("linear formula", InfoField::Formula),
    ("empirical formula", InfoField::Formula),
];

pub struct VendorCatalog {
    fetcher: Arc<dyn Fetcher>,
    base_url: String,
}

impl VendorCatalog {
    pub fn new(fetcher: Arc<dyn Fetcher>, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn search_url(&self, term: &str, focus: &str) -> String {
        format!(
            "{}/catalog/search?interface=ALL&N=0+&mode=partialmax&term={}&lang=de&region=CH&focus={}",
            self.base_url,
            encode_term(term),
            focus
        )
    }
}

#[async_trait]
impl SubstanceSource for VendorCatalog {
    fn name(&self) -> &'static str {
        "vendor-catalog"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn search(&self, term: &str) -> LoaderResult<Vec<String>> {
        let queries: Vec<String> = SEARCH_FOCUS
            .iter()
            .map(|focus| self.search_url(term, focus))
            .collect();
        search_in_order(self.name(), self.fetcher.as_ref(), &queries, parse_search_results).await
    }

    fn extract(&self, uri: &str, content: &str) -> LoaderResult<ScrapedSubstance> {
        extract_product(uri, content)
    }
}

/// Result links of a search page, reduced to a bounded sample
pub fn parse_search_results(content: &str) -> LoaderResult<Vec<String>> {
    let document = Html::parse_document(content);
    let links = selector(RESULT_LINKS)?;

    let anchors: Vec<ElementRef> = document.select(&links).collect();
    Ok(reduce(anchors)
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .filter_map(text::non_empty)
        .collect())
}

/// Read a product page
pub fn extract_product(uri: &str, content: &str) -> LoaderResult<ScrapedSubstance> {
    let document = Html::parse_document(content);
    let info_sel = selector(".productInfo")?;
    let info = document
        .select(&info_sel)
        .next()
        .ok_or_else(|| LoaderError::missing(uri, ".productInfo"))?;

    let mut scraped = ScrapedSubstance {
        source: uri.to_string(),
        ..Default::default()
    };
    read_info_rows(&info, &mut scraped)?;

    scraped.name = match first_text(&info, "h1")? {
        Some(title) => title,
        None => match &scraped.formula {
            Some(formula) => {
                warn!(uri = %uri, formula = %formula, "No product title, using formula as name");
                formula.clone()
            }
            None => return Err(LoaderError::missing(uri, "product title and formula")),
        },
    };

    let safety_sel = selector(".safetyBox")?;
    match document.select(&safety_sel).next() {
        Some(safety) => read_safety_box(uri, &safety, &mut scraped)?,
        None => warn!(uri = %uri, "No safety data on product page"),
    }

    Ok(scraped)
}

fn read_info_rows(info: &ElementRef, scraped: &mut ScrapedSubstance) -> LoaderResult<()> {
    let rows = selector("ul.clearfix li")?;
    let values = selector("span")?;

    for row in info.select(&rows) {
        let label = element_text(&row);
        let Some(value) = row
            .select(&values)
            .next()
            .map(|span| element_text(&span))
            .filter(|v| !v.is_empty())
        else {
            continue;
        };

        let field = ROW_LABELS
            .iter()
            .find(|(prefix, _)| text::starts_with_ci(prefix, &label))
            .map(|(_, field)| *field);

        match field {
            Some(InfoField::CasNumber) => scraped.cas_number = Some(value),
            Some(InfoField::PubchemId) => {
                scraped.pubchem_id = first_integer(&value);
            }
            Some(InfoField::Formula) => {
                if scraped.formula.is_none() {
                    scraped.formula = Some(value);
                }
            }
            None => debug!(label = %label, "Ignoring product info row"),
        }
    }
    Ok(())
}

fn read_safety_box(uri: &str, safety: &ElementRef, scraped: &mut ScrapedSubstance) -> LoaderResult<()> {
    if let Some(symbols) = first_text(safety, r"#Symbol")? {
        scraped.symbol_codes = symbols
            .split(',')
            .filter_map(text::non_empty)
            .collect();
    }
    scraped.signal_word = first_text(safety, "span.warningLabel")?;
    scraped.ridadr = first_text(safety, "#RIDADR")?;
    scraped.wgk_germany = first_text(safety, r"#WGK\ Germany")?.as_deref().and_then(first_integer);
    scraped.rtecs = first_text(safety, "#RTECS")?;

    let precautionary = first_text(safety, r"#Precautionary\ statements")?;
    let hazard = first_text(safety, r"#Hazard\ statements")?;
    let joined = [precautionary, hazard]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n");
    scraped.statement_codes = text::split_codes(&joined);
    if scraped.statement_codes.is_empty() {
        warn!(uri = %uri, "No statement codes in safety data");
    }
    Ok(())
}
