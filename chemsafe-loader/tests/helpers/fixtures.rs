//! HTML / JSON fixtures shaped like the external sources' pages

pub const VENDOR_BASE: &str = "https://vendor.test";
pub const GATEWAY_BASE: &str = "http://gateway.test";
pub const KB_BASE: &str = "https://kb.test";

/// Vendor search result page listing the given product links
pub fn vendor_search_page(links: &[&str]) -> String {
    let items: String = links
        .iter()
        .map(|href| {
            format!(
                r#"<li class="infoContainer"><div class="viewProducts"><a href="{}">View</a></div></li>"#,
                href
            )
        })
        .collect();
    format!(
        r#"<html><body><div id="searchBasedNavigation_widget"><ul>{}</ul></div></body></html>"#,
        items
    )
}

/// Vendor product page
pub fn vendor_product_page(name: &str, formula: &str, cas: &str, hazard: &str, precautionary: &str) -> String {
    format!(
        r#"<html><body>
        <div class="productInfo">
          <h1>{name}</h1>
          <ul class="clearfix">
            <li><p>CAS Number: <span>{cas}</span></p></li>
            <li><p>Linear Formula: <span>{formula}</span></p></li>
          </ul>
        </div>
        <div class="safetyBox">
          <div class="safetyRight" id="Symbol">GHS02,GHS07</div>
          <div class="safetyRight"><span class="warningLabel">Danger</span></div>
          <div class="safetyRight" id="Hazard statements">{hazard}</div>
          <div class="safetyRight" id="Precautionary statements">{precautionary}</div>
          <div class="safetyRight" id="WGK Germany">WGK 3</div>
        </div>
        </body></html>"#
    )
}

pub const BENZENE_PRODUCT_PATH: &str = "/catalog/product/sial/12540";

pub fn benzene_product_page() -> String {
    vendor_product_page("Benzene", "C6H6", "71-43-2", "H225-H304-H315", "")
}

/// Page without the product info block
pub const BROKEN_PRODUCT_PAGE: &str = "<html><body><h1>Maintenance</h1></body></html>";

/// Gateway search result page
pub fn gateway_search_page(links: &[&str]) -> String {
    let rows: String = links
        .iter()
        .map(|href| format!(r#"<tr><td class="hit-title"><a href="{}">hit</a></td></tr>"#, href))
        .collect();
    format!("<html><body><table>{}</table></body></html>", rows)
}

pub fn gateway_document(name: &str, formula: &str) -> String {
    format!(
        r#"<html><body>
        <h1 class="stoffname">{name}</h1>
        <table><tr><td>Formula</td><td><span class="acsf">{formula}</span></td></tr></table>
        <table><tr><td><b>Signal Word:</b></td><td>Warning</td></tr></table>
        <table><tbody>
          <tr><td><b>Hazard Statement - H-phrases:</b></td></tr>
          <tr><td>H226: Flammable liquid and vapour.</td></tr>
        </tbody></table>
        </body></html>"#
    )
}

pub const EMPTY_SEARCH_PAGE: &str = "<html><body><p>No results</p></body></html>";
