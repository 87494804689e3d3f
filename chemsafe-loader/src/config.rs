//! Configuration resolution for the loader
//!
//! Provides multi-tier resolution with CLI → ENV → TOML → default priority
//! for the source order, and TOML → default for transport settings.

use crate::error::{LoaderError, LoaderResult};
use crate::fetch::FetchSettings;
use crate::sources::{SourceKind, SourceUrls};
use chemsafe_common::config::TomlConfig;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable holding a comma separated source order
pub const SOURCES_ENV: &str = "CHEMSAFE_SOURCES";

/// Everything the loader needs besides the database
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub sources: Vec<SourceKind>,
    pub urls: SourceUrls,
    pub fetch: FetchSettings,
}

impl LoaderConfig {
    pub fn resolve(cli_sources: &[SourceKind], toml_config: &TomlConfig) -> LoaderResult<Self> {
        Ok(Self {
            sources: resolve_source_order(cli_sources, toml_config)?,
            urls: resolve_source_urls(toml_config),
            fetch: resolve_fetch_settings(toml_config),
        })
    }
}

/// Parse a comma separated list of source kinds
pub fn parse_source_list(value: &str) -> LoaderResult<Vec<SourceKind>> {
    let kinds = value
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect::<LoaderResult<Vec<SourceKind>>>()?;
    dedup_kinds(kinds)
}

fn dedup_kinds(kinds: Vec<SourceKind>) -> LoaderResult<Vec<SourceKind>> {
    let mut unique = Vec::with_capacity(kinds.len());
    for kind in kinds {
        if !unique.contains(&kind) {
            unique.push(kind);
        }
    }
    if unique.is_empty() {
        return Err(LoaderError::Parse("Source list is empty".to_string()));
    }
    Ok(unique)
}

/// Resolve the source order
///
/// **Priority:** CLI → ENV → TOML → default
pub fn resolve_source_order(cli_sources: &[SourceKind], toml_config: &TomlConfig) -> LoaderResult<Vec<SourceKind>> {
    if !cli_sources.is_empty() {
        info!("Source order from command line");
        return dedup_kinds(cli_sources.to_vec());
    }

    if let Ok(value) = std::env::var(SOURCES_ENV) {
        if !value.trim().is_empty() {
            info!("Source order from {}", SOURCES_ENV);
            return parse_source_list(&value);
        }
    }

    if let Some(order) = &toml_config.sources.order {
        info!("Source order from TOML config");
        let kinds = order
            .iter()
            .map(|name| name.parse())
            .collect::<LoaderResult<Vec<SourceKind>>>()?;
        return dedup_kinds(kinds);
    }

    Ok(SourceKind::DEFAULT_ORDER.to_vec())
}

fn resolve_source_urls(toml_config: &TomlConfig) -> SourceUrls {
    let defaults = SourceUrls::default();
    let sources = &toml_config.sources;
    SourceUrls {
        vendor_catalog: sources.vendor_base_url.clone().unwrap_or(defaults.vendor_catalog),
        hazard_gateway: sources.gateway_base_url.clone().unwrap_or(defaults.hazard_gateway),
        knowledge_base: sources.knowledge_base_url.clone().unwrap_or(defaults.knowledge_base),
    }
}

fn resolve_fetch_settings(toml_config: &TomlConfig) -> FetchSettings {
    let defaults = FetchSettings::default();
    let sources = &toml_config.sources;

    let requests_per_second = match sources.requests_per_second {
        Some(0) => {
            warn!("requests_per_second = 0 is not allowed, using {}", defaults.requests_per_second);
            defaults.requests_per_second
        }
        Some(n) => n,
        None => defaults.requests_per_second,
    };

    FetchSettings {
        locale_cookie: sources.locale_cookie.clone().unwrap_or(defaults.locale_cookie),
        timeout: sources.timeout_secs.map(Duration::from_secs).unwrap_or(defaults.timeout),
        requests_per_second,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_source_list() {
        assert_eq!(
            parse_source_list("gestis, vendor,gestis").unwrap(),
            vec![SourceKind::HazardGateway, SourceKind::VendorCatalog]
        );
        assert!(parse_source_list("vendor,pubchem").is_err());
        assert!(parse_source_list(" , ").is_err());
    }

    #[test]
    #[serial]
    fn test_cli_beats_env_and_toml() {
        std::env::set_var(SOURCES_ENV, "knowledge-base");
        let mut toml_config = TomlConfig::default();
        toml_config.sources.order = Some(vec!["hazard-gateway".to_string()]);

        let order = resolve_source_order(&[SourceKind::VendorCatalog], &toml_config).unwrap();
        assert_eq!(order, vec![SourceKind::VendorCatalog]);

        std::env::remove_var(SOURCES_ENV);
    }

    #[test]
    #[serial]
    fn test_env_beats_toml() {
        std::env::set_var(SOURCES_ENV, "knowledge-base,vendor-catalog");
        let mut toml_config = TomlConfig::default();
        toml_config.sources.order = Some(vec!["hazard-gateway".to_string()]);

        let order = resolve_source_order(&[], &toml_config).unwrap();
        assert_eq!(order, vec![SourceKind::KnowledgeBase, SourceKind::VendorCatalog]);

        std::env::remove_var(SOURCES_ENV);
    }

    #[test]
    #[serial]
    fn test_toml_then_default() {
        std::env::remove_var(SOURCES_ENV);
        let mut toml_config = TomlConfig::default();
        assert_eq!(
            resolve_source_order(&[], &toml_config).unwrap(),
            SourceKind::DEFAULT_ORDER.to_vec()
        );

        toml_config.sources.order = Some(vec!["gestis".to_string()]);
        assert_eq!(
            resolve_source_order(&[], &toml_config).unwrap(),
            vec![SourceKind::HazardGateway]
        );

        toml_config.sources.order = Some(vec!["nope".to_string()]);
        assert!(resolve_source_order(&[], &toml_config).is_err());
    }

    #[test]
    fn test_transport_settings_from_toml() {
        let mut toml_config = TomlConfig::default();
        toml_config.sources.timeout_secs = Some(5);
        toml_config.sources.requests_per_second = Some(0);
        toml_config.sources.gateway_base_url = Some("http://localhost:8080".to_string());

        let config = LoaderConfig::resolve(&[SourceKind::HazardGateway], &toml_config).unwrap();
        assert_eq!(config.fetch.timeout, Duration::from_secs(5));
        assert_eq!(config.fetch.requests_per_second, 2);
        assert_eq!(config.urls.hazard_gateway, "http://localhost:8080");
        assert_eq!(config.urls.vendor_catalog, "https://www.sigmaaldrich.com");
    }
}
