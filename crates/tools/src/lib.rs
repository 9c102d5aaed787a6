//! Tool backends for agentrail.
//!
//! Each backend implements the shared [`Tool`](agentrail_core::Tool)
//! contract and is registered under its [`ToolKind`] tag:
//! the product catalog (`CSV`), web search (`WEB`), and a structured REST
//! API (`API`). Every backend has a simulated mode so the pipeline runs
//! offline; simulated results surface as `DEGRADED`.

pub mod api_lookup;
pub mod catalog;
pub mod web_search;

pub use api_lookup::{ApiLookupTool, ApiRequest, derive_request};
pub use catalog::{CatalogTool, product_term, sku_token};
pub use web_search::WebSearchTool;

use agentrail_config::ToolsConfig;
use agentrail_core::decision::ToolKind;
use agentrail_core::tool::ToolRegistry;
use tracing::info;

/// Build a registry from configuration.
///
/// Disabled tools are left out. A tool without credentials (or with
/// `mock = true`) is registered in simulated mode.
pub fn build_registry(config: &ToolsConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new().with_timeout(config.timeout());

    if config.csv.enabled {
        let tool = match (&config.csv.catalog_path, config.csv.mock) {
            (Some(path), false) => CatalogTool::from_path(path),
            _ => CatalogTool::sample(),
        };
        registry.register(Box::new(tool));
    }

    if config.web.enabled {
        let tool = match (&config.web.api_key, config.web.mock) {
            (Some(key), false) => WebSearchTool::live(&config.web.base_url, key),
            _ => WebSearchTool::simulated(),
        };
        registry.register(Box::new(tool.with_num_results(config.web.num_results)));
    }

    if config.api.enabled {
        let tool = if config.api.mock {
            ApiLookupTool::simulated()
        } else {
            ApiLookupTool::live(&config.api.base_url, config.api.api_key.clone())
        };
        registry.register(Box::new(tool));
    }

    for kind in registry.kinds() {
        let simulated = registry.get(kind).is_some_and(|t| t.is_simulated());
        info!(tool = %kind, simulated, "Registered tool");
    }

    registry
}

/// A registry with every tool in simulated mode.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(CatalogTool::sample()));
    registry.register(Box::new(WebSearchTool::simulated()));
    registry.register(Box::new(ApiLookupTool::simulated()));
    registry
}
