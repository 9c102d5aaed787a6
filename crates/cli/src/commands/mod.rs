pub mod ask;
pub mod chat;
pub mod config_cmd;

use agentrail_config::AppConfig;
use std::path::Path;

/// Load the config file (explicit path or the default location) with
/// environment overrides applied.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => AppConfig::load_with_env(p),
        None => AppConfig::load(),
    };
    config.map_err(|e| format!("Failed to load config: {e}").into())
}
