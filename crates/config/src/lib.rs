//! Configuration loading, validation, and management for agentrail.
//!
//! Loads configuration from `~/.agentrail/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use agentrail_core::decision::ToolKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.agentrail/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Retrieval client settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Reasoner thresholds and generation assist
    #[serde(default)]
    pub reasoner: ReasonerConfig,

    /// Tool backends
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Turn orchestration
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Trace sink
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

fn default_true() -> bool {
    true
}

// ── Retrieval ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// "keyword" (local knowledge-base directory) or "http" (vector service)
    #[serde(default = "default_retrieval_backend")]
    pub backend: String,

    /// Passages requested per turn
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Base URL of the vector service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,

    /// Knowledge-base directory for the keyword retriever
    #[serde(default = "default_kb_dir")]
    pub kb_dir: String,

    #[serde(default = "default_retrieval_timeout")]
    pub timeout_secs: u64,
}

fn default_retrieval_backend() -> String {
    "keyword".into()
}
fn default_top_k() -> usize {
    3
}
fn default_kb_dir() -> String {
    "kb".into()
}
fn default_retrieval_timeout() -> u64 {
    10
}

impl RetrievalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            backend: default_retrieval_backend(),
            top_k: default_top_k(),
            service_url: None,
            kb_dir: default_kb_dir(),
            timeout_secs: default_retrieval_timeout(),
        }
    }
}

// ── Reasoner ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonerConfig {
    /// Minimum top-passage score for answering from context
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f32,

    /// Fraction of query content terms the top passage must contain
    #[serde(default = "default_min_overlap")]
    pub min_overlap: f32,

    /// Generation-backend assist on rule-table miss
    #[serde(default)]
    pub generation: GenerationConfig,
}

fn default_relevance_threshold() -> f32 {
    0.6
}
fn default_min_overlap() -> f32 {
    0.5
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: default_relevance_threshold(),
            min_overlap: default_min_overlap(),
            generation: GenerationConfig::default(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Let the backend write the final answer; rule-based text is the fallback
    #[serde(default)]
    pub compose_answer: bool,

    /// Preferred backend: "openai" or "huggingface"
    #[serde(default = "default_generation_backend")]
    pub backend: String,

    /// OpenAI-compatible base URL
    #[serde(default = "default_generation_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Hugging Face inference base URL
    #[serde(default = "default_hf_url")]
    pub hf_api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hf_api_token: Option<String>,

    #[serde(default = "default_hf_model")]
    pub hf_model: String,

    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

fn default_generation_backend() -> String {
    "openai".into()
}
fn default_generation_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_generation_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_hf_url() -> String {
    "https://api-inference.huggingface.co".into()
}
fn default_hf_model() -> String {
    "google/flan-t5-large".into()
}
fn default_generation_timeout() -> u64 {
    30
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("enabled", &self.enabled)
            .field("compose_answer", &self.compose_answer)
            .field("backend", &self.backend)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("hf_api_url", &self.hf_api_url)
            .field("hf_api_token", &redact(&self.hf_api_token))
            .field("hf_model", &self.hf_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            compose_answer: false,
            backend: default_generation_backend(),
            api_url: default_generation_url(),
            api_key: None,
            model: default_generation_model(),
            hf_api_url: default_hf_url(),
            hf_api_token: None,
            hf_model: default_hf_model(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

// ── Tools ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Per-dispatch timeout
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub csv: CsvToolConfig,

    #[serde(default)]
    pub web: WebToolConfig,

    #[serde(default)]
    pub api: ApiToolConfig,
}

fn default_tool_timeout() -> u64 {
    10
}

impl ToolsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_tool_timeout(),
            csv: CsvToolConfig::default(),
            web: WebToolConfig::default(),
            api: ApiToolConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvToolConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Serve the built-in sample catalog even if a path is set
    #[serde(default)]
    pub mock: bool,

    /// Delimited catalog file; without one the tool is simulated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<String>,
}

impl Default for CsvToolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mock: false,
            catalog_path: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct WebToolConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub mock: bool,

    /// SerpAPI key; without one the tool is simulated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_search_url")]
    pub base_url: String,

    #[serde(default = "default_num_results")]
    pub num_results: usize,
}

fn default_search_url() -> String {
    "https://serpapi.com/search".into()
}
fn default_num_results() -> usize {
    3
}

impl std::fmt::Debug for WebToolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebToolConfig")
            .field("enabled", &self.enabled)
            .field("mock", &self.mock)
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("num_results", &self.num_results)
            .finish()
    }
}

impl Default for WebToolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mock: false,
            api_key: None,
            base_url: default_search_url(),
            num_results: default_num_results(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ApiToolConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Simulated by default; set `mock = false` to call `base_url`
    #[serde(default = "default_true")]
    pub mock: bool,

    #[serde(default = "default_api_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_api_url() -> String {
    "https://jsonplaceholder.typicode.com".into()
}

impl std::fmt::Debug for ApiToolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiToolConfig")
            .field("enabled", &self.enabled)
            .field("mock", &self.mock)
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

impl Default for ApiToolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mock: true,
            base_url: default_api_url(),
            api_key: None,
        }
    }
}

// ── Orchestrator ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Tool substituted once when the primary dispatch fails
    #[serde(default = "default_fallback_tool")]
    pub fallback_tool: ToolKind,

    /// Extra tool hops per turn (0 or 1)
    #[serde(default = "default_max_chain_hops")]
    pub max_chain_hops: u32,
}

fn default_fallback_tool() -> ToolKind {
    ToolKind::Web
}
fn default_max_chain_hops() -> u32 {
    1
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fallback_tool: default_fallback_tool(),
            max_chain_hops: default_max_chain_hops(),
        }
    }
}

// ── Telemetry ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// "memory", "jsonl", or "none"
    #[serde(default = "default_sink")]
    pub sink: String,

    /// Output file for the "jsonl" sink
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn default_sink() -> String {
    "memory".into()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            sink: default_sink(),
            path: None,
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from the default path (~/.agentrail/config.toml)
    /// and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from a specific path and apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides through a lookup function.
    ///
    /// Secrets from the environment only fill values the file left empty;
    /// tuning knobs always override.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(k) = var("AGENTRAIL_TOP_K")
            .or_else(|| var("TOP_K"))
            .and_then(|v| v.parse().ok())
        {
            self.retrieval.top_k = k;
        }
        if let Some(t) = var("AGENTRAIL_RELEVANCE_THRESHOLD").and_then(|v| v.parse().ok()) {
            self.reasoner.relevance_threshold = t;
        }
        if let Some(url) = var("AGENTRAIL_RETRIEVAL_URL") {
            self.retrieval.backend = "http".into();
            self.retrieval.service_url = Some(url);
        }
        if let Some(path) = var("AGENTRAIL_CATALOG") {
            self.tools.csv.catalog_path = Some(path);
        }

        let generation = &mut self.reasoner.generation;
        if generation.api_key.is_none() {
            generation.api_key = var("OPENAI_API_KEY");
        }
        if let Some(model) = var("OPENAI_MODEL") {
            generation.model = model;
        }
        if generation.hf_api_token.is_none() {
            generation.hf_api_token = var("HUGGINGFACE_API_TOKEN");
        }
        if let Some(model) = var("HF_MODEL") {
            generation.hf_model = model;
        }
        if var("USE_HF_MODEL").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
            generation.backend = "huggingface".into();
        }
        if let Some(on) = var("AGENTRAIL_COMPOSE_ANSWER").and_then(|v| v.parse().ok()) {
            generation.compose_answer = on;
        }

        if self.tools.web.api_key.is_none() {
            self.tools.web.api_key = var("SERPAPI_KEY");
        }
        if let Some(url) = var("API_BASE_URL") {
            self.tools.api.base_url = url;
            self.tools.api.mock = false;
        }
        if self.tools.api.api_key.is_none() {
            self.tools.api.api_key = var("API_KEY");
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".agentrail")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.reasoner.relevance_threshold) {
            return Err(ConfigError::ValidationError(
                "reasoner.relevance_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.reasoner.min_overlap) {
            return Err(ConfigError::ValidationError(
                "reasoner.min_overlap must be between 0.0 and 1.0".into(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be at least 1".into(),
            ));
        }

        if !matches!(self.retrieval.backend.as_str(), "keyword" | "http") {
            return Err(ConfigError::ValidationError(format!(
                "retrieval.backend must be \"keyword\" or \"http\", got \"{}\"",
                self.retrieval.backend
            )));
        }

        if self.retrieval.backend == "http" && self.retrieval.service_url.is_none() {
            return Err(ConfigError::ValidationError(
                "retrieval.service_url is required for the http backend".into(),
            ));
        }

        if self.orchestrator.fallback_tool == ToolKind::None {
            return Err(ConfigError::ValidationError(
                "orchestrator.fallback_tool must name a tool, not NONE".into(),
            ));
        }

        if !self.tool_enabled(self.orchestrator.fallback_tool) {
            return Err(ConfigError::ValidationError(format!(
                "orchestrator.fallback_tool {} is disabled in [tools]",
                self.orchestrator.fallback_tool
            )));
        }

        if self.orchestrator.max_chain_hops > 1 {
            return Err(ConfigError::ValidationError(
                "orchestrator.max_chain_hops is capped at 1".into(),
            ));
        }

        if !matches!(self.telemetry.sink.as_str(), "memory" | "jsonl" | "none") {
            return Err(ConfigError::ValidationError(format!(
                "telemetry.sink must be \"memory\", \"jsonl\" or \"none\", got \"{}\"",
                self.telemetry.sink
            )));
        }

        if self.telemetry.sink == "jsonl" && self.telemetry.path.is_none() {
            return Err(ConfigError::ValidationError(
                "telemetry.path is required for the jsonl sink".into(),
            ));
        }

        Ok(())
    }

    /// Whether a tool is enabled in configuration.
    pub fn tool_enabled(&self, kind: ToolKind) -> bool {
        match kind {
            ToolKind::None => true,
            ToolKind::Csv => self.tools.csv.enabled,
            ToolKind::Web => self.tools.web.enabled,
            ToolKind::Api => self.tools.api.enabled,
        }
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.reasoner.relevance_threshold, 0.6);
        assert_eq!(config.orchestrator.fallback_tool, ToolKind::Web);
        assert_eq!(config.orchestrator.max_chain_hops, 1);
        assert!(!config.reasoner.generation.enabled);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.retrieval.top_k, config.retrieval.top_k);
        assert_eq!(parsed.orchestrator.fallback_tool, ToolKind::Web);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[reasoner]
relevance_threshold = 0.75

[tools.csv]
catalog_path = "prices.csv"

[orchestrator]
fallback_tool = "API"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.reasoner.relevance_threshold, 0.75);
        assert_eq!(config.reasoner.min_overlap, 0.5);
        assert_eq!(config.tools.csv.catalog_path.as_deref(), Some("prices.csv"));
        assert!(config.tools.csv.enabled);
        assert_eq!(config.orchestrator.fallback_tool, ToolKind::Api);
    }

    #[test]
    fn invalid_threshold_rejected() {
        let mut config = AppConfig::default();
        config.reasoner.relevance_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn chain_hops_capped_at_one() {
        let mut config = AppConfig::default();
        config.orchestrator.max_chain_hops = 2;
        assert!(config.validate().is_err());
        config.orchestrator.max_chain_hops = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn none_fallback_rejected() {
        let mut config = AppConfig::default();
        config.orchestrator.fallback_tool = ToolKind::None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn disabled_fallback_tool_rejected() {
        let mut config = AppConfig::default();
        config.tools.web.enabled = false;
        assert!(config.validate().is_err());
        config.orchestrator.fallback_tool = ToolKind::Csv;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn http_backend_requires_url() {
        let mut config = AppConfig::default();
        config.retrieval.backend = "http".into();
        assert!(config.validate().is_err());
        config.retrieval.service_url = Some("http://localhost:8000".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn jsonl_sink_requires_path() {
        let mut config = AppConfig::default();
        config.telemetry.sink = "jsonl".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().retrieval.backend, "keyword");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[retrieval]\ntop_k = 7\n").unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.retrieval.top_k, 7);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[retrieval\ntop_k = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("TOP_K", "5"),
            ("SERPAPI_KEY", "serp-secret"),
            ("API_BASE_URL", "http://localhost:9000"),
            ("OPENAI_API_KEY", "sk-test"),
            ("USE_HF_MODEL", "true"),
        ]));
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.tools.web.api_key.as_deref(), Some("serp-secret"));
        assert_eq!(config.tools.api.base_url, "http://localhost:9000");
        assert!(!config.tools.api.mock);
        assert_eq!(config.reasoner.generation.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.reasoner.generation.backend, "huggingface");
    }

    #[test]
    fn env_does_not_replace_file_secret() {
        let mut config = AppConfig::default();
        config.tools.web.api_key = Some("from-file".into());
        config.apply_env(env(&[("SERPAPI_KEY", "from-env")]));
        assert_eq!(config.tools.web.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn retrieval_url_env_switches_backend() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("AGENTRAIL_RETRIEVAL_URL", "http://vectors:8080")]));
        assert_eq!(config.retrieval.backend, "http");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.tools.web.api_key = Some("serp-secret".into());
        config.reasoner.generation.api_key = Some("sk-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("serp-secret"));
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn tool_enabled_flags() {
        let mut config = AppConfig::default();
        config.tools.api.enabled = false;
        assert!(config.tool_enabled(ToolKind::Csv));
        assert!(!config.tool_enabled(ToolKind::Api));
    }

    #[test]
    fn compose_answer_defaults_off_and_reads_env() {
        let mut config = AppConfig::default();
        assert!(!config.reasoner.generation.compose_answer);

        config.apply_env(env(&[("AGENTRAIL_COMPOSE_ANSWER", "true")]));
        assert!(config.reasoner.generation.compose_answer);

        let parsed: AppConfig = toml::from_str(
            "[reasoner.generation]\nenabled = true\ncompose_answer = true\n",
        )
        .unwrap();
        assert!(parsed.reasoner.generation.compose_answer);
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("relevance_threshold"));
        assert!(toml_str.contains("fallback_tool = \"WEB\""));
    }
}
