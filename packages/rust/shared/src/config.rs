//! Application configuration for serpforge.
//!
//! User config lives at `~/.serpforge/serpforge.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SerpforgeError};
use crate::rules::RuleSet;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "serpforge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".serpforge";

// ---------------------------------------------------------------------------
// Config structs (matching serpforge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Page/SERP fetch policies.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// AI assistant gateway settings.
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Heuristic rule tables (CTA phrases, legal patterns, ...).
    #[serde(default)]
    pub rules: RuleSet,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Database file path (`~` expands to the user's home).
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// SERP result cap per keyword.
    #[serde(default = "default_serp_results")]
    pub serp_results: u32,

    /// Batch worker pool width.
    #[serde(default = "default_max_workers")]
    pub max_workers: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            serp_results: default_serp_results(),
            max_workers: default_max_workers(),
        }
    }
}

fn default_db_path() -> String {
    "~/.serpforge/research.db".into()
}
fn default_serp_results() -> u32 {
    5
}
fn default_max_workers() -> u32 {
    3
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// SERP HTML endpoint (query appended as `?q=`).
    #[serde(default = "default_serp_endpoint")]
    pub serp_endpoint: String,

    /// Per-request timeout in seconds for page fetches.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry count after the first attempt.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Fixed (non-exponential) backoff between attempts, in milliseconds.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            serp_endpoint: default_serp_endpoint(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_serp_endpoint() -> String {
    "https://html.duckduckgo.com/html/".into()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_retries() -> u32 {
    2
}
fn default_backoff_ms() -> u64 {
    600
}

/// `[assistant]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Base URL of the AI assistant service.
    #[serde(default = "default_assistant_url")]
    pub base_url: String,

    /// Name of the env var holding the bearer token (never the token itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: default_assistant_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_assistant_url() -> String {
    "http://localhost:8000".into()
}
fn default_api_key_env() -> String {
    "AI_ASSISTANT_API_KEY".into()
}

impl AssistantConfig {
    /// Resolve the bearer token from the configured env var.
    /// Returns a demo key when unset — the gateway falls back locally anyway.
    pub fn api_key(&self) -> String {
        std::env::var(&self.api_key_env).unwrap_or_else(|_| "demo_key".into())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.serpforge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SerpforgeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.serpforge/serpforge.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SerpforgeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SerpforgeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SerpforgeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SerpforgeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SerpforgeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve the database path, expanding a leading `~`.
pub fn resolve_db_path(config: &AppConfig) -> Result<PathBuf> {
    let raw = &config.defaults.db_path;
    if let Some(rest) = raw.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| SerpforgeError::config("could not determine home directory"))?;
        Ok(home.join(rest))
    } else {
        Ok(PathBuf::from(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("db_path"));
        assert!(toml_str.contains("duckduckgo"));
        assert!(toml_str.contains("AI_ASSISTANT_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.serp_results, 5);
        assert_eq!(parsed.defaults.max_workers, 3);
        assert_eq!(parsed.fetch.timeout_secs, 15);
        assert_eq!(parsed.fetch.retries, 2);
        assert_eq!(parsed.fetch.backoff_ms, 600);
    }

    #[test]
    fn rules_section_overrides() {
        let toml_str = r#"
[defaults]
serp_results = 3

[rules]
cta_phrases = ["позвонить нам"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.serp_results, 3);
        assert_eq!(config.rules.cta_phrases, vec!["позвонить нам".to_string()]);
        // Untouched rule tables keep defaults.
        assert_eq!(config.rules.legal_patterns.len(), 4);
    }

    #[test]
    fn db_path_tilde_expansion() {
        let config = AppConfig::default();
        let path = resolve_db_path(&config).expect("resolve");
        assert!(path.is_absolute());
        assert!(path.ends_with(".serpforge/research.db"));
    }
}
