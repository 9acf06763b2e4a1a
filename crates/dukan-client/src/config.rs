//! # Register Configuration
//!
//! Configuration management for a register terminal.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     DUKAN_API_URL=http://192.168.1.10:5000                             │
//! │     DUKAN_SEARCH_DEBOUNCE_MS=250                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pos/register.toml (Linux)                                │
//! │     ~/Library/Application Support/com.dukan.pos/register.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://127.0.0.1:5000, 300ms debounce, 100ms scanner gap           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # register.toml
//! [api]
//! base_url = "http://127.0.0.1:5000"
//!
//! [scanner]
//! keystroke_gap_ms = 100
//! min_length = 4
//! max_buffer = 50
//!
//! [search]
//! debounce_ms = 300
//! min_query_len = 2
//!
//! [store]
//! name = "Main Street"
//! currency_symbol = "ج.م"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use dukan_core::barcode::ScannerTuning;
use dukan_core::{
    Money, MIN_SEARCH_QUERY_LEN, SCANNER_KEYSTROKE_GAP_MS, SCANNER_MAX_BUFFER, SCANNER_MIN_LENGTH,
    SEARCH_DEBOUNCE_MS,
};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// API Settings
// =============================================================================

/// Where the sales API lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Origin of the sales API. Endpoint paths are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
        }
    }
}

impl ApiSettings {
    /// Parses the base URL.
    pub fn url(&self) -> ClientResult<Url> {
        let url = Url::parse(&self.base_url)?;
        if url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(format!(
                "{} cannot be used as a base URL",
                self.base_url
            )));
        }
        Ok(url)
    }
}

// =============================================================================
// Scanner Settings
// =============================================================================

/// Hardware scanner heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerSettings {
    /// Longest gap between two keystrokes of one scan (milliseconds).
    #[serde(default = "default_keystroke_gap")]
    pub keystroke_gap_ms: u64,

    /// Shortest burst accepted as a scan.
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    /// Buffer is dropped past this many characters.
    #[serde(default = "default_max_buffer")]
    pub max_buffer: usize,
}

fn default_keystroke_gap() -> u64 {
    SCANNER_KEYSTROKE_GAP_MS
}

fn default_min_length() -> usize {
    SCANNER_MIN_LENGTH
}

fn default_max_buffer() -> usize {
    SCANNER_MAX_BUFFER
}

impl Default for ScannerSettings {
    fn default() -> Self {
        ScannerSettings {
            keystroke_gap_ms: default_keystroke_gap(),
            min_length: default_min_length(),
            max_buffer: default_max_buffer(),
        }
    }
}

impl ScannerSettings {
    /// Converts the settings into detector tuning.
    pub fn tuning(&self) -> ScannerTuning {
        ScannerTuning {
            max_gap: Duration::from_millis(self.keystroke_gap_ms),
            min_length: self.min_length,
            max_buffer: self.max_buffer,
        }
    }
}

// =============================================================================
// Search Settings
// =============================================================================

/// Product search behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Input inactivity before a query is sent (milliseconds).
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,

    /// Queries shorter than this clear the results instead.
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,
}

fn default_debounce() -> u64 {
    SEARCH_DEBOUNCE_MS
}

fn default_min_query_len() -> usize {
    MIN_SEARCH_QUERY_LEN
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            debounce_ms: default_debounce(),
            min_query_len: default_min_query_len(),
        }
    }
}

impl SearchSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// =============================================================================
// Store Settings
// =============================================================================

/// Display settings for the store this register belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Human-readable store name.
    #[serde(default = "default_store_name")]
    pub name: String,

    /// Currency symbol printed after amounts.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_store_name() -> String {
    "Dukan".to_string()
}

fn default_currency_symbol() -> String {
    "ج.م".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete register configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub scanner: ScannerSettings,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub store: StoreSettings,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (register.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading register config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load register config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Register config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = self.api.url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.scanner.min_length == 0 {
            return Err(ClientError::InvalidConfig(
                "scanner.min_length must be greater than 0".into(),
            ));
        }

        if self.scanner.max_buffer < self.scanner.min_length {
            return Err(ClientError::InvalidConfig(
                "scanner.max_buffer must not be smaller than scanner.min_length".into(),
            ));
        }

        if self.search.min_query_len == 0 {
            return Err(ClientError::InvalidConfig(
                "search.min_query_len must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DUKAN_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Ok(ms) = std::env::var("DUKAN_SEARCH_DEBOUNCE_MS") {
            match ms.parse::<u64>() {
                Ok(ms) => self.search.debounce_ms = ms,
                Err(_) => warn!(value = %ms, "Ignoring invalid DUKAN_SEARCH_DEBOUNCE_MS"),
            }
        }

        if let Ok(ms) = std::env::var("DUKAN_SCANNER_GAP_MS") {
            match ms.parse::<u64>() {
                Ok(ms) => self.scanner.keystroke_gap_ms = ms,
                Err(_) => warn!(value = %ms, "Ignoring invalid DUKAN_SCANNER_GAP_MS"),
            }
        }

        if let Ok(name) = std::env::var("DUKAN_STORE_NAME") {
            self.store.name = name;
        }

        if let Ok(symbol) = std::env::var("DUKAN_CURRENCY_SYMBOL") {
            self.store.currency_symbol = symbol;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "dukan", "pos")
            .map(|dirs| dirs.config_dir().join("register.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Formats an amount for display, e.g. `12.50 ج.م`.
    pub fn format_currency(&self, amount: Money) -> String {
        format!("{} {}", amount, self.store.currency_symbol)
    }

    pub fn scanner_tuning(&self) -> ScannerTuning {
        self.scanner.tuning()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.search.debounce(), Duration::from_millis(300));
        assert_eq!(config.search.min_query_len, 2);
        assert_eq!(config.scanner_tuning(), ScannerTuning::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();

        config.api.base_url = "ws://localhost:5000".to_string();
        assert!(matches!(config.validate(), Err(ClientError::InvalidUrl(_))));

        config.api.base_url = "not a url".to_string();
        assert!(config.validate().unwrap_err().is_config_error());

        config.api.base_url = "https://pos.example.com/shop/".to_string();
        assert!(config.validate().is_ok());

        config.scanner.max_buffer = 2;
        assert!(matches!(config.validate(), Err(ClientError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            base_url = "http://10.0.0.5:8000"

            [search]
            debounce_ms = 150
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://10.0.0.5:8000");
        assert_eq!(config.search.debounce_ms, 150);
        assert_eq!(config.search.min_query_len, 2);
        assert_eq!(config.scanner.keystroke_gap_ms, 100);
    }

    #[test]
    fn test_format_currency() {
        let mut config = ClientConfig::default();
        config.store.currency_symbol = "EGP".to_string();
        assert_eq!(config.format_currency(Money::from_cents(1250)), "12.50 EGP");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("register.toml");

        let mut config = ClientConfig::default();
        config.api.base_url = "http://10.0.0.5:8000".to_string();
        config.store.name = "Dukan Heliopolis".to_string();
        config.search.debounce_ms = 200;
        config.save(Some(path.clone())).unwrap();

        let loaded = ClientConfig::load(Some(path)).unwrap();
        assert_eq!(loaded.api.base_url, "http://10.0.0.5:8000");
        assert_eq!(loaded.store.name, "Dukan Heliopolis");
        assert_eq!(loaded.search.debounce_ms, 200);
        assert_eq!(loaded.scanner.max_buffer, config.scanner.max_buffer);
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("register.toml");
        std::fs::write(&path, "[scanner]\nmin_length = 0\n").unwrap();

        assert!(ClientConfig::load(Some(path.clone()))
            .unwrap_err()
            .is_config_error());

        let config = ClientConfig::load_or_default(Some(path));
        assert_eq!(config.scanner.min_length, ClientConfig::default().scanner.min_length);
    }

    #[test]
    fn test_toml_serialization() {
        let config = ClientConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[scanner]"));
        assert!(toml_str.contains("[search]"));
    }
}
