//! Configuration file parser for ~/.config/feedex/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted but logged as potential typos. Command-line
//! flags are applied on top of whatever the file provides.
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::feed::{ExtractOptions, ProxyOptions, RetrieverOptions};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// CLI configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
///
/// Header values that look like credentials are masked in `Debug` output.
#[derive(Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Map to the canonical schema; `false` returns the dialect-native object.
    pub normalization: bool,

    /// Rewrite dates as ISO 8601 UTC.
    pub use_iso_date_format: bool,

    /// Root URL used to absolutize relative links.
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Overrides the default User-Agent.
    pub user_agent: Option<String>,

    /// URL-prefix proxy; the percent-encoded feed URL is appended to it.
    pub proxy_target: Option<String>,

    /// HTTP(S) proxy the client connects through.
    pub http_proxy: Option<String>,

    /// Extra request headers.
    pub headers: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            normalization: true,
            use_iso_date_format: false,
            base_url: None,
            timeout_secs: 30,
            user_agent: None,
            proxy_target: None,
            http_proxy: None,
            headers: HashMap::new(),
        }
    }
}

fn is_sensitive_header(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    ["auth", "token", "key", "cookie", "secret"]
        .iter()
        .any(|needle| name.contains(needle))
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let headers: HashMap<&str, &str> = self
            .headers
            .iter()
            .map(|(name, value)| {
                let shown = if is_sensitive_header(name) {
                    "[REDACTED]"
                } else {
                    value.as_str()
                };
                (name.as_str(), shown)
            })
            .collect();

        f.debug_struct("Config")
            .field("normalization", &self.normalization)
            .field("use_iso_date_format", &self.use_iso_date_format)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("proxy_target", &self.proxy_target)
            .field("http_proxy", &self.http_proxy)
            .field("headers", &headers)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "normalization",
        "use_iso_date_format",
        "base_url",
        "timeout_secs",
        "user_agent",
        "proxy_target",
        "http_proxy",
        "headers",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Extraction options described by this configuration.
    pub fn extract_options(&self) -> ExtractOptions {
        let mut builder = ExtractOptions::builder()
            .normalization(self.normalization)
            .use_iso_date_format(self.use_iso_date_format);
        if let Some(base_url) = &self.base_url {
            builder = builder.base_url(base_url.clone());
        }
        builder.build()
    }

    /// Retriever options described by this configuration.
    ///
    /// `user_agent` becomes a `user-agent` header unless `[headers]` already
    /// sets one. With a proxy target, the same headers go to the proxy.
    pub fn retriever_options(&self) -> RetrieverOptions {
        let mut headers = self.headers.clone();
        if let Some(agent) = &self.user_agent {
            let has_agent = headers.keys().any(|k| k.eq_ignore_ascii_case("user-agent"));
            if !has_agent {
                headers.insert("user-agent".to_owned(), agent.clone());
            }
        }

        let proxy = self.proxy_target.as_ref().map(|target| ProxyOptions {
            target: target.clone(),
            headers: headers.clone(),
        });

        RetrieverOptions {
            headers,
            proxy,
            http_proxy: self.http_proxy.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
