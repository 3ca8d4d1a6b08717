//! Configuration management for autodoc.
//!
//! Parses `autodoc.toml` with serde and auto-discovers the file in parent
//! directories. Programmatic overrides can be applied during load via
//! [`Settings`].
//!
//! ## Environment Variable Expansion
//!
//! String values support `${VAR}` and `${VAR:-default}`.
//!
//! Expanded fields:
//! - `default_handler`
//! - `theme`
//! - `cache.dir`
//!
//! Handler `import` URLs are expanded later, at download time, so that
//! credentials never end up in logs or resolved configuration.

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "autodoc.toml";

/// Handler used when neither the instruction nor the config names one.
const DEFAULT_HANDLER: &str = "python";

/// Theme used to pick handler templates when none is configured.
const DEFAULT_THEME: &str = "default";

/// Default lifetime of downloaded inventories.
const DEFAULT_MAX_AGE_SECS: u64 = 24 * 60 * 60;

/// Default HTTP timeout for inventory downloads.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Overrides applied on top of the loaded file.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct Settings {
    /// Override the default handler name.
    pub default_handler: Option<String>,
    /// Override the theme name.
    pub theme: Option<String>,
    /// Override the download cache directory.
    pub cache_dir: Option<PathBuf>,
}

/// Autodoc configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Handler used by instructions without a `handler:` key.
    pub default_handler: String,
    /// Active theme, passed to handlers for template lookup.
    pub theme: String,
    /// Per-handler global configuration, keyed by handler name.
    pub handlers: BTreeMap<String, HandlerConfig>,
    /// Download cache section as written in TOML.
    cache: CacheConfigRaw,

    /// Resolved cache configuration (set after loading).
    #[serde(skip)]
    pub cache_resolved: CacheConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Global configuration of one handler.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Global options, overridden key-by-key by instruction-local options.
    pub options: Map<String, Value>,
    /// URLs of cross-reference inventories to load into the handler.
    pub import: Vec<String>,
    /// Any other handler-specific keys, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Raw cache configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CacheConfigRaw {
    dir: Option<String>,
    max_age_secs: Option<u64>,
    timeout_secs: Option<u64>,
}

/// Resolved download cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Directory holding downloaded files.
    pub dir: PathBuf,
    /// How long a download stays fresh.
    pub max_age: Duration,
    /// HTTP timeout for a single download.
    pub timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".autodoc/cache"),
            max_age: Duration::from_secs(DEFAULT_MAX_AGE_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`cache.dir`").
        field: String,
        /// Error message (e.g., "${`CACHE_DIR`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional overrides.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `autodoc.toml` in the current directory and its parents, falling
    /// back to defaults.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        settings: Option<&Settings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = settings {
            config.apply_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Parse configuration from a TOML string, resolving paths against `base`.
    ///
    /// # Errors
    ///
    /// Returns error if parsing, expansion or validation fails.
    pub fn from_toml_str(content: &str, base: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.resolve_paths(base);
        config.validate()?;
        Ok(config)
    }

    fn apply_settings(&mut self, settings: &Settings) {
        if let Some(handler) = &settings.default_handler {
            self.default_handler.clone_from(handler);
        }
        if let Some(theme) = &settings.theme {
            self.theme.clone_from(theme);
        }
        if let Some(dir) = &settings.cache_dir {
            self.cache_resolved.dir.clone_from(dir);
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.default_handler, "default_handler")?;
        require_non_empty(&self.theme, "theme")?;

        if self.cache_resolved.timeout.is_zero() {
            return Err(ConfigError::Validation(
                "cache.timeout_secs must be greater than 0".to_owned(),
            ));
        }

        for (name, handler) in &self.handlers {
            for url in &handler.import {
                require_http_url(url, &format!("handlers.{name}.import"))?;
            }
        }

        Ok(())
    }

    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        let mut config = Self {
            default_handler: DEFAULT_HANDLER.to_owned(),
            theme: DEFAULT_THEME.to_owned(),
            handlers: BTreeMap::new(),
            cache: CacheConfigRaw::default(),
            cache_resolved: CacheConfig::default(),
            config_path: None,
        };
        config.resolve_paths(base);
        config
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        let mut config = Self::from_toml_str(&content, config_dir)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.default_handler = expand::expand_env(&self.default_handler, "default_handler")?;
        self.theme = expand::expand_env(&self.theme, "theme")?;
        if let Some(ref dir) = self.cache.dir {
            self.cache.dir = Some(expand::expand_env(dir, "cache.dir")?);
        }
        Ok(())
    }

    fn resolve_paths(&mut self, config_dir: &Path) {
        let defaults = CacheConfig::default();
        self.cache_resolved = CacheConfig {
            dir: self
                .cache
                .dir
                .as_deref()
                .map_or_else(|| config_dir.join(&defaults.dir), |dir| config_dir.join(dir)),
            max_age: self
                .cache
                .max_age_secs
                .map_or(defaults.max_age, Duration::from_secs),
            timeout: self
                .cache
                .timeout_secs
                .map_or(defaults.timeout, Duration::from_secs),
        };
    }
}
