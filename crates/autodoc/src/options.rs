//! Instruction configuration and layered options.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A mapping of option names to values.
pub type Options = Map<String, Value>;

/// Option key overridden by heading markers in front of `:::`.
pub const HEADING_LEVEL: &str = "heading_level";

/// YAML configuration written under an instruction.
///
/// ```yaml
/// handler: python
/// options:
///   show_source: false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Configuration {
    /// Handler name; `None` selects the configured default.
    #[serde(default)]
    pub handler: Option<String>,
    /// Local options.
    #[serde(default)]
    pub options: Option<Options>,
}

impl Configuration {
    /// Parse the configuration text of an instruction.
    ///
    /// Empty text yields the empty configuration. Malformed text is reported
    /// with a warning and also yields the empty configuration, so an authoring
    /// mistake never aborts the build.
    pub fn parse(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self::default();
        }
        match serde_yaml::from_str::<Option<Self>>(text) {
            Ok(config) => config.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Malformed instruction configuration, using defaults");
                Self::default()
            }
        }
    }

    /// Local options, empty when absent.
    pub fn local_options(&self) -> Options {
        self.options.clone().unwrap_or_default()
    }
}

/// Read-only layered view over local and global options.
///
/// Lookups return the value of the first layer defining the key:
/// the heading level override (when requested), then local, then global.
/// Nested values are never merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSet {
    heading_level: Option<Value>,
    local: Options,
    global: Options,
}

impl OptionSet {
    /// Layer `local` over `global`; a non-zero `heading_level` wins over both.
    #[must_use]
    pub fn build(local: Options, global: Options, heading_level: u8) -> Self {
        Self {
            heading_level: (heading_level > 0).then(|| Value::from(heading_level)),
            local,
            global,
        }
    }

    /// Options from a single mapping (e.g., a handler's fallback config).
    #[must_use]
    pub fn from_options(options: Options) -> Self {
        Self::build(options, Options::new(), 0)
    }

    /// Look up `key` across the layers.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if key == HEADING_LEVEL
            && let Some(level) = &self.heading_level
        {
            return Some(level);
        }
        self.local.get(key).or_else(|| self.global.get(key))
    }

    /// Look up `key` and deserialize it, `None` if absent or of the wrong shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Whether any layer defines `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Collapse the layers into one mapping with the same precedence.
    pub fn flatten(&self) -> Options {
        let mut flat = self.global.clone();
        for (key, value) in &self.local {
            flat.insert(key.clone(), value.clone());
        }
        if let Some(level) = &self.heading_level {
            flat.insert(HEADING_LEVEL.to_owned(), level.clone());
        }
        flat
    }
}
