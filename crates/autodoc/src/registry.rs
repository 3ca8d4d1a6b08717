//! Handler registry.
//!
//! [`Handlers`] maps handler names to factories and keeps at most one live
//! instance per name for the whole build. It also records which handlers
//! already had their rendering environment prepared for which document.
//!
//! The instance map is only mutated through [`Handlers::get_or_create`].
//! The environment set grows through [`Handlers::ensure_env`] and shrinks
//! through [`Handlers::end_document`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use autodoc_cache::UrlCache;
use autodoc_config::{Config, HandlerConfig};

use crate::error::AutodocError;
use crate::handler::{EnvContext, Handler, HandlerFactory};
use crate::options::Configuration;

/// Identity of one document conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc-{}", self.0)
    }
}

/// Registry of handler factories and live handler instances.
pub struct Handlers {
    default_handler: String,
    theme: String,
    configs: BTreeMap<String, HandlerConfig>,
    factories: HashMap<String, Box<dyn HandlerFactory>>,
    instances: RwLock<HashMap<String, Arc<dyn Handler>>>,
    updated_envs: Mutex<HashSet<(String, DocumentId)>>,
    next_document: AtomicU64,
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut factories: Vec<_> = self.factories.keys().collect();
        factories.sort();
        f.debug_struct("Handlers")
            .field("default_handler", &self.default_handler)
            .field("theme", &self.theme)
            .field("factories", &factories)
            .finish_non_exhaustive()
    }
}

impl Handlers {
    /// Create an empty registry from the loaded configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            default_handler: config.default_handler.clone(),
            theme: config.theme.clone(),
            configs: config.handlers.clone(),
            factories: HashMap::new(),
            instances: RwLock::new(HashMap::new()),
            updated_envs: Mutex::new(HashSet::new()),
            next_document: AtomicU64::new(0),
        }
    }

    /// Register the factory building the handler called `name`.
    #[must_use]
    pub fn with_factory<F: HandlerFactory + 'static>(mut self, name: &str, factory: F) -> Self {
        self.factories.insert(name.to_owned(), Box::new(factory));
        self
    }

    /// Active theme name.
    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Handler name and global configuration for an instruction.
    pub fn resolve(&self, configuration: &Configuration) -> (String, HandlerConfig) {
        let name = configuration
            .handler
            .clone()
            .unwrap_or_else(|| self.default_handler.clone());
        let config = self.handler_config(&name);
        (name, config)
    }

    /// Global configuration of `name`, empty if not configured.
    pub fn handler_config(&self, name: &str) -> HandlerConfig {
        self.configs.get(name).cloned().unwrap_or_default()
    }

    /// Return the live handler called `name`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`AutodocError::UnknownHandler`] if no factory is registered.
    pub fn get_or_create(
        &self,
        name: &str,
        config: &HandlerConfig,
    ) -> Result<Arc<dyn Handler>, AutodocError> {
        if let Some(handler) = self
            .instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Ok(Arc::clone(handler));
        }

        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| AutodocError::UnknownHandler(name.to_owned()))?;

        let mut instances = self.instances.write().unwrap_or_else(PoisonError::into_inner);
        let handler = instances.entry(name.to_owned()).or_insert_with(|| {
            tracing::debug!(handler = name, "Creating handler");
            factory.create(name, config)
        });
        Ok(Arc::clone(handler))
    }

    /// Names of the handlers created so far, sorted.
    pub fn loaded(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Start a new document conversion.
    pub fn begin_document(&self) -> DocumentId {
        DocumentId(self.next_document.fetch_add(1, Ordering::Relaxed))
    }

    /// Prepare `handler`'s rendering environment for `document`, once.
    ///
    /// Returns `true` if [`Handler::update_env`] ran on this call.
    pub fn ensure_env(&self, document: DocumentId, name: &str, handler: &dyn Handler) -> bool {
        let first = self
            .updated_envs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((name.to_owned(), document));
        if first {
            tracing::debug!(handler = name, %document, "Updating handler's rendering env");
            let config = self.handler_config(name);
            handler.update_env(&EnvContext {
                document,
                theme: &self.theme,
                config: &config,
            });
        }
        first
    }

    /// Finish `document`, forgetting which handlers prepared their env for it.
    pub fn end_document(&self, document: DocumentId) {
        self.updated_envs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(_, doc)| *doc != document);
        tracing::debug!(%document, "Document finished");
    }

    /// Number of (handler, document) pairs with a prepared env.
    #[cfg(test)]
    pub(crate) fn tracked_envs(&self) -> usize {
        self.updated_envs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Download the inventories listed in `name`'s `import` config and load
    /// them into the handler.
    ///
    /// Failed downloads or loads are logged and skipped. Returns the number
    /// of inventories loaded.
    ///
    /// # Errors
    ///
    /// Returns [`AutodocError::UnknownHandler`] if no factory is registered.
    pub fn import_inventories(&self, name: &str, cache: &UrlCache) -> Result<usize, AutodocError> {
        let config = self.handler_config(name);
        if config.import.is_empty() {
            return Ok(0);
        }

        let handler = self.get_or_create(name, &config)?;
        let mut loaded = 0;
        for url in &config.import {
            let content = match cache.fetch(url) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(handler = name, error = %e, "Failed to download inventory");
                    continue;
                }
            };
            match handler.load_inventory(&content, url) {
                Ok(()) => loaded += 1,
                Err(e) => tracing::warn!(handler = name, error = %e, "Failed to load inventory"),
            }
        }
        Ok(loaded)
    }
}
