//! Handler trait: the pluggable collector/renderer behind `::: identifier`.
//!
//! A handler turns an identifier into opaque collected data
//! ([`CollectorItem`]), renders that data to HTML, and describes the
//! headings and anchors the rendering produces. Handlers are created by
//! name through a [`HandlerFactory`] registered on
//! [`Handlers`](crate::Handlers).
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeSet;
//! use autodoc::{CollectionError, CollectorItem, Element, Handler, OptionSet, RenderError};
//!
//! struct Echo;
//!
//! impl Handler for Echo {
//!     fn name(&self) -> &str { "echo" }
//!     fn domain(&self) -> &str { "txt" }
//!
//!     fn collect(
//!         &self,
//!         identifier: &str,
//!         _options: &OptionSet,
//!     ) -> Result<CollectorItem, CollectionError> {
//!         Ok(Box::new(identifier.to_owned()))
//!     }
//!
//!     fn render(
//!         &self,
//!         item: &CollectorItem,
//!         _options: &OptionSet,
//!     ) -> Result<String, RenderError> {
//!         let name = item.downcast_ref::<String>().ok_or_else(|| RenderError::other("bad item"))?;
//!         Ok(format!("<p>{name}</p>"))
//!     }
//!
//!     fn get_headings(&self, _item: &CollectorItem, _options: &OptionSet) -> Vec<Element> {
//!         Vec::new()
//!     }
//!
//!     fn get_anchors(&self, _item: &CollectorItem) -> BTreeSet<String> {
//!         BTreeSet::new()
//!     }
//! }
//! ```

use std::any::Any;
use std::collections::BTreeSet;
use std::sync::Arc;

use autodoc_config::HandlerConfig;

use crate::options::{OptionSet, Options};
use crate::registry::DocumentId;
use crate::tree::Element;

/// Data collected by a handler; only that handler interprets it.
pub type CollectorItem = Box<dyn Any + Send + Sync>;

/// A handler could not resolve an identifier.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CollectionError {
    message: String,
}

impl CollectionError {
    /// Create an error with a human-readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A handler could not render collected data.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A template required by the active theme does not exist.
    #[error("template not found: {template}")]
    TemplateNotFound {
        /// Template name (e.g., "class.html").
        template: String,
    },
    /// Any other rendering failure.
    #[error("{0}")]
    Other(String),
}

impl RenderError {
    /// Create a generic rendering error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// What a handler sees when preparing to render for a document.
#[derive(Debug, Clone, Copy)]
pub struct EnvContext<'a> {
    /// Document being converted.
    pub document: DocumentId,
    /// Active theme name.
    pub theme: &'a str,
    /// The handler's global configuration.
    pub config: &'a HandlerConfig,
}

/// A documentation collector and renderer.
///
/// Implementations are shared across documents and must be thread-safe;
/// per-render state needs interior mutability.
pub trait Handler: Send + Sync {
    /// Registry name (e.g., "python").
    fn name(&self) -> &str;

    /// Inventory domain of the objects this handler documents (e.g., "py").
    fn domain(&self) -> &str;

    /// Collect data for `identifier`.
    fn collect(
        &self,
        identifier: &str,
        options: &OptionSet,
    ) -> Result<CollectorItem, CollectionError>;

    /// Render collected data to HTML.
    fn render(&self, item: &CollectorItem, options: &OptionSet) -> Result<String, RenderError>;

    /// Heading elements present in the rendering of `item`, in document order.
    ///
    /// Each heading should carry an `id`; a `data-role` marks it as an
    /// inventory object and `data-toc-label` overrides its TOC name.
    fn get_headings(&self, item: &CollectorItem, options: &OptionSet) -> Vec<Element>;

    /// Every anchor name `item` is reachable under (aliases included).
    fn get_anchors(&self, item: &CollectorItem) -> BTreeSet<String>;

    /// Options for the cheap lookup used when registering extra anchors.
    fn fallback_config(&self) -> Options {
        Options::new()
    }

    /// One-time preparation before the first render in a document.
    fn update_env(&self, _ctx: &EnvContext<'_>) {}

    /// Load a downloaded cross-reference inventory.
    fn load_inventory(&self, _content: &[u8], _url: &str) -> Result<(), CollectionError> {
        Ok(())
    }
}

/// Builds a handler from its global configuration.
pub trait HandlerFactory: Send + Sync {
    /// Create the handler registered as `name`.
    fn create(&self, name: &str, config: &HandlerConfig) -> Arc<dyn Handler>;
}

impl<F> HandlerFactory for F
where
    F: Fn(&str, &HandlerConfig) -> Arc<dyn Handler> + Send + Sync,
{
    fn create(&self, name: &str, config: &HandlerConfig) -> Arc<dyn Handler> {
        self(name, config)
    }
}
