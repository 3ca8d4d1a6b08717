//! Autodoc instructions for markdown.
//!
//! A line `::: identifier` in a markdown document is replaced by the
//! documentation a pluggable [`Handler`] collects and renders for that
//! identifier. Handlers are registered by name on [`Handlers`]; each
//! instruction picks one through its YAML configuration:
//!
//! ```markdown
//! ## ::: package.module.Class
//!     handler: python
//!     options:
//!       show_source: false
//! ```
//!
//! # Architecture
//!
//! - [`matcher`]: finds instructions and splits blocks around them
//! - [`OptionSet`]: local options layered over the handler's global options
//! - [`Handlers`]: handler factories, live instances and per-document env
//! - [`AutoDocProcessor`]: resolves an instruction and inserts the result
//! - [`register_headings`]: records anchors in [`CrossRefs`] and [`Inventory`]
//! - [`remove_duplicated_headings`] and [`override_toc_labels`]: tree passes
//!   run after the TOC is built
//! - [`AutodocExtension`]: the whole pipeline for one document
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeSet;
//! use std::sync::Arc;
//!
//! use autodoc::{
//!     AutodocExtension, CollectionError, CollectorItem, CrossRefs, Element, Handler, Handlers,
//!     Inventory, OptionSet, RenderError,
//! };
//! use autodoc_config::{Config, HandlerConfig};
//!
//! struct Shout;
//!
//! impl Handler for Shout {
//!     fn name(&self) -> &str { "shout" }
//!     fn domain(&self) -> &str { "txt" }
//!
//!     fn collect(
//!         &self,
//!         identifier: &str,
//!         _options: &OptionSet,
//!     ) -> Result<CollectorItem, CollectionError> {
//!         Ok(Box::new(identifier.to_uppercase()))
//!     }
//!
//!     fn render(
//!         &self,
//!         item: &CollectorItem,
//!         _options: &OptionSet,
//!     ) -> Result<String, RenderError> {
//!         let text = item.downcast_ref::<String>().ok_or_else(|| RenderError::other("bad item"))?;
//!         Ok(format!("<p>{text}</p>"))
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
//!
//! let mut config = Config::default();
//! config.default_handler = "shout".to_owned();
//! let handlers = Handlers::new(&config).with_factory(
//!     "shout",
//!     |_: &str, _: &HandlerConfig| -> Arc<dyn Handler> { Arc::new(Shout) },
//! );
//! let extension = AutodocExtension::new(
//!     &config,
//!     Arc::new(handlers),
//!     Arc::new(Inventory::new()),
//!     Arc::new(CrossRefs::new()),
//! );
//!
//! let converted = extension.convert("::: hello", None).unwrap();
//! assert_eq!(converted.html, "<p>HELLO</p>");
//! ```

mod anchors;
mod error;
mod extension;
mod handler;
mod headings;
mod inventory;
pub mod matcher;
mod options;
mod parser;
mod processor;
mod registry;
mod stash;
mod toc;
mod tree;

pub use anchors::register_headings;
pub use error::AutodocError;
pub use extension::{AutodocExtension, Converted};
pub use handler::{CollectionError, CollectorItem, EnvContext, Handler, HandlerFactory, RenderError};
pub use headings::{AUTODOC_CLASS, remove_duplicated_headings};
pub use inventory::{CrossRefs, Inventory, InventoryItem, Priority};
pub use matcher::Instruction;
pub use options::{Configuration, HEADING_LEVEL, OptionSet, Options};
pub use parser::{BlockParser, CmarkBlockParser, is_fenced, slugify, split_blocks};
pub use processor::{AutoDocProcessor, ResolvedBlock};
pub use registry::{DocumentId, Handlers};
pub use stash::HtmlStash;
pub use toc::{TOC_LABEL_ATTR, TocToken, collect_toc, override_toc_labels};
pub use tree::{Element, escape_html};
