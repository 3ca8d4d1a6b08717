//! Document conversion.
//!
//! [`AutodocExtension`] runs the whole pipeline for one markdown document:
//!
//! 1. Split the source into blocks and feed them to the
//!    [`AutoDocProcessor`] or the host [`BlockParser`]. Fenced code always
//!    goes to the block parser.
//! 2. Build the TOC from the tree, handler headings included.
//! 3. Drop the instruction containers and apply TOC label overrides.
//! 4. Serialize the tree and reveal the stashed HTML.
//!
//! Per-document handler env tracking is released when the conversion ends,
//! whether it succeeded or not.

use std::collections::VecDeque;
use std::sync::Arc;

use autodoc_cache::UrlCache;
use autodoc_config::Config;

use crate::error::AutodocError;
use crate::headings::remove_duplicated_headings;
use crate::inventory::{CrossRefs, Inventory};
use crate::parser::{BlockParser, CmarkBlockParser, is_fenced, split_blocks};
use crate::processor::AutoDocProcessor;
use crate::registry::{DocumentId, Handlers};
use crate::stash::HtmlStash;
use crate::toc::{TocToken, collect_toc, override_toc_labels};
use crate::tree::Element;

/// Output of converting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    /// Rendered HTML.
    pub html: String,
    /// Table of contents, labels overridden.
    pub toc: Vec<TocToken>,
}

/// Autodoc pipeline shared by all documents of a build.
#[derive(Debug, Clone)]
pub struct AutodocExtension {
    handlers: Arc<Handlers>,
    inventory: Arc<Inventory>,
    crossrefs: Arc<CrossRefs>,
    gfm: bool,
}

impl AutodocExtension {
    /// Create the pipeline around shared build state.
    pub fn new(
        config: &Config,
        handlers: Arc<Handlers>,
        inventory: Arc<Inventory>,
        crossrefs: Arc<CrossRefs>,
    ) -> Self {
        tracing::debug!(
            default_handler = %config.default_handler,
            theme = %config.theme,
            "Autodoc extension ready"
        );
        Self {
            handlers,
            inventory,
            crossrefs,
            gfm: true,
        }
    }

    /// Enable or disable GFM extensions of the reference block parser.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Handler registry.
    pub fn handlers(&self) -> &Arc<Handlers> {
        &self.handlers
    }

    /// Inventory filled by conversions.
    pub fn inventory(&self) -> &Arc<Inventory> {
        &self.inventory
    }

    /// Cross-references filled by conversions.
    pub fn crossrefs(&self) -> &Arc<CrossRefs> {
        &self.crossrefs
    }

    /// Download the inventories each configured handler imports and load
    /// them into the handlers.
    ///
    /// Downloads go through the URL cache described by `config`. Returns the
    /// number of inventories loaded; failed downloads are logged and skipped.
    pub fn import_inventories(&self, config: &Config) -> Result<usize, AutodocError> {
        let cache = UrlCache::new(
            config.cache_resolved.dir.clone(),
            config.cache_resolved.max_age,
            config.cache_resolved.timeout,
        );

        let mut loaded = 0;
        for (name, handler) in &config.handlers {
            if !handler.import.is_empty() {
                loaded += self.handlers.import_inventories(name, &cache)?;
            }
        }
        tracing::debug!(loaded, "Imported inventories");
        Ok(loaded)
    }

    /// Convert `source` with the reference block parser.
    ///
    /// `page` is the document's URL; anchors are only registered when known.
    pub fn convert(&self, source: &str, page: Option<&str>) -> Result<Converted, AutodocError> {
        let mut parser = CmarkBlockParser::new().with_gfm(self.gfm);
        self.convert_with(&mut parser, source, page)
    }

    /// Convert `source` with a host block parser.
    pub fn convert_with(
        &self,
        parser: &mut dyn BlockParser,
        source: &str,
        page: Option<&str>,
    ) -> Result<Converted, AutodocError> {
        let document = self.handlers.begin_document();
        tracing::debug!(%document, page, "Converting document");

        let converted = self.convert_document(document, parser, source, page);
        self.handlers.end_document(document);
        converted
    }

    fn convert_document(
        &self,
        document: DocumentId,
        parser: &mut dyn BlockParser,
        source: &str,
        page: Option<&str>,
    ) -> Result<Converted, AutodocError> {
        let processor = AutoDocProcessor::new(
            Arc::clone(&self.handlers),
            Arc::clone(&self.inventory),
            Arc::clone(&self.crossrefs),
            document,
            page.map(str::to_owned),
        );

        let mut stash = HtmlStash::new();
        let mut root = Element::new("div");
        let mut blocks: VecDeque<String> = split_blocks(source).into();

        while let Some(block) = blocks.front() {
            if !is_fenced(block) && processor.test(block) {
                processor.run(&mut root, &mut blocks, parser, &mut stash)?;
            } else if let Some(block) = blocks.pop_front() {
                parser.parse_block(&mut root, &block, &mut stash);
            }
        }

        let mut toc = collect_toc(&root);
        remove_duplicated_headings(&mut root);
        override_toc_labels(&mut toc);

        let html = stash.reveal(&root.inner_html());
        Ok(Converted { html, toc })
    }
}
