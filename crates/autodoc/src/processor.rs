//! Block resolution.
//!
//! [`AutoDocProcessor`] claims blocks containing a `:::` instruction, runs
//! the instruction through the handler it names, and inserts the result in
//! the document tree as a `div.autodoc` container: the rendered markup is
//! stashed as the container's text, and copies of the handler's headings are
//! its children so the TOC scan can see them. The container is removed again
//! by [`remove_duplicated_headings`](crate::headings::remove_duplicated_headings).

use std::collections::VecDeque;
use std::sync::Arc;

use crate::anchors;
use crate::error::AutodocError;
use crate::handler::{CollectorItem, Handler, RenderError};
use crate::headings::AUTODOC_CLASS;
use crate::inventory::{CrossRefs, Inventory};
use crate::matcher;
use crate::options::{Configuration, OptionSet};
use crate::parser::BlockParser;
use crate::registry::{DocumentId, Handlers};
use crate::stash::HtmlStash;
use crate::tree::Element;

/// Result of resolving one instruction.
pub struct ResolvedBlock {
    /// Rendered HTML.
    pub markup: String,
    /// Handler that produced it.
    pub handler: Arc<dyn Handler>,
    /// Data collected for the identifier.
    pub item: CollectorItem,
    /// Options the item was collected and rendered with.
    pub options: OptionSet,
}

/// Resolves `:::` instructions of one document.
#[derive(Debug)]
pub struct AutoDocProcessor {
    handlers: Arc<Handlers>,
    inventory: Arc<Inventory>,
    crossrefs: Arc<CrossRefs>,
    document: DocumentId,
    page: Option<String>,
}

impl AutoDocProcessor {
    /// Create a processor for `document`, rendered as `page` when known.
    pub fn new(
        handlers: Arc<Handlers>,
        inventory: Arc<Inventory>,
        crossrefs: Arc<CrossRefs>,
        document: DocumentId,
        page: Option<String>,
    ) -> Self {
        Self {
            handlers,
            inventory,
            crossrefs,
            document,
            page,
        }
    }

    /// Whether `block` contains an instruction.
    pub fn test(&self, block: &str) -> bool {
        matcher::is_match(block)
    }

    /// Consume the front block of `blocks`.
    ///
    /// Text before the instruction goes to `parser`, the rest of the block is
    /// requeued in front of `blocks`. A block without instruction is handed to
    /// `parser` whole.
    pub fn run(
        &self,
        parent: &mut Element,
        blocks: &mut VecDeque<String>,
        parser: &mut dyn BlockParser,
        stash: &mut HtmlStash,
    ) -> Result<(), AutodocError> {
        let Some(block) = blocks.pop_front() else {
            return Ok(());
        };
        let Some((before, instruction)) = matcher::match_block(&block, blocks) else {
            parser.parse_block(parent, &block, stash);
            return Ok(());
        };
        if let Some(before) = before {
            parser.parse_block(parent, before, stash);
        }

        let resolved = self.process_block(
            &instruction.identifier,
            &instruction.config_text,
            instruction.heading_level,
        )?;
        let headings = resolved.handler.get_headings(&resolved.item, &resolved.options);
        anchors::register_headings(
            self.page.as_deref(),
            resolved.handler.as_ref(),
            &headings,
            &self.inventory,
            &self.crossrefs,
        );

        let mut container = Element::new("div").with_attr("class", AUTODOC_CLASS);
        container.text = Some(stash.store(resolved.markup));
        container.children = headings;
        parent.children.push(container);
        Ok(())
    }

    /// Collect and render `identifier` with the handler its configuration
    /// selects.
    ///
    /// `heading_level` is the number of `#` before the marker; a non-zero
    /// value overrides the `heading_level` option.
    pub fn process_block(
        &self,
        identifier: &str,
        config_text: &str,
        heading_level: u8,
    ) -> Result<ResolvedBlock, AutodocError> {
        let configuration = Configuration::parse(config_text);
        let (handler_name, handler_config) = self.handlers.resolve(&configuration);
        let handler = self.handlers.get_or_create(&handler_name, &handler_config)?;

        let options = OptionSet::build(
            configuration.local_options(),
            handler_config.options.clone(),
            heading_level,
        );

        tracing::debug!(identifier, handler = %handler_name, "Collecting data");
        let item = handler.collect(identifier, &options).map_err(|source| {
            tracing::error!(identifier, page = ?self.page, error = %source, "Could not collect");
            AutodocError::Collection {
                identifier: identifier.to_owned(),
                page: self.page.clone(),
                source,
            }
        })?;

        self.handlers
            .ensure_env(self.document, &handler_name, handler.as_ref());

        tracing::debug!(identifier, handler = %handler_name, "Rendering");
        let markup = handler.render(&item, &options).map_err(|source| match source {
            RenderError::TemplateNotFound { template } => {
                tracing::error!(
                    template = %template,
                    handler = %handler_name,
                    theme = self.handlers.theme(),
                    "Template not found"
                );
                AutodocError::TemplateMissing {
                    template,
                    handler: handler_name.clone(),
                    theme: self.handlers.theme().to_owned(),
                }
            }
            other => AutodocError::Render {
                identifier: identifier.to_owned(),
                handler: handler_name.clone(),
                source: other,
            },
        })?;

        Ok(ResolvedBlock {
            markup,
            handler,
            item,
            options,
        })
    }
}
