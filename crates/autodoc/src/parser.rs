//! Host block parsing.
//!
//! The autodoc pipeline only needs two things from the host markdown
//! parser: turning a plain block into tree nodes, and heading elements the
//! TOC scan can see. [`CmarkBlockParser`] is a reference implementation on
//! top of `pulldown-cmark`: headings become [`Element`]s with unique ids,
//! everything else is rendered to HTML and stashed.

use std::collections::HashMap;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::matcher::TAB_LENGTH;
use crate::stash::HtmlStash;
use crate::tree::Element;

/// Parses one plain markdown block into `parent`.
pub trait BlockParser {
    /// Append the nodes for `block` to `parent`.
    fn parse_block(&mut self, parent: &mut Element, block: &str, stash: &mut HtmlStash);
}

/// Split a document into blocks separated by blank lines.
///
/// Tabs are expanded to [`TAB_LENGTH`] columns. A fenced code region
/// (```` ``` ```` or `~~~` through its closing fence) always forms a block of
/// its own, blank lines included; see [`is_fenced`].
pub fn split_blocks(source: &str) -> Vec<String> {
    let normalized = source.replace("\r\n", "\n");
    let mut blocks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut open: Option<Fence> = None;

    for line in normalized.split('\n').map(expand_tabs) {
        if let Some(fence) = &open {
            let closes = fence.closed_by(&line);
            current.push(line);
            if closes {
                push_block(&mut blocks, &mut current);
                open = None;
            }
        } else if let Some(fence) = Fence::opened_by(&line) {
            push_block(&mut blocks, &mut current);
            current.push(line);
            open = Some(fence);
        } else if line.trim().is_empty() {
            push_block(&mut blocks, &mut current);
        } else {
            current.push(line);
        }
    }
    push_block(&mut blocks, &mut current);
    blocks
}

/// Whether `block` is a fenced code region produced by [`split_blocks`].
///
/// Its content is literal: instructions inside are not run.
pub fn is_fenced(block: &str) -> bool {
    block.lines().next().and_then(Fence::opened_by).is_some()
}

fn push_block(blocks: &mut Vec<String>, lines: &mut Vec<String>) {
    let block = lines.join("\n");
    lines.clear();
    if !block.trim().is_empty() {
        blocks.push(block);
    }
}

/// Replace tabs with spaces up to the next multiple of [`TAB_LENGTH`].
fn expand_tabs(line: &str) -> String {
    if !line.contains('\t') {
        return line.to_owned();
    }
    let mut expanded = String::with_capacity(line.len() + TAB_LENGTH);
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let width = TAB_LENGTH - column % TAB_LENGTH;
            expanded.extend(std::iter::repeat_n(' ', width));
            column += width;
        } else {
            expanded.push(c);
            column += 1;
        }
    }
    expanded
}

/// Opening code fence: at most three spaces of indent, then three or more
/// backticks or tildes.
struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    fn opened_by(line: &str) -> Option<Self> {
        let rest = strip_fence_indent(line)?;
        let marker = rest.chars().next().filter(|c| matches!(c, '`' | '~'))?;
        let len = rest.chars().take_while(|&c| c == marker).count();
        if len < 3 {
            return None;
        }
        // Backtick info strings cannot contain backticks.
        if marker == '`' && rest[len..].contains('`') {
            return None;
        }
        Some(Self { marker, len })
    }

    fn closed_by(&self, line: &str) -> bool {
        let Some(rest) = strip_fence_indent(line) else {
            return false;
        };
        let len = rest.chars().take_while(|&c| c == self.marker).count();
        len >= self.len && rest[len..].trim().is_empty()
    }
}

fn strip_fence_indent(line: &str) -> Option<&str> {
    let rest = line.trim_start_matches(' ');
    (line.len() - rest.len() <= 3).then_some(rest)
}

/// Reference block parser based on `pulldown-cmark`.
///
/// Blocks are parsed independently, so constructs spanning blank lines
/// (loose lists) are split. Fenced code arrives whole from
/// [`split_blocks`]. Heading content is kept as plain text.
#[derive(Debug, Default)]
pub struct CmarkBlockParser {
    gfm: bool,
    id_counts: HashMap<String, usize>,
}

impl CmarkBlockParser {
    /// Create a parser with GFM extensions enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gfm: true,
            id_counts: HashMap::new(),
        }
    }

    /// Enable or disable GFM extensions (tables, strikethrough, task lists).
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Parser options based on GFM configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let base = Options::ENABLE_HEADING_ATTRIBUTES;
        if self.gfm {
            base | Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
        } else {
            base
        }
    }

    /// Generate a unique id for a heading.
    fn generate_id(&mut self, text: &str) -> String {
        let mut base_id = slugify(text);
        if base_id.is_empty() {
            base_id.push_str("section");
        }
        let count = self.id_counts.entry(base_id.clone()).or_default();
        let id = match *count {
            0 => base_id,
            n => format!("{base_id}_{n}"),
        };
        *count += 1;
        id
    }
}

/// Heading being collected.
struct PendingHeading {
    level: usize,
    id: Option<String>,
    text: String,
}

impl BlockParser for CmarkBlockParser {
    fn parse_block(&mut self, parent: &mut Element, block: &str, stash: &mut HtmlStash) {
        let mut events: Vec<Event<'_>> = Vec::new();
        let mut heading: Option<PendingHeading> = None;

        for event in Parser::new_ext(block, self.parser_options()) {
            match event {
                Event::Start(Tag::Heading { level, id, .. }) => {
                    flush(parent, &mut events, stash);
                    heading = Some(PendingHeading {
                        level: level as usize,
                        id: id.map(|id| id.to_string()),
                        text: String::new(),
                    });
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(done) = heading.take() {
                        let text = done.text.trim().to_owned();
                        let id = match done.id {
                            Some(id) => id,
                            None => self.generate_id(&text),
                        };
                        parent.children.push(
                            Element::new(format!("h{}", done.level))
                                .with_attr("id", id)
                                .with_text(text),
                        );
                    }
                }
                Event::Text(text) | Event::Code(text) if heading.is_some() => {
                    if let Some(pending) = heading.as_mut() {
                        pending.text.push_str(&text);
                    }
                }
                other if heading.is_none() => events.push(other),
                _ => {}
            }
        }
        flush(parent, &mut events, stash);
    }
}

/// Render buffered events to HTML and append their placeholder.
fn flush(parent: &mut Element, events: &mut Vec<Event<'_>>, stash: &mut HtmlStash) {
    if events.is_empty() {
        return;
    }
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, events.drain(..));
    parent.append_text(&stash.store(html));
}

/// Convert text to URL-safe slug.
///
/// Converts to lowercase, replaces whitespace/dashes/underscores with single dashes,
/// and removes other non-alphanumeric characters.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}
