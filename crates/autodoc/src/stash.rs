//! Opaque HTML fragments.
//!
//! Raw HTML cannot live in the [`Element`](crate::Element) tree (text is
//! escaped on serialization) and must stay invisible to tree passes such as
//! the TOC scan. Fragments are stored here and represented in the tree by a
//! placeholder; [`HtmlStash::reveal`] swaps them back in after serialization.
//!
//! # Example
//!
//! ```
//! use autodoc::{Element, HtmlStash};
//!
//! let mut stash = HtmlStash::new();
//! let mut root = Element::new("div");
//! root.append_text(&stash.store("<em>raw</em>"));
//!
//! assert_eq!(stash.reveal(&root.inner_html()), "<em>raw</em>");
//! ```

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Placeholder delimiters; control characters never produced by the parser.
const STX: char = '\u{2}';
const ETX: char = '\u{3}';

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("\u{2}autodoc-stash:(\\d+)\u{3}").expect("valid placeholder regex")
});

/// Per-document store of raw HTML fragments.
#[derive(Debug, Default)]
pub struct HtmlStash {
    fragments: Vec<String>,
}

impl HtmlStash {
    /// Create an empty stash.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `html` and return the placeholder that stands for it.
    pub fn store(&mut self, html: impl Into<String>) -> String {
        let index = self.fragments.len();
        self.fragments.push(html.into());
        format!("{STX}autodoc-stash:{index}{ETX}")
    }

    /// Number of stored fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether nothing was stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Replace every placeholder in `html` with its fragment, in one pass.
    ///
    /// Placeholders with an unknown index are left as they are.
    pub fn reveal(&self, html: &str) -> String {
        PLACEHOLDER
            .replace_all(html, |caps: &Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.fragments.get(i))
                    .map_or_else(|| caps[0].to_owned(), Clone::clone)
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_store_returns_distinct_placeholders() {
        let mut stash = HtmlStash::new();
        let a = stash.store("<p>a</p>");
        let b = stash.store("<p>b</p>");
        assert_ne!(a, b);
        assert_eq!(stash.len(), 2);
    }

    #[test]
    fn test_reveal_in_order() {
        let mut stash = HtmlStash::new();
        let a = stash.store("<p>a</p>");
        let b = stash.store("<p>b</p>");
        let html = format!("{b}<hr>{a}");
        assert_eq!(stash.reveal(&html), "<p>b</p><hr><p>a</p>");
    }

    #[test]
    fn test_reveal_does_not_rescan_fragments() {
        let mut stash = HtmlStash::new();
        let inner = stash.store("inner");
        let outer = stash.store(format!("[{inner}]"));
        assert_eq!(stash.reveal(&outer), format!("[{inner}]"));
    }

    #[test]
    fn test_unknown_placeholder_kept() {
        let stash = HtmlStash::new();
        let html = "\u{2}autodoc-stash:7\u{3}";
        assert_eq!(stash.reveal(html), html);
    }

    #[test]
    fn test_empty_stash() {
        let stash = HtmlStash::new();
        assert!(stash.is_empty());
        assert_eq!(stash.reveal("plain"), "plain");
    }
}
