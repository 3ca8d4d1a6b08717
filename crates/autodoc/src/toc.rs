//! Table of contents.
//!
//! [`collect_toc`] scans the document tree for headings and nests them by
//! level. Handlers may give a heading a TOC label different from its text
//! through the `data-toc-label` attribute; [`override_toc_labels`] makes the
//! label the displayed name.

use crate::tree::Element;

/// TOC label attribute set by handlers on headings.
pub const TOC_LABEL_ATTR: &str = "data-toc-label";

/// One entry of the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocToken {
    /// Heading level (1-6).
    pub level: u8,
    /// Anchor id.
    pub id: String,
    /// Displayed name.
    pub name: String,
    /// Label requested by the heading, if any.
    pub custom_label: Option<String>,
    /// Nested entries.
    pub children: Vec<TocToken>,
}

impl TocToken {
    fn from_heading(heading: &Element, level: u8) -> Self {
        Self {
            level,
            id: heading.get("id").unwrap_or_default().to_owned(),
            name: heading.text_content().trim().to_owned(),
            custom_label: heading.get(TOC_LABEL_ATTR).map(str::to_owned),
            children: Vec::new(),
        }
    }
}

/// Replace each token's name with its custom label, recursively.
pub fn override_toc_labels(tokens: &mut [TocToken]) {
    for token in tokens {
        if let Some(label) = &token.custom_label
            && *label != token.name
        {
            token.name.clone_from(label);
        }
        override_toc_labels(&mut token.children);
    }
}

/// Build the nested TOC of every heading under `root`, in document order.
///
/// A heading becomes a child of the closest preceding heading with a lower
/// level.
pub fn collect_toc(root: &Element) -> Vec<TocToken> {
    let mut flat = Vec::new();
    collect_headings(root, &mut flat);
    nest(flat)
}

fn collect_headings(el: &Element, out: &mut Vec<TocToken>) {
    for child in &el.children {
        match child.heading_level() {
            Some(level) => out.push(TocToken::from_heading(child, level)),
            None => collect_headings(child, out),
        }
    }
}

fn nest(flat: Vec<TocToken>) -> Vec<TocToken> {
    let mut roots: Vec<TocToken> = Vec::new();
    let mut stack: Vec<TocToken> = Vec::new();

    for token in flat {
        while stack.last().is_some_and(|open| open.level >= token.level) {
            close(&mut stack, &mut roots);
        }
        stack.push(token);
    }
    while !stack.is_empty() {
        close(&mut stack, &mut roots);
    }
    roots
}

/// Pop the innermost open token into its parent, or into `roots`.
fn close(stack: &mut Vec<TocToken>, roots: &mut Vec<TocToken>) {
    if let Some(done) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(done),
            None => roots.push(done),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn token(level: u8, id: &str, name: &str, label: Option<&str>) -> TocToken {
        TocToken {
            level,
            id: id.to_owned(),
            name: name.to_owned(),
            custom_label: label.map(str::to_owned),
            children: Vec::new(),
        }
    }

    fn heading(level: u8, id: &str, text: &str) -> Element {
        Element::new(format!("h{level}")).with_attr("id", id).with_text(text)
    }

    #[test]
    fn test_override_labels_recursively() {
        let mut child = token(3, "pkg.Foo.bar", "pkg.Foo.bar", Some("bar"));
        child.children.push(token(4, "x", "x", Some("x")));
        let mut root = token(2, "pkg.Foo", "pkg.Foo", Some("Foo"));
        root.children.push(child);
        let mut tokens = vec![root, token(2, "plain", "Plain", None)];

        override_toc_labels(&mut tokens);

        assert_eq!(tokens[0].name, "Foo");
        assert_eq!(tokens[0].children[0].name, "bar");
        assert_eq!(tokens[0].children[0].children[0].name, "x");
        assert_eq!(tokens[1].name, "Plain");
    }

    #[test]
    fn test_override_idempotent() {
        let mut tokens = vec![token(1, "a", "a", Some("A"))];
        override_toc_labels(&mut tokens);
        let once = tokens.clone();
        override_toc_labels(&mut tokens);
        assert_eq!(tokens, once);
    }

    #[test]
    fn test_collect_nests_by_level() {
        let mut root = Element::new("div");
        root.children.push(heading(1, "title", "Title"));
        root.children.push(heading(2, "a", "A"));
        root.children.push(heading(3, "a1", "A1"));
        root.children.push(heading(2, "b", "B"));
        root.children.push(heading(1, "end", "End"));

        let toc = collect_toc(&root);

        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0].id, "title");
        let ids: Vec<_> = toc[0].children.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(toc[0].children[0].children[0].id, "a1");
        assert_eq!(toc[1].id, "end");
    }

    #[test]
    fn test_collect_inside_containers_and_labels() {
        let mut container = Element::new("div").with_attr("class", "autodoc");
        container
            .children
            .push(heading(2, "pkg.Foo", "pkg.Foo").with_attr(TOC_LABEL_ATTR, "Foo"));
        let mut root = Element::new("div");
        root.children.push(container);

        let mut toc = collect_toc(&root);
        assert_eq!(toc[0].custom_label.as_deref(), Some("Foo"));
        assert_eq!(toc[0].name, "pkg.Foo");

        override_toc_labels(&mut toc);
        assert_eq!(toc[0].name, "Foo");
    }

    #[test]
    fn test_collect_starts_below_first_level() {
        let mut root = Element::new("div");
        root.children.push(heading(3, "deep", "Deep"));
        root.children.push(heading(2, "up", "Up"));
        let toc = collect_toc(&root);
        let ids: Vec<_> = toc.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["deep", "up"]);
    }
}
