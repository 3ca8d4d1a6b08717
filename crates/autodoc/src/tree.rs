//! Document tree.
//!
//! [`Element`] follows the element-tree model: besides its children, a node
//! owns the text before its first child (`text`) and the text between its own
//! end and its next sibling (`tail`). Text is escaped on serialization, so
//! raw HTML must go through the [`HtmlStash`](crate::HtmlStash).

/// Elements serialized without a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

/// A node of the document tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag name (e.g., "div", "h2").
    pub tag: String,
    /// Attributes in insertion order.
    pub attributes: Vec<(String, String)>,
    /// Text before the first child.
    pub text: Option<String>,
    /// Text after this element, before the next sibling.
    pub tail: Option<String>,
    /// Child elements.
    pub children: Vec<Element>,
}

impl Element {
    /// Create an empty element.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Set an attribute (builder form).
    #[must_use]
    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set the leading text (builder form).
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Attribute value by name.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set or replace an attribute.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key.to_owned(), value)),
        }
    }

    /// Heading level for `h1`..`h6`, `None` otherwise.
    pub fn heading_level(&self) -> Option<u8> {
        match self.tag.as_bytes() {
            [b'h', level @ b'1'..=b'6'] => Some(level - b'0'),
            _ => None,
        }
    }

    /// Append text at the end of this element's content.
    ///
    /// Goes to `text` when there are no children, otherwise to the last
    /// child's `tail`.
    pub fn append_text(&mut self, text: &str) {
        match self.children.last_mut() {
            Some(last) => append_to(&mut last.tail, text),
            None => append_to(&mut self.text, text),
        }
    }

    /// Concatenated text of this element and its descendants, without tail.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
            if let Some(tail) = &child.tail {
                out.push_str(tail);
            }
        }
    }

    /// Serialize this element, including its tail.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    /// Serialize only the content of this element (text and children).
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        self.write_inner(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_html(value));
            out.push('"');
        }
        out.push('>');
        if !VOID_TAGS.contains(&self.tag.as_str()) {
            self.write_inner(out);
            out.push_str("</");
            out.push_str(&self.tag);
            out.push('>');
        }
        if let Some(tail) = &self.tail {
            out.push_str(&escape_html(tail));
        }
    }

    fn write_inner(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(&escape_html(text));
        }
        for child in &self.children {
            child.write_html(out);
        }
    }
}

/// Append `text` to an optional text slot.
pub(crate) fn append_to(slot: &mut Option<String>, text: &str) {
    slot.get_or_insert_with(String::new).push_str(text);
}

/// Escape `&`, `<`, `>` and `"` for HTML text and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_attributes() {
        let mut el = Element::new("h2").with_attr("id", "a");
        el.set("id", "b");
        el.set("data-role", "class");
        assert_eq!(el.get("id"), Some("b"));
        assert_eq!(el.get("data-role"), Some("class"));
        assert_eq!(el.get("missing"), None);
        assert_eq!(el.attributes.len(), 2);
    }

    #[test]
    fn test_heading_level() {
        assert_eq!(Element::new("h1").heading_level(), Some(1));
        assert_eq!(Element::new("h6").heading_level(), Some(6));
        assert_eq!(Element::new("h7").heading_level(), None);
        assert_eq!(Element::new("hr").heading_level(), None);
        assert_eq!(Element::new("div").heading_level(), None);
    }

    #[test]
    fn test_append_text_goes_to_last_tail() {
        let mut root = Element::new("div");
        root.append_text("a");
        root.children.push(Element::new("p"));
        root.append_text("b");
        root.append_text("c");
        assert_eq!(root.text.as_deref(), Some("a"));
        assert_eq!(root.children[0].tail.as_deref(), Some("bc"));
    }

    #[test]
    fn test_serialize() {
        let mut root = Element::new("div").with_text("x < y");
        let mut heading = Element::new("h2").with_attr("id", "a\"b").with_text("Title");
        heading.tail = Some(" after".to_owned());
        root.children.push(heading);
        root.children.push(Element::new("br"));

        assert_eq!(
            root.to_html(),
            "<div>x &lt; y<h2 id=\"a&quot;b\">Title</h2> after<br></div>"
        );
        assert_eq!(
            root.inner_html(),
            "x &lt; y<h2 id=\"a&quot;b\">Title</h2> after<br>"
        );
    }

    #[test]
    fn test_text_content() {
        let mut root = Element::new("h3").with_text("Class ");
        let mut code = Element::new("code").with_text("Foo");
        code.tail = Some("!".to_owned());
        root.children.push(code);
        assert_eq!(root.text_content(), "Class Foo!");
    }
}
