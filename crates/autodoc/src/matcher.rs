//! Instruction matching.
//!
//! Finds `::: identifier` lines in a block of text and splits the block into
//! the text before the marker, the indented configuration under it, and the
//! rest of the block:
//!
//! ```text
//! Some text before.
//! ## ::: package.module.Class
//!     handler: python
//!     options:
//!       show_source: false
//! Unindented text after.
//! ```

use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::Regex;

/// Indentation removed from the configuration lines.
pub const TAB_LENGTH: usize = 4;

static INSTRUCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?P<heading>#{1,6} *|)::: ?(?P<name>.+?) *$")
        .expect("valid instruction regex")
});

/// Prefixes of a configuration block separated from its marker by a blank line.
const DETACHED_CONFIG_PREFIXES: [&str; 2] = ["    handler:", "    options:"];

/// A matched `:::` instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Identifier after `:::`, surrounding spaces stripped.
    pub identifier: String,
    /// Number of `#` before `:::`; 0 when no heading was requested.
    pub heading_level: u8,
    /// Detabbed YAML configuration, possibly empty.
    pub config_text: String,
}

/// Whether `block` contains an instruction line.
pub fn is_match(block: &str) -> bool {
    INSTRUCTION.is_match(block)
}

/// Remove one level of indentation from the leading lines of `text`.
///
/// Lines indented by [`TAB_LENGTH`] spaces lose the indentation and blank
/// lines become empty; the first other line ends the indented region.
/// Returns the region and the remaining text.
pub fn detab(text: &str) -> (String, String) {
    let indent = " ".repeat(TAB_LENGTH);
    let lines: Vec<&str> = text.split('\n').collect();

    let mut region = Vec::new();
    for line in &lines {
        if let Some(stripped) = line.strip_prefix(&indent) {
            region.push(stripped);
        } else if line.trim().is_empty() {
            region.push("");
        } else {
            break;
        }
    }

    let rest = lines[region.len()..].join("\n");
    (region.join("\n"), rest)
}

/// Match an instruction in `block`.
///
/// On a match, returns the text before the marker line (if any) and the
/// instruction. The unindented rest of the block is pushed to the front of
/// `pending`. When the marker has no indented configuration and the next
/// pending block is one (`handler:` or `options:` indented after a blank
/// line), that block is consumed as the configuration and its own
/// unindented remainder is requeued after the rest of `block`.
///
/// Returns `None` and leaves `pending` untouched when nothing matches.
pub fn match_block<'a>(
    block: &'a str,
    pending: &mut VecDeque<String>,
) -> Option<(Option<&'a str>, Instruction)> {
    let caps = INSTRUCTION.captures(block)?;
    let whole = caps.get(0)?;

    let before = (whole.start() > 0).then(|| &block[..whole.start()]);
    let heading_level = u8::try_from(caps["heading"].matches('#').count()).unwrap_or(0);
    let identifier = caps["name"].to_owned();

    let (mut config_text, rest) = detab(&block[whole.end()..]);

    if config_text.trim().is_empty()
        && pending
            .front()
            .is_some_and(|next| DETACHED_CONFIG_PREFIXES.iter().any(|p| next.starts_with(p)))
        && let Some(next) = pending.pop_front()
    {
        let (detached, remainder) = detab(&next);
        config_text = detached;
        if !remainder.is_empty() {
            pending.push_front(remainder);
        }
    }

    if !rest.is_empty() {
        pending.push_front(rest);
    }

    Some((
        before,
        Instruction {
            identifier,
            heading_level,
            config_text,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn queue(blocks: &[&str]) -> VecDeque<String> {
        blocks.iter().map(|b| (*b).to_owned()).collect()
    }

    #[test]
    fn test_is_match() {
        assert!(is_match("::: a.b"));
        assert!(is_match(":::a.b"));
        assert!(is_match("text\n### ::: a.b"));
        assert!(!is_match("  ::: a.b"));
        assert!(!is_match("####### ::: a.b"));
    }

    #[test]
    fn test_match_splits_block() {
        let mut pending = queue(&["next"]);
        let (before, instruction) =
            match_block("prefix\n::: a.b\n    opt: 1\nsuffix", &mut pending).unwrap();

        assert_eq!(before, Some("prefix\n"));
        assert_eq!(instruction.identifier, "a.b");
        assert_eq!(instruction.heading_level, 0);
        assert_eq!(instruction.config_text, "\nopt: 1");
        assert_eq!(pending, queue(&["suffix", "next"]));
    }

    #[test]
    fn test_heading_level_and_trailing_spaces() {
        let mut pending = VecDeque::new();
        let (before, instruction) = match_block("## ::: pkg.mod   ", &mut pending).unwrap();
        assert_eq!(before, None);
        assert_eq!(instruction.identifier, "pkg.mod");
        assert_eq!(instruction.heading_level, 2);
        assert_eq!(instruction.config_text, "");
        assert!(pending.is_empty());
    }

    #[test]
    fn test_heading_without_space() {
        let mut pending = VecDeque::new();
        let (_, instruction) = match_block("######::: x", &mut pending).unwrap();
        assert_eq!(instruction.heading_level, 6);
        assert_eq!(instruction.identifier, "x");
    }

    #[test]
    fn test_blank_lines_inside_config() {
        let mut pending = VecDeque::new();
        let block = "::: x\n    handler: demo\n  \n    options:\n      a: 1";
        let (_, instruction) = match_block(block, &mut pending).unwrap();
        assert_eq!(instruction.config_text, "\nhandler: demo\n\noptions:\n  a: 1");
        assert!(pending.is_empty());
    }

    #[test]
    fn test_pulls_detached_config() {
        let mut pending = queue(&[
            "    handler: demo\n    options:\n      a: 1\ntrailing",
            "later",
        ]);
        let (_, instruction) = match_block("::: x\nrest", &mut pending).unwrap();

        assert_eq!(instruction.config_text, "handler: demo\noptions:\n  a: 1");
        assert_eq!(pending, queue(&["rest", "trailing", "later"]));
    }

    #[test]
    fn test_does_not_pull_other_blocks() {
        let mut pending = queue(&["    some code"]);
        let (_, instruction) = match_block("::: x", &mut pending).unwrap();
        assert_eq!(instruction.config_text, "");
        assert_eq!(pending, queue(&["    some code"]));
    }

    #[test]
    fn test_does_not_pull_when_config_present() {
        let mut pending = queue(&["    options:\n      a: 1"]);
        let (_, instruction) = match_block("::: x\n    handler: demo", &mut pending).unwrap();
        assert_eq!(instruction.config_text, "\nhandler: demo");
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_no_match_leaves_queue() {
        let mut pending = queue(&["a"]);
        assert!(match_block("plain text", &mut pending).is_none());
        assert_eq!(pending, queue(&["a"]));
    }

    #[test]
    fn test_detab() {
        let (region, rest) = detab("    a\n\n      b\nc\n    d");
        assert_eq!(region, "a\n\n  b");
        assert_eq!(rest, "c\n    d");
    }
}
