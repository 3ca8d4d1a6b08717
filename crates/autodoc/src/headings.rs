//! Duplicated heading removal.
//!
//! Instruction containers (`div.autodoc`) carry copies of the handler's
//! headings for the TOC scan, next to the stashed markup that already renders
//! them. Once the TOC is built the containers are dropped, and their text
//! (the stash placeholder) and tail move to the preceding sibling's tail, or
//! to the parent's text when the container comes first.

use crate::tree::{Element, append_to};

/// Class of instruction containers.
pub const AUTODOC_CLASS: &str = "autodoc";

fn is_container(el: &Element) -> bool {
    el.tag == "div" && el.get("class") == Some(AUTODOC_CLASS)
}

/// Drop every instruction container under `parent`, keeping its text.
pub fn remove_duplicated_headings(parent: &mut Element) {
    let children = std::mem::take(&mut parent.children);
    let mut kept = Vec::with_capacity(children.len());
    let mut carry = String::new();

    for mut child in children.into_iter().rev() {
        if is_container(&child) {
            let mut text = child.text.take().unwrap_or_default();
            if let Some(tail) = child.tail.take() {
                text.push_str(&tail);
            }
            carry.insert_str(0, &text);
        } else {
            if !carry.is_empty() {
                append_to(&mut child.tail, &carry);
                carry.clear();
            }
            remove_duplicated_headings(&mut child);
            kept.push(child);
        }
    }

    if !carry.is_empty() {
        append_to(&mut parent.text, &carry);
    }
    kept.reverse();
    parent.children = kept;
}
