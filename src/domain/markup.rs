//! Escaping and tag-writing primitives shared by leaf emitters.

use std::fmt::Write;

use itertools::Itertools;

use crate::domain::node::Node;

/// Tags that never get a closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "frame", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag.to_ascii_lowercase().as_str())
}

/// Escapes text content and attribute values.
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

/// Escapes free text for embedding inside a double-quoted script literal.
///
/// Every character outside printable ASCII becomes a numeric character
/// reference (`é` → `&#233;`). Quote, backslash and the markup-significant
/// characters are referenced the same way so the literal can never end early.
pub fn escape_free_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        let printable = (' '..='~').contains(&c);
        if printable && !matches!(c, '"' | '\\' | '<' | '>' | '&') {
            out.push(c);
        } else {
            // writing to a String cannot fail
            let _ = write!(out, "&#{};", c as u32);
        }
    }
    out
}

/// Writes ` id="…" class="…" k="v"` for a node plus any kind-specific extras.
///
/// Node attributes win over extras with the same name.
pub fn write_attributes(out: &mut String, node: &Node, extra: &[(&str, &str)]) {
    if let Some(id) = node.id() {
        let _ = write!(out, " id=\"{}\"", escape_html(id));
    }
    if !node.classes().is_empty() {
        let _ = write!(
            out,
            " class=\"{}\"",
            escape_html(&node.classes().iter().join(" "))
        );
    }
    for (name, value) in extra {
        if node.attribute(name).is_none() {
            write_attribute(out, name, value);
        }
    }
    for (name, value) in node.attributes() {
        write_attribute(out, name, value);
    }
}

fn write_attribute(out: &mut String, name: &str, value: &str) {
    // boolean attributes carry no value
    if value.is_empty() {
        let _ = write!(out, " {name}");
    } else {
        let _ = write!(out, " {}=\"{}\"", name, escape_html(value));
    }
}

pub fn write_open_tag(out: &mut String, tag: &str, node: &Node, extra: &[(&str, &str)]) {
    out.push('<');
    out.push_str(tag);
    write_attributes(out, node, extra);
    out.push('>');
}

pub fn write_close_tag(out: &mut String, tag: &str) {
    if !is_void_tag(tag) {
        let _ = write!(out, "</{tag}>");
    }
}
