//! Built-in node kinds.
//!
//! Markup here is deliberately plain; richer leaf widgets live outside the
//! crate and plug in through [`Widget`].

use std::fmt::Write;

use crate::domain::dictionary::{self, DictionaryRecord};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::hooks::{
    AttachContext, EmitContext, ExpandContext, FinalizeContext, Widget,
};
use crate::domain::markup::{
    escape_free_text, escape_html, is_void_tag, write_close_tag, write_open_tag,
};
use crate::domain::node::{KindTag, Node, NodeKind};

/// Style rule registered once per page by the first frame set.
pub const FRAME_SET_STYLE: &str = "frameset { border: 0; }";

/// Root of every page: document head and body wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHead {
    title: String,
    lang: String,
}

impl PageHead {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lang: "en".to_string(),
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }
}

impl Widget for PageHead {
    fn name(&self) -> &str {
        "page"
    }

    fn accepts_children(&self) -> bool {
        true
    }

    fn emit_open(&self, node: &Node, cx: &EmitContext<'_>, out: &mut String) {
        let _ = write!(
            out,
            "<!DOCTYPE html>\n<html lang=\"{}\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n",
            escape_html(&self.lang),
            escape_html(&self.title)
        );
        if !cx.style_rules().is_empty() {
            out.push_str("<style>\n");
            for rule in cx.style_rules() {
                out.push_str(rule);
                out.push('\n');
            }
            out.push_str("</style>\n");
        }
        out.push_str("</head>\n");
        write_open_tag(out, "body", node, &[]);
        out.push('\n');
    }

    fn emit_close(&self, _node: &Node, _cx: &EmitContext<'_>, out: &mut String) {
        out.push_str("\n</body>\n</html>\n");
    }
}

/// Transparent container: emits only its children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fragment;

impl Widget for Fragment {
    fn name(&self) -> &str {
        "fragment"
    }

    fn accepts_children(&self) -> bool {
        true
    }

    fn emit_open(&self, _node: &Node, _cx: &EmitContext<'_>, _out: &mut String) {}
}

/// Generic tag. Void tags (`input`, `br`, …) take no children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl Widget for Element {
    fn name(&self) -> &str {
        &self.tag
    }

    fn accepts_children(&self) -> bool {
        !is_void_tag(&self.tag)
    }

    fn emit_open(&self, node: &Node, _cx: &EmitContext<'_>, out: &mut String) {
        write_open_tag(out, &self.tag, node, &[]);
    }

    fn emit_close(&self, _node: &Node, _cx: &EmitContext<'_>, out: &mut String) {
        write_close_tag(out, &self.tag);
    }
}

/// Escaped text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    content: String,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

impl Widget for Text {
    fn name(&self) -> &str {
        "text"
    }

    fn emit_open(&self, _node: &Node, _cx: &EmitContext<'_>, out: &mut String) {
        out.push_str(&escape_html(&self.content));
    }
}

/// Pre-rendered markup, emitted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMarkup {
    html: String,
}

impl RawMarkup {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

impl Widget for RawMarkup {
    fn name(&self) -> &str {
        "markup"
    }

    fn emit_open(&self, _node: &Node, _cx: &EmitContext<'_>, out: &mut String) {
        out.push_str(&self.html);
    }
}

/// Inline script block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineScript {
    body: String,
}

impl InlineScript {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

impl Widget for InlineScript {
    fn name(&self) -> &str {
        "script"
    }

    fn emit_open(&self, node: &Node, _cx: &EmitContext<'_>, out: &mut String) {
        write_open_tag(out, "script", node, &[("type", "text/javascript")]);
        out.push('\n');
        out.push_str(&self.body);
        out.push_str("\n</script>\n");
    }
}

/// Shared external script; emitted by the first include of a `src` only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInclude {
    src: String,
    owner: bool,
}

impl ScriptInclude {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            owner: false,
        }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    /// Whether this include won the page-wide slot for its `src`.
    pub fn is_owner(&self) -> bool {
        self.owner
    }

    pub fn flag_key(&self) -> String {
        format!("script:{}", self.src)
    }
}

impl Widget for ScriptInclude {
    fn name(&self) -> &str {
        "script_include"
    }

    fn expand(&mut self, cx: &mut ExpandContext<'_>) -> DomainResult<()> {
        if cx.flags_mut().reserve(&self.flag_key()) {
            self.owner = true;
            cx.register_finalizer();
        }
        Ok(())
    }

    fn finalize(&mut self, cx: &mut FinalizeContext<'_>) -> DomainResult<()> {
        cx.flags_mut().complete(&self.flag_key());
        Ok(())
    }

    fn emit_open(&self, node: &Node, _cx: &EmitContext<'_>, out: &mut String) {
        if self.owner {
            write_open_tag(
                out,
                "script",
                node,
                &[("type", "text/javascript"), ("src", &self.src)],
            );
            out.push_str("</script>\n");
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameSet {
    rows: Option<String>,
    cols: Option<String>,
}

impl FrameSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, rows: impl Into<String>) -> Self {
        self.rows = Some(rows.into());
        self
    }

    pub fn with_cols(mut self, cols: impl Into<String>) -> Self {
        self.cols = Some(cols.into());
        self
    }
}

impl Widget for FrameSet {
    fn name(&self) -> &str {
        "frameset"
    }

    fn accepts_children(&self) -> bool {
        true
    }

    fn on_attached(&self, _node: &Node, cx: &mut AttachContext<'_>) {
        cx.add_style_rule(FRAME_SET_STYLE);
    }

    fn emit_open(&self, node: &Node, _cx: &EmitContext<'_>, out: &mut String) {
        let mut extra = Vec::new();
        if let Some(rows) = &self.rows {
            extra.push(("rows", rows.as_str()));
        }
        if let Some(cols) = &self.cols {
            extra.push(("cols", cols.as_str()));
        }
        write_open_tag(out, "frameset", node, &extra);
    }

    fn emit_close(&self, _node: &Node, _cx: &EmitContext<'_>, out: &mut String) {
        out.push_str("</frameset>");
    }
}

/// Frame leaf; only valid somewhere inside a [`FrameSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    src: String,
    name: Option<String>,
}

impl Frame {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Widget for Frame {
    fn name(&self) -> &str {
        "frame"
    }

    fn required_ancestor(&self) -> Option<KindTag> {
        Some(KindTag::FrameSet)
    }

    fn emit_open(&self, node: &Node, _cx: &EmitContext<'_>, out: &mut String) {
        let mut extra = vec![("src", self.src.as_str())];
        if let Some(name) = &self.name {
            extra.push(("name", name.as_str()));
        }
        write_open_tag(out, "frame", node, &extra);
    }
}

/// Text field that expands into a label, the input and a hidden companion
/// carrying the original value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    label: String,
    value: String,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            value: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }
}

impl Widget for Field {
    fn name(&self) -> &str {
        "field"
    }

    fn accepts_children(&self) -> bool {
        true
    }

    fn expand(&mut self, cx: &mut ExpandContext<'_>) -> DomainResult<()> {
        cx.ensure_id()?;
        cx.node_mut()?.add_class("field");
        let input_id = cx.next_id();

        if !self.label.is_empty() {
            let label = cx.append_child(
                Node::new(NodeKind::element("label")).with_attribute("for", input_id.clone()),
            )?;
            cx.append_to(label, Node::new(NodeKind::text(self.label.clone())))?;
        }
        cx.append_child(
            Node::new(NodeKind::element("input"))
                .with_id(input_id)
                .with_attribute("type", "text")
                .with_attribute("name", self.name.clone())
                .with_attribute("value", self.value.clone()),
        )?;
        cx.append_child(
            Node::new(NodeKind::element("input"))
                .with_attribute("type", "hidden")
                .with_attribute("name", format!("{}__orig", self.name))
                .with_attribute("value", self.value.clone()),
        )?;
        Ok(())
    }

    fn emit_open(&self, node: &Node, _cx: &EmitContext<'_>, out: &mut String) {
        write_open_tag(out, "span", node, &[]);
    }

    fn emit_close(&self, _node: &Node, _cx: &EmitContext<'_>, out: &mut String) {
        out.push_str("</span>");
    }
}

/// Checkbox whose state is set from loose boolean literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkbox {
    name: String,
    label: String,
    checked: bool,
}

impl Checkbox {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            checked: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn checked(&self) -> bool {
        self.checked
    }

    pub fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    /// Sets the state from a literal; only the resulting bool is kept.
    pub fn set_value(&mut self, literal: &str) -> DomainResult<()> {
        self.checked = parse_bool_literal(literal)?;
        Ok(())
    }
}

/// `Y`, `true`, `on` are true and `N`, `false`, `off` false, in any case.
/// A blank literal means false.
pub fn parse_bool_literal(literal: &str) -> DomainResult<bool> {
    let trimmed = literal.trim();
    if trimmed.is_empty() {
        return Ok(false);
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "y" | "true" | "on" => Ok(true),
        "n" | "false" | "off" => Ok(false),
        _ => Err(DomainError::IllegalArgument(format!(
            "unrecognized boolean literal \"{}\"",
            escape_free_text(literal)
        ))),
    }
}

impl Widget for Checkbox {
    fn name(&self) -> &str {
        "checkbox"
    }

    fn expand(&mut self, cx: &mut ExpandContext<'_>) -> DomainResult<()> {
        cx.ensure_id()?;
        Ok(())
    }

    fn emit_open(&self, node: &Node, _cx: &EmitContext<'_>, out: &mut String) {
        let mut extra = vec![("type", "checkbox"), ("name", self.name.as_str()), ("value", "Y")];
        if self.checked {
            extra.push(("checked", ""));
        }
        write_open_tag(out, "input", node, &extra);
        if !self.label.is_empty() {
            let _ = write!(
                out,
                "<label for=\"{}\">{}</label>",
                escape_html(node.id().unwrap_or_default()),
                escape_html(&self.label)
            );
        }
    }
}

/// Input backed by the page's lookup dictionary.
///
/// Each lookup contributes one record; the first finalizer to run publishes
/// the whole dictionary as a single inline script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    name: String,
    label: String,
    required: bool,
    max_length: i64,
}

impl Lookup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            required: false,
            max_length: 0,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_max_length(mut self, max_length: i64) -> Self {
        self.max_length = max_length;
        self
    }
}

impl Widget for Lookup {
    fn name(&self) -> &str {
        "lookup"
    }

    fn expand(&mut self, cx: &mut ExpandContext<'_>) -> DomainResult<()> {
        let id = cx.ensure_id()?;
        let record = DictionaryRecord::new()
            .text("id", id)
            .text("name", self.name.clone())
            .text("label", self.label.clone())
            .flag("required", self.required)
            .number("maxlen", self.max_length);
        cx.storage_mut().push(dictionary::DICTIONARY_KEY, record);
        cx.register_finalizer();
        Ok(())
    }

    fn finalize(&mut self, cx: &mut FinalizeContext<'_>) -> DomainResult<()> {
        dictionary::publish(cx)?;
        Ok(())
    }

    fn emit_open(&self, node: &Node, _cx: &EmitContext<'_>, out: &mut String) {
        write_open_tag(
            out,
            "input",
            node,
            &[("type", "text"), ("name", &self.name), ("data-lookup", &self.name)],
        );
    }
}
