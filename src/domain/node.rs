//! Node data model: identity, classes, attributes and the closed set of kinds.

use std::collections::BTreeMap;
use std::fmt;

use generational_arena::Index;

use crate::domain::hooks::Widget;
use crate::domain::widgets::{
    Checkbox, Element, Field, Fragment, Frame, FrameSet, InlineScript, Lookup, PageHead,
    RawMarkup, ScriptInclude, Text,
};

/// Handle to a node inside a page's arena.
///
/// Handles are lookup-only; the owning container's child list is the only
/// ownership edge in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) Index);

/// Discriminant of [`NodeKind`], used for structural checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindTag {
    Page,
    Fragment,
    Element,
    Text,
    Markup,
    Script,
    ScriptInclude,
    FrameSet,
    Frame,
    Field,
    Checkbox,
    Lookup,
    Custom,
}

impl fmt::Display for KindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KindTag::Page => "page",
            KindTag::Fragment => "fragment",
            KindTag::Element => "element",
            KindTag::Text => "text",
            KindTag::Markup => "markup",
            KindTag::Script => "script",
            KindTag::ScriptInclude => "script_include",
            KindTag::FrameSet => "frame_set",
            KindTag::Frame => "frame",
            KindTag::Field => "field",
            KindTag::Checkbox => "checkbox",
            KindTag::Lookup => "lookup",
            KindTag::Custom => "custom",
        };
        write!(f, "{s}")
    }
}

/// Closed set of node kinds. External widgets plug in through `Widget`.
#[derive(Debug)]
pub enum NodeKind {
    Page(PageHead),
    Fragment(Fragment),
    Element(Element),
    Text(Text),
    Markup(RawMarkup),
    Script(InlineScript),
    ScriptInclude(ScriptInclude),
    FrameSet(FrameSet),
    Frame(Frame),
    Field(Field),
    Checkbox(Checkbox),
    Lookup(Lookup),
    Widget(Box<dyn Widget>),
}

impl Default for NodeKind {
    fn default() -> Self {
        NodeKind::Fragment(Fragment)
    }
}

impl NodeKind {
    pub fn element(tag: impl Into<String>) -> Self {
        NodeKind::Element(Element::new(tag))
    }

    pub fn text(content: impl Into<String>) -> Self {
        NodeKind::Text(Text::new(content))
    }

    pub fn markup(html: impl Into<String>) -> Self {
        NodeKind::Markup(RawMarkup::new(html))
    }

    pub fn script(body: impl Into<String>) -> Self {
        NodeKind::Script(InlineScript::new(body))
    }

    pub fn widget(widget: impl Widget + 'static) -> Self {
        NodeKind::Widget(Box::new(widget))
    }

    pub fn tag(&self) -> KindTag {
        match self {
            NodeKind::Page(_) => KindTag::Page,
            NodeKind::Fragment(_) => KindTag::Fragment,
            NodeKind::Element(_) => KindTag::Element,
            NodeKind::Text(_) => KindTag::Text,
            NodeKind::Markup(_) => KindTag::Markup,
            NodeKind::Script(_) => KindTag::Script,
            NodeKind::ScriptInclude(_) => KindTag::ScriptInclude,
            NodeKind::FrameSet(_) => KindTag::FrameSet,
            NodeKind::Frame(_) => KindTag::Frame,
            NodeKind::Field(_) => KindTag::Field,
            NodeKind::Checkbox(_) => KindTag::Checkbox,
            NodeKind::Lookup(_) => KindTag::Lookup,
            NodeKind::Widget(_) => KindTag::Custom,
        }
    }

    pub fn behavior(&self) -> &dyn Widget {
        match self {
            NodeKind::Page(w) => w,
            NodeKind::Fragment(w) => w,
            NodeKind::Element(w) => w,
            NodeKind::Text(w) => w,
            NodeKind::Markup(w) => w,
            NodeKind::Script(w) => w,
            NodeKind::ScriptInclude(w) => w,
            NodeKind::FrameSet(w) => w,
            NodeKind::Frame(w) => w,
            NodeKind::Field(w) => w,
            NodeKind::Checkbox(w) => w,
            NodeKind::Lookup(w) => w,
            NodeKind::Widget(w) => w.as_ref(),
        }
    }

    pub fn behavior_mut(&mut self) -> &mut dyn Widget {
        match self {
            NodeKind::Page(w) => w,
            NodeKind::Fragment(w) => w,
            NodeKind::Element(w) => w,
            NodeKind::Text(w) => w,
            NodeKind::Markup(w) => w,
            NodeKind::Script(w) => w,
            NodeKind::ScriptInclude(w) => w,
            NodeKind::FrameSet(w) => w,
            NodeKind::Frame(w) => w,
            NodeKind::Field(w) => w,
            NodeKind::Checkbox(w) => w,
            NodeKind::Lookup(w) => w,
            NodeKind::Widget(w) => w.as_mut(),
        }
    }

    /// Short human-readable label, e.g. `div` for elements.
    pub fn describe(&self) -> String {
        match self {
            NodeKind::Element(e) => e.tag().to_string(),
            NodeKind::Widget(w) => w.name().to_string(),
            other => other.tag().to_string(),
        }
    }
}

/// Base render unit.
#[derive(Debug)]
pub struct Node {
    id: Option<String>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    pub(crate) kind: NodeKind,
    // cached at construction, the kind is moved out while its hooks run
    pub(crate) tag: KindTag,
    pub(crate) container: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) expanded: bool,
    // set once `on_attached` has run for this node
    pub(crate) attached: bool,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        let tag = kind.tag();
        let container = kind.behavior().accepts_children();
        Self {
            id: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            kind,
            tag,
            container,
            parent: None,
            children: Vec::new(),
            expanded: false,
            attached: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for class in classes {
            self.add_class(class);
        }
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub(crate) fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Adds a class, keeping insertion order and ignoring duplicates and blanks.
    pub fn add_class(&mut self, class: impl Into<String>) {
        let class = class.into();
        let class = class.trim();
        if !class.is_empty() && !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, class: &str) -> bool {
        let before = self.classes.len();
        self.classes.retain(|c| c != class);
        before != self.classes.len()
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Mutable access to the kind's own settings.
    ///
    /// Swapping in a different variant is not supported: structural checks
    /// use the kind the node was created with.
    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn tag(&self) -> KindTag {
        self.tag
    }

    pub fn accepts_children(&self) -> bool {
        self.container
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }
}

/// Opaque description of the target environment.
///
/// The lifecycle passes it to every hook untouched; only widgets read it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    entries: BTreeMap<String, String>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}
