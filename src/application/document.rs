//! Page documents: declarative page trees read from TOML or JSON.
//!
//! ```toml
//! title = "Orders"
//!
//! [[nodes]]
//! kind = "element"
//! tag = "form"
//! id = "order"
//!
//! [[nodes.children]]
//! kind = "lookup"
//! name = "city"
//! label = "City"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::{
    Checkbox, DomainResult, Field, Frame, FrameSet, Lookup, Node, NodeId, NodeKind, Page,
    PageHead, PageOptions, ScriptInclude,
};

/// Serialization format of a page document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Json,
}

impl DocumentFormat {
    /// Picks the format from the file extension; anything but `.json` is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Toml,
        }
    }

    pub fn is_document(path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("toml") | Some("json")
        )
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PageDocument {
    pub title: String,
    #[serde(default)]
    pub lang: Option<String>,
    /// Classes of the `<body>` element
    #[serde(default)]
    pub classes: Vec<String>,
    /// Attributes of the `<body>` element
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NodeSpec {
    #[serde(flatten)]
    pub kind: KindSpec,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KindSpec {
    Fragment,
    Element {
        tag: String,
    },
    Text {
        text: String,
    },
    Markup {
        html: String,
    },
    Script {
        body: String,
    },
    ScriptInclude {
        src: String,
    },
    FrameSet {
        #[serde(default)]
        rows: Option<String>,
        #[serde(default)]
        cols: Option<String>,
    },
    Frame {
        src: String,
        #[serde(default)]
        name: Option<String>,
    },
    Field {
        name: String,
        #[serde(default)]
        label: String,
        #[serde(default)]
        value: String,
    },
    Checkbox {
        name: String,
        #[serde(default)]
        label: String,
        /// Loose boolean literal (`Y`, `true`, `on`, …)
        #[serde(default)]
        value: Option<String>,
    },
    Lookup {
        name: String,
        #[serde(default)]
        label: String,
        #[serde(default)]
        required: bool,
        #[serde(default)]
        max_length: i64,
    },
}

impl KindSpec {
    fn to_kind(&self) -> DomainResult<NodeKind> {
        let kind = match self {
            KindSpec::Fragment => NodeKind::default(),
            KindSpec::Element { tag } => NodeKind::element(tag.clone()),
            KindSpec::Text { text } => NodeKind::text(text.clone()),
            KindSpec::Markup { html } => NodeKind::markup(html.clone()),
            KindSpec::Script { body } => NodeKind::script(body.clone()),
            KindSpec::ScriptInclude { src } => NodeKind::ScriptInclude(ScriptInclude::new(src.clone())),
            KindSpec::FrameSet { rows, cols } => {
                let mut set = FrameSet::new();
                if let Some(rows) = rows {
                    set = set.with_rows(rows.clone());
                }
                if let Some(cols) = cols {
                    set = set.with_cols(cols.clone());
                }
                NodeKind::FrameSet(set)
            }
            KindSpec::Frame { src, name } => {
                let mut frame = Frame::new(src.clone());
                if let Some(name) = name {
                    frame = frame.with_name(name.clone());
                }
                NodeKind::Frame(frame)
            }
            KindSpec::Field { name, label, value } => NodeKind::Field(
                Field::new(name.clone())
                    .with_label(label.clone())
                    .with_value(value.clone()),
            ),
            KindSpec::Checkbox { name, label, value } => {
                let mut checkbox = Checkbox::new(name.clone()).with_label(label.clone());
                if let Some(literal) = value {
                    checkbox.set_value(literal)?;
                }
                NodeKind::Checkbox(checkbox)
            }
            KindSpec::Lookup {
                name,
                label,
                required,
                max_length,
            } => NodeKind::Lookup(
                Lookup::new(name.clone())
                    .with_label(label.clone())
                    .with_required(*required)
                    .with_max_length(*max_length),
            ),
        };
        Ok(kind)
    }
}

impl NodeSpec {
    pub fn to_node(&self) -> DomainResult<Node> {
        let mut node = Node::new(self.kind.to_kind()?).with_classes(self.classes.iter().cloned());
        if let Some(id) = &self.id {
            node = node.with_id(id.clone());
        }
        for (name, value) in &self.attributes {
            node.set_attribute(name.clone(), value.clone());
        }
        Ok(node)
    }
}

/// Why a page document could not be read.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl PageDocument {
    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self, DocumentError> {
        Ok(match format {
            DocumentFormat::Toml => toml::from_str(content)?,
            DocumentFormat::Json => serde_json::from_str(content)?,
        })
    }

    /// Builds a fresh page through the regular attach operations, so every
    /// structural or value error surfaces here rather than at render time.
    pub fn build(&self, options: PageOptions) -> DomainResult<Page> {
        let mut head = PageHead::new(self.title.clone());
        if let Some(lang) = &self.lang {
            head = head.with_lang(lang.clone());
        }
        let mut root = Node::new(NodeKind::Page(head)).with_classes(self.classes.iter().cloned());
        for (name, value) in &self.attributes {
            root.set_attribute(name.clone(), value.clone());
        }

        let mut page = Page::from_root(root, options);
        let root = page.root();
        attach_all(&mut page, root, &self.nodes)?;
        debug!(title = %self.title, "page document built");
        Ok(page)
    }
}

fn attach_all(page: &mut Page, parent: NodeId, specs: &[NodeSpec]) -> DomainResult<()> {
    for spec in specs {
        let id = page.append(parent, spec.to_node()?)?;
        attach_all(page, id, &spec.children)?;
    }
    Ok(())
}
