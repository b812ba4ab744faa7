//! Lookup dictionary: records gathered during expansion, published once as
//! an inline script during finalization.

use std::fmt::{self, Write};

use tracing::debug;

use crate::domain::error::DomainResult;
use crate::domain::hooks::FinalizeContext;
use crate::domain::markup::escape_free_text;
use crate::domain::node::{Node, NodeKind};

/// Working-storage key of the pending record list.
pub const DICTIONARY_KEY: &str = "lookup.dictionary";

/// Flag guarding the single published block.
pub const DICTIONARY_FLAG: &str = "lookup.dictionary.published";

pub const DEFAULT_DICTIONARY_VAR: &str = "lookupDictionary";

/// Scalar field value of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Free text; escaped on output
    Text(String),
    Flag(bool),
    Number(i64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", escape_free_text(s)),
            FieldValue::Flag(b) => write!(f, "{b}"),
            FieldValue::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Ordered set of named fields; insertion order is output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryRecord {
    fields: Vec<(String, FieldValue)>,
}

impl DictionaryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.field(key, FieldValue::Text(value.into()))
    }

    pub fn flag(self, key: impl Into<String>, value: bool) -> Self {
        self.field(key, FieldValue::Flag(value))
    }

    pub fn number(self, key: impl Into<String>, value: i64) -> Self {
        self.field(key, FieldValue::Number(value))
    }

    pub fn field(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.fields.push((key.into(), value));
        self
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Serializes `records` into one script assignment.
///
/// ```text
/// var lookupDictionary = {
/// count:"2",
/// id_1:"n1",
/// ...
/// id_2:"n2"
/// };
/// ```
///
/// One assignment per line; every line but the last one ends with a comma.
pub fn serialize(var_name: &str, records: &[DictionaryRecord]) -> String {
    let mut entries = Vec::with_capacity(1 + records.iter().map(|r| r.fields.len()).sum::<usize>());
    entries.push(format!("count:\"{}\"", records.len()));
    for (i, record) in records.iter().enumerate() {
        for (key, value) in &record.fields {
            entries.push(format!("{}_{}:\"{}\"", key, i + 1, value));
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "var {var_name} = {{");
    out.push_str(&entries.join(",\n"));
    out.push_str("\n};");
    out
}

/// Drains the pending records and appends the script block to the page.
///
/// Returns `false` without touching anything when the dictionary has
/// already been published on this page.
pub fn publish(cx: &mut FinalizeContext<'_>) -> DomainResult<bool> {
    if cx.flags_mut().is_done(DICTIONARY_FLAG) {
        return Ok(false);
    }
    let records: Vec<DictionaryRecord> = cx.storage_mut().drain_list(DICTIONARY_KEY);
    debug!(records = records.len(), "publishing lookup dictionary");

    let block = serialize(cx.dictionary_var(), &records);
    cx.append_to_page(Node::new(NodeKind::script(block)))?;
    cx.flags_mut().complete(DICTIONARY_FLAG);
    Ok(true)
}
