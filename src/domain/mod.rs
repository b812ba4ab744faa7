//! Domain layer: the page tree and its render lifecycle
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod dictionary;
pub mod error;
pub mod flags;
pub mod hooks;
pub mod ids;
pub mod markup;
pub mod node;
pub mod page;
pub mod storage;
pub mod tree;
pub mod widgets;

pub use dictionary::{DictionaryRecord, FieldValue};
pub use error::{DomainError, DomainResult};
pub use flags::{FlagState, FlagStore};
pub use hooks::{AttachContext, EmitContext, ExpandContext, FinalizeContext, Widget};
pub use ids::IdAllocator;
pub use node::{Capabilities, KindTag, Node, NodeId, NodeKind};
pub use page::{Page, PageOptions};
pub use storage::WorkingStorage;
pub use widgets::{
    Checkbox, Element, Field, Fragment, Frame, FrameSet, InlineScript, Lookup, PageHead, RawMarkup,
    ScriptInclude, Text,
};
