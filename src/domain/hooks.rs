//! Lifecycle hooks and the contexts handed to them.
//!
//! A widget sees the page only through these contexts: attach-time side
//! effects, the expansion pass, finalization callbacks and emission.

use std::fmt;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::flags::FlagStore;
use crate::domain::node::{Capabilities, KindTag, Node, NodeId};
use crate::domain::page::{attach_new, PageState};
use crate::domain::storage::WorkingStorage;
use crate::domain::tree::NodeTree;

/// Behaviour contract every node kind implements.
///
/// Only `emit_open` is mandatory; the other hooks default to no-ops.
pub trait Widget: fmt::Debug + Send + Sync {
    /// Name used in outlines and diagnostics.
    fn name(&self) -> &str {
        "widget"
    }

    fn accepts_children(&self) -> bool {
        false
    }

    /// Kind that must be the parent or an ancestor of this node.
    fn required_ancestor(&self) -> Option<KindTag> {
        None
    }

    /// Runs once when the node is attached under the page.
    fn on_attached(&self, _node: &Node, _cx: &mut AttachContext<'_>) {}

    fn expand(&mut self, _cx: &mut ExpandContext<'_>) -> DomainResult<()> {
        Ok(())
    }

    fn finalize(&mut self, _cx: &mut FinalizeContext<'_>) -> DomainResult<()> {
        Ok(())
    }

    fn emit_open(&self, node: &Node, cx: &EmitContext<'_>, out: &mut String);

    fn emit_close(&self, _node: &Node, _cx: &EmitContext<'_>, _out: &mut String) {}
}

/// Page access for `on_attached`.
pub struct AttachContext<'a> {
    pub(crate) state: &'a mut PageState,
    pub(crate) node: NodeId,
}

impl AttachContext<'_> {
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Registers a page-level style rule; repeated rules are kept once.
    pub fn add_style_rule(&mut self, rule: impl Into<String>) {
        let rule = rule.into();
        if !self.state.style_rules.contains(&rule) {
            self.state.style_rules.push(rule);
        }
    }

    pub fn flags_mut(&mut self) -> &mut FlagStore {
        &mut self.state.flags
    }
}

/// Page access during the expansion pass.
pub struct ExpandContext<'a> {
    pub(crate) tree: &'a mut NodeTree,
    pub(crate) state: &'a mut PageState,
    pub(crate) node: NodeId,
    pub(crate) caps: &'a Capabilities,
}

impl<'a> ExpandContext<'a> {
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// The node being expanded. Its kind is moved out while the hook runs
    /// and reads as a fragment here.
    pub fn node(&self) -> DomainResult<&Node> {
        self.tree.node(self.node)
    }

    pub fn node_mut(&mut self) -> DomainResult<&mut Node> {
        self.tree.node_mut(self.node)
    }

    pub fn capabilities(&self) -> &Capabilities {
        self.caps
    }

    pub fn next_id(&mut self) -> String {
        self.state.allocate_id()
    }

    /// Returns the node's id, allocating one if it has none yet.
    pub fn ensure_id(&mut self) -> DomainResult<String> {
        if let Some(id) = self.tree.node(self.node)?.id() {
            return Ok(id.to_string());
        }
        let id = self.state.allocate_id();
        self.tree.node_mut(self.node)?.set_id(id.clone());
        Ok(id)
    }

    /// Appends a child under the node being expanded.
    pub fn append_child(&mut self, node: Node) -> DomainResult<NodeId> {
        attach_new(self.tree, self.state, self.node, node, None)
    }

    /// Appends under any container of the page, typically a descendant
    /// created earlier in the same hook.
    pub fn append_to(&mut self, parent: NodeId, node: Node) -> DomainResult<NodeId> {
        attach_new(self.tree, self.state, parent, node, None)
    }

    pub fn flags(&self) -> &FlagStore {
        &self.state.flags
    }

    pub fn flags_mut(&mut self) -> &mut FlagStore {
        &mut self.state.flags
    }

    pub fn storage_mut(&mut self) -> &mut WorkingStorage {
        &mut self.state.storage
    }

    /// Asks for one `finalize` call after expansion settles.
    /// Registering the same node twice has no further effect.
    pub fn register_finalizer(&mut self) {
        if !self.state.finalizers.contains(&self.node) {
            self.state.finalizers.push(self.node);
        }
    }

    pub fn dictionary_var(&self) -> &str {
        &self.state.dictionary_var
    }
}

/// Page access for finalization callbacks.
pub struct FinalizeContext<'a> {
    pub(crate) tree: &'a mut NodeTree,
    pub(crate) state: &'a mut PageState,
    pub(crate) node: NodeId,
    pub(crate) caps: &'a Capabilities,
}

impl FinalizeContext<'_> {
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn capabilities(&self) -> &Capabilities {
        self.caps
    }

    pub fn flags_mut(&mut self) -> &mut FlagStore {
        &mut self.state.flags
    }

    pub fn storage_mut(&mut self) -> &mut WorkingStorage {
        &mut self.state.storage
    }

    pub fn dictionary_var(&self) -> &str {
        &self.state.dictionary_var
    }

    /// Appends a node at the end of the page body.
    ///
    /// Expansion has already settled, so the node is emitted as-is.
    pub fn append_to_page(&mut self, node: Node) -> DomainResult<NodeId> {
        if node.accepts_children() {
            return Err(DomainError::IllegalArgument(format!(
                "finalization may only append leaf nodes, got {}",
                node.tag()
            )));
        }
        let root = self.tree.root();
        let id = attach_new(self.tree, self.state, root, node, None)?;
        self.tree.node_mut(id)?.expanded = true;
        Ok(id)
    }
}

/// Read-only page access during emission.
pub struct EmitContext<'a> {
    pub(crate) tree: &'a NodeTree,
    pub(crate) state: &'a PageState,
    pub(crate) caps: &'a Capabilities,
}

impl EmitContext<'_> {
    pub fn capabilities(&self) -> &Capabilities {
        self.caps
    }

    pub fn flags(&self) -> &FlagStore {
        &self.state.flags
    }

    pub fn storage(&self) -> &WorkingStorage {
        &self.state.storage
    }

    pub fn style_rules(&self) -> &[String] {
        &self.state.style_rules
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.tree.get(id)
    }
}
