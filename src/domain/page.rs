//! Page: root container, page-scoped state and the render lifecycle.
//!
//! `render` runs three phases. The first call expands the tree to a fixed
//! point and then runs every registered finalizer once. Every call emits
//! the markup. Later renders only repeat the emission.

use std::collections::HashSet;
use std::thread::{self, ThreadId};

use parking_lot::{RwLock, RwLockUpgradableReadGuard, RwLockWriteGuard};
use tracing::{debug, instrument, trace, warn};

use crate::domain::dictionary::DEFAULT_DICTIONARY_VAR;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::flags::{FlagState, FlagStore};
use crate::domain::hooks::{AttachContext, EmitContext, ExpandContext, FinalizeContext};
use crate::domain::ids::{IdAllocator, DEFAULT_ID_PREFIX};
use crate::domain::node::{Capabilities, Node, NodeId, NodeKind};
use crate::domain::storage::WorkingStorage;
use crate::domain::tree::NodeTree;
use crate::domain::widgets::PageHead;

pub const DEFAULT_MAX_EXPANSION_PASSES: usize = 32;
pub const DEFAULT_MAX_NODES: usize = 100_000;

/// Per-page tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOptions {
    pub id_prefix: String,
    /// Full passes over the tree before expansion is declared divergent
    pub max_expansion_passes: usize,
    /// Upper bound on nodes expanded by one compile
    pub max_nodes: usize,
    pub dictionary_var: String,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            max_expansion_passes: DEFAULT_MAX_EXPANSION_PASSES,
            max_nodes: DEFAULT_MAX_NODES,
            dictionary_var: DEFAULT_DICTIONARY_VAR.to_string(),
        }
    }
}

/// Shared state every node of one page can reach through its hooks.
#[derive(Debug)]
pub struct PageState {
    pub(crate) ids: IdAllocator,
    pub(crate) flags: FlagStore,
    pub(crate) storage: WorkingStorage,
    pub(crate) finalizers: Vec<NodeId>,
    pub(crate) style_rules: Vec<String>,
    // explicit ids seen on attach, never handed out by the allocator
    pub(crate) taken_ids: HashSet<String>,
    pub(crate) dictionary_var: String,
}

impl PageState {
    fn new(options: &PageOptions) -> Self {
        Self {
            ids: IdAllocator::new(options.id_prefix.clone()),
            flags: FlagStore::new(),
            storage: WorkingStorage::new(),
            finalizers: Vec::new(),
            style_rules: Vec::new(),
            taken_ids: HashSet::new(),
            dictionary_var: options.dictionary_var.clone(),
        }
    }

    pub(crate) fn allocate_id(&mut self) -> String {
        self.ids.next_id_avoiding(&self.taken_ids)
    }
}

/// Inserts a fresh node and runs its attach hook.
pub(crate) fn attach_new(
    tree: &mut NodeTree,
    state: &mut PageState,
    parent: NodeId,
    node: Node,
    index: Option<usize>,
) -> DomainResult<NodeId> {
    let explicit = node.id().map(str::to_string);
    let id = tree.insert_child(parent, node, index)?;
    if let Some(explicit) = explicit {
        state.taken_ids.insert(explicit);
    }
    notify_attached(tree, state, id)?;
    Ok(id)
}

/// Runs `on_attached` for every node of the subtree at `from` that is now
/// under the root and has not seen the hook yet.
pub(crate) fn notify_attached(
    tree: &mut NodeTree,
    state: &mut PageState,
    from: NodeId,
) -> DomainResult<()> {
    if !tree.is_reachable(from) {
        return Ok(());
    }
    for id in tree.preorder(from) {
        let node = tree.node_mut(id)?;
        if node.attached {
            continue;
        }
        node.attached = true;
        let node = tree.node(id)?;
        let mut cx = AttachContext {
            state: &mut *state,
            node: id,
        };
        node.kind().behavior().on_attached(node, &mut cx);
    }
    Ok(())
}

#[derive(Debug)]
struct PageInner {
    tree: NodeTree,
    state: PageState,
    expanded: bool,
    // first compile error; a page that failed to compile stays failed
    failure: Option<DomainError>,
    max_passes: usize,
    max_nodes: usize,
}

impl PageInner {
    fn ensure_mutable(&self) -> DomainResult<()> {
        if let Some(err) = &self.failure {
            return Err(DomainError::StructuralViolation(format!(
                "page failed to compile and cannot be changed: {err}"
            )));
        }
        if self.expanded {
            return Err(DomainError::StructuralViolation(
                "page has already been rendered; its tree is sealed".to_string(),
            ));
        }
        Ok(())
    }

    #[instrument(level = "debug", skip_all)]
    fn compile(&mut self, caps: &Capabilities) -> DomainResult<()> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let result = self
            .expand_all(caps)
            .and_then(|()| self.run_finalizers(caps));
        match result {
            Ok(()) => {
                self.expanded = true;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "compile failed");
                self.failure = Some(err.clone());
                Err(err)
            }
        }
    }

    fn expand_all(&mut self, caps: &Capabilities) -> DomainResult<()> {
        let mut budget = self.max_nodes;
        // a pass that expands nothing confirms the fixed point and is not counted
        for pass in 0..self.max_passes {
            let root = self.tree.root();
            let expanded = self.expand_subtree(root, caps, &mut budget)?;
            debug!(pass, expanded, "expansion pass");
            if expanded == 0 {
                return Ok(());
            }
        }
        let root = self.tree.root();
        if !self.has_unexpanded(root)? {
            return Ok(());
        }
        Err(DomainError::StructuralViolation(format!(
            "expansion did not settle after {} passes",
            self.max_passes
        )))
    }

    fn expand_subtree(
        &mut self,
        id: NodeId,
        caps: &Capabilities,
        budget: &mut usize,
    ) -> DomainResult<usize> {
        let mut expanded = 0;
        if !self.tree.node(id)?.is_expanded() {
            if *budget == 0 {
                return Err(DomainError::StructuralViolation(format!(
                    "expansion exceeded {} nodes",
                    self.max_nodes
                )));
            }
            *budget -= 1;
            self.expand_one(id, caps)?;
            expanded += 1;
        }
        // children appended while iterating are picked up by the index walk
        let mut index = 0;
        loop {
            let next = self.tree.node(id)?.children().get(index).copied();
            let Some(child) = next else {
                break;
            };
            expanded += self.expand_subtree(child, caps, budget)?;
            index += 1;
        }
        Ok(expanded)
    }

    fn has_unexpanded(&self, from: NodeId) -> DomainResult<bool> {
        for id in self.tree.preorder(from) {
            if !self.tree.node(id)?.is_expanded() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn expand_one(&mut self, id: NodeId, caps: &Capabilities) -> DomainResult<()> {
        let mut kind = std::mem::take(&mut self.tree.node_mut(id)?.kind);
        trace!(?id, kind = %kind.describe(), "expand");
        let result = {
            let mut cx = ExpandContext {
                tree: &mut self.tree,
                state: &mut self.state,
                node: id,
                caps,
            };
            kind.behavior_mut().expand(&mut cx)
        };
        let node = self.tree.node_mut(id)?;
        node.kind = kind;
        node.expanded = result.is_ok();
        result
    }

    fn run_finalizers(&mut self, caps: &Capabilities) -> DomainResult<()> {
        let finalizers = std::mem::take(&mut self.state.finalizers);
        debug!(count = finalizers.len(), "running finalizers");
        for id in finalizers {
            // a finalizer registered by a node detached afterwards is skipped
            let Some(node) = self.tree.get_mut(id) else {
                continue;
            };
            let mut kind = std::mem::take(&mut node.kind);
            let result = {
                let mut cx = FinalizeContext {
                    tree: &mut self.tree,
                    state: &mut self.state,
                    node: id,
                    caps,
                };
                kind.behavior_mut().finalize(&mut cx)
            };
            self.tree.node_mut(id)?.kind = kind;
            result?;
        }
        Ok(())
    }

    fn emit(&self, id: NodeId, cx: &EmitContext<'_>, out: &mut String) {
        let Some(node) = self.tree.get(id) else {
            return;
        };
        let widget = node.kind().behavior();
        widget.emit_open(node, cx, out);
        for &child in node.children() {
            self.emit(child, cx, out);
        }
        widget.emit_close(node, cx, out);
    }
}

/// Root container of a node tree plus the state its nodes share.
///
/// A page is built, mutated and rendered on one thread; debug builds assert
/// this. The internal lock only orders re-renders against the one-time
/// expansion.
#[derive(Debug)]
pub struct Page {
    inner: RwLock<PageInner>,
    owner: ThreadId,
}

impl Page {
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_options(title, PageOptions::default())
    }

    pub fn with_options(title: impl Into<String>, options: PageOptions) -> Self {
        Self::from_root(Node::new(NodeKind::Page(PageHead::new(title))), options)
    }

    /// Builds a page around a prepared root node (e.g. with body attributes).
    pub fn from_root(root: Node, options: PageOptions) -> Self {
        let mut state = PageState::new(&options);
        if let Some(id) = root.id() {
            state.taken_ids.insert(id.to_string());
        }
        Self {
            inner: RwLock::new(PageInner {
                tree: NodeTree::new(root),
                state,
                expanded: false,
                failure: None,
                max_passes: options.max_expansion_passes,
                max_nodes: options.max_nodes,
            }),
            owner: thread::current().id(),
        }
    }

    fn assert_owner(&self) {
        debug_assert_eq!(
            thread::current().id(),
            self.owner,
            "page used from a thread other than the one that created it"
        );
    }

    fn inner_mut(&mut self) -> &mut PageInner {
        self.assert_owner();
        self.inner.get_mut()
    }

    pub fn root(&self) -> NodeId {
        self.inner.read().tree.root()
    }

    pub fn title(&self) -> String {
        let inner = self.inner.read();
        match inner.tree.get(inner.tree.root()).map(Node::kind) {
            Some(NodeKind::Page(head)) => head.title().to_string(),
            _ => String::new(),
        }
    }

    /// Attaches a new node under `parent`, at `index` or at the end.
    #[instrument(level = "debug", skip(self, node), fields(kind = %node.tag()))]
    pub fn attach(
        &mut self,
        parent: NodeId,
        node: Node,
        index: Option<usize>,
    ) -> DomainResult<NodeId> {
        let inner = self.inner_mut();
        inner.ensure_mutable()?;
        attach_new(&mut inner.tree, &mut inner.state, parent, node, index)
    }

    pub fn append(&mut self, parent: NodeId, node: Node) -> DomainResult<NodeId> {
        self.attach(parent, node, None)
    }

    /// Re-attaches a node previously detached from this page.
    pub fn attach_existing(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: Option<usize>,
    ) -> DomainResult<()> {
        let inner = self.inner_mut();
        inner.ensure_mutable()?;
        inner.tree.attach_existing(parent, child, index)?;
        notify_attached(&mut inner.tree, &mut inner.state, child)
    }

    pub fn detach(&mut self, parent: NodeId, index: usize) -> DomainResult<NodeId> {
        let inner = self.inner_mut();
        inner.ensure_mutable()?;
        inner.tree.detach_at(parent, index)
    }

    /// Detaches all direct children of `parent` with id `id`.
    pub fn detach_matching(&mut self, parent: NodeId, id: &str) -> DomainResult<bool> {
        let inner = self.inner_mut();
        inner.ensure_mutable()?;
        inner.tree.detach_matching(parent, id)
    }

    pub fn clear(&mut self, parent: NodeId) -> DomainResult<usize> {
        let inner = self.inner_mut();
        inner.ensure_mutable()?;
        inner.tree.clear(parent)
    }

    pub fn child_at(&self, parent: NodeId, index: usize) -> DomainResult<NodeId> {
        self.inner.read().tree.child_at(parent, index)
    }

    pub fn count(&self, parent: NodeId) -> DomainResult<usize> {
        self.inner.read().tree.count(parent)
    }

    pub fn children(&self, parent: NodeId) -> DomainResult<Vec<NodeId>> {
        Ok(self.inner.read().tree.children(parent)?.to_vec())
    }

    pub fn find_by_id(&self, id: &str) -> DomainResult<NodeId> {
        self.inner.read().tree.find_by_id(id)
    }

    pub fn parent_of(&self, id: NodeId) -> DomainResult<Option<NodeId>> {
        Ok(self.inner.read().tree.node(id)?.parent())
    }

    /// Runs `f` against a node under the read lock.
    pub fn with_node<R>(&self, id: NodeId, f: impl FnOnce(&Node) -> R) -> DomainResult<R> {
        let inner = self.inner.read();
        Ok(f(inner.tree.node(id)?))
    }

    pub fn node_mut(&mut self, id: NodeId) -> DomainResult<&mut Node> {
        let inner = self.inner_mut();
        inner.ensure_mutable()?;
        inner.tree.node_mut(id)
    }

    pub fn next_id(&mut self) -> String {
        self.inner_mut().state.allocate_id()
    }

    pub fn flag(&self, key: &str) -> Option<FlagState> {
        self.inner.read().state.flags.get(key)
    }

    pub fn set_flag(&mut self, key: impl Into<String>, state: FlagState) {
        self.inner_mut().state.flags.set(key, state);
    }

    pub fn storage_mut(&mut self) -> &mut WorkingStorage {
        &mut self.inner_mut().state.storage
    }

    pub fn with_storage<R>(&self, f: impl FnOnce(&WorkingStorage) -> R) -> R {
        f(&self.inner.read().state.storage)
    }

    pub fn style_rules(&self) -> Vec<String> {
        self.inner.read().state.style_rules.clone()
    }

    pub fn is_expanded(&self) -> bool {
        self.inner.read().expanded
    }

    /// Expands and finalizes the tree without emitting; no-op once done.
    ///
    /// A failed compile is final: later calls return the same error.
    pub fn compile(&self, caps: &Capabilities) -> DomainResult<()> {
        self.assert_owner();
        let guard = self.inner.upgradable_read();
        if guard.expanded {
            return Ok(());
        }
        RwLockUpgradableReadGuard::upgrade(guard).compile(caps)
    }

    /// Renders the page to markup.
    ///
    /// The first call compiles the tree; every call emits it again, and
    /// repeated renders of an unchanged page are byte-identical.
    #[instrument(level = "debug", skip_all)]
    pub fn render(&self, caps: &Capabilities) -> DomainResult<String> {
        self.assert_owner();
        let guard = self.inner.upgradable_read();
        let guard = if guard.expanded {
            RwLockUpgradableReadGuard::downgrade(guard)
        } else {
            let mut write = RwLockUpgradableReadGuard::upgrade(guard);
            write.compile(caps)?;
            RwLockWriteGuard::downgrade(write)
        };

        let cx = EmitContext {
            tree: &guard.tree,
            state: &guard.state,
            caps,
        };
        let mut out = String::with_capacity(guard.tree.len() * 32);
        guard.emit(guard.tree.root(), &cx, &mut out);
        debug!(bytes = out.len(), "rendered");
        Ok(out)
    }
}
