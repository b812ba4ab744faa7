//! Arena-backed node tree.
//!
//! Containers own their children through `Node::children`; `Node::parent`
//! is a lookup-only back link. Detached subtrees stay in the arena as
//! orphans so callers can re-attach them elsewhere.

use generational_arena::Arena;
use tracing::{instrument, trace};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::{KindTag, Node, NodeId};

#[derive(Debug)]
pub struct NodeTree {
    arena: Arena<Node>,
    root: NodeId,
}

impl NodeTree {
    pub fn new(root: Node) -> Self {
        let mut arena = Arena::new();
        let root = NodeId(arena.insert(root));
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the arena, orphans included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.arena.get_mut(id.0)
    }

    pub fn node(&self, id: NodeId) -> DomainResult<&Node> {
        self.get(id).ok_or_else(|| missing(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> DomainResult<&mut Node> {
        self.get_mut(id).ok_or_else(|| missing(id))
    }

    pub fn children(&self, parent: NodeId) -> DomainResult<&[NodeId]> {
        Ok(self.node(parent)?.children())
    }

    pub fn count(&self, parent: NodeId) -> DomainResult<usize> {
        Ok(self.children(parent)?.len())
    }

    pub fn child_at(&self, parent: NodeId, index: usize) -> DomainResult<NodeId> {
        let children = self.children(parent)?;
        children
            .get(index)
            .copied()
            .ok_or(DomainError::IndexOutOfRange {
                index,
                len: children.len(),
            })
    }

    /// Parent chain of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.get(id).and_then(Node::parent),
        }
    }

    pub fn is_ancestor(&self, candidate: NodeId, of: NodeId) -> bool {
        self.ancestors(of).any(|a| a == candidate)
    }

    /// Whether `id` hangs below the root (or is the root).
    pub fn is_reachable(&self, id: NodeId) -> bool {
        id == self.root || self.is_ancestor(self.root, id)
    }

    /// Inserts a fresh node under `parent` after validating the attach.
    #[instrument(level = "trace", skip(self, node), fields(kind = %node.tag()))]
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        mut node: Node,
        index: Option<usize>,
    ) -> DomainResult<NodeId> {
        if node.tag() == KindTag::Page {
            return Err(DomainError::IllegalArgument(
                "a page cannot be attached below another node".to_string(),
            ));
        }
        let index = self.validate_attach(parent, node.tag(), required_of(&node), index)?;
        node.parent = Some(parent);
        let id = NodeId(self.arena.insert(node));
        self.node_mut(parent)?.children.insert(index, id);
        trace!(?id, ?parent, index, "attached");
        Ok(id)
    }

    /// Re-attaches a previously detached node (and its subtree).
    #[instrument(level = "trace", skip(self))]
    pub fn attach_existing(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: Option<usize>,
    ) -> DomainResult<()> {
        let node = self.node(child)?;
        if child == self.root {
            return Err(DomainError::IllegalArgument(
                "the page root cannot be attached".to_string(),
            ));
        }
        if node.parent().is_some() {
            return Err(DomainError::IllegalArgument(
                "node is already attached; detach it first".to_string(),
            ));
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(DomainError::StructuralViolation(
                "attaching a node below itself would create a cycle".to_string(),
            ));
        }
        let (tag, required) = (node.tag(), required_of(node));
        let index = self.validate_attach(parent, tag, required, index)?;
        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.insert(index, child);
        Ok(())
    }

    fn validate_attach(
        &self,
        parent: NodeId,
        tag: KindTag,
        required: Option<KindTag>,
        index: Option<usize>,
    ) -> DomainResult<usize> {
        let target = self.node(parent)?;
        if !target.accepts_children() {
            return Err(DomainError::StructuralViolation(format!(
                "{} nodes cannot hold children (attaching {})",
                target.tag(),
                tag
            )));
        }
        let len = target.children().len();
        let index = index.unwrap_or(len);
        if index > len {
            return Err(DomainError::IndexOutOfRange { index, len });
        }
        if let Some(required) = required {
            let satisfied = target.tag() == required
                || self
                    .ancestors(parent)
                    .any(|a| self.get(a).map(Node::tag) == Some(required));
            if !satisfied {
                return Err(DomainError::StructuralViolation(format!(
                    "{tag} must be placed inside a {required}"
                )));
            }
        }
        Ok(index)
    }

    /// Detaches the child at `index`; the subtree stays available as an orphan.
    pub fn detach_at(&mut self, parent: NodeId, index: usize) -> DomainResult<NodeId> {
        let child = self.child_at(parent, index)?;
        self.node_mut(parent)?.children.remove(index);
        self.node_mut(child)?.parent = None;
        Ok(child)
    }

    /// Detaches every direct child of `parent` whose id equals `id`.
    ///
    /// Returns whether anything was removed. Remaining children keep their
    /// relative order.
    pub fn detach_matching(&mut self, parent: NodeId, id: &str) -> DomainResult<bool> {
        let children = std::mem::take(&mut self.node_mut(parent)?.children);
        let (removed, kept): (Vec<NodeId>, Vec<NodeId>) = children
            .into_iter()
            .partition(|c| self.get(*c).and_then(Node::id) == Some(id));
        self.node_mut(parent)?.children = kept;
        for child in &removed {
            self.node_mut(*child)?.parent = None;
        }
        Ok(!removed.is_empty())
    }

    /// Removes all children of `parent` and frees their subtrees.
    pub fn clear(&mut self, parent: NodeId) -> DomainResult<usize> {
        let children = std::mem::take(&mut self.node_mut(parent)?.children);
        let count = children.len();
        for child in children {
            self.free_subtree(child);
        }
        Ok(count)
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current.0) {
                stack.extend(node.children);
            }
        }
    }

    /// Depth-first, pre-order list of `from` and its descendants.
    pub fn preorder(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.get(current) {
                order.push(current);
                // reverse so the leftmost child is visited first
                stack.extend(node.children.iter().rev());
            }
        }
        order
    }

    /// First node below the root (pre-order) carrying `id`.
    pub fn find_by_id(&self, id: &str) -> DomainResult<NodeId> {
        self.find_in(self.root, id)
    }

    pub fn find_in(&self, scope: NodeId, id: &str) -> DomainResult<NodeId> {
        self.preorder(scope)
            .into_iter()
            .find(|n| self.get(*n).and_then(Node::id) == Some(id))
            .ok_or_else(|| DomainError::NotFound(format!("no node with id '{id}'")))
    }
}

pub struct Ancestors<'a> {
    tree: &'a NodeTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(Node::parent);
        Some(current)
    }
}

fn required_of(node: &Node) -> Option<KindTag> {
    node.kind().behavior().required_ancestor()
}

fn missing(id: NodeId) -> DomainError {
    DomainError::NotFound(format!("node {:?} is not part of this page", id.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::NodeKind;
    use crate::domain::widgets::PageHead;

    fn tree() -> NodeTree {
        NodeTree::new(Node::new(NodeKind::Page(PageHead::new("t"))))
    }

    #[test]
    fn given_children_when_detach_at_then_indices_shift_down() {
        let mut t = tree();
        let root = t.root();
        let a = t.insert_child(root, Node::new(NodeKind::text("a")), None).unwrap();
        let b = t.insert_child(root, Node::new(NodeKind::text("b")), None).unwrap();

        assert_eq!(t.detach_at(root, 0).unwrap(), a);
        assert_eq!(t.child_at(root, 0).unwrap(), b);
        assert_eq!(t.node(a).unwrap().parent(), None);
        assert!(!t.is_reachable(a));
    }

    #[test]
    fn given_node_when_attached_below_itself_then_cycle_rejected() {
        let mut t = tree();
        let root = t.root();
        let outer = t.insert_child(root, Node::new(NodeKind::element("div")), None).unwrap();
        let inner = t.insert_child(outer, Node::new(NodeKind::element("div")), None).unwrap();
        t.detach_at(root, 0).unwrap();

        let err = t.attach_existing(inner, outer, None).unwrap_err();
        assert!(matches!(err, DomainError::StructuralViolation(_)));
    }

    #[test]
    fn given_cleared_container_when_looking_up_then_nodes_freed() {
        let mut t = tree();
        let root = t.root();
        let div = t.insert_child(root, Node::new(NodeKind::element("div")), None).unwrap();
        t.insert_child(div, Node::new(NodeKind::text("x")), None).unwrap();
        assert_eq!(t.len(), 3);

        assert_eq!(t.clear(root).unwrap(), 1);
        assert_eq!(t.len(), 1);
        assert!(t.get(div).is_none());
    }
}
