//! Text outline of a page tree.
use termtree::Tree;
use tracing::instrument;

use crate::domain::{DomainResult, Node, NodeId, Page};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> DomainResult<Tree<String>>;
}

impl TreeNodeConvert for Page {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> DomainResult<Tree<String>> {
        fn build_tree(page: &Page, id: NodeId) -> DomainResult<Tree<String>> {
            let label = page.with_node(id, node_label)?;
            let leaves = page
                .children(id)?
                .into_iter()
                .map(|child| build_tree(page, child))
                .collect::<DomainResult<Vec<_>>>()?;
            Ok(Tree::new(label).with_leaves(leaves))
        }

        build_tree(self, self.root())
    }
}

/// `kind #id .class1.class2`
pub fn node_label(node: &Node) -> String {
    let mut label = node.kind().describe();
    if let Some(id) = node.id() {
        label.push_str(" #");
        label.push_str(id);
    }
    if !node.classes().is_empty() {
        label.push_str(" .");
        label.push_str(&node.classes().join("."));
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Capabilities, NodeKind};

    #[test]
    fn given_nested_page_when_outlined_then_children_are_leaves() {
        let mut page = Page::new("Outline");
        let root = page.root();
        let div = page
            .append(root, Node::new(NodeKind::element("div")).with_id("main").with_class("wide"))
            .unwrap();
        page.append(div, Node::new(NodeKind::text("hi"))).unwrap();
        page.compile(&Capabilities::new()).unwrap();

        let tree = page.to_tree_string().unwrap();
        let rendered = tree.to_string();

        assert!(rendered.contains("div #main .wide"), "{rendered}");
        assert_eq!(tree.leaves.len(), 1);
        assert_eq!(tree.leaves[0].leaves.len(), 1);
    }
}
