//! Tests for page tree mutation and lookup

use rstest::rstest;

use pagegen::domain::{
    Capabilities, DomainError, Frame, FrameSet, Node, NodeKind, Page, PageHead,
};

fn div(id: &str) -> Node {
    Node::new(NodeKind::element("div")).with_id(id)
}

#[test]
fn given_nested_ids_when_find_by_id_then_returns_node_or_not_found() {
    let mut page = Page::new("Find");
    let root = page.root();
    let outer = page.append(root, div("outer")).unwrap();
    let foo = page.append(outer, div("foo")).unwrap();

    assert_eq!(page.find_by_id("foo").unwrap(), foo);
    assert_eq!(page.parent_of(foo).unwrap(), Some(outer));
    assert_eq!(
        page.find_by_id("missing").unwrap_err(),
        DomainError::NotFound("no node with id 'missing'".to_string())
    );
}

#[rstest]
#[case(0, true)]
#[case(2, true)]
#[case(3, false)]
fn given_two_children_when_attaching_at_index_then_bounds_checked(
    #[case] index: usize,
    #[case] ok: bool,
) {
    let mut page = Page::new("Bounds");
    let root = page.root();
    page.append(root, div("a")).unwrap();
    page.append(root, div("b")).unwrap();

    let result = page.attach(root, div("new"), Some(index));

    if ok {
        let id = result.unwrap();
        assert_eq!(page.child_at(root, index).unwrap(), id);
    } else {
        assert_eq!(
            result.unwrap_err(),
            DomainError::IndexOutOfRange { index: 3, len: 2 }
        );
    }
}

#[test]
fn given_index_past_end_when_child_at_then_index_out_of_range() {
    let mut page = Page::new("Bounds");
    let root = page.root();
    page.append(root, div("a")).unwrap();

    assert_eq!(
        page.child_at(root, 1).unwrap_err(),
        DomainError::IndexOutOfRange { index: 1, len: 1 }
    );
    assert!(matches!(
        page.detach(root, 5),
        Err(DomainError::IndexOutOfRange { index: 5, len: 1 })
    ));
}

#[test]
fn given_detached_node_when_attached_elsewhere_then_moves_with_subtree() {
    let mut page = Page::new("Move");
    let root = page.root();
    let left = page.append(root, div("left")).unwrap();
    let right = page.append(root, div("right")).unwrap();
    let item = page.append(left, div("item")).unwrap();
    page.append(item, Node::new(NodeKind::text("payload"))).unwrap();

    let detached = page.detach(left, 0).unwrap();
    assert_eq!(detached, item);
    assert_eq!(page.count(left).unwrap(), 0);
    assert_eq!(page.parent_of(item).unwrap(), None);
    assert!(page.find_by_id("item").is_err());

    page.attach_existing(right, item, None).unwrap();

    assert_eq!(page.children(right).unwrap(), vec![item]);
    assert_eq!(page.count(item).unwrap(), 1);
    let html = page.render(&Capabilities::new()).unwrap();
    assert!(html.contains("<div id=\"right\"><div id=\"item\">payload</div></div>"));
}

#[test]
fn given_attached_node_when_attach_existing_then_illegal_argument() {
    let mut page = Page::new("Twice");
    let root = page.root();
    let a = page.append(root, div("a")).unwrap();
    let b = page.append(root, div("b")).unwrap();

    assert!(matches!(
        page.attach_existing(b, a, None),
        Err(DomainError::IllegalArgument(_))
    ));
    assert!(matches!(
        page.attach_existing(a, root, None),
        Err(DomainError::IllegalArgument(_))
    ));
}

#[test]
fn given_detached_node_when_attached_below_own_child_then_structural_violation() {
    let mut page = Page::new("Cycle");
    let root = page.root();
    let a = page.append(root, div("a")).unwrap();
    let b = page.append(a, div("b")).unwrap();
    page.detach(root, 0).unwrap();

    assert!(matches!(
        page.attach_existing(b, a, None),
        Err(DomainError::StructuralViolation(_))
    ));
}

#[test]
fn given_duplicate_ids_when_detach_matching_then_all_removed_and_order_kept() {
    let mut page = Page::new("Remove");
    let root = page.root();
    let first = page.append(root, div("keep1")).unwrap();
    page.append(root, div("dup")).unwrap();
    let second = page.append(root, div("keep2")).unwrap();
    page.append(root, div("dup")).unwrap();

    assert!(page.detach_matching(root, "dup").unwrap());
    assert_eq!(page.children(root).unwrap(), vec![first, second]);
    assert!(!page.detach_matching(root, "dup").unwrap());
}

#[test]
fn given_children_when_cleared_then_count_zero_and_lookups_fail() {
    let mut page = Page::new("Clear");
    let root = page.root();
    let list = page.append(root, div("list")).unwrap();
    page.append(list, div("x")).unwrap();
    page.append(list, div("y")).unwrap();

    assert_eq!(page.clear(list).unwrap(), 2);
    assert_eq!(page.count(list).unwrap(), 0);
    assert!(matches!(page.find_by_id("x"), Err(DomainError::NotFound(_))));
}

#[test]
fn given_frame_outside_frame_set_when_attaching_then_structural_violation() {
    let mut page = Page::new("Frames");
    let root = page.root();
    let holder = page.append(root, div("holder")).unwrap();

    let err = page
        .append(holder, Node::new(NodeKind::Frame(Frame::new("/a.html"))))
        .unwrap_err();

    assert_eq!(
        err,
        DomainError::StructuralViolation("frame must be placed inside a frame_set".to_string())
    );
    assert_eq!(page.count(holder).unwrap(), 0);
}

#[test]
fn given_frame_below_frame_set_descendant_when_attaching_then_accepted() {
    let mut page = Page::new("Frames");
    let root = page.root();
    let set = page
        .append(root, Node::new(NodeKind::FrameSet(FrameSet::new().with_cols("50%,50%"))))
        .unwrap();
    let wrapper = page.append(set, Node::new(NodeKind::default())).unwrap();

    page.append(set, Node::new(NodeKind::Frame(Frame::new("/a.html"))))
        .unwrap();
    page.append(
        wrapper,
        Node::new(NodeKind::Frame(Frame::new("/b.html").with_name("right"))),
    )
    .unwrap();

    let html = page.render(&Capabilities::new()).unwrap();
    assert!(html.contains("<frameset cols=\"50%,50%\">"));
    assert!(html.contains("<frame src=\"/b.html\" name=\"right\">"));
    assert_eq!(page.style_rules(), vec!["frameset { border: 0; }".to_string()]);
}

#[rstest]
#[case(NodeKind::text("leaf"))]
#[case(NodeKind::element("input"))]
#[case(NodeKind::script("var a;"))]
fn given_leaf_parent_when_attaching_then_structural_violation(#[case] leaf: NodeKind) {
    let mut page = Page::new("Leaf");
    let root = page.root();
    let parent = page.append(root, Node::new(leaf)).unwrap();

    assert!(matches!(
        page.append(parent, div("child")),
        Err(DomainError::StructuralViolation(_))
    ));
}

#[test]
fn given_page_kind_when_attaching_then_illegal_argument() {
    let mut page = Page::new("Nested");
    let root = page.root();

    let err = page
        .append(root, Node::new(NodeKind::Page(PageHead::new("inner"))))
        .unwrap_err();

    assert!(matches!(err, DomainError::IllegalArgument(_)));
}

#[test]
fn given_node_when_editing_classes_then_deduplicated_and_emitted() {
    let mut page = Page::new("Classes");
    let root = page.root();
    let id = page
        .append(root, div("box").with_classes(["a", "b"]))
        .unwrap();
    {
        let node = page.node_mut(id).unwrap();
        node.add_class("a");
        node.add_class("c");
        assert!(node.remove_class("b"));
        node.set_attribute("role", "note");
    }

    let html = page.render(&Capabilities::new()).unwrap();

    assert!(html.contains("<div id=\"box\" class=\"a c\" role=\"note\"></div>"), "{html}");
}

#[test]
fn given_frame_set_built_under_detached_container_when_reattached_then_style_rule_registered() {
    let mut page = Page::new("Frames");
    let root = page.root();
    let holder = page.append(root, Node::new(NodeKind::element("div"))).unwrap();
    page.detach(root, 0).unwrap();
    let set = page
        .append(holder, Node::new(NodeKind::FrameSet(FrameSet::new())))
        .unwrap();
    page.append(set, Node::new(NodeKind::Frame(Frame::new("/a.html"))))
        .unwrap();
    assert!(page.style_rules().is_empty());

    page.attach_existing(root, holder, None).unwrap();

    assert_eq!(page.style_rules(), vec!["frameset { border: 0; }".to_string()]);
    let html = page.render(&Capabilities::new()).unwrap();
    assert!(html.contains("<frameset>"), "{html}");
    assert!(html.contains("frameset { border: 0; }"), "{html}");
}

#[test]
fn given_frame_set_moved_within_page_when_reattached_then_style_rule_kept_once() {
    let mut page = Page::new("Frames");
    let root = page.root();
    let left = page.append(root, div("left")).unwrap();
    let right = page.append(root, div("right")).unwrap();
    page.append(left, Node::new(NodeKind::FrameSet(FrameSet::new())))
        .unwrap();

    let set = page.detach(left, 0).unwrap();
    page.attach_existing(right, set, None).unwrap();

    assert_eq!(page.style_rules().len(), 1);
}
