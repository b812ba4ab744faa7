//! Tests for page-scoped ids, flags and working storage

use std::collections::HashSet;

use rstest::rstest;

use pagegen::domain::{
    Capabilities, DomainError, Field, FlagState, FlagStore, IdAllocator, Node, NodeKind, Page,
    PageOptions, WorkingStorage,
};

#[test]
fn given_page_when_allocating_many_ids_then_unique_and_strictly_increasing() {
    let mut page = Page::new("Ids");
    let allocator = IdAllocator::default();

    let ids: Vec<String> = (0..100).map(|_| page.next_id()).collect();

    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
    let sequence: Vec<u64> = ids
        .iter()
        .map(|id| allocator.sequence_of(id).unwrap())
        .collect();
    assert!(sequence.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn given_two_pages_when_allocating_then_sequences_independent() {
    let mut first = Page::new("a");
    let mut second = Page::new("b");

    assert_eq!(first.next_id(), "n1");
    assert_eq!(first.next_id(), "n2");
    assert_eq!(second.next_id(), "n1");
}

#[test]
fn given_explicit_id_matching_allocator_pattern_when_expanding_then_skipped() {
    let mut page = Page::new("Collide");
    let root = page.root();
    page.append(root, Node::new(NodeKind::element("div")).with_id("n1"))
        .unwrap();
    page.append(root, Node::new(NodeKind::Field(Field::new("f"))))
        .unwrap();

    let html = page.render(&Capabilities::new()).unwrap();

    assert_eq!(html.matches("id=\"n1\"").count(), 1, "{html}");
    assert!(html.contains("<span id=\"n2\" class=\"field\">"), "{html}");
}

#[test]
fn given_rejected_attach_with_explicit_id_when_allocating_then_id_still_available() {
    let mut page = Page::new("Rejected");
    let root = page.root();

    let result = page.attach(
        root,
        Node::new(NodeKind::element("div")).with_id("n1"),
        Some(5),
    );

    assert!(matches!(result, Err(DomainError::IndexOutOfRange { .. })));
    assert_eq!(page.next_id(), "n1");
}

#[test]
fn given_custom_prefix_when_allocating_then_prefix_used() {
    let mut page = Page::with_options(
        "Prefix",
        PageOptions {
            id_prefix: "w".into(),
            ..PageOptions::default()
        },
    );

    assert_eq!(page.next_id(), "w1");
}

#[test]
fn given_flag_never_set_when_get_then_distinct_from_explicit_unset() {
    let mut flags = FlagStore::new();
    assert_eq!(flags.get("k"), None);

    flags.set("k", FlagState::Unset);

    assert_eq!(flags.get("k"), Some(FlagState::Unset));
    assert_ne!(flags.get("k"), None);
}

#[rstest]
#[case(None, true)]
#[case(Some(FlagState::Unset), true)]
#[case(Some(FlagState::Pending), false)]
#[case(Some(FlagState::Done), false)]
fn given_flag_state_when_reserving_then_only_free_slots_granted(
    #[case] initial: Option<FlagState>,
    #[case] granted: bool,
) {
    let mut flags = FlagStore::new();
    if let Some(state) = initial {
        flags.set("slot", state);
    }

    assert_eq!(flags.reserve("slot"), granted);
    if granted {
        assert_eq!(flags.get("slot"), Some(FlagState::Pending));
    }
}

#[test]
fn given_page_flags_when_set_then_last_write_wins() {
    let mut page = Page::new("Flags");
    page.set_flag("guard", FlagState::Pending);
    page.set_flag("guard", FlagState::Done);

    assert_eq!(page.flag("guard"), Some(FlagState::Done));
    assert_eq!(page.flag("other"), None);
}

#[test]
fn given_list_under_key_when_get_or_create_append_then_order_kept() {
    let mut storage = WorkingStorage::new();
    storage.list_mut::<u32>("pending").push(1);
    storage.push("pending", 2u32);
    storage.list_mut::<u32>("pending").push(3);

    assert_eq!(storage.get::<Vec<u32>>("pending"), Some(&vec![1, 2, 3]));
    assert_eq!(storage.drain_list::<u32>("pending"), vec![1, 2, 3]);
    assert!(storage.drain_list::<u32>("pending").is_empty());
}

#[test]
fn given_value_of_other_type_when_get_then_none() {
    let mut storage = WorkingStorage::new();
    storage.put("count", 5usize);

    assert_eq!(storage.get::<String>("count"), None);
    assert_eq!(storage.take::<String>("count"), None);
    assert_eq!(storage.take::<usize>("count"), Some(5));
    assert!(!storage.contains("count"));
}

#[test]
fn given_page_storage_when_written_then_visible_through_reader() {
    let mut page = Page::new("Storage");
    page.storage_mut().put("title", "x".to_string());

    let value = page.with_storage(|s| s.get::<String>("title").cloned());

    assert_eq!(value.as_deref(), Some("x"));
}
