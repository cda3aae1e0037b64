//! Navigation Tests
//!
//! Pure get/put/delete over persistent trees:
//! - Read-your-write and auto-created intermediates
//! - Structural sharing between versions
//! - Metadata preservation on pass-through levels
//! - Primitive-in-the-way policy (lenient and strict)

use crate::common::*;
use reactive_model::{delete, diff, put_meta, try_put, ChangeKind, ModelError, Segment};

// ============================================================================
// Read / Write
// ============================================================================

#[test]
fn nested_put_on_empty_root() {
    let root = put(&Node::map(), &p("a/b"), Node::primitive(1i64));

    assert_eq!(get(&root, &p("a/b")), Some(&Node::primitive(1i64)));
    let a = get(&root, &p("a")).unwrap();
    assert!(a.is_map());
    assert!(a.contains_key("b"));
}

#[test]
fn missing_paths_are_none_not_errors() {
    let root = put(&Node::map(), &p("/a"), Node::primitive(1i64));
    assert!(get(&root, &p("/b")).is_none());
    assert!(get(&root, &p("/a/deeper")).is_none());
    assert!(get(&Node::map(), &p("/x/y/z")).is_none());
}

#[test]
fn integer_segments_address_children() {
    let path = Path::root().key("tabs").index(3).key("title");
    let root = put(&Node::map(), &path, Node::primitive("notes.md"));

    assert_eq!(path.to_string(), "/tabs/3/title");
    assert_eq!(p("/tabs/3/title"), path);
    assert_eq!(path.segments()[1].as_index(), Some(3));
    assert_eq!(
        get_value(&root, &path).and_then(Value::as_str),
        Some("notes.md")
    );
    assert_eq!(Segment::from(3usize).as_str(), "3");
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn old_versions_remain_readable() {
    let v1 = put(&Node::map(), &p("/doc/title"), Node::primitive("draft"));
    let v2 = put(&v1, &p("/doc/title"), Node::primitive("final"));
    let (v3, _) = delete(&v2, &p("/doc"));

    assert_eq!(int_at(&v1, "/doc/title"), None);
    assert_eq!(
        get_value(&v1, &p("/doc/title")).and_then(Value::as_str),
        Some("draft")
    );
    assert_eq!(
        get_value(&v2, &p("/doc/title")).and_then(Value::as_str),
        Some("final")
    );
    assert!(get(&v3, &p("/doc")).is_none());
}

#[test]
fn untouched_branches_are_shared() {
    let root = put(&Node::map(), &p("/left/a"), Node::primitive(1i64));
    let root = put(&root, &p("/right/b"), Node::primitive(2i64));
    let next = put(&root, &p("/right/c"), Node::primitive(3i64));

    assert!(Node::ptr_eq(
        get(&root, &p("/left")).unwrap(),
        get(&next, &p("/left")).unwrap()
    ));
    assert!(!Node::ptr_eq(
        get(&root, &p("/right")).unwrap(),
        get(&next, &p("/right")).unwrap()
    ));
}

#[test]
fn diff_reports_only_touched_paths() {
    let root = put(&Node::map(), &p("/a/x"), Node::primitive(1i64));
    let root = put(&root, &p("/b/y"), Node::primitive(2i64));
    let next = put(&root, &p("/a/x"), Node::primitive(10i64));
    let (next, _) = delete(&next, &p("/b/y"));

    let changes = diff(&root, &next);
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].path, p("/a/x"));
    assert_eq!(changes[0].kind, ChangeKind::Replaced);
    assert_eq!(changes[1].path, p("/b/y"));
    assert_eq!(changes[1].kind, ChangeKind::Removed);
}

// ============================================================================
// Metadata
// ============================================================================

#[test]
fn metadata_survives_writes_below() {
    let root = put_meta(&Node::map(), &p("/panel"), "layout", "split");
    let root = put(&root, &p("/panel/left/width"), Node::primitive(240i64));
    let root = put(&root, &p("/panel/right"), Node::map());

    let panel = get(&root, &p("/panel")).unwrap();
    assert_eq!(panel.meta("layout"), Some(&Value::from("split")));
    assert_eq!(panel.len(), 2);
}

#[test]
fn replacing_a_node_replaces_its_metadata() {
    let root = put_meta(&Node::map(), &p("/panel"), "layout", "split");
    let root = put(&root, &p("/panel"), Node::map());
    assert!(get(&root, &p("/panel")).unwrap().metadata().is_empty());
}

// ============================================================================
// Primitive In The Way
// ============================================================================

#[test]
fn lenient_put_replaces_primitive_with_map() {
    let root = put(&Node::map(), &p("/a"), Node::primitive(1i64));
    let root = put(&root, &p("/a/b"), Node::primitive(2i64));
    assert!(get(&root, &p("/a")).unwrap().is_map());
    assert_eq!(int_at(&root, "/a/b"), Some(2));
}

#[test]
fn strict_put_reports_the_blocking_prefix() {
    let root = put(&Node::map(), &p("/a/b"), Node::primitive(1i64));
    let err = try_put(&root, &p("/a/b/c/d"), Node::primitive(2i64)).unwrap_err();
    assert_eq!(err, ModelError::InvalidPathTransition { path: p("/a/b") });
}
