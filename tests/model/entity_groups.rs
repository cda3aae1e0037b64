//! Entity Group Tests
//!
//! The sibling active-selection contract as an editor-tab host would use it:
//! - Removing the active entity promotes exactly one sibling
//! - Removing the last entity promotes nobody
//! - Entity lifetimes end with removal; host objects go with them
//! - Config-driven policies (promotion order, index reuse, strict paths)

use crate::common::*;
use reactive_model::{
    ActivationOrder, EngineError, IndexReuse, ModelError, CONFIG_FILE_NAME,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Debug)]
struct EditorController {
    file: String,
}

fn editor(title: &str) -> Node {
    Node::map().with_child("title", Node::primitive(title))
}

fn tabs(rt: &Runtime) -> EntityGroup<String> {
    rt.group(p("/workspace/tabs")).unwrap()
}

// ============================================================================
// Sibling Selection
// ============================================================================

#[test]
fn removing_active_promotes_next_ascending() {
    let rt = runtime();
    let group = tabs(&rt);
    for (i, name) in ["a.rs", "b.rs", "c.rs"].iter().enumerate() {
        group.add(name.to_string(), editor(name), i == 0).unwrap();
    }
    assert_eq!(group.active(), Some(0));

    assert_eq!(group.remove(&"a.rs".to_string()).unwrap(), Some(1));
    assert_eq!(group.active(), Some(1));
    assert!(!group.is_active(2));
}

#[test]
fn removing_last_sibling_activates_none() {
    let rt = runtime();
    let group = tabs(&rt);
    group.add("only.rs".to_string(), editor("only.rs"), true).unwrap();

    assert_eq!(group.remove(&"only.rs".to_string()).unwrap(), None);
    assert_eq!(group.active(), None);
    assert!(group.is_empty());
    let entities = rt.model().get(&p("/workspace/tabs/entities")).unwrap();
    assert!(entities.is_empty());
}

#[test]
fn removal_and_promotion_are_one_commit() {
    let rt = runtime();
    let group = tabs(&rt);
    group.add("a".to_string(), editor("a"), true).unwrap();
    group.add("b".to_string(), editor("b"), false).unwrap();

    let recorder = Recorder::new();
    recorder.watch(rt.model(), "/workspace/tabs");
    let before = rt.model().version();

    group.remove(&"a".to_string()).unwrap();

    assert_eq!(rt.model().version(), before + 1);
    assert_eq!(recorder.len(), 1);
    let event = recorder.last().unwrap();
    // observers see the removal and the promotion together
    assert!(event.changes.iter().any(|c| c.path == p("/workspace/tabs/entities/0")));
    assert!(event
        .changes
        .iter()
        .any(|c| c.path == p("/workspace/tabs/entities/1/active")));
}

#[test]
fn descending_order_promotes_highest() {
    let rt = runtime_with(ModelConfig {
        activation_order: ActivationOrder::Descending,
        ..ModelConfig::default()
    });
    let group = tabs(&rt);
    for name in ["a", "b", "c", "d"] {
        group.add(name.to_string(), editor(name), name == "b").unwrap();
    }
    assert_eq!(group.remove(&"b".to_string()).unwrap(), Some(3));
}

#[test]
fn set_active_moves_the_flag() {
    let rt = runtime();
    let group = tabs(&rt);
    group.add("a".to_string(), editor("a"), true).unwrap();
    group.add("b".to_string(), editor("b"), false).unwrap();

    group.set_active(&"b".to_string()).unwrap();
    assert_eq!(group.active(), Some(1));
    assert_eq!(
        rt.model()
            .get(&p("/workspace/tabs/entities/0/active"))
            .and_then(|n| n.as_primitive().cloned()),
        Some(Value::Bool(false))
    );
}

// ============================================================================
// Lifetimes And Hosts
// ============================================================================

#[test]
fn removal_terminates_entity_lifetime_and_runs_cleanup() {
    let rt = runtime();
    let group = tabs(&rt);
    let handle = group.add("a".to_string(), editor("a"), true).unwrap();

    let disposed = Arc::new(AtomicUsize::new(0));
    let d = Arc::clone(&disposed);
    handle.lifetime.on_termination(move || {
        d.fetch_add(1, Ordering::SeqCst);
    });

    group
        .attach_host(&"a".to_string(), EditorController { file: "a".into() })
        .unwrap();
    assert_eq!(
        group
            .host::<EditorController>(&"a".to_string())
            .map(|c| c.file.clone()),
        Some("a".to_string())
    );

    group.remove(&"a".to_string()).unwrap();
    assert!(handle.lifetime.is_terminated());
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
    assert!(rt.hosts().is_empty());
}

#[test]
fn host_objects_are_not_part_of_the_tree() {
    let rt = runtime();
    let group = tabs(&rt);
    group.add("a".to_string(), editor("a"), true).unwrap();
    let version = rt.model().version();
    let root = rt.model().root();

    group
        .attach_host(&"a".to_string(), EditorController { file: "a".into() })
        .unwrap();

    assert_eq!(rt.model().version(), version);
    assert!(Node::ptr_eq(&rt.model().root(), &root));
}

#[test]
fn shutdown_ends_every_entity() {
    let rt = runtime();
    let group = tabs(&rt);
    let handles: Vec<_> = ["a", "b"]
        .iter()
        .map(|n| group.add(n.to_string(), editor(n), false).unwrap())
        .collect();

    rt.shutdown();
    assert!(handles.iter().all(|h| h.lifetime.is_terminated()));
    assert!(matches!(
        group.add("c".to_string(), editor("c"), true),
        Err(EngineError::Lifetime(_))
    ));
    assert!(matches!(
        group.attach_host(&"a".to_string(), EditorController { file: "a".into() }),
        Err(EngineError::Lifetime(_))
    ));
    assert!(rt.hosts().is_empty());
}

// ============================================================================
// Errors And Policies
// ============================================================================

#[test]
fn duplicate_and_unknown_keys() {
    let rt = runtime();
    let group = tabs(&rt);
    group.add("a".to_string(), editor("a"), true).unwrap();

    assert!(matches!(
        group.add("a".to_string(), editor("a"), true),
        Err(EngineError::DuplicateEntity { .. })
    ));
    assert!(matches!(
        group.remove(&"zzz".to_string()),
        Err(EngineError::UnknownEntity { .. })
    ));
    assert!(matches!(
        group.set_active(&"zzz".to_string()),
        Err(EngineError::UnknownEntity { .. })
    ));
}

#[test]
fn index_reuse_policies() {
    let reuse = runtime();
    let never = runtime_with(ModelConfig {
        index_reuse: IndexReuse::Never,
        ..ModelConfig::default()
    });

    for rt in [&reuse, &never] {
        let group = tabs(rt);
        for name in ["a", "b", "c"] {
            group.add(name.to_string(), editor(name), false).unwrap();
        }
        group.remove(&"b".to_string()).unwrap();
        let next = group.add("d".to_string(), editor("d"), false).unwrap().index;
        let expected = if rt.config().index_reuse == IndexReuse::Never { 3 } else { 1 };
        assert_eq!(next, expected);
    }
}

#[test]
fn strict_paths_surface_invalid_transitions() {
    let rt = runtime_with(ModelConfig {
        strict_paths: true,
        ..ModelConfig::default()
    });
    rt.model()
        .transaction(|root| Ok(put(root, &p("/workspace"), Node::primitive("not a map"))))
        .unwrap();

    let err = rt.group::<String>(p("/workspace/tabs")).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Model(ModelError::InvalidPathTransition { .. })
    ));
}

#[test]
fn runtime_from_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "activation_order = \"descending\"\n").unwrap();

    let rt = Runtime::from_config_file(&path).unwrap();
    let group = tabs(&rt);
    group.add("a".to_string(), editor("a"), false).unwrap();
    group.add("b".to_string(), editor("b"), false).unwrap();
    group.add("c".to_string(), editor("c"), true).unwrap();
    group.set_active(&"a".to_string()).unwrap();
    assert_eq!(group.remove(&"a".to_string()).unwrap(), Some(2));
}
