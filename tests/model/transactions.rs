//! Transaction Tests
//!
//! Tests the commit contract of ReactiveModel:
//! - Identity and value-equal transforms are no-ops
//! - Failed transforms leave the root untouched
//! - Observers hear affected paths, after the root is visible
//! - Nested transactions fail instead of deadlocking

use crate::common::*;
use reactive_model::{update, ModelError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

fn seeded() -> ReactiveModel {
    init_tracing();
    let model = ReactiveModel::new();
    model
        .transaction(|root| {
            let root = put(root, &p("/a/x"), Node::primitive(1i64));
            let root = put(&root, &p("/a/y"), Node::primitive(2i64));
            Ok(put(&root, &p("/b"), Node::primitive(3i64)))
        })
        .unwrap();
    model
}

// ============================================================================
// No-ops
// ============================================================================

#[test]
fn identity_transaction_changes_nothing() {
    let model = seeded();
    let before = model.snapshot();

    let commit = model.transaction(|root| Ok(root.clone())).unwrap();

    assert!(commit.is_noop());
    assert_eq!(commit.version, before.version());
    for path in ["/a", "/a/x", "/a/y", "/b", "/missing"] {
        assert_eq!(model.get(&p(path)), before.get(&p(path)).cloned());
    }
}

#[test]
fn noop_commit_does_not_notify() {
    let model = seeded();
    let recorder = Recorder::new();
    recorder.watch(&model, "/");

    model
        .transaction(|root| Ok(put(root, &p("/a/x"), Node::primitive(1i64))))
        .unwrap();
    assert_eq!(recorder.len(), 0);
    assert_eq!(model.version(), 1);
}

#[test]
fn removing_missing_entry_through_update_is_noop() {
    let model = seeded();
    let recorder = Recorder::new();
    recorder.watch(&model, "/");

    let commit = model
        .transaction(|root| Ok(update(root, &p("/x/y"), |_| None)))
        .unwrap();

    assert!(commit.is_noop());
    assert_eq!(recorder.len(), 0);
    assert!(model.get(&p("/x")).is_none());
}

// ============================================================================
// Aborts
// ============================================================================

#[test]
fn aborted_transaction_propagates_error_and_keeps_root() {
    let model = seeded();
    let before = model.root();

    let err = model
        .transaction(|root| {
            let staged = put(root, &p("/a/x"), Node::primitive(100i64));
            if int_at(&staged, "/a/x") > Some(10) {
                return Err(ModelError::aborted("x out of range"));
            }
            Ok(staged)
        })
        .unwrap_err();

    assert_eq!(
        err,
        ModelError::TransactionAborted {
            reason: "x out of range".to_string()
        }
    );
    assert!(Node::ptr_eq(&model.root(), &before));
    assert_eq!(model.version(), 1);
}

#[test]
fn panic_in_transform_leaves_model_usable() {
    let model = Arc::new(seeded());
    let m = Arc::clone(&model);
    assert!(thread::spawn(move || {
        let _ = m.transaction(|_| -> reactive_model::ModelResult<Node> { panic!("bug") });
    })
    .join()
    .is_err());

    assert_eq!(int_at(&model.root(), "/a/x"), Some(1));
    model
        .transaction(|root| Ok(put(root, &p("/c"), Node::primitive(4i64))))
        .unwrap();
    assert_eq!(model.version(), 2);
}

// ============================================================================
// Observers
// ============================================================================

#[test]
fn ancestors_and_descendants_hear_value_changes() {
    let model = seeded();
    let (root_obs, a_obs, ax_obs, b_obs) = (Recorder::new(), Recorder::new(), Recorder::new(), Recorder::new());
    root_obs.watch(&model, "/");
    a_obs.watch(&model, "/a");
    ax_obs.watch(&model, "/a/x/deep");
    b_obs.watch(&model, "/b");

    model
        .transaction(|root| Ok(put(root, &p("/a/x"), Node::primitive(5i64))))
        .unwrap();

    assert_eq!(root_obs.len(), 1);
    assert_eq!(a_obs.len(), 1);
    assert_eq!(ax_obs.len(), 1);
    assert_eq!(b_obs.len(), 0);
}

#[test]
fn one_event_per_observer_per_commit() {
    let model = seeded();
    let recorder = Recorder::new();
    recorder.watch(&model, "/a");

    let commit = model
        .transaction(|root| {
            let root = put(root, &p("/a/x"), Node::primitive(10i64));
            Ok(put(&root, &p("/a/y"), Node::primitive(20i64)))
        })
        .unwrap();

    assert_eq!(commit.changes.len(), 2);
    assert_eq!(recorder.len(), 1);
    assert_eq!(recorder.last().unwrap().changes.len(), 2);
}

#[test]
fn observers_run_before_transaction_returns() {
    let model = seeded();
    let recorder = Recorder::new();
    recorder.watch(&model, "/b");

    for i in 0..5i64 {
        model
            .transaction(|root| Ok(update(root, &p("/b"), |_| Some(Node::primitive(i + 10)))))
            .unwrap();
        assert_eq!(recorder.len(), (i + 1) as usize);
    }
    assert_eq!(recorder.versions(), vec![2, 3, 4, 5, 6]);
}

#[test]
fn scoped_observer_stops_with_its_lifetime() {
    let model = seeded();
    let scope = Lifetime::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    model
        .observe(&scope, p("/b"), move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    model
        .transaction(|root| Ok(put(root, &p("/b"), Node::primitive(7i64))))
        .unwrap();
    scope.terminate();
    model
        .transaction(|root| Ok(put(root, &p("/b"), Node::primitive(8i64))))
        .unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(model.observer_count(), 0);
}

// ============================================================================
// Re-entrancy
// ============================================================================

#[test]
fn transaction_inside_transform_fails_loudly() {
    let model = seeded();
    let result = model.transaction(|root| {
        model.transaction(|r| Ok(r.clone()))?;
        Ok(root.clone())
    });
    assert_eq!(result.unwrap_err(), ModelError::ReentrantTransaction);
    assert_eq!(model.version(), 1);
}

#[test]
fn other_threads_wait_for_the_writer() {
    let model = Arc::new(seeded());
    let m = Arc::clone(&model);
    let observer_thread_commit = Arc::new(AtomicUsize::new(0));
    let o = Arc::clone(&observer_thread_commit);

    // an observer that hands work to another thread and waits for it
    model.subscribe(p("/trigger"), move |_| {
        let m = Arc::clone(&m);
        let o = Arc::clone(&o);
        let worker = thread::spawn(move || {
            m.transaction(|root| Ok(put(root, &p("/followup"), Node::primitive(true))))
                .map(|c| o.store(c.version as usize, Ordering::SeqCst))
        });
        // not joined here: the worker is blocked until this commit finishes
        drop(worker);
    });

    model
        .transaction(|root| Ok(put(root, &p("/trigger"), Node::primitive(1i64))))
        .unwrap();

    // wait for the follow-up to land
    for _ in 0..1000 {
        if observer_thread_commit.load(Ordering::SeqCst) != 0 {
            break;
        }
        thread::sleep(std::time::Duration::from_millis(1));
    }
    assert_eq!(observer_thread_commit.load(Ordering::SeqCst), 3);
    assert!(model.get(&p("/followup")).is_some());
}
