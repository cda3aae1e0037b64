//! Shared test utilities for the integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a test's main.rs.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::{Arc, Once};

pub use reactive_model::{
    get, get_value, put, ChangeEvent, EntityGroup, Lifetime, ModelConfig, Node, Path,
    ReactiveModel, Runtime, Value,
};

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Install a fmt subscriber once per test binary.
///
/// Honors `RUST_LOG`, e.g. `RUST_LOG=reactive=debug cargo test -- --nocapture`.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Helpers
// ============================================================================

/// Parse a path literal
pub fn p(s: &str) -> Path {
    s.parse().expect("valid test path")
}

/// Read an integer primitive at `path`
pub fn int_at(root: &Node, path: &str) -> Option<i64> {
    get_value(root, &p(path)).and_then(Value::as_int)
}

/// A runtime with default config and tracing enabled
pub fn runtime() -> Runtime {
    init_tracing();
    Runtime::default()
}

/// A runtime built from `config`
pub fn runtime_with(config: ModelConfig) -> Runtime {
    init_tracing();
    Runtime::new(config).expect("valid config")
}

/// Records every event an observer receives
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<ChangeEvent>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe this recorder on `path`
    pub fn watch(&self, model: &ReactiveModel, path: &str) {
        let events = Arc::clone(&self.events);
        model.subscribe(p(path), move |e| events.lock().push(e.clone()));
    }

    /// Versions of every recorded event, in arrival order
    pub fn versions(&self) -> Vec<u64> {
        self.events.lock().iter().map(|e| e.version).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn last(&self) -> Option<ChangeEvent> {
        self.events.lock().last().cloned()
    }
}
