//! The runtime: one model, one host table, one root lifetime
//!
//! [`Runtime`] is the object an application keeps for as long as its
//! reactive state exists. It owns:
//!
//! - the [`ReactiveModel`] holding the current tree,
//! - the [`HostTable`] where host objects are attached by path,
//! - the root [`Lifetime`] every group and entity scope descends from,
//! - the [`ModelConfig`] it was built with.
//!
//! [`Runtime::shutdown`] terminates the root lifetime, which cascades into
//! every group and entity and detaches their host objects. The tree itself
//! is left as it was.

use crate::config::ModelConfig;
use crate::error::EngineResult;
use crate::group::EntityGroup;
use crate::host::HostTable;
use reactive_concurrency::ReactiveModel;
use reactive_core::Path;
use reactive_lifetime::Lifetime;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Owner of the model, the host side table and the root lifetime
pub struct Runtime {
    config: ModelConfig,
    model: Arc<ReactiveModel>,
    hosts: Arc<HostTable>,
    lifetime: Lifetime,
}

impl Runtime {
    /// Create a runtime with an empty tree
    ///
    /// # Errors
    ///
    /// Returns an error if `config` does not validate.
    pub fn new(config: ModelConfig) -> EngineResult<Self> {
        config.validate()?;
        let runtime = Self::build(config);
        tracing::debug!(
            target: "reactive::engine",
            lifetime = runtime.lifetime.id(),
            "runtime created"
        );
        Ok(runtime)
    }

    fn build(config: ModelConfig) -> Self {
        let hosts = Arc::new(HostTable::new());
        let lifetime = Lifetime::new();

        // host objects never outlive the runtime scope
        let weak_hosts = Arc::downgrade(&hosts);
        lifetime.on_termination(move || {
            if let Some(hosts) = weak_hosts.upgrade() {
                hosts.remove_subtree(&Path::root());
            }
        });

        Runtime {
            config,
            model: Arc::new(ReactiveModel::new()),
            hosts,
            lifetime,
        }
    }

    /// Create a runtime from a `reactive.toml` file
    pub fn from_config_file(path: &std::path::Path) -> EngineResult<Self> {
        Self::new(ModelConfig::from_file(path)?)
    }

    /// The model
    pub fn model(&self) -> &Arc<ReactiveModel> {
        &self.model
    }

    /// The host side table
    pub fn hosts(&self) -> &Arc<HostTable> {
        &self.hosts
    }

    /// The root lifetime
    pub fn lifetime(&self) -> &Lifetime {
        &self.lifetime
    }

    /// The configuration this runtime was built with
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Open an entity group at `path`
    ///
    /// The group's lifetime is a child of the runtime lifetime.
    pub fn group<K>(&self, path: Path) -> EngineResult<EntityGroup<K>>
    where
        K: Clone + Eq + Hash + fmt::Debug,
    {
        EntityGroup::open(
            path,
            Arc::clone(&self.model),
            Arc::clone(&self.hosts),
            &self.lifetime,
            &self.config,
        )
    }

    /// Terminate the root lifetime; returns false if already shut down
    pub fn shutdown(&self) -> bool {
        let first = self.lifetime.terminate();
        if first {
            tracing::info!(
                target: "reactive::engine",
                version = self.model.version(),
                "runtime shut down"
            );
        }
        first
    }

    /// Check if [`shutdown`](Self::shutdown) has run
    pub fn is_shut_down(&self) -> bool {
        self.lifetime.is_terminated()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::build(ModelConfig::default())
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("model", &self.model)
            .field("hosts", &self.hosts)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}
