//! Entity groups: addressable siblings with one active member
//!
//! An [`EntityGroup`] manages a set of entities stored under
//! `<group>/entities/<index>`. Each entity:
//!
//! - is known by a caller key `K` and by its tree index (see [`EntityRegistry`]),
//! - owns a child [`Lifetime`] of the group's lifetime,
//! - carries a boolean `active` flag at `<group>/entities/<index>/active`.
//!
//! At most one entity is active at a time. Removing the active entity
//! promotes exactly one remaining sibling, picked by the configured
//! [`ActivationOrder`] (lowest index first by default). Removing the last
//! entity promotes nobody.
//!
//! ## Removal sequence
//!
//! ```text
//! 1. ONE transaction:
//!    a. look up the entity index (UnknownEntity if absent)
//!    b. delete the entity subtree, promote a sibling if needed
//!    c. unregister the key
//! 2. Terminate the entity lifetime (host objects below it are detached)
//! 3. Release the index for reuse
//! ```
//!
//! Registry bookkeeping happens inside the transaction body, so the model's
//! writer slot is the only lock a group operation waits on. A group call
//! from an observer on the committing thread fails with
//! `ReentrantTransaction`; on any other thread it waits for the commit.
//!
//! The index stays reserved until its lifetime cleanup has finished, so a
//! reused index never inherits cleanup meant for its previous owner.

use crate::config::{ActivationOrder, ModelConfig};
use crate::error::{EngineError, EngineResult};
use crate::host::{HostObject, HostTable};
use crate::registry::EntityRegistry;
use parking_lot::Mutex;
use reactive_concurrency::ReactiveModel;
use reactive_core::{delete, get, put, put_meta, try_put, ModelError, ModelResult, Node, Path, Value};
use reactive_lifetime::{Lifetime, LifetimeError};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Child of the group node holding the entities
pub const ENTITIES_KEY: &str = "entities";
/// Child of an entity node holding its active flag
pub const ACTIVE_KEY: &str = "active";
/// Metadata key tagging the group node
pub const KIND_META: &str = "kind";
/// Metadata value tagging the group node
pub const GROUP_KIND: &str = "entity-group";
/// Host-table key used by [`EntityGroup::attach_host`]
pub const HOST_KEY: &str = "host";

/// What [`EntityGroup::add`] hands back
#[derive(Debug, Clone)]
pub struct EntityHandle {
    /// Index of the entity in the group
    pub index: usize,
    /// Tree location of the entity
    pub path: Path,
    /// Scope that ends when the entity is removed
    pub lifetime: Lifetime,
}

struct Members<K> {
    registry: EntityRegistry<K>,
    lifetimes: BTreeMap<usize, Lifetime>,
}

/// A group of sibling entities with exclusive active selection
pub struct EntityGroup<K> {
    path: Path,
    entities: Path,
    model: Arc<ReactiveModel>,
    hosts: Arc<HostTable>,
    lifetime: Lifetime,
    strict_paths: bool,
    activation_order: ActivationOrder,
    /// Mutated only inside transaction bodies; never held across a commit
    members: Mutex<Members<K>>,
}

impl<K> EntityGroup<K>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    /// Install a group at `path`
    ///
    /// Existing content at `path` is kept; the node is tagged with
    /// `kind = "entity-group"`. The group lifetime is a child of `parent`.
    pub fn open(
        path: Path,
        model: Arc<ReactiveModel>,
        hosts: Arc<HostTable>,
        parent: &Lifetime,
        config: &ModelConfig,
    ) -> EngineResult<Self> {
        let entities = path.append(ENTITIES_KEY);
        // deepest path the group will ever write
        entities
            .append(0usize)
            .append(ACTIVE_KEY)
            .validate_max(config.max_path_length)
            .map_err(ModelError::from)?;

        let lifetime = Lifetime::create(parent)?;
        let group = EntityGroup {
            path,
            entities,
            model,
            hosts,
            lifetime,
            strict_paths: config.strict_paths,
            activation_order: config.activation_order,
            members: Mutex::new(Members {
                registry: EntityRegistry::new(config.index_reuse),
                lifetimes: BTreeMap::new(),
            }),
        };

        let result = group.model.transaction(|root| match get(root, &group.path) {
            Some(node) if node.is_map() => Ok(put_meta(root, &group.path, KIND_META, GROUP_KIND)),
            Some(_) if group.strict_paths => Err(ModelError::InvalidPathTransition {
                path: group.path.clone(),
            }),
            _ => group.write(root, &group.path, Node::map().with_meta(KIND_META, GROUP_KIND)),
        });
        if let Err(e) = result {
            group.lifetime.terminate();
            return Err(e.into());
        }

        tracing::debug!(target: "reactive::engine", group = %group.path, "entity group opened");
        Ok(group)
    }

    /// Add an entity under a fresh index
    ///
    /// With `activate`, the new entity becomes the only active sibling in
    /// the same transaction that writes it.
    ///
    /// # Errors
    ///
    /// - [`EngineError::DuplicateEntity`] if `key` is already present
    /// - [`EngineError::Lifetime`] if the group has been terminated
    /// - [`EngineError::Model`] if the write fails; nothing is registered
    pub fn add(&self, key: K, node: Node, activate: bool) -> EngineResult<EntityHandle> {
        let (added, _) = self.model.transaction_with(|root| {
            let (index, lifetime, siblings) = match self.reserve(&key) {
                Ok(reserved) => reserved,
                Err(e) => return Ok((root.clone(), Err(e))),
            };
            let path = self.entity_path(index);
            let written = self.write(root, &path, node).and_then(|root| {
                if activate {
                    self.with_active(&root, &siblings, Some(index))
                } else {
                    self.write(&root, &self.flag_path(index), Node::primitive(false))
                }
            });
            match written {
                Ok(new_root) => Ok((new_root, Ok((index, path, lifetime)))),
                Err(e) => {
                    self.unreserve(&key, index);
                    lifetime.terminate();
                    Err(e)
                }
            }
        })?;
        let (index, path, lifetime) = added?;

        tracing::debug!(
            target: "reactive::engine",
            group = %self.path,
            index,
            activate,
            "entity added"
        );
        Ok(EntityHandle {
            index,
            path,
            lifetime,
        })
    }

    /// Remove an entity; returns the index of the sibling promoted to active
    ///
    /// A sibling is promoted only when the removed entity was active and
    /// at least one sibling remains.
    ///
    /// # Errors
    ///
    /// - [`EngineError::UnknownEntity`] if `key` is not present
    /// - [`EngineError::Model`] if the transaction fails; the entity stays
    pub fn remove(&self, key: &K) -> EngineResult<Option<usize>> {
        let (removed, _) = self.model.transaction_with(|root| {
            let (index, siblings) = {
                let members = self.members.lock();
                let Some(index) = members.registry.index_of(key) else {
                    return Ok((root.clone(), Err(EngineError::unknown_entity(key))));
                };
                let siblings: Vec<usize> = members
                    .registry
                    .indices()
                    .filter(|&i| i != index)
                    .collect();
                (index, siblings)
            };

            let was_active = self.flag(root, index);
            let (new_root, _) = delete(root, &self.entity_path(index));
            let promoted = if was_active {
                self.pick_successor(&siblings)
            } else {
                None
            };
            let new_root = match promoted {
                Some(next) => self.with_active(&new_root, &siblings, Some(next))?,
                None => new_root,
            };

            let lifetime = {
                let mut members = self.members.lock();
                members.registry.detach(key);
                members.lifetimes.remove(&index)
            };
            Ok((new_root, Ok((index, lifetime, promoted))))
        })?;
        let (index, lifetime, promoted) = removed?;

        if let Some(lifetime) = lifetime {
            lifetime.terminate();
        }
        self.members.lock().registry.release(index);

        tracing::debug!(
            target: "reactive::engine",
            group = %self.path,
            index,
            promoted = ?promoted,
            "entity removed"
        );
        Ok(promoted)
    }

    /// Make the entity for `key` the only active sibling
    pub fn set_active(&self, key: &K) -> EngineResult<()> {
        let (found, _) = self.model.transaction_with(|root| {
            let (index, siblings) = {
                let members = self.members.lock();
                let Some(index) = members.registry.index_of(key) else {
                    return Ok((root.clone(), Err(EngineError::unknown_entity(key))));
                };
                (index, members.registry.indices().collect::<Vec<_>>())
            };
            Ok((self.with_active(root, &siblings, Some(index))?, Ok(())))
        })?;
        found
    }

    /// Index of the active entity, if any
    pub fn active(&self) -> Option<usize> {
        let root = self.model.root();
        self.live_indices()
            .into_iter()
            .find(|&index| self.flag(&root, index))
    }

    /// Check if the entity at `index` is active
    pub fn is_active(&self, index: usize) -> bool {
        self.flag(&self.model.root(), index)
    }

    /// Index of the entity registered under `key`
    pub fn index_of(&self, key: &K) -> Option<usize> {
        self.members.lock().registry.index_of(key)
    }

    /// Key of the entity at `index`
    pub fn key_of(&self, index: usize) -> Option<K> {
        self.members.lock().registry.key_of(index).cloned()
    }

    /// Registered `(index, key)` pairs in index order
    pub fn entries(&self) -> Vec<(usize, K)> {
        let members = self.members.lock();
        members
            .registry
            .indices()
            .filter_map(|i| members.registry.key_of(i).map(|k| (i, k.clone())))
            .collect()
    }

    /// Lifetime of the entity registered under `key`
    pub fn entity_lifetime(&self, key: &K) -> Option<Lifetime> {
        let members = self.members.lock();
        let index = members.registry.index_of(key)?;
        members.lifetimes.get(&index).cloned()
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.members.lock().registry.len()
    }

    /// Check if the group has no entities
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tree location of the entity at `index`
    pub fn entity_path(&self, index: usize) -> Path {
        self.entities.append(index)
    }

    /// Tree location of the group
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Scope of the whole group; terminating it terminates every entity
    pub fn lifetime(&self) -> &Lifetime {
        &self.lifetime
    }

    /// Attach a host object to the entity for `key`
    ///
    /// The object lives in the runtime's [`HostTable`], not in the tree,
    /// and is detached automatically when the entity is removed. Returns
    /// the previously attached object, if any.
    ///
    /// # Errors
    ///
    /// - [`EngineError::UnknownEntity`] if `key` is not present
    /// - [`EngineError::Lifetime`] if the entity's lifetime has ended,
    ///   e.g. after the group or runtime was shut down
    pub fn attach_host<T>(&self, key: &K, host: T) -> EngineResult<Option<HostObject>>
    where
        T: Any + Send + Sync,
    {
        let (index, lifetime) = {
            let members = self.members.lock();
            let index = members
                .registry
                .index_of(key)
                .ok_or_else(|| EngineError::unknown_entity(key))?;
            (index, members.lifetimes.get(&index).cloned())
        };
        let dead = |lifetime: &Option<Lifetime>| {
            lifetime
                .as_ref()
                .filter(|l| l.is_terminated())
                .map(|l| EngineError::from(LifetimeError::AlreadyTerminated { id: l.id() }))
        };
        if let Some(e) = dead(&lifetime) {
            return Err(e);
        }

        let path = self.entity_path(index);
        let previous = self.hosts.insert(path.clone(), HOST_KEY, host);
        // cleanup may have run between the check and the insert
        if let Some(e) = dead(&lifetime) {
            self.hosts.remove(&path, HOST_KEY);
            return Err(e);
        }
        Ok(previous)
    }

    /// Host object attached to the entity for `key`, if it is a `T`
    pub fn host<T>(&self, key: &K) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let index = self.index_of(key)?;
        self.hosts.get::<T>(&self.entity_path(index), HOST_KEY)
    }

    fn flag_path(&self, index: usize) -> Path {
        self.entity_path(index).append(ACTIVE_KEY)
    }

    fn flag(&self, root: &Node, index: usize) -> bool {
        get(root, &self.flag_path(index))
            .and_then(Node::as_primitive)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Register `key` and open its lifetime; called inside a transaction body
    fn reserve(&self, key: &K) -> EngineResult<(usize, Lifetime, Vec<usize>)> {
        let (index, lifetime, siblings) = {
            let mut members = self.members.lock();
            let index = members
                .registry
                .insert(key.clone())
                .ok_or_else(|| EngineError::duplicate_entity(key))?;
            let lifetime = match Lifetime::create(&self.lifetime) {
                Ok(lifetime) => lifetime,
                Err(e) => {
                    members.registry.remove(key);
                    return Err(e.into());
                }
            };
            members.lifetimes.insert(index, lifetime.clone());
            let siblings: Vec<usize> = members.registry.indices().collect();
            (index, lifetime, siblings)
        };

        let hosts = Arc::downgrade(&self.hosts);
        let cleanup_path = self.entity_path(index);
        lifetime.on_termination(move || {
            if let Some(hosts) = hosts.upgrade() {
                hosts.remove_subtree(&cleanup_path);
            }
        });
        Ok((index, lifetime, siblings))
    }

    fn unreserve(&self, key: &K, index: usize) {
        let mut members = self.members.lock();
        members.lifetimes.remove(&index);
        members.registry.remove(key);
    }

    /// Registered indices; the registry, not the tree, defines the siblings
    fn live_indices(&self) -> Vec<usize> {
        self.members.lock().registry.indices().collect()
    }

    fn pick_successor(&self, siblings: &[usize]) -> Option<usize> {
        match self.activation_order {
            ActivationOrder::Ascending => siblings.iter().min().copied(),
            ActivationOrder::Descending => siblings.iter().max().copied(),
        }
    }

    /// Rewrite the flags of `siblings` so that only `active` is set
    fn with_active(&self, root: &Node, siblings: &[usize], active: Option<usize>) -> ModelResult<Node> {
        let mut root = root.clone();
        for &index in siblings {
            let wanted = Some(index) == active;
            if self.flag(&root, index) != wanted {
                root = self.write(&root, &self.flag_path(index), Node::primitive(wanted))?;
            }
        }
        Ok(root)
    }

    fn write(&self, root: &Node, path: &Path, node: Node) -> ModelResult<Node> {
        if self.strict_paths {
            try_put(root, path, node)
        } else {
            Ok(put(root, path, node))
        }
    }
}

impl<K> fmt::Debug for EntityGroup<K>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityGroup")
            .field("path", &self.path)
            .field("entities", &self.members.lock().registry.len())
            .field("lifetime", &self.lifetime)
            .finish()
    }
}
