//! Tile instance pooling
//!
//! Faces are re-matched on every edit, so tile instances come and go
//! constantly. [`InstancePool`] keeps released instances around per tile id
//! and hands them out again before asking the host for a new one.

use std::collections::{BTreeMap, HashMap};

use mesh_tileset_core::{TileDefinition, TileId, Tileset};
use mesh_tileset_match::TilePlacement;

/// Host side of the pool: creates, shows, moves and destroys tile instances.
///
/// Handles are owned by the pool between `materialize` and `destroy`.
pub trait TileMaterializer {
    type Handle;

    /// Create an active instance of `tile` with all of its parts visible
    fn materialize(&mut self, tile: &TileDefinition) -> Self::Handle;

    fn set_active(&mut self, handle: &Self::Handle, active: bool);

    fn set_placement(&mut self, handle: &Self::Handle, placement: &TilePlacement);

    /// Show or hide every part of the instance carrying `tag`
    fn set_part_visibility(&mut self, handle: &Self::Handle, tag: &str, visible: bool);

    fn destroy(&mut self, handle: Self::Handle);
}

/// Non-owning reference to a pooled instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceKey(u64);

#[derive(Debug)]
struct PooledInstance<H> {
    tile: TileId,
    handle: H,
    active: bool,
}

/// Instances of catalog tiles, reused per tile id
#[derive(Debug)]
pub struct InstancePool<H> {
    instances: BTreeMap<InstanceKey, PooledInstance<H>>,
    available: HashMap<TileId, Vec<InstanceKey>>,
    next_key: u64,
    materialized: usize,
    destroyed: usize,
}

impl<H> Default for InstancePool<H> {
    fn default() -> Self {
        Self {
            instances: BTreeMap::new(),
            available: HashMap::new(),
            next_key: 0,
            materialized: 0,
            destroyed: 0,
        }
    }
}

impl<H> InstancePool<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an active instance of tile `id`.
    ///
    /// The most recently released instance of that tile is reused first.
    /// Otherwise a new one is materialized from the catalog definition.
    /// Returns `None` when the catalog has no tile `id`.
    pub fn acquire<M>(&mut self, host: &mut M, tileset: &Tileset, id: TileId) -> Option<InstanceKey>
    where
        M: TileMaterializer<Handle = H>,
    {
        if let Some(key) = self.available.get_mut(&id).and_then(Vec::pop) {
            if let Some(instance) = self.instances.get_mut(&key) {
                instance.active = true;
                host.set_active(&instance.handle, true);
                return Some(key);
            }
        }

        let Some(tile) = tileset.lookup(id) else {
            tracing::warn!(tile = %id, tileset = %tileset.name, "cannot instantiate unknown tile");
            return None;
        };

        let key = InstanceKey(self.next_key);
        self.next_key += 1;
        let handle = host.materialize(tile);
        self.instances.insert(
            key,
            PooledInstance {
                tile: id,
                handle,
                active: true,
            },
        );
        self.materialized += 1;
        tracing::trace!(tile = %id, ?key, "materialized tile instance");
        Some(key)
    }

    /// Deactivate an instance and make it available for its tile id.
    /// Releasing an inactive or unknown instance does nothing.
    pub fn release<M>(&mut self, host: &mut M, key: InstanceKey)
    where
        M: TileMaterializer<Handle = H>,
    {
        let Some(instance) = self.instances.get_mut(&key) else {
            return;
        };
        if !instance.active {
            return;
        }
        instance.active = false;
        host.set_active(&instance.handle, false);
        self.available.entry(instance.tile).or_default().push(key);
    }

    /// Release every active instance
    pub fn return_all<M>(&mut self, host: &mut M)
    where
        M: TileMaterializer<Handle = H>,
    {
        let active: Vec<InstanceKey> = self
            .instances
            .iter()
            .filter(|(_, instance)| instance.active)
            .map(|(&key, _)| key)
            .collect();
        for key in active {
            self.release(host, key);
        }
    }

    /// Destroy every released instance. Active instances are kept.
    pub fn clear_available<M>(&mut self, host: &mut M)
    where
        M: TileMaterializer<Handle = H>,
    {
        for (_, keys) in self.available.iter_mut() {
            for key in keys.drain(..) {
                if let Some(instance) = self.instances.remove(&key) {
                    host.destroy(instance.handle);
                    self.destroyed += 1;
                }
            }
        }
    }

    /// Destroy every instance, active or not, and start over with empty
    /// available lists for `ids`. Keys handed out before are no longer valid.
    pub fn rebuild<M>(&mut self, host: &mut M, ids: impl IntoIterator<Item = TileId>)
    where
        M: TileMaterializer<Handle = H>,
    {
        let instances = std::mem::take(&mut self.instances);
        let destroyed = instances.len();
        self.destroyed += destroyed;
        for (_, instance) in instances {
            host.destroy(instance.handle);
        }
        self.available = ids.into_iter().map(|id| (id, Vec::new())).collect();
        tracing::debug!(destroyed, tiles = self.available.len(), "rebuilt instance pool");
    }

    pub fn place<M>(&self, host: &mut M, key: InstanceKey, placement: &TilePlacement)
    where
        M: TileMaterializer<Handle = H>,
    {
        if let Some(instance) = self.instances.get(&key) {
            host.set_placement(&instance.handle, placement);
        }
    }

    pub fn set_part_visibility<M>(&self, host: &mut M, key: InstanceKey, tag: &str, visible: bool)
    where
        M: TileMaterializer<Handle = H>,
    {
        if let Some(instance) = self.instances.get(&key) {
            host.set_part_visibility(&instance.handle, tag, visible);
        }
    }

    /// Tile id an instance was created for
    pub fn tile_of(&self, key: InstanceKey) -> Option<TileId> {
        self.instances.get(&key).map(|instance| instance.tile)
    }

    pub fn handle(&self, key: InstanceKey) -> Option<&H> {
        self.instances.get(&key).map(|instance| &instance.handle)
    }

    pub fn is_active(&self, key: InstanceKey) -> bool {
        self.instances.get(&key).is_some_and(|instance| instance.active)
    }

    /// Number of tracked instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.instances.values().filter(|i| i.active).count()
    }

    pub fn available_count(&self) -> usize {
        self.available.values().map(Vec::len).sum()
    }

    pub fn available_for(&self, id: TileId) -> usize {
        self.available.get(&id).map_or(0, Vec::len)
    }

    /// Instances created over the pool's lifetime
    pub fn materialized(&self) -> usize {
        self.materialized
    }

    /// Instances destroyed over the pool's lifetime
    pub fn destroyed(&self) -> usize {
        self.destroyed
    }
}
