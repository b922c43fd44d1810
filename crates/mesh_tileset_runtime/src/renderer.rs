//! Refresh passes
//!
//! [`TilesetRenderer`] keeps one [`FaceSignature`] per quad face of a mesh,
//! matches each against its tileset and keeps a pooled tile instance placed on
//! every matched face.
//!
//! The mesh and the host are lent to each pass, so one renderer can serve a
//! mesh owned elsewhere and a host that only exists for the duration of a call.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use mesh_tileset_core::{FlagMask, TileDefinition, TileId, Tileset, CLEAR_BLOCK};
use mesh_tileset_match::{
    match_tile, write_face_mask, AdjacencyLookup, FaceSignature, MeshGeometry, MeshGeometryMut,
};

use crate::config::RendererSettings;
use crate::pool::{InstanceKey, InstancePool, TileMaterializer};

/// A face signature and the instance placed on it
#[derive(Debug, Clone)]
struct FaceSlot {
    signature: FaceSignature,
    instance: Option<InstanceKey>,
}

/// Counts describing the state after a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshSummary {
    pub faces: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub active_instances: usize,
    pub available_instances: usize,
}

/// Dresses the quad faces of a mesh with tiles from a [`Tileset`]
#[derive(Debug)]
pub struct TilesetRenderer<H> {
    settings: RendererSettings,
    tileset: Option<Tileset>,
    pool: InstancePool<H>,
    /// `None` until the first full refresh
    faces: Option<Vec<FaceSlot>>,
    /// Face index to slot index
    face_lookup: HashMap<usize, usize>,
    adjacency: AdjacencyLookup,
    world_to_object: Quat,
    /// Face and vertex count seen by the last full refresh
    mesh_counts: Option<(usize, usize)>,
    /// Catalog or settings changed since the last full refresh
    stale: bool,
}

impl<H> Default for TilesetRenderer<H> {
    fn default() -> Self {
        Self {
            settings: RendererSettings::default(),
            tileset: None,
            pool: InstancePool::new(),
            faces: None,
            face_lookup: HashMap::new(),
            adjacency: AdjacencyLookup::default(),
            world_to_object: Quat::IDENTITY,
            mesh_counts: None,
            stale: false,
        }
    }
}

impl<H> TilesetRenderer<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(mut self, settings: RendererSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_tileset(mut self, tileset: Tileset) -> Self {
        self.tileset = Some(tileset);
        self
    }

    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// Replace the settings. The next pass is a full refresh.
    pub fn set_settings(&mut self, settings: RendererSettings) {
        self.settings = settings;
        self.stale = true;
    }

    pub fn tileset(&self) -> Option<&Tileset> {
        self.tileset.as_ref()
    }

    /// Edit the catalog in place. The next pass is a full refresh, so faces
    /// pick up added, changed or removed tiles.
    pub fn tileset_mut(&mut self) -> Option<&mut Tileset> {
        self.stale = true;
        self.tileset.as_mut()
    }

    /// Swap the tileset. Every instance of the previous tileset is destroyed.
    pub fn set_tileset<M>(&mut self, host: &mut M, tileset: Option<Tileset>)
    where
        M: TileMaterializer<Handle = H>,
    {
        self.tileset = tileset;
        self.stale = true;
        self.rebuild_pool(host);
    }

    /// Rotation of the owning object in world space, used by the world-space
    /// orientation policies
    pub fn set_owner_rotation(&mut self, object_to_world: Quat) {
        self.world_to_object = object_to_world.inverse();
    }

    pub fn pool(&self) -> &InstancePool<H> {
        &self.pool
    }

    /// Signatures from the last pass, in face order
    pub fn signatures(&self) -> impl Iterator<Item = &FaceSignature> {
        self.faces.iter().flatten().map(|slot| &slot.signature)
    }

    pub fn signature(&self, face: usize) -> Option<&FaceSignature> {
        let slot = *self.face_lookup.get(&face)?;
        self.faces.as_ref()?.get(slot).map(|slot| &slot.signature)
    }

    /// Instance placed on a face, if any
    pub fn instance(&self, face: usize) -> Option<InstanceKey> {
        let slot = *self.face_lookup.get(&face)?;
        self.faces.as_ref()?.get(slot)?.instance
    }

    /// Set the flag mask of a face and write it to the face's vertex colors.
    /// Returns `false` when the face has no signature.
    ///
    /// Matches are not updated until the next full refresh.
    pub fn set_face_flags(
        &mut self,
        mesh: &mut impl MeshGeometryMut,
        face: usize,
        flags: FlagMask,
    ) -> bool {
        let Some(&slot) = self.face_lookup.get(&face) else {
            return false;
        };
        let Some(slot) = self.faces.as_mut().and_then(|faces| faces.get_mut(slot)) else {
            return false;
        };
        slot.signature.set_flags(flags);
        let quad = slot.signature.quad();
        if quad.iter().all(|&v| v < mesh.vertex_count()) {
            write_face_mask(mesh, quad, &flags);
        }
        true
    }

    /// Write every signature's flag mask to the mesh's vertex colors.
    ///
    /// Vertices outside any signature are cleared. Signatures whose vertices
    /// no longer exist are skipped.
    pub fn write_flag_masks(&self, mesh: &mut impl MeshGeometryMut) {
        let vertex_count = mesh.vertex_count();
        for vertex in 0..vertex_count {
            mesh.set_vertex_color(vertex, CLEAR_BLOCK);
        }
        for slot in self.faces.iter().flatten() {
            let quad = slot.signature.quad();
            if quad.iter().all(|&v| v < vertex_count) {
                write_face_mask(mesh, quad, slot.signature.flags());
            }
        }
    }

    /// Rebuild every signature and re-match every face.
    ///
    /// Masks from the previous pass are written to the mesh first, all
    /// instances are returned to the pool and handed out again in face order,
    /// and instances left over at the end are destroyed.
    pub fn full_refresh<G, M>(&mut self, mesh: &mut G, host: &mut M)
    where
        G: MeshGeometryMut,
        M: TileMaterializer<Handle = H>,
    {
        if self.tileset.is_none() {
            tracing::debug!("no tileset assigned, skipping full refresh");
            return;
        }

        mesh.ensure_vertex_colors();
        if self.faces.is_some() {
            self.write_flag_masks(mesh);
        }
        let mesh: &G = mesh;

        self.adjacency = AdjacencyLookup::build(mesh);
        let mut slots: Vec<FaceSlot> = (0..mesh.face_count())
            .filter_map(|face| FaceSignature::new(mesh, face))
            .map(|signature| FaceSlot {
                signature,
                instance: None,
            })
            .collect();
        self.face_lookup = slots
            .iter()
            .enumerate()
            .map(|(index, slot)| (slot.signature.face(), index))
            .collect();

        self.pool.return_all(host);

        let Some(tileset) = self.tileset.as_ref() else {
            return;
        };
        let settings = self.settings;

        // Orient every face before classifying edges against neighbor normals
        for slot in &mut slots {
            slot.signature
                .refresh_orientation(mesh, settings.orientation, self.world_to_object);
            slot.signature.refresh_geometry(mesh, &settings.tolerances);
        }
        let normals: HashMap<usize, Vec3> = slots
            .iter()
            .map(|slot| (slot.signature.face(), slot.signature.normal()))
            .collect();

        for slot in &mut slots {
            slot.signature
                .refresh_edge_flags(&self.adjacency, &settings.tolerances, |face| {
                    normals.get(&face).copied()
                });
            update_face(slot, tileset, &mut self.pool, host, mesh, &settings, self.world_to_object);
        }

        self.faces = Some(slots);
        self.pool.clear_available(host);
        self.mesh_counts = Some((mesh.face_count(), mesh.vertex_count()));
        self.stale = false;

        let summary = self.summary();
        tracing::debug!(
            tileset = %tileset.name,
            faces = summary.faces,
            matched = summary.matched,
            unmatched = summary.unmatched,
            active = summary.active_instances,
            materialized = self.pool.materialized(),
            destroyed = self.pool.destroyed(),
            "full refresh"
        );
    }

    /// Re-read geometry and re-match only the faces that moved or resized.
    ///
    /// Falls back to a full refresh before the first pass, after the catalog
    /// or settings were changed, or when the face count or any face's vertices
    /// changed. Edge flags are kept from the last full refresh.
    pub fn refresh<G, M>(&mut self, mesh: &mut G, host: &mut M)
    where
        G: MeshGeometryMut,
        M: TileMaterializer<Handle = H>,
    {
        if self.tileset.is_none() {
            tracing::debug!("no tileset assigned, skipping refresh");
            return;
        }
        if self.stale || self.topology_changed(&*mesh) {
            self.full_refresh(mesh, host);
            return;
        }

        let (Some(tileset), Some(slots)) = (self.tileset.as_ref(), self.faces.as_mut()) else {
            return;
        };
        let settings = self.settings;
        let mesh: &G = mesh;

        let mut changed = 0;
        for slot in slots.iter_mut() {
            if !slot.signature.refresh_geometry(mesh, &settings.tolerances) {
                continue;
            }
            update_face(slot, tileset, &mut self.pool, host, mesh, &settings, self.world_to_object);
            changed += 1;
        }
        tracing::trace!(changed, "incremental refresh");
    }

    /// Entry point for mesh edits: a full refresh when faces or vertices were
    /// added or removed since the last full refresh, an incremental one otherwise.
    pub fn on_mesh_changed<G, M>(&mut self, mesh: &mut G, host: &mut M)
    where
        G: MeshGeometryMut,
        M: TileMaterializer<Handle = H>,
    {
        if self.mesh_counts != Some((mesh.face_count(), mesh.vertex_count())) {
            self.full_refresh(mesh, host);
        } else {
            self.refresh(mesh, host);
        }
    }

    /// Destroy every instance and forget all matches. The next pass starts
    /// from an empty pool.
    pub fn rebuild_pool<M>(&mut self, host: &mut M)
    where
        M: TileMaterializer<Handle = H>,
    {
        let ids = self.tileset.iter().flat_map(Tileset::ids);
        self.pool.rebuild(host, ids);
        for slot in self.faces.iter_mut().flatten() {
            slot.instance = None;
            slot.signature.clear_match();
        }
    }

    /// Return every instance to the pool and destroy it
    pub fn clear_pool<M>(&mut self, host: &mut M)
    where
        M: TileMaterializer<Handle = H>,
    {
        self.pool.return_all(host);
        self.pool.clear_available(host);
        for slot in self.faces.iter_mut().flatten() {
            slot.instance = None;
        }
    }

    pub fn summary(&self) -> RefreshSummary {
        let faces = self.faces.as_deref().unwrap_or_default();
        let matched = faces
            .iter()
            .filter(|slot| slot.signature.matched_tile().is_some())
            .count();
        RefreshSummary {
            faces: faces.len(),
            matched,
            unmatched: faces.len() - matched,
            active_instances: self.pool.active_count(),
            available_instances: self.pool.available_count(),
        }
    }

    fn topology_changed(&self, mesh: &impl MeshGeometry) -> bool {
        let Some(slots) = &self.faces else {
            return true;
        };
        if self.mesh_counts.map(|(faces, _)| faces) != Some(mesh.face_count()) {
            return true;
        }
        slots
            .iter()
            .any(|slot| mesh.face_quad(slot.signature.face()) != Some(*slot.signature.quad()))
    }
}

/// Match a face, keep its instance in sync and apply hide groups
fn update_face<H, G, M>(
    slot: &mut FaceSlot,
    tileset: &Tileset,
    pool: &mut InstancePool<H>,
    host: &mut M,
    mesh: &G,
    settings: &RendererSettings,
    world_to_object: Quat,
) where
    G: MeshGeometry,
    M: TileMaterializer<Handle = H>,
{
    let result = match_tile(&slot.signature, tileset, &settings.match_settings());
    let tile = result.tile.and_then(|id| tileset.lookup(id));
    slot.signature.set_matched(result, tile, mesh, world_to_object);

    reconcile_instance(slot, tileset, pool, host);
    if let Some(tile) = tile {
        apply_hide_groups(slot, tile, pool, host);
    }
}

/// Release an instance of the wrong tile, then acquire and place the right one
fn reconcile_instance<H, M>(
    slot: &mut FaceSlot,
    tileset: &Tileset,
    pool: &mut InstancePool<H>,
    host: &mut M,
) where
    M: TileMaterializer<Handle = H>,
{
    let wanted: Option<TileId> = slot.signature.matched_tile();
    if let Some(key) = slot.instance {
        if pool.tile_of(key) != wanted || !pool.is_active(key) {
            pool.release(host, key);
            slot.instance = None;
        }
    }

    let Some(id) = wanted else {
        return;
    };
    if slot.instance.is_none() {
        slot.instance = pool.acquire(host, tileset, id);
    }
    if let Some(key) = slot.instance {
        pool.place(host, key, &slot.signature.placement());
    }
}

fn apply_hide_groups<H, M>(
    slot: &FaceSlot,
    tile: &TileDefinition,
    pool: &InstancePool<H>,
    host: &mut M,
) where
    M: TileMaterializer<Handle = H>,
{
    let Some(key) = slot.instance else {
        return;
    };
    for group in &tile.hide_groups {
        let hidden = group.should_hide(slot.signature.flags());
        pool.set_part_visibility(host, key, &group.tag, !hidden);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneGraph;
    use mesh_tileset_core::{EdgeFlag, EdgeFlags};
    use mesh_tileset_match::QuadMesh;

    fn floor(x: f32, z: f32) -> [Vec3; 4] {
        [
            Vec3::new(x, 0.0, z),
            Vec3::new(x, 0.0, z + 1.0),
            Vec3::new(x + 1.0, 0.0, z + 1.0),
            Vec3::new(x + 1.0, 0.0, z),
        ]
    }

    fn tileset() -> Tileset {
        let mut tileset = Tileset::new("Floors");
        tileset.add_tile(TileDefinition::new("Floor", 1.0, 1.0)).unwrap();
        tileset
    }

    #[test]
    fn refresh_without_tileset_is_noop() {
        let mut mesh = QuadMesh::from_quads(&[floor(0.0, 0.0)]);
        let mut scene = SceneGraph::new();
        let mut renderer = TilesetRenderer::new();
        renderer.full_refresh(&mut mesh, &mut scene);
        renderer.refresh(&mut mesh, &mut scene);
        assert_eq!(renderer.signatures().count(), 0);
        assert!(scene.is_empty());
    }

    #[test]
    fn first_refresh_runs_a_full_pass() {
        let mut mesh = QuadMesh::from_quads(&[floor(0.0, 0.0), floor(1.0, 0.0)]);
        let mut scene = SceneGraph::new();
        let mut renderer = TilesetRenderer::new().with_tileset(tileset());
        renderer.refresh(&mut mesh, &mut scene);
        assert_eq!(renderer.summary().matched, 2);
        assert!(renderer.instance(0).is_some());
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn face_flags_persist_through_full_refresh() {
        let mut mesh = QuadMesh::from_quads(&[floor(0.0, 0.0)]);
        let mut scene = SceneGraph::new();
        let mut renderer = TilesetRenderer::new().with_tileset(tileset());
        renderer.full_refresh(&mut mesh, &mut scene);

        let mask = FlagMask::UNDEFINED.with_slot(4, 3);
        assert!(renderer.set_face_flags(&mut mesh, 0, mask));
        assert!(!renderer.set_face_flags(&mut mesh, 7, mask));
        renderer.full_refresh(&mut mesh, &mut scene);
        assert_eq!(renderer.signature(0).unwrap().flags(), &mask);
        assert_eq!(mesh.colors()[1], [3.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn face_flags_survive_incremental_refresh() {
        let mut mesh = QuadMesh::from_quads(&[floor(0.0, 0.0)]);
        let mut scene = SceneGraph::new();
        let mut renderer = TilesetRenderer::new().with_tileset(tileset());
        renderer.full_refresh(&mut mesh, &mut scene);

        let mask = FlagMask::UNDEFINED.with_slot(2, 1);
        assert!(renderer.set_face_flags(&mut mesh, 0, mask));
        renderer.refresh(&mut mesh, &mut scene);
        assert_eq!(renderer.signature(0).unwrap().flags(), &mask);
        renderer.full_refresh(&mut mesh, &mut scene);
        assert_eq!(renderer.signature(0).unwrap().flags(), &mask);
    }

    #[test]
    fn removed_tile_unmatches_faces_on_next_pass() {
        let mut mesh = QuadMesh::from_quads(&[floor(0.0, 0.0)]);
        let mut scene = SceneGraph::new();
        let mut renderer = TilesetRenderer::new().with_tileset(tileset());
        renderer.full_refresh(&mut mesh, &mut scene);
        assert!(renderer.instance(0).is_some());

        let removed = renderer.tileset_mut().unwrap().remove_tile(TileId(1));
        assert!(removed.is_some());
        renderer.on_mesh_changed(&mut mesh, &mut scene);
        assert_eq!(renderer.signature(0).unwrap().matched_tile(), None);
        assert_eq!(renderer.instance(0), None);
        assert!(scene.is_empty());
    }

    #[test]
    fn incremental_refresh_leaves_unchanged_faces_alone() {
        let joined = EdgeFlags::new(EdgeFlag::Any, EdgeFlag::Any, EdgeFlag::Any, EdgeFlag::Flat);
        let mut tileset = Tileset::new("Joins");
        let joined = tileset
            .add_tile(TileDefinition::new("Joined", 1.0, 1.0).with_edges(joined))
            .unwrap();
        let single = tileset.add_tile(TileDefinition::new("Single", 1.0, 1.0)).unwrap();

        let mut mesh = QuadMesh::from_quads(&[floor(0.0, 0.0), floor(1.0, 0.0)]);
        let mut scene = SceneGraph::new();
        let mut renderer = TilesetRenderer::new().with_tileset(tileset);
        renderer.full_refresh(&mut mesh, &mut scene);
        let neighbor = renderer.instance(1).unwrap();
        assert_eq!(renderer.signature(0).unwrap().matched_tile(), Some(joined));
        assert_eq!(renderer.pool().materialized(), 2);

        // Lift face 0 away from its neighbor
        mesh.translate_face(0, Vec3::new(0.0, 5.0, 0.0));
        renderer.refresh(&mut mesh, &mut scene);
        assert_eq!(renderer.instance(1), Some(neighbor));
        assert_eq!(renderer.pool().materialized(), 2);
        let moved = renderer.signature(0).unwrap();
        assert_eq!(moved.edge_flags().right, EdgeFlag::Flat);
        assert_eq!(moved.matched_tile(), Some(joined));
        assert_eq!(moved.center(), Vec3::new(0.5, 5.0, 0.5));

        // Edges are only re-derived by a full refresh
        mesh.weld_vertices();
        renderer.full_refresh(&mut mesh, &mut scene);
        let moved = renderer.signature(0).unwrap();
        assert_eq!(moved.edge_flags().right, EdgeFlag::Empty);
        assert_eq!(moved.matched_tile(), Some(single));
    }

    #[test]
    fn moved_face_is_replaced_in_incremental_refresh() {
        let mut mesh = QuadMesh::from_quads(&[floor(0.0, 0.0)]);
        let mut scene = SceneGraph::new();
        let mut renderer = TilesetRenderer::new().with_tileset(tileset());
        renderer.full_refresh(&mut mesh, &mut scene);
        let key = renderer.instance(0).unwrap();

        mesh.translate_face(0, Vec3::new(0.0, 2.0, 0.0));
        renderer.refresh(&mut mesh, &mut scene);
        assert_eq!(renderer.instance(0), Some(key));
        let handle = renderer.pool().handle(key).unwrap();
        let placement = scene.node(*handle).unwrap().placement;
        assert_eq!(placement.translation, Vec3::new(0.5, 2.0, 0.5));
    }

    #[test]
    fn resized_face_loses_its_tile() {
        let mut mesh = QuadMesh::from_quads(&[floor(0.0, 0.0)]);
        let mut scene = SceneGraph::new();
        let mut renderer = TilesetRenderer::new().with_tileset(tileset());
        renderer.full_refresh(&mut mesh, &mut scene);

        mesh.set_position(2, Vec3::new(3.0, 0.0, 1.0));
        mesh.set_position(3, Vec3::new(3.0, 0.0, 0.0));
        renderer.on_mesh_changed(&mut mesh, &mut scene);
        assert_eq!(renderer.signature(0).unwrap().matched_tile(), None);
        assert_eq!(renderer.instance(0), None);
        assert_eq!(scene.active_nodes().count(), 0);
    }

    #[test]
    fn removed_face_triggers_full_refresh() {
        let mut mesh = QuadMesh::from_quads(&[floor(0.0, 0.0), floor(1.0, 0.0)]);
        let mut scene = SceneGraph::new();
        let mut renderer = TilesetRenderer::new().with_tileset(tileset());
        renderer.full_refresh(&mut mesh, &mut scene);

        mesh.remove_face(1);
        renderer.on_mesh_changed(&mut mesh, &mut scene);
        assert_eq!(renderer.summary().faces, 1);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn clear_and_rebuild_pool() {
        let mut mesh = QuadMesh::from_quads(&[floor(0.0, 0.0), floor(1.0, 0.0)]);
        let mut scene = SceneGraph::new();
        let mut renderer = TilesetRenderer::new().with_tileset(tileset());
        renderer.full_refresh(&mut mesh, &mut scene);

        renderer.clear_pool(&mut scene);
        assert!(scene.is_empty());
        assert_eq!(renderer.instance(0), None);

        renderer.full_refresh(&mut mesh, &mut scene);
        renderer.rebuild_pool(&mut scene);
        assert!(scene.is_empty());
        assert_eq!(renderer.summary().matched, 0);
    }

    #[test]
    fn swapping_tileset_destroys_old_instances() {
        let mut mesh = QuadMesh::from_quads(&[floor(0.0, 0.0)]);
        let mut scene = SceneGraph::new();
        let mut renderer = TilesetRenderer::new().with_tileset(tileset());
        renderer.full_refresh(&mut mesh, &mut scene);

        let mut other = Tileset::new("Other");
        other.add_tile(TileDefinition::new("Big", 2.0, 2.0)).unwrap();
        renderer.set_tileset(&mut scene, Some(other));
        assert!(scene.is_empty());

        renderer.full_refresh(&mut mesh, &mut scene);
        assert_eq!(renderer.summary().unmatched, 1);
    }

    #[test]
    fn unsetting_tileset_empties_pool() {
        let mut mesh = QuadMesh::from_quads(&[floor(0.0, 0.0), floor(1.0, 0.0)]);
        let mut scene = SceneGraph::new();
        let mut renderer = TilesetRenderer::new().with_tileset(tileset());
        renderer.full_refresh(&mut mesh, &mut scene);
        assert_eq!(scene.active_nodes().count(), 2);

        renderer.set_tileset(&mut scene, None);
        assert!(renderer.tileset().is_none());
        assert!(renderer.pool().is_empty());
        assert_eq!(renderer.pool().available_count(), 0);
        assert_eq!(renderer.instance(0), None);
        assert!(scene.is_empty());

        renderer.refresh(&mut mesh, &mut scene);
        assert!(scene.is_empty());
    }
}
