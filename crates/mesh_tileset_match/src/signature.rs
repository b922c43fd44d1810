//! Per-face signatures
//!
//! A [`FaceSignature`] is everything the matcher needs to know about one quad
//! face: its oriented corner positions, size, normal, the [`EdgeFlags`] it
//! derives from its neighbors and the [`FlagMask`] stored on its vertex colors.

use glam::{Mat3, Quat, Vec2, Vec3};
use mesh_tileset_core::{EdgeFlag, EdgeFlags, FlagMask, TileDefinition, TileId, TileOrientation};
use serde::{Deserialize, Serialize};

use crate::geometry::{AdjacencyLookup, MeshGeometry};
use crate::MatchResult;

/// Tolerance for opposite edges being antiparallel and adjacent edges perpendicular
pub const RECT_THRESHOLD: f32 = 0.001;

/// Thresholds used when deriving and comparing signatures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// `|tangent . neighbor_normal|` at or below this is a flat edge
    pub flat: f32,
    /// Width and height difference treated as equal
    pub size: f32,
    /// Center movement treated as no movement
    pub position: f32,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            flat: 0.001,
            size: 0.001,
            position: 1e-5,
        }
    }
}

/// Local transform for a tile instance placed on a face (owner object space)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TilePlacement {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for TilePlacement {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct GeometrySnapshot {
    center: Vec3,
    width: f32,
    height: f32,
}

/// Derived description of one quad face
#[derive(Debug, Clone)]
pub struct FaceSignature {
    face: usize,
    quad: [usize; 4],
    orientation_offset: usize,
    vertices: [Vec3; 4],
    edge_flags: EdgeFlags,
    width: f32,
    height: f32,
    center: Vec3,
    normal: Vec3,
    flags: FlagMask,
    matched_tile: Option<TileId>,
    matched_rotation: usize,
    last: Option<GeometrySnapshot>,
}

impl FaceSignature {
    /// Build the signature of `face`, or `None` when it is not a quad.
    ///
    /// Geometry and normal are computed immediately with orientation offset 0.
    /// The first [`refresh_geometry`](Self::refresh_geometry) reports a change.
    pub fn new(mesh: &impl MeshGeometry, face: usize) -> Option<Self> {
        let quad = mesh.face_quad(face)?;
        let mut signature = Self {
            face,
            quad,
            orientation_offset: 0,
            vertices: [Vec3::ZERO; 4],
            edge_flags: EdgeFlags::ANY,
            width: 0.0,
            height: 0.0,
            center: Vec3::ZERO,
            normal: Vec3::ZERO,
            flags: FlagMask::UNDEFINED,
            matched_tile: None,
            matched_rotation: 0,
            last: None,
        };
        signature.update_geometry(mesh);
        Some(signature)
    }

    pub fn face(&self) -> usize {
        self.face
    }

    /// Vertex indices of the face in mesh order
    pub fn quad(&self) -> &[usize; 4] {
        &self.quad
    }

    pub fn orientation_offset(&self) -> usize {
        self.orientation_offset
    }

    /// Corner positions starting at the oriented bottom-left corner
    pub fn vertices(&self) -> &[Vec3; 4] {
        &self.vertices
    }

    pub fn edge_flags(&self) -> EdgeFlags {
        self.edge_flags
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn flags(&self) -> &FlagMask {
        &self.flags
    }

    /// Replace the face's mask. Persist it to the mesh before the next full refresh.
    pub fn set_flags(&mut self, flags: FlagMask) {
        self.flags = flags;
    }

    pub fn matched_tile(&self) -> Option<TileId> {
        self.matched_tile
    }

    pub fn matched_rotation(&self) -> usize {
        self.matched_rotation
    }

    /// Choose the orientation offset whose top edge best faces the policy's target.
    ///
    /// `FromVertexOrder` always uses offset 0. Ties keep the lowest offset.
    pub fn refresh_orientation(
        &mut self,
        mesh: &impl MeshGeometry,
        orientation: TileOrientation,
        world_to_object: Quat,
    ) {
        let Some(target) = orientation.top_target(world_to_object) else {
            self.orientation_offset = 0;
            return;
        };

        let mut best = f32::MIN;
        for offset in 0..4 {
            let from = mesh.position(self.quad[offset]);
            let to = mesh.position(self.quad[(offset + 1) % 4]);
            let dot = (to - from).normalize_or_zero().dot(target);
            if dot > best {
                self.orientation_offset = offset;
                best = dot;
            }
        }
    }

    /// Re-read positions and colors. Returns `true` when the center moved or
    /// the size changed beyond `tolerances` since the previous refresh.
    pub fn refresh_geometry(&mut self, mesh: &impl MeshGeometry, tolerances: &Tolerances) -> bool {
        self.update_geometry(mesh);
        let changed = match self.last {
            None => true,
            Some(last) => {
                last.center.distance(self.center) > tolerances.position
                    || (last.width - self.width).abs() > tolerances.size
                    || (last.height - self.height).abs() > tolerances.size
            }
        };
        self.remember_geometry();
        changed
    }

    fn update_geometry(&mut self, mesh: &impl MeshGeometry) {
        for i in 0..4 {
            self.vertices[i] = mesh.position(self.quad[(i + self.orientation_offset) % 4]);
        }
        let [v0, v1, v2, v3] = self.vertices;
        let left = v1 - v0;
        let bottom = v3 - v0;

        self.height = left.length();
        self.width = bottom.length();
        self.center = (v0 + v1 + v2 + v3) / 4.0;
        self.normal = left.cross(bottom).normalize_or_zero();

        // Colors are read in mesh order, independent of the orientation
        let colors = self.quad.map(|v| mesh.vertex_color(v));
        self.flags.read_vertex_colors(&colors);
    }

    fn remember_geometry(&mut self) {
        self.last = Some(GeometrySnapshot {
            center: self.center,
            width: self.width,
            height: self.height,
        });
    }

    /// Classify the neighbor across each side.
    ///
    /// `neighbor_normal` returns the normal of another face's signature, or
    /// `None` when that face has none in the current pass.
    pub fn refresh_edge_flags(
        &mut self,
        adjacency: &AdjacencyLookup,
        tolerances: &Tolerances,
        neighbor_normal: impl Fn(usize) -> Option<Vec3>,
    ) {
        for i in 0..4 {
            let a = self.quad[(i + self.orientation_offset) % 4];
            let b = self.quad[(i + 1 + self.orientation_offset) % 4];
            let neighbors = adjacency.edge_neighbors(a, b, self.face);

            let normal = match neighbors.as_slice() {
                [single] => neighbor_normal(*single),
                _ => None,
            };
            self.edge_flags[i] = match normal {
                None => EdgeFlag::Empty,
                Some(normal) => {
                    // Points out of the face across side i, in the face plane
                    let tangent = (self.vertices[i] - self.vertices[(i + 3) % 4]).normalize_or_zero();
                    let d = tangent.dot(normal);
                    if d.abs() <= tolerances.flat {
                        EdgeFlag::Flat
                    } else if d > tolerances.flat {
                        EdgeFlag::ConvexDown
                    } else {
                        EdgeFlag::ConcaveUp
                    }
                }
            };
        }
    }

    /// Overwrite the derived edge flags
    pub fn set_edge_flags(&mut self, edge_flags: EdgeFlags) {
        self.edge_flags = edge_flags;
    }

    /// Width and height as seen by a tile rotated `rotation` quarter turns
    pub fn rotated_size(&self, rotation: usize) -> Vec2 {
        if rotation % 2 == 0 {
            Vec2::new(self.width, self.height)
        } else {
            Vec2::new(self.height, self.width)
        }
    }

    pub fn matches_size(&self, tile: &TileDefinition, rotation: usize, tolerance: f32) -> bool {
        let size = self.rotated_size(rotation);
        (tile.width - size.x).abs() <= tolerance && (tile.height - size.y).abs() <= tolerance
    }

    /// Opposite edges antiparallel and adjacent edges perpendicular
    pub fn is_rect(&self) -> bool {
        let [v0, v1, v2, v3] = self.vertices;
        let e1 = (v0 - v1).normalize_or_zero();
        let e2 = (v1 - v2).normalize_or_zero();
        let e3 = (v2 - v3).normalize_or_zero();
        let e4 = (v3 - v0).normalize_or_zero();

        e1.dot(e3) < -1.0 + RECT_THRESHOLD
            && e2.dot(e4) < -1.0 + RECT_THRESHOLD
            && e1.dot(e2).abs() < RECT_THRESHOLD
            && e3.dot(e4).abs() < RECT_THRESHOLD
    }

    /// Record a match result.
    ///
    /// When the result switches to a tile that overrides orientation, the
    /// face is re-oriented with the tile's policy and its geometry re-read.
    pub fn set_matched(
        &mut self,
        result: MatchResult,
        tile: Option<&TileDefinition>,
        mesh: &impl MeshGeometry,
        world_to_object: Quat,
    ) {
        if result.tile.is_some() && result.tile != self.matched_tile {
            if let Some(orientation) = tile.and_then(TileDefinition::orientation_override) {
                self.refresh_orientation(mesh, orientation, world_to_object);
                self.update_geometry(mesh);
                self.remember_geometry();
            }
        }
        self.matched_tile = result.tile;
        self.matched_rotation = result.rotation;
    }

    /// Forget the current match
    pub fn clear_match(&mut self) {
        self.matched_tile = None;
        self.matched_rotation = 0;
    }

    /// Where a matched tile instance goes: centered on the face, looking along
    /// the left edge with the normal as up, turned by the matched rotation.
    pub fn placement(&self) -> TilePlacement {
        let forward = (self.vertices[1] - self.vertices[0]).normalize_or_zero();
        let look = look_rotation(forward, self.normal);
        let spin = if self.normal == Vec3::ZERO {
            Quat::IDENTITY
        } else {
            let angle = -std::f32::consts::FRAC_PI_2 * self.matched_rotation as f32;
            Quat::from_axis_angle(self.normal, angle)
        };
        TilePlacement {
            translation: self.center,
            rotation: spin * look,
        }
    }
}

/// Rotation taking +Z to `forward` and +Y to `up`
fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let right = up.cross(forward);
    if right.length_squared() <= f32::EPSILON {
        return Quat::IDENTITY;
    }
    let right = right.normalize();
    let up = forward.cross(right).normalize();
    Quat::from_mat3(&Mat3::from_cols(right, up, forward)).normalize()
}
