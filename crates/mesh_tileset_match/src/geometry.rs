//! Mesh geometry access
//!
//! The matcher never owns a mesh. It reads faces, positions and vertex colors
//! through [`MeshGeometry`] and resolves adjacency through an
//! [`AdjacencyLookup`] built from the same provider. [`QuadMesh`] is a plain
//! in-memory implementation for hosts without their own mesh store.

use glam::Vec3;
use mesh_tileset_core::{ColorBlock, FlagMask, CLEAR_BLOCK};

/// Read access to a polygon mesh
pub trait MeshGeometry {
    fn face_count(&self) -> usize;

    fn vertex_count(&self) -> usize;

    /// Vertex indices of a face in winding order
    fn face_vertices(&self, face: usize) -> &[usize];

    /// The four vertex indices of a quad face, or `None` for any other polygon
    fn face_quad(&self, face: usize) -> Option<[usize; 4]> {
        <[usize; 4]>::try_from(self.face_vertices(face)).ok()
    }

    fn position(&self, vertex: usize) -> Vec3;

    /// Color of a vertex. Meshes without colors report [`CLEAR_BLOCK`].
    fn vertex_color(&self, vertex: usize) -> ColorBlock;

    /// Group id shared by all vertices at the same location
    fn shared_vertex(&self, vertex: usize) -> usize;
}

/// Write access to vertex colors, used to persist face flag masks
pub trait MeshGeometryMut: MeshGeometry {
    fn set_vertex_color(&mut self, vertex: usize, color: ColorBlock);

    /// Make sure every vertex has a color slot
    fn ensure_vertex_colors(&mut self) {}
}

/// Decode the flag mask stored on a quad's vertex colors
pub fn read_face_mask(mesh: &impl MeshGeometry, quad: &[usize; 4]) -> FlagMask {
    let colors = quad.map(|v| mesh.vertex_color(v));
    FlagMask::from_vertex_colors(&colors)
}

/// Encode `mask` onto a quad's vertex colors, one block per vertex
pub fn write_face_mask(mesh: &mut impl MeshGeometryMut, quad: &[usize; 4], mask: &FlagMask) {
    let mut colors = [CLEAR_BLOCK; 4];
    mask.write_vertex_colors(&mut colors);
    for (&vertex, color) in quad.iter().zip(colors) {
        mesh.set_vertex_color(vertex, color);
    }
}

/// Shared-vertex and face-incidence tables for one mesh snapshot.
///
/// Built at the start of every full refresh. Querying a vertex or group the
/// snapshot does not contain panics.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyLookup {
    shared: Vec<usize>,
    faces_by_group: Vec<Vec<usize>>,
}

impl AdjacencyLookup {
    pub fn build(mesh: &impl MeshGeometry) -> Self {
        let shared: Vec<usize> = (0..mesh.vertex_count())
            .map(|v| mesh.shared_vertex(v))
            .collect();
        let group_count = shared.iter().map(|&g| g + 1).max().unwrap_or(0);
        let mut faces_by_group = vec![Vec::new(); group_count];

        for face in 0..mesh.face_count() {
            for &vertex in mesh.face_vertices(face) {
                let faces: &mut Vec<usize> = &mut faces_by_group[shared[vertex]];
                // Faces are visited in order, so a repeat can only be the last entry
                if faces.last() != Some(&face) {
                    faces.push(face);
                }
            }
        }

        Self {
            shared,
            faces_by_group,
        }
    }

    pub fn shared_vertex(&self, vertex: usize) -> usize {
        self.shared[vertex]
    }

    /// Faces touching a shared-vertex group, ascending
    pub fn faces_touching(&self, group: usize) -> &[usize] {
        &self.faces_by_group[group]
    }

    /// Faces other than `face` that touch both endpoints of an edge
    pub fn edge_neighbors(&self, a: usize, b: usize, face: usize) -> Vec<usize> {
        let faces_b = self.faces_touching(self.shared_vertex(b));
        self.faces_touching(self.shared_vertex(a))
            .iter()
            .copied()
            .filter(|f| *f != face && faces_b.contains(f))
            .collect()
    }

    pub fn vertex_count(&self) -> usize {
        self.shared.len()
    }
}

/// Distance under which [`QuadMesh`] welds two vertices into one group
pub const WELD_EPSILON: f32 = 1e-5;

/// In-memory polygon mesh with per-face vertices and welded shared groups.
///
/// Like most editable meshes every face owns its vertices; vertices at the
/// same location are linked through their shared group so that adjacency can
/// be found across faces.
#[derive(Debug, Clone, Default)]
pub struct QuadMesh {
    positions: Vec<Vec3>,
    colors: Vec<ColorBlock>,
    shared: Vec<usize>,
    faces: Vec<Vec<usize>>,
}

impl QuadMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh with one quad face per entry
    pub fn from_quads(quads: &[[Vec3; 4]]) -> Self {
        let mut mesh = Self::new();
        for quad in quads {
            mesh.add_quad(*quad);
        }
        mesh
    }

    /// Add a vertex, welding it to any existing vertex at the same position
    pub fn add_vertex(&mut self, position: Vec3) -> usize {
        let index = self.positions.len();
        let group = self
            .positions
            .iter()
            .position(|p| p.distance(position) <= WELD_EPSILON)
            .map(|v| self.shared[v])
            .unwrap_or(index);
        self.positions.push(position);
        self.colors.push(CLEAR_BLOCK);
        self.shared.push(group);
        index
    }

    /// Add a face over existing vertices
    pub fn add_face(&mut self, vertices: &[usize]) -> usize {
        self.faces.push(vertices.to_vec());
        self.faces.len() - 1
    }

    /// Add a quad face with four fresh vertices
    pub fn add_quad(&mut self, corners: [Vec3; 4]) -> usize {
        let vertices = corners.map(|p| self.add_vertex(p));
        self.add_face(&vertices)
    }

    /// Remove a face. Its vertices stay in place.
    pub fn remove_face(&mut self, face: usize) -> Vec<usize> {
        self.faces.remove(face)
    }

    pub fn set_position(&mut self, vertex: usize, position: Vec3) {
        self.positions[vertex] = position;
    }

    /// Move every vertex of a face by `offset`
    pub fn translate_face(&mut self, face: usize, offset: Vec3) {
        for &vertex in &self.faces[face] {
            self.positions[vertex] += offset;
        }
    }

    /// Recompute shared groups from the current positions
    pub fn weld_vertices(&mut self) {
        for v in 0..self.positions.len() {
            let position = self.positions[v];
            self.shared[v] = (0..v)
                .find(|&u| self.positions[u].distance(position) <= WELD_EPSILON)
                .map(|u| self.shared[u])
                .unwrap_or(v);
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn colors(&self) -> &[ColorBlock] {
        &self.colors
    }
}

impl MeshGeometry for QuadMesh {
    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn face_vertices(&self, face: usize) -> &[usize] {
        &self.faces[face]
    }

    fn position(&self, vertex: usize) -> Vec3 {
        self.positions[vertex]
    }

    fn vertex_color(&self, vertex: usize) -> ColorBlock {
        self.colors.get(vertex).copied().unwrap_or(CLEAR_BLOCK)
    }

    fn shared_vertex(&self, vertex: usize) -> usize {
        self.shared[vertex]
    }
}

impl MeshGeometryMut for QuadMesh {
    fn set_vertex_color(&mut self, vertex: usize, color: ColorBlock) {
        self.colors[vertex] = color;
    }

    fn ensure_vertex_colors(&mut self) {
        self.colors.resize(self.positions.len(), CLEAR_BLOCK);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor(x: f32, z: f32) -> [Vec3; 4] {
        [
            Vec3::new(x, 0.0, z),
            Vec3::new(x, 0.0, z + 1.0),
            Vec3::new(x + 1.0, 0.0, z + 1.0),
            Vec3::new(x + 1.0, 0.0, z),
        ]
    }

    #[test]
    fn coincident_vertices_share_a_group() {
        let mesh = QuadMesh::from_quads(&[floor(0.0, 0.0), floor(1.0, 0.0)]);
        assert_eq!(mesh.vertex_count(), 8);
        // Right edge of the first face is the left edge of the second
        assert_eq!(mesh.shared_vertex(3), mesh.shared_vertex(4));
        assert_eq!(mesh.shared_vertex(2), mesh.shared_vertex(5));
        assert_ne!(mesh.shared_vertex(0), mesh.shared_vertex(4));
    }

    #[test]
    fn non_quads_have_no_quad() {
        let mut mesh = QuadMesh::from_quads(&[floor(0.0, 0.0)]);
        let a = mesh.add_vertex(Vec3::new(5.0, 0.0, 0.0));
        let b = mesh.add_vertex(Vec3::new(6.0, 0.0, 0.0));
        let c = mesh.add_vertex(Vec3::new(5.0, 0.0, 1.0));
        let triangle = mesh.add_face(&[a, b, c]);
        assert_eq!(mesh.face_quad(0), Some([0, 1, 2, 3]));
        assert_eq!(mesh.face_quad(triangle), None);
    }

    #[test]
    fn edge_neighbors_excludes_self() {
        let mesh = QuadMesh::from_quads(&[floor(0.0, 0.0), floor(1.0, 0.0), floor(0.0, 1.0)]);
        let lookup = AdjacencyLookup::build(&mesh);
        assert_eq!(lookup.edge_neighbors(2, 3, 0), vec![1]);
        assert_eq!(lookup.edge_neighbors(1, 2, 0), vec![2]);
        assert!(lookup.edge_neighbors(0, 1, 0).is_empty());
        // The corner vertex at (1, 0, 1) touches all three faces
        assert_eq!(lookup.faces_touching(lookup.shared_vertex(2)), &[0, 1, 2]);
    }

    #[test]
    fn weld_after_move_links_faces() {
        let mut mesh = QuadMesh::from_quads(&[floor(0.0, 0.0), floor(3.0, 0.0)]);
        assert!(AdjacencyLookup::build(&mesh).edge_neighbors(2, 3, 0).is_empty());
        mesh.translate_face(1, Vec3::new(-2.0, 0.0, 0.0));
        mesh.weld_vertices();
        assert_eq!(AdjacencyLookup::build(&mesh).edge_neighbors(2, 3, 0), vec![1]);
    }

    #[test]
    fn face_mask_round_trips_through_colors() {
        let mut mesh = QuadMesh::from_quads(&[floor(0.0, 0.0)]);
        let quad = mesh.face_quad(0).unwrap();
        assert!(read_face_mask(&mesh, &quad).is_undefined());

        let mask = FlagMask::UNDEFINED.with_slot(6, 2);
        write_face_mask(&mut mesh, &quad, &mask);
        assert_eq!(mesh.vertex_color(1), [0.0, 0.0, 2.0, 0.0]);
        assert_eq!(read_face_mask(&mesh, &quad), mask);
    }
}
