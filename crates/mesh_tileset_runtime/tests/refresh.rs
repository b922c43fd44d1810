//! End-to-end refresh passes over small meshes

use glam::Vec3;
use mesh_tileset_core::{
    load_tileset, EdgeFlag, EdgeFlags, FlagMask, HideGroup, HideMode, TileDefinition, TileId,
    TilePart, Tileset,
};
use mesh_tileset_match::QuadMesh;
use mesh_tileset_runtime::{NodeId, SceneGraph, TilesetRenderer};

fn floor(x: f32, z: f32) -> [Vec3; 4] {
    [
        Vec3::new(x, 0.0, z),
        Vec3::new(x, 0.0, z + 1.0),
        Vec3::new(x + 1.0, 0.0, z + 1.0),
        Vec3::new(x + 1.0, 0.0, z),
    ]
}

/// Wall dropping down from the +X edge of the unit floor at the origin
fn wall_down() -> [Vec3; 4] {
    [
        Vec3::new(1.0, -1.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(1.0, -1.0, 1.0),
    ]
}

/// Wall rising from the +X edge of the unit floor at the origin
fn wall_up() -> [Vec3; 4] {
    [
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(1.0, 1.0, 0.0),
    ]
}

fn edge_tileset() -> Tileset {
    let right = |flag| EdgeFlags::new(EdgeFlag::Any, EdgeFlag::Any, EdgeFlag::Any, flag);
    let mut tileset = Tileset::new("Edges");
    let ledge = TileDefinition::new("Ledge", 1.0, 1.0).with_edges(right(EdgeFlag::ConvexDown));
    let trim = TileDefinition::new("Trim", 1.0, 1.0).with_edges(right(EdgeFlag::ConcaveUp));
    for tile in [ledge, trim, TileDefinition::new("Floor", 1.0, 1.0)] {
        tileset.add_tile(tile).unwrap();
    }
    tileset
}

fn assignments(renderer: &TilesetRenderer<NodeId>) -> Vec<(usize, Option<TileId>, usize)> {
    renderer
        .signatures()
        .map(|s| (s.face(), s.matched_tile(), s.matched_rotation()))
        .collect()
}

fn tile_name(renderer: &TilesetRenderer<NodeId>, face: usize) -> Option<String> {
    let id = renderer.signature(face)?.matched_tile()?;
    renderer.tileset()?.lookup(id).map(|tile| tile.name.clone())
}

#[test]
fn edge_bends_select_tiles() {
    let mut scene = SceneGraph::new();

    let mut ledge = QuadMesh::from_quads(&[floor(0.0, 0.0), wall_down()]);
    let mut renderer = TilesetRenderer::new().with_tileset(edge_tileset());
    renderer.full_refresh(&mut ledge, &mut scene);
    assert_eq!(tile_name(&renderer, 0).as_deref(), Some("Ledge"));
    assert_eq!(tile_name(&renderer, 1).as_deref(), Some("Ledge"));
    assert_eq!(renderer.signature(0).unwrap().matched_rotation(), 0);

    let mut scene = SceneGraph::new();
    let mut trim = QuadMesh::from_quads(&[floor(0.0, 0.0), wall_up()]);
    let mut renderer = TilesetRenderer::new().with_tileset(edge_tileset());
    renderer.full_refresh(&mut trim, &mut scene);
    assert_eq!(tile_name(&renderer, 0).as_deref(), Some("Trim"));
    assert_eq!(tile_name(&renderer, 1).as_deref(), Some("Trim"));

    let mut scene = SceneGraph::new();
    let mut lone = QuadMesh::from_quads(&[floor(0.0, 0.0)]);
    let mut renderer = TilesetRenderer::new().with_tileset(edge_tileset());
    renderer.full_refresh(&mut lone, &mut scene);
    assert_eq!(tile_name(&renderer, 0).as_deref(), Some("Floor"));
}

#[test]
fn repeated_full_refresh_is_stable() {
    let mut mesh = QuadMesh::from_quads(&[floor(0.0, 0.0), floor(1.0, 0.0), wall_up()]);
    let mut scene = SceneGraph::new();
    let mut renderer = TilesetRenderer::new().with_tileset(edge_tileset());

    renderer.full_refresh(&mut mesh, &mut scene);
    let first = assignments(&renderer);
    let materialized = renderer.pool().materialized();
    let summary = renderer.summary();

    renderer.full_refresh(&mut mesh, &mut scene);
    assert_eq!(assignments(&renderer), first);
    assert_eq!(renderer.pool().materialized(), materialized);
    assert_eq!(renderer.pool().destroyed(), 0);
    assert_eq!(renderer.summary(), summary);
    assert_eq!(scene.active_nodes().count(), 3);
}

#[test]
fn unsatisfiable_face_stays_empty() {
    let big = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 2.0),
        Vec3::new(2.0, 0.0, 2.0),
        Vec3::new(2.0, 0.0, 0.0),
    ];
    let mut mesh = QuadMesh::from_quads(&[big]);
    let mut scene = SceneGraph::new();
    let mut renderer = TilesetRenderer::new().with_tileset(edge_tileset());
    renderer.full_refresh(&mut mesh, &mut scene);

    assert_eq!(renderer.signature(0).unwrap().matched_tile(), None);
    assert_eq!(renderer.instance(0), None);
    assert!(scene.is_empty());
    assert_eq!(renderer.summary().unmatched, 1);
}

#[test]
fn hide_groups_follow_face_flags() {
    let mut tileset = Tileset::new("Overgrown");
    tileset.add_tile(
        TileDefinition::new("Floor", 1.0, 1.0)
            .with_part(TilePart::new("Slab"))
            .with_part(TilePart::new("Ivy").with_tag("Ivy"))
            .with_hide_group(HideGroup::new(
                "Ivy",
                HideMode::HideOnMatch,
                FlagMask::UNDEFINED.with_slot(2, 1),
            )),
    ).unwrap();

    let mut mesh = QuadMesh::from_quads(&[floor(0.0, 0.0), floor(3.0, 0.0)]);
    let mut scene = SceneGraph::new();
    let mut renderer = TilesetRenderer::new().with_tileset(tileset);
    renderer.full_refresh(&mut mesh, &mut scene);
    assert!(renderer.set_face_flags(&mut mesh, 0, FlagMask::UNDEFINED.with_slot(2, 1)));
    renderer.full_refresh(&mut mesh, &mut scene);

    let ivy_visible = |face: usize| {
        let key = renderer.instance(face).unwrap();
        let node = scene.node(*renderer.pool().handle(key).unwrap()).unwrap();
        node.part_visible("Ivy")
    };
    assert_eq!(ivy_visible(0), Some(false));
    assert_eq!(ivy_visible(1), Some(true));

    // Clearing the flag shows the part again
    assert!(renderer.set_face_flags(&mut mesh, 0, FlagMask::UNDEFINED));
    renderer.full_refresh(&mut mesh, &mut scene);
    let key = renderer.instance(0).unwrap();
    let node = scene.node(*renderer.pool().handle(key).unwrap()).unwrap();
    assert_eq!(node.part_visible("Ivy"), Some(true));
}

#[test]
fn tileset_loaded_from_json_drives_matching() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edges.json");
    let json = r#"{
        "id": "6f1c2b1e-5d8a-4c3e-9a55-0b7f6c2d9e10",
        "name": "Edges",
        "tiles": [
            { "id": 1, "name": "Ledge", "width": 1.0, "height": 1.0,
              "edge_flags": { "right": 4 } },
            { "id": 2, "name": "Floor", "width": 1.0, "height": 1.0 }
        ]
    }"#;
    std::fs::write(&path, json).unwrap();
    let tileset = load_tileset(&path).unwrap();

    let mut mesh = QuadMesh::from_quads(&[floor(0.0, 0.0), wall_down(), floor(5.0, 5.0)]);
    let mut scene = SceneGraph::new();
    let mut renderer = TilesetRenderer::new().with_tileset(tileset);
    renderer.full_refresh(&mut mesh, &mut scene);

    assert_eq!(tile_name(&renderer, 0).as_deref(), Some("Ledge"));
    assert_eq!(tile_name(&renderer, 2).as_deref(), Some("Floor"));
}
