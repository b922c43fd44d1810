//! In-memory scene host
//!
//! [`SceneGraph`] is a [`TileMaterializer`] that records instances as plain
//! data. Hosts without an engine use it as their scene, and it doubles as an
//! inspection target for tests.

use std::collections::BTreeMap;

use mesh_tileset_core::{TileDefinition, TileId};
use mesh_tileset_match::TilePlacement;

use crate::pool::TileMaterializer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// One authored part inside a tile instance
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePart {
    pub name: String,
    pub tag: Option<String>,
    pub asset: Option<String>,
    pub visible: bool,
}

/// A materialized tile instance
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub tile: TileId,
    pub name: String,
    pub active: bool,
    pub placement: TilePlacement,
    pub parts: Vec<ScenePart>,
}

impl SceneNode {
    /// Visibility of the first part with `tag`
    pub fn part_visible(&self, tag: &str) -> Option<bool> {
        self.parts
            .iter()
            .find(|part| part.tag.as_deref() == Some(tag))
            .map(|part| part.visible)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, SceneNode>,
    next_id: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().map(|(&id, node)| (id, node))
    }

    pub fn active_nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes().filter(|(_, node)| node.active)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl TileMaterializer for SceneGraph {
    type Handle = NodeId;

    fn materialize(&mut self, tile: &TileDefinition) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let parts = tile
            .parts
            .iter()
            .map(|part| ScenePart {
                name: part.name.clone(),
                tag: part.tag.clone(),
                asset: part.asset.clone(),
                visible: true,
            })
            .collect();
        self.nodes.insert(
            id,
            SceneNode {
                tile: tile.id,
                name: tile.name.clone(),
                active: true,
                placement: TilePlacement::default(),
                parts,
            },
        );
        id
    }

    fn set_active(&mut self, handle: &NodeId, active: bool) {
        if let Some(node) = self.nodes.get_mut(handle) {
            node.active = active;
        }
    }

    fn set_placement(&mut self, handle: &NodeId, placement: &TilePlacement) {
        if let Some(node) = self.nodes.get_mut(handle) {
            node.placement = *placement;
        }
    }

    fn set_part_visibility(&mut self, handle: &NodeId, tag: &str, visible: bool) {
        let Some(node) = self.nodes.get_mut(handle) else {
            return;
        };
        for part in node.parts.iter_mut().filter(|p| p.tag.as_deref() == Some(tag)) {
            part.visible = visible;
        }
    }

    fn destroy(&mut self, handle: NodeId) {
        self.nodes.remove(&handle);
    }
}
