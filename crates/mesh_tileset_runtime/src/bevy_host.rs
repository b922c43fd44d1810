//! Bevy host for tile instances
//!
//! Each instance is a root entity carrying [`TileInstanceRoot`] with one child
//! per authored [`TilePart`](mesh_tileset_core::TilePart). Systems lend their
//! `World` to a [`BevyMaterializer`] for the duration of a refresh pass.

use bevy::prelude::*;
use mesh_tileset_core::{TileDefinition, TileId};
use mesh_tileset_match::TilePlacement;

use crate::pool::TileMaterializer;

/// Marker on the root entity of a tile instance
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileInstanceRoot {
    pub tile: TileId,
}

/// A part entity below a [`TileInstanceRoot`]
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct TilePartTag {
    pub name: String,
    pub tag: Option<String>,
    /// Asset path the host should attach a scene or mesh from
    pub asset: Option<String>,
}

/// Spawns tile instances into a borrowed `World`
pub struct BevyMaterializer<'w> {
    world: &'w mut World,
    parent: Option<Entity>,
}

impl<'w> BevyMaterializer<'w> {
    pub fn new(world: &'w mut World) -> Self {
        Self { world, parent: None }
    }

    /// Spawn instance roots as children of `parent`, usually the mesh entity
    pub fn with_parent(mut self, parent: Entity) -> Self {
        self.parent = Some(parent);
        self
    }

    fn part_entities(&self, root: Entity) -> Vec<Entity> {
        self.world
            .get::<Children>(root)
            .map(|children| children.to_vec())
            .unwrap_or_default()
    }
}

fn placement_transform(placement: &TilePlacement) -> Transform {
    Transform {
        translation: Vec3::from_array(placement.translation.to_array()),
        rotation: Quat::from_array(placement.rotation.to_array()),
        scale: Vec3::ONE,
    }
}

impl TileMaterializer for BevyMaterializer<'_> {
    type Handle = Entity;

    fn materialize(&mut self, tile: &TileDefinition) -> Entity {
        let root = self
            .world
            .spawn((
                TileInstanceRoot { tile: tile.id },
                Name::new(tile.name.clone()),
                Transform::default(),
                Visibility::Inherited,
            ))
            .id();
        if let Some(parent) = self.parent {
            self.world.entity_mut(root).insert(ChildOf(parent));
        }

        for part in &tile.parts {
            self.world.spawn((
                TilePartTag {
                    name: part.name.clone(),
                    tag: part.tag.clone(),
                    asset: part.asset.clone(),
                },
                Name::new(part.name.clone()),
                Transform {
                    translation: Vec3::from_array(part.translation.to_array()),
                    rotation: Quat::from_array(part.rotation.to_array()),
                    scale: Vec3::from_array(part.scale.to_array()),
                },
                Visibility::Inherited,
                ChildOf(root),
            ));
        }
        root
    }

    fn set_active(&mut self, handle: &Entity, active: bool) {
        if let Some(mut visibility) = self.world.get_mut::<Visibility>(*handle) {
            *visibility = if active {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            };
        }
    }

    fn set_placement(&mut self, handle: &Entity, placement: &TilePlacement) {
        if let Some(mut transform) = self.world.get_mut::<Transform>(*handle) {
            *transform = placement_transform(placement);
        }
    }

    fn set_part_visibility(&mut self, handle: &Entity, tag: &str, visible: bool) {
        for part in self.part_entities(*handle) {
            let tagged = self
                .world
                .get::<TilePartTag>(part)
                .is_some_and(|part| part.tag.as_deref() == Some(tag));
            if !tagged {
                continue;
            }
            if let Some(mut visibility) = self.world.get_mut::<Visibility>(part) {
                *visibility = if visible {
                    Visibility::Inherited
                } else {
                    Visibility::Hidden
                };
            }
        }
    }

    fn destroy(&mut self, handle: Entity) {
        if let Ok(entity) = self.world.get_entity_mut(handle) {
            entity.despawn();
        }
    }
}
