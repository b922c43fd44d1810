//! Inspector data for selected faces
//!
//! Editors show what a face derived and matched, and let users edit the
//! face's flag mask through the tileset's named channels. Everything here is
//! UI-agnostic: it only reads from and writes to a [`TilesetRenderer`].

use mesh_tileset_core::{EdgeFlags, FlagChannel, FlagMask, TileId};
use mesh_tileset_match::MeshGeometryMut;

use crate::pool::{InstanceKey, TileMaterializer};
use crate::renderer::TilesetRenderer;

/// Current value of one enabled flag channel on a face
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelValue {
    pub slot: usize,
    pub name: String,
    pub is_toggle: bool,
    pub value: i32,
    /// Display label of `value`, `None` when out of range
    pub label: Option<String>,
    /// Selectable labels, "Undefined" first
    pub options: Vec<String>,
}

/// Everything an inspector shows for one face
#[derive(Debug, Clone, PartialEq)]
pub struct FaceInfo {
    pub face: usize,
    pub tile: Option<TileId>,
    pub tile_name: Option<String>,
    pub rotation: usize,
    pub instance: Option<InstanceKey>,
    pub edge_flags: EdgeFlags,
    pub width: f32,
    pub height: f32,
    pub is_rect: bool,
    pub flags_undefined: bool,
    pub channels: Vec<ChannelValue>,
}

/// Describe a face from the renderer's last pass
pub fn inspect_face<H>(renderer: &TilesetRenderer<H>, face: usize) -> Option<FaceInfo> {
    let signature = renderer.signature(face)?;
    let tileset = renderer.tileset();
    let tile_name = signature
        .matched_tile()
        .and_then(|id| tileset?.lookup(id))
        .map(|tile| tile.name.clone());

    let channels = tileset
        .map(|tileset| {
            tileset
                .flag_channels()
                .iter()
                .enumerate()
                .filter(|(_, channel)| channel.is_enabled())
                .map(|(slot, channel)| {
                    let value = signature.flags().get(slot);
                    ChannelValue {
                        slot,
                        name: channel.name.clone(),
                        is_toggle: channel.is_toggle,
                        value,
                        label: channel.label(value),
                        options: channel.options_with_undefined(),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    Some(FaceInfo {
        face,
        tile: signature.matched_tile(),
        tile_name,
        rotation: signature.matched_rotation(),
        instance: renderer.instance(face),
        edge_flags: signature.edge_flags(),
        width: signature.width(),
        height: signature.height(),
        is_rect: signature.is_rect(),
        flags_undefined: signature.flags().is_undefined(),
        channels,
    })
}

/// Set a channel's slot on `mask` if `value` is valid for the channel.
///
/// Toggles accept `0` and `1`, option channels `0..=options.len()`.
pub fn set_channel_value(mask: &mut FlagMask, slot: usize, channel: &FlagChannel, value: i32) -> bool {
    let max = if channel.is_toggle {
        1
    } else {
        channel.options.len() as i32
    };
    if !(0..=max).contains(&value) {
        return false;
    }
    mask.set(slot, value);
    true
}

/// Edit the flag mask of a face selection.
///
/// `edit` is applied to the first selected face's mask. If that changes it,
/// the result is written to every selected face and a full refresh is run.
/// Returns whether anything changed.
pub fn edit_face_flags<H, G, M>(
    renderer: &mut TilesetRenderer<H>,
    mesh: &mut G,
    host: &mut M,
    selection: &[usize],
    edit: impl FnOnce(&mut FlagMask),
) -> bool
where
    G: MeshGeometryMut,
    M: TileMaterializer<Handle = H>,
{
    let Some(source) = selection.first().and_then(|&face| renderer.signature(face)) else {
        return false;
    };
    let before = *source.flags();
    let mut mask = before;
    edit(&mut mask);
    if mask == before {
        return false;
    }

    for &face in selection {
        renderer.set_face_flags(mesh, face, mask);
    }
    renderer.full_refresh(mesh, host);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneGraph;
    use glam::Vec3;
    use mesh_tileset_core::{TileDefinition, Tileset};
    use mesh_tileset_match::QuadMesh;

    fn setup() -> (TilesetRenderer<crate::scene::NodeId>, QuadMesh, SceneGraph) {
        let mut tileset = Tileset::new("Overlay");
        *tileset.flag_channel_mut(0) = FlagChannel::with_options("Material", &["Stone", "Wood"]);
        *tileset.flag_channel_mut(3) = FlagChannel::toggle("Broken");
        tileset.add_tile(
            TileDefinition::new("Wood Floor", 1.0, 1.0)
                .with_flags(FlagMask::UNDEFINED.with_slot(0, 2)),
        ).unwrap();
        tileset.add_tile(TileDefinition::new("Floor", 1.0, 1.0)).unwrap();

        let mesh = QuadMesh::from_quads(&[
            [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(1.0, 0.0, 0.0),
            ],
            [
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(2.0, 0.0, 1.0),
                Vec3::new(2.0, 0.0, 0.0),
            ],
        ]);
        (TilesetRenderer::new().with_tileset(tileset), mesh, SceneGraph::new())
    }

    #[test]
    fn inspect_lists_enabled_channels() {
        let (mut renderer, mut mesh, mut scene) = setup();
        renderer.full_refresh(&mut mesh, &mut scene);

        let info = inspect_face(&renderer, 0).unwrap();
        assert_eq!(info.tile_name.as_deref(), Some("Floor"));
        assert!(info.flags_undefined);
        assert!(info.is_rect);
        assert_eq!(info.channels.len(), 2);
        assert_eq!(info.channels[0].options, vec!["Undefined", "Stone", "Wood"]);
        assert_eq!(info.channels[1].slot, 3);
        assert!(inspect_face(&renderer, 9).is_none());
    }

    #[test]
    fn channel_values_are_range_checked() {
        let wood = FlagChannel::with_options("Material", &["Stone", "Wood"]);
        let mut mask = FlagMask::UNDEFINED;
        assert!(set_channel_value(&mut mask, 0, &wood, 2));
        assert!(!set_channel_value(&mut mask, 0, &wood, 3));
        assert!(!set_channel_value(&mut mask, 1, &FlagChannel::toggle("Lit"), 2));
        assert_eq!(mask.get(0), 2);
    }

    #[test]
    fn editing_selection_rematches_every_face() {
        let (mut renderer, mut mesh, mut scene) = setup();
        renderer.full_refresh(&mut mesh, &mut scene);
        let channel = renderer.tileset().unwrap().flag_channels()[0].clone();

        let changed = edit_face_flags(&mut renderer, &mut mesh, &mut scene, &[0, 1], |mask| {
            set_channel_value(mask, 0, &channel, 2);
        });
        assert!(changed);
        for face in [0, 1] {
            let info = inspect_face(&renderer, face).unwrap();
            assert_eq!(info.tile_name.as_deref(), Some("Wood Floor"));
            assert_eq!(info.channels[0].label.as_deref(), Some("Wood"));
        }

        let unchanged = edit_face_flags(&mut renderer, &mut mesh, &mut scene, &[1], |mask| {
            mask.set(0, 2);
        });
        assert!(!unchanged);
    }
}
