//! Tile definitions
//!
//! A [`TileDefinition`] is one authored catalog entry: its size, the edge
//! conditions and flag mask a face must satisfy, and the parts a host
//! instantiates when the tile is placed.

use crate::edge::EdgeFlags;
use crate::flags::FlagMask;
use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a tile within its tileset.
///
/// Assigned by [`Tileset::add_tile`](crate::Tileset::add_tile) as
/// `max(existing) + 1`, starting at `1`. `0` marks a tile not yet added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(pub u32);

impl TileId {
    pub const UNASSIGNED: Self = TileId(0);

    pub fn is_assigned(self) -> bool {
        self != Self::UNASSIGNED
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How the top edge of a face is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileOrientation {
    /// Orientation follows the order of the face's vertices
    #[default]
    FromVertexOrder,
    /// Top edge faces up in world space
    TopIsWorldUp,
    /// Top edge faces up in object space
    TopIsObjectUp,
    /// Top edge faces forward in world space
    TopIsWorldForward,
    /// Top edge faces forward in object space
    TopIsObjectForward,
}

impl TileOrientation {
    /// Target direction for the top edge in object space, or `None` when the
    /// vertex order decides.
    ///
    /// `world_to_object` rotates world directions into the owner's object
    /// space and only affects the world-space policies.
    pub fn top_target(self, world_to_object: Quat) -> Option<Vec3> {
        match self {
            TileOrientation::FromVertexOrder => None,
            TileOrientation::TopIsWorldUp => Some(world_to_object * Vec3::Y),
            TileOrientation::TopIsObjectUp => Some(Vec3::Y),
            TileOrientation::TopIsWorldForward => Some(world_to_object * Vec3::Z),
            TileOrientation::TopIsObjectForward => Some(Vec3::Z),
        }
    }
}

/// Whether a hide group hides or shows its parts when its condition matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HideMode {
    #[default]
    ShowOnMatch,
    HideOnMatch,
}

/// Toggles the tagged parts of a placed tile based on the face's flag mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HideGroup {
    /// Parts carrying this tag are affected
    pub tag: String,
    #[serde(default)]
    pub mode: HideMode,
    /// Requirement tested against the face's mask
    #[serde(default)]
    pub condition: FlagMask,
}

impl HideGroup {
    pub fn new(tag: impl Into<String>, mode: HideMode, condition: FlagMask) -> Self {
        Self {
            tag: tag.into(),
            mode,
            condition,
        }
    }

    pub fn should_hide(&self, face_flags: &FlagMask) -> bool {
        let matches = face_flags.matches(&self.condition);
        match self.mode {
            HideMode::HideOnMatch => matches,
            HideMode::ShowOnMatch => !matches,
        }
    }
}

/// One piece of authored tile content, copied into every instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilePart {
    pub name: String,
    /// Tag used by hide groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Host asset this part renders (mesh, prefab, scene path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    #[serde(default)]
    pub translation: Vec3,
    #[serde(default = "default_rotation")]
    pub rotation: Quat,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    /// Size of the part's bounds in its own space
    #[serde(default)]
    pub extents: Vec3,
}

fn default_rotation() -> Quat {
    Quat::IDENTITY
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

impl TilePart {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: None,
            asset: None,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            extents: Vec3::ZERO,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = Some(asset.into());
        self
    }

    pub fn with_transform(mut self, translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        self.translation = translation;
        self.rotation = rotation;
        self.scale = scale;
        self
    }

    pub fn with_extents(mut self, extents: Vec3) -> Self {
        self.extents = extents;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.as_deref() == Some(tag)
    }

    /// Largest projection of the part's bounds onto `axis` (tile space)
    fn projected_extent(&self, axis: Vec3) -> f32 {
        let size = self.extents * self.scale;
        [
            (self.rotation * Vec3::X) * size.x,
            (self.rotation * Vec3::Y) * size.y,
            (self.rotation * Vec3::Z) * size.z,
        ]
        .into_iter()
        .map(|v| axis.dot(v).abs())
        .fold(0.0, f32::max)
    }
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDefinition {
    #[serde(default)]
    pub id: TileId,
    pub name: String,
    pub width: f32,
    pub height: f32,
    /// Edge conditions a face must satisfy (rotations are searched)
    #[serde(default)]
    pub edge_flags: EdgeFlags,
    /// Flag requirement a face must satisfy
    #[serde(default)]
    pub flags: FlagMask,
    /// When set, faces matched to this tile are re-oriented with `orientation`
    #[serde(default)]
    pub override_orientation: bool,
    #[serde(default)]
    pub orientation: TileOrientation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hide_groups: Vec<HideGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<TilePart>,
}

impl TileDefinition {
    pub fn new(name: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            id: TileId::UNASSIGNED,
            name: name.into(),
            width,
            height,
            edge_flags: EdgeFlags::ANY,
            flags: FlagMask::UNDEFINED,
            override_orientation: false,
            orientation: TileOrientation::FromVertexOrder,
            hide_groups: Vec::new(),
            parts: Vec::new(),
        }
    }

    pub fn with_edges(mut self, edge_flags: EdgeFlags) -> Self {
        self.edge_flags = edge_flags;
        self
    }

    pub fn with_flags(mut self, flags: FlagMask) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_orientation(mut self, orientation: TileOrientation) -> Self {
        self.override_orientation = true;
        self.orientation = orientation;
        self
    }

    pub fn with_hide_group(mut self, group: HideGroup) -> Self {
        self.hide_groups.push(group);
        self
    }

    pub fn with_part(mut self, part: TilePart) -> Self {
        self.parts.push(part);
        self
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Orientation policy to apply when this tile is matched, if it overrides one
    pub fn orientation_override(&self) -> Option<TileOrientation> {
        self.override_orientation.then_some(self.orientation)
    }

    /// Fit width (tile X) and height (tile Z, the face's up edge) to the
    /// largest projected part bounds. Tiles without sized parts keep their size.
    pub fn fit_size_to_parts(&mut self) {
        let sized = self.parts.iter().filter(|p| p.extents != Vec3::ZERO);
        let (width, height) = sized.fold((0.0_f32, 0.0_f32), |(w, h), part| {
            (
                w.max(part.projected_extent(Vec3::X)),
                h.max(part.projected_extent(Vec3::Z)),
            )
        });
        if width > 0.0 && height > 0.0 {
            self.width = width;
            self.height = height;
        }
    }
}
