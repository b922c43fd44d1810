//! Runtime for mesh tilesets
//!
//! Keeps a mesh dressed with tile instances as it is edited:
//! - [`TilesetRenderer`] - full and incremental refresh passes
//! - [`InstancePool`] / [`TileMaterializer`] - reuse of tile instances across passes
//! - [`SceneGraph`] - engine-free host that records instances as data
//! - [`RendererSettings`] - match mode, orientation and tolerances, loaded from TOML
//! - [`inspect_face`] / [`edit_face_flags`] - inspector data and flag editing
//!
//! With the `bevy` feature, [`BevyMaterializer`] spawns instances as entity trees.
//!
//! # Example
//!
//! ```
//! use mesh_tileset_core::{TileDefinition, Tileset};
//! use mesh_tileset_match::QuadMesh;
//! use mesh_tileset_runtime::{SceneGraph, TilesetRenderer};
//! use glam::Vec3;
//!
//! let mut tileset = Tileset::new("Floors");
//! tileset.add_tile(TileDefinition::new("Floor", 1.0, 1.0)).unwrap();
//!
//! let mut mesh = QuadMesh::from_quads(&[[
//!     Vec3::new(0.0, 0.0, 0.0),
//!     Vec3::new(0.0, 0.0, 1.0),
//!     Vec3::new(1.0, 0.0, 1.0),
//!     Vec3::new(1.0, 0.0, 0.0),
//! ]]);
//! let mut scene = SceneGraph::new();
//! let mut renderer = TilesetRenderer::new().with_tileset(tileset);
//! renderer.full_refresh(&mut mesh, &mut scene);
//! assert_eq!(renderer.summary().matched, 1);
//! ```

mod config;
mod overlay;
mod pool;
mod renderer;
mod scene;

#[cfg(feature = "bevy")]
mod bevy_host;

pub use config::{load_settings, parse_settings, save_settings, ConfigError, RendererSettings};
pub use overlay::{edit_face_flags, inspect_face, set_channel_value, ChannelValue, FaceInfo};
pub use pool::{InstanceKey, InstancePool, TileMaterializer};
pub use renderer::{RefreshSummary, TilesetRenderer};
pub use scene::{NodeId, SceneGraph, SceneNode, ScenePart};

#[cfg(feature = "bevy")]
pub use bevy_host::{BevyMaterializer, TileInstanceRoot, TilePartTag};
