//! Procedural tile dressing for quad meshes
//!
//! Re-exports the workspace crates behind one dependency:
//! - [`core`] - edge flags, flag masks, tile definitions and tilesets
//! - [`matching`] - face signatures and the tile matcher
//! - [`runtime`] - refresh passes and instance pooling (feature `runtime`)
//!
//! Most users only need the [`prelude`].

pub use mesh_tileset_core as core;
pub use mesh_tileset_match as matching;
#[cfg(feature = "runtime")]
pub use mesh_tileset_runtime as runtime;

pub mod prelude {
    pub use mesh_tileset_core::{
        load_tileset, save_tileset, Bend, EdgeFlag, EdgeFlags, FlagChannel, FlagMask, HideGroup,
        HideMode, TileDefinition, TileId, TileOrientation, TilePart, Tileset, TilesetError,
    };
    pub use mesh_tileset_match::{
        match_tile, FaceSignature, MatchResult, MatchSettings, MeshGeometry, MeshGeometryMut,
        QuadMesh, SizeMatchMode, TilePlacement, Tolerances,
    };

    #[cfg(feature = "runtime")]
    pub use mesh_tileset_runtime::{
        InstanceKey, InstancePool, RefreshSummary, RendererSettings, SceneGraph, TileMaterializer,
        TilesetRenderer,
    };

    #[cfg(feature = "bevy")]
    pub use mesh_tileset_runtime::{BevyMaterializer, TileInstanceRoot, TilePartTag};
}
