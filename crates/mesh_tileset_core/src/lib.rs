//! Core data structures for mesh tilesets
//!
//! This crate provides the authored and derived data used to dress quad meshes
//! with tiles:
//! - `EdgeFlag` / `EdgeFlags` - adjacency conditions for the four sides of a face
//! - `FlagMask` - per-face attribute slots with "don't care" semantics
//! - `TileDefinition` - a catalog entry with size, requirements and parts
//! - `Tileset` - the ordered catalog, with JSON persistence
//!
//! This crate has no engine dependency.

mod edge;
mod flags;
mod tile;
mod tileset;

pub use edge::{Bend, EdgeFlag, EdgeFlags, InvalidEdgeFlag};
pub use flags::{
    are_vertex_colors_undefined, ColorBlock, FlagChannel, FlagMask, CLEAR_BLOCK, FLAG_BLOCK_COUNT,
    FLAG_COUNT,
};
pub use tile::{HideGroup, HideMode, TileDefinition, TileId, TileOrientation, TilePart};
pub use tileset::{load_tileset, parse_tileset, save_tileset, Tileset};

use thiserror::Error;

/// Errors that can occur when loading, saving or validating a tileset
#[derive(Debug, Error)]
pub enum TilesetError {
    #[error("Failed to access tileset file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse tileset JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Duplicate tile id {0}")]
    DuplicateTileId(TileId),
    #[error("Tile '{0}' has no id")]
    UnassignedTileId(String),
    #[error("Tile {id} has invalid size {width}x{height}")]
    InvalidTileSize { id: TileId, width: f32, height: f32 },
    #[error("Expected {expected} flag channels, found {0}", expected = FLAG_COUNT)]
    FlagChannelCount(usize),
}
