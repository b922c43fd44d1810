//! Ordered tile catalog with JSON persistence

use crate::flags::{FlagChannel, FLAG_COUNT};
use crate::tile::{TileDefinition, TileId, TilePart};
use crate::TilesetError;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// Ordered catalog of tile definitions.
///
/// Order is significant: when several tiles fit a face equally well the one
/// listed first wins, so specific tiles should precede general ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tileset {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    tiles: Vec<TileDefinition>,
    /// Authoring metadata for each flag slot
    #[serde(default = "default_flag_channels")]
    flag_channels: Vec<FlagChannel>,
}

fn default_flag_channels() -> Vec<FlagChannel> {
    vec![FlagChannel::default(); FLAG_COUNT]
}

impl Tileset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            tiles: Vec::new(),
            flag_channels: default_flag_channels(),
        }
    }

    /// Id for the next added tile: the largest existing id plus one
    ///
    /// Removing the tile with the largest id makes that id available again.
    pub fn next_id(&self) -> TileId {
        let max = self.tiles.iter().map(|t| t.id.0).max().unwrap_or(0);
        TileId(max + 1)
    }

    /// Append a tile and assign it a fresh id.
    ///
    /// Fails when the tile's width or height is not positive.
    pub fn add_tile(&mut self, tile: TileDefinition) -> Result<TileId, TilesetError> {
        let end = self.tiles.len();
        self.insert_tile(end, tile)
    }

    /// Insert a tile at `index` in priority order and assign it a fresh id
    pub fn insert_tile(
        &mut self,
        index: usize,
        mut tile: TileDefinition,
    ) -> Result<TileId, TilesetError> {
        let id = self.next_id();
        check_size(id, &tile)?;
        tile.id = id;
        self.tiles.insert(index.min(self.tiles.len()), tile);
        Ok(id)
    }

    /// Add one tile per part, named after the part and sized to its bounds.
    ///
    /// Each part is moved to its tile's origin. Parts without usable extents
    /// get a 1x1 tile.
    pub fn tiles_from_parts(
        &mut self,
        parts: impl IntoIterator<Item = TilePart>,
    ) -> Result<Vec<TileId>, TilesetError> {
        parts
            .into_iter()
            .map(|part| {
                let mut tile = TileDefinition::new(part.name.clone(), 1.0, 1.0).with_part(TilePart {
                    translation: Vec3::ZERO,
                    ..part
                });
                tile.fit_size_to_parts();
                self.add_tile(tile)
            })
            .collect()
    }

    /// Remove a tile.
    ///
    /// Faces matched to it fall back to unmatched on the next full refresh. A
    /// renderer whose catalog is edited through `tileset_mut` runs one on its
    /// next pass.
    pub fn remove_tile(&mut self, id: TileId) -> Option<TileDefinition> {
        let pos = self.tiles.iter().position(|t| t.id == id)?;
        Some(self.tiles.remove(pos))
    }

    /// Move a tile to a new priority position
    pub fn move_tile(&mut self, id: TileId, new_index: usize) -> bool {
        let Some(pos) = self.tiles.iter().position(|t| t.id == id) else {
            return false;
        };
        let tile = self.tiles.remove(pos);
        self.tiles.insert(new_index.min(self.tiles.len()), tile);
        true
    }

    pub fn lookup(&self, id: TileId) -> Option<&TileDefinition> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn lookup_mut(&mut self, id: TileId) -> Option<&mut TileDefinition> {
        self.tiles.iter_mut().find(|t| t.id == id)
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.lookup(id).is_some()
    }

    /// Tiles in priority order
    pub fn tiles(&self) -> &[TileDefinition] {
        &self.tiles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TileDefinition> {
        self.tiles.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = TileId> + '_ {
        self.tiles.iter().map(|t| t.id)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn flag_channels(&self) -> &[FlagChannel] {
        &self.flag_channels
    }

    /// Panics if `slot >= FLAG_COUNT`
    pub fn flag_channel_mut(&mut self, slot: usize) -> &mut FlagChannel {
        &mut self.flag_channels[slot]
    }

    /// Check ids are assigned and unique, sizes positive and channels complete
    pub fn validate(&self) -> Result<(), TilesetError> {
        if self.flag_channels.len() != FLAG_COUNT {
            return Err(TilesetError::FlagChannelCount(self.flag_channels.len()));
        }
        let mut seen = HashSet::new();
        for tile in &self.tiles {
            if !tile.id.is_assigned() {
                return Err(TilesetError::UnassignedTileId(tile.name.clone()));
            }
            if !seen.insert(tile.id) {
                return Err(TilesetError::DuplicateTileId(tile.id));
            }
            check_size(tile.id, tile)?;
        }
        Ok(())
    }
}

fn check_size(id: TileId, tile: &TileDefinition) -> Result<(), TilesetError> {
    if tile.width > 0.0 && tile.height > 0.0 {
        return Ok(());
    }
    Err(TilesetError::InvalidTileSize {
        id,
        width: tile.width,
        height: tile.height,
    })
}

impl<'a> IntoIterator for &'a Tileset {
    type Item = &'a TileDefinition;
    type IntoIter = std::slice::Iter<'a, TileDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles.iter()
    }
}

/// Load and validate a tileset from a JSON file
pub fn load_tileset(path: &Path) -> Result<Tileset, TilesetError> {
    let content = std::fs::read_to_string(path)?;
    parse_tileset(&content)
}

/// Parse and validate a tileset from a JSON string
pub fn parse_tileset(json: &str) -> Result<Tileset, TilesetError> {
    let tileset: Tileset = serde_json::from_str(json)?;
    tileset.validate()?;
    tracing::debug!(tileset = %tileset.name, tiles = tileset.len(), "loaded tileset");
    Ok(tileset)
}

/// Save a tileset to a JSON file
pub fn save_tileset(tileset: &Tileset, path: &Path) -> Result<(), TilesetError> {
    let content = serde_json::to_string_pretty(tileset)?;
    std::fs::write(path, content)?;
    Ok(())
}
