//! Renderer settings, loaded from TOML

use std::path::Path;

use mesh_tileset_core::TileOrientation;
use mesh_tileset_match::{MatchSettings, SizeMatchMode, Tolerances};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading or saving renderer settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// How a renderer orients faces and picks tiles.
///
/// Every field is optional in TOML:
///
/// ```toml
/// size_match = "ClosestMatch"
/// prefer_fewer_rotations = true
/// orientation = "TopIsWorldUp"
///
/// [tolerances]
/// flat = 0.001
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    pub size_match: SizeMatchMode,
    pub prefer_fewer_rotations: bool,
    /// How the top edge of each face is chosen
    pub orientation: TileOrientation,
    pub tolerances: Tolerances,
}

impl RendererSettings {
    pub fn match_settings(&self) -> MatchSettings {
        MatchSettings {
            size_match: self.size_match,
            prefer_fewer_rotations: self.prefer_fewer_rotations,
            size_tolerance: self.tolerances.size,
        }
    }
}

pub fn load_settings(path: &Path) -> Result<RendererSettings, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_settings(&content)
}

pub fn parse_settings(content: &str) -> Result<RendererSettings, ConfigError> {
    Ok(toml::from_str(content)?)
}

pub fn save_settings(settings: &RendererSettings, path: &Path) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}
