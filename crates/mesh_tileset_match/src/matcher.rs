//! Catalog matching
//!
//! [`match_tile`] walks the catalog in priority order and picks the tile whose
//! edge flags, flag mask and size best fit a [`FaceSignature`].

use mesh_tileset_core::{TileDefinition, TileId};
use serde::{Deserialize, Serialize};

use crate::signature::FaceSignature;

/// How tile sizes are compared against face sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SizeMatchMode {
    /// Consider the tile with the closest width and height
    ClosestMatch,
    /// Only consider tiles whose width and height match within the size tolerance
    #[default]
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    pub size_match: SizeMatchMode,
    /// Pick tiles that need fewer quarter turns to match
    pub prefer_fewer_rotations: bool,
    pub size_tolerance: f32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            size_match: SizeMatchMode::Exact,
            prefer_fewer_rotations: false,
            size_tolerance: 0.001,
        }
    }
}

/// The tile chosen for a face and how many clockwise quarter turns it needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchResult {
    pub tile: Option<TileId>,
    pub rotation: usize,
}

impl MatchResult {
    pub const UNMATCHED: Self = Self {
        tile: None,
        rotation: 0,
    };

    pub fn is_matched(&self) -> bool {
        self.tile.is_some()
    }
}

/// Find the best catalog tile for `signature`.
///
/// Candidates must satisfy the face's edge flags (the tile's flags are rotated,
/// the face's stay fixed) and the face's flag mask must satisfy the tile's.
/// Every rotation that satisfies the edges is considered for a candidate:
/// [`SizeMatchMode::Exact`] takes the first one whose size fits and
/// [`SizeMatchMode::ClosestMatch`] the one with the smallest squared size
/// distance.
///
/// Earlier catalog entries win ties. With `prefer_fewer_rotations` a candidate
/// that needs fewer rotations replaces the current best, but in closest-match
/// mode only when its distance is exactly equal.
pub fn match_tile<'a>(
    signature: &FaceSignature,
    catalog: impl IntoIterator<Item = &'a TileDefinition>,
    settings: &MatchSettings,
) -> MatchResult {
    let face_edges = signature.edge_flags();
    let mut best: Option<(TileId, usize)> = None;
    let mut min_distance = f32::MAX;

    for tile in catalog {
        if !signature.flags().matches(&tile.flags) {
            continue;
        }
        let mut rotations = tile.edge_flags.matching_rotations(face_edges);

        let rotation = match settings.size_match {
            SizeMatchMode::Exact => {
                let Some(rotation) = rotations
                    .find(|&r| signature.matches_size(tile, r, settings.size_tolerance))
                else {
                    continue;
                };
                if !settings.prefer_fewer_rotations {
                    best = Some((tile.id, rotation));
                    break;
                }
                rotation
            }
            SizeMatchMode::ClosestMatch => {
                let Some((rotation, distance)) = rotations
                    .map(|r| (r, size_distance(signature, tile, r)))
                    .fold(None, |closest: Option<(usize, f32)>, (r, d)| match closest {
                        Some((_, best_d)) if best_d <= d => closest,
                        _ => Some((r, d)),
                    })
                else {
                    continue;
                };
                if distance > min_distance {
                    continue;
                }
                if distance < min_distance {
                    min_distance = distance;
                    best = Some((tile.id, rotation));
                    continue;
                }
                rotation
            }
        };

        if settings.prefer_fewer_rotations {
            let fewer = best.map_or(true, |(_, best_rotation)| rotation < best_rotation);
            if fewer {
                best = Some((tile.id, rotation));
            }
        }
    }

    let result = match best {
        Some((tile, rotation)) => MatchResult {
            tile: Some(tile),
            rotation,
        },
        None => MatchResult::UNMATCHED,
    };
    tracing::trace!(
        face = signature.face(),
        tile = ?result.tile,
        rotation = result.rotation,
        "matched face"
    );
    result
}

fn size_distance(signature: &FaceSignature, tile: &TileDefinition, rotation: usize) -> f32 {
    (tile.size() - signature.rotated_size(rotation)).length_squared()
}
