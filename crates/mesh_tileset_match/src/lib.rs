//! Face signature derivation and tile matching
//!
//! Turns the quad faces of a mesh into [`FaceSignature`]s and finds the best
//! catalog tile for each one:
//! - [`MeshGeometry`] / [`AdjacencyLookup`] - read-only mesh access and neighbor lookup
//! - [`FaceSignature`] - orientation, size, normal, edge flags and flag mask of a face
//! - [`match_tile`] - rotation-aware catalog search under a [`SizeMatchMode`]
//!
//! Like the core crate this has no engine dependency.

mod geometry;
mod matcher;
mod signature;

pub use geometry::{
    read_face_mask, write_face_mask, AdjacencyLookup, MeshGeometry, MeshGeometryMut, QuadMesh,
    WELD_EPSILON,
};
pub use matcher::{match_tile, MatchResult, MatchSettings, SizeMatchMode};
pub use signature::{FaceSignature, TilePlacement, Tolerances, RECT_THRESHOLD};
