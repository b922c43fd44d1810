//! Edge adjacency flags
//!
//! Every side of a quad face is described by an [`EdgeFlag`] telling what kind
//! of neighbor (if any) borders it. Tiles declare the flags they require, faces
//! derive the flags they have, and [`EdgeFlags::matches`] decides whether the
//! two agree, optionally searching over the four clockwise rotations.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};
use thiserror::Error;

/// Concrete bend between a face and its neighbor across a shared edge.
///
/// Only these three kinds can be negated by [`EdgeFlag::Not`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bend {
    /// The neighbor continues in the same plane
    Flat,
    /// The neighbor bends away from the face normal (outside corner)
    ConvexDown,
    /// The neighbor bends towards the face normal (inside corner)
    ConcaveUp,
}

impl Bend {
    pub const ALL: [Bend; 3] = [Bend::Flat, Bend::ConvexDown, Bend::ConcaveUp];
}

impl From<Bend> for EdgeFlag {
    fn from(bend: Bend) -> Self {
        match bend {
            Bend::Flat => EdgeFlag::Flat,
            Bend::ConvexDown => EdgeFlag::ConvexDown,
            Bend::ConcaveUp => EdgeFlag::ConcaveUp,
        }
    }
}

/// Adjacency condition for one side of a face.
///
/// Serialized as its ordinal (`Any=0` .. `ConcaveUp=5`, `Not(x) = 2 * x`), so
/// `NotFlat=6`, `NotConvexDown=8` and `NotConcaveUp=10`. Odd values above 5 are
/// reserved and rejected on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EdgeFlag {
    /// Matches with everything
    #[default]
    Any,
    /// Edge has no adjacent face
    Empty,
    /// Edge has any adjacent face (flat, convex or concave)
    AnyTile,
    /// Adjacent face continues in the same plane
    Flat,
    /// Adjacent face bends down (convex geometry)
    ConvexDown,
    /// Adjacent face bends up (concave geometry)
    ConcaveUp,
    /// Anything except the given bend
    Not(Bend),
}

/// Error returned when decoding an out-of-range edge flag ordinal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid edge flag ordinal {0}")]
pub struct InvalidEdgeFlag(pub u8);

impl EdgeFlag {
    /// Every valid flag in ordinal order
    pub const ALL: [EdgeFlag; 9] = [
        EdgeFlag::Any,
        EdgeFlag::Empty,
        EdgeFlag::AnyTile,
        EdgeFlag::Flat,
        EdgeFlag::ConvexDown,
        EdgeFlag::ConcaveUp,
        EdgeFlag::Not(Bend::Flat),
        EdgeFlag::Not(Bend::ConvexDown),
        EdgeFlag::Not(Bend::ConcaveUp),
    ];

    /// Numeric encoding of this flag
    pub fn ordinal(self) -> u8 {
        match self {
            EdgeFlag::Any => 0,
            EdgeFlag::Empty => 1,
            EdgeFlag::AnyTile => 2,
            EdgeFlag::Flat => 3,
            EdgeFlag::ConvexDown => 4,
            EdgeFlag::ConcaveUp => 5,
            EdgeFlag::Not(bend) => EdgeFlag::from(bend).ordinal() * 2,
        }
    }

    /// Decode a flag from its numeric encoding
    pub fn from_ordinal(value: u8) -> Option<Self> {
        match value {
            0 => Some(EdgeFlag::Any),
            1 => Some(EdgeFlag::Empty),
            2 => Some(EdgeFlag::AnyTile),
            3 => Some(EdgeFlag::Flat),
            4 => Some(EdgeFlag::ConvexDown),
            5 => Some(EdgeFlag::ConcaveUp),
            6 => Some(EdgeFlag::Not(Bend::Flat)),
            8 => Some(EdgeFlag::Not(Bend::ConvexDown)),
            10 => Some(EdgeFlag::Not(Bend::ConcaveUp)),
            _ => None,
        }
    }

    /// Display name used by inspectors
    pub fn name(self) -> &'static str {
        match self {
            EdgeFlag::Any => "Any",
            EdgeFlag::Empty => "Empty",
            EdgeFlag::AnyTile => "Any Tile",
            EdgeFlag::Flat => "Flat",
            EdgeFlag::ConvexDown => "Convex Down",
            EdgeFlag::ConcaveUp => "Concave Up",
            EdgeFlag::Not(Bend::Flat) => "Not Flat",
            EdgeFlag::Not(Bend::ConvexDown) => "Not Convex Down",
            EdgeFlag::Not(Bend::ConcaveUp) => "Not Concave Up",
        }
    }

    /// True for the concrete kinds of an existing neighbor
    /// (`AnyTile`, `Flat`, `ConvexDown`, `ConcaveUp`).
    fn is_tile(self) -> bool {
        matches!(
            self,
            EdgeFlag::AnyTile | EdgeFlag::Flat | EdgeFlag::ConvexDown | EdgeFlag::ConcaveUp
        )
    }

    /// `Not(x)` accepts everything but `x`
    fn negation_allows(self, other: EdgeFlag) -> bool {
        match self {
            EdgeFlag::Not(bend) => other != EdgeFlag::from(bend),
            _ => false,
        }
    }

    /// Symmetric match between two flags
    pub fn matches(self, other: EdgeFlag) -> bool {
        self == other
            || self == EdgeFlag::Any
            || other == EdgeFlag::Any
            || (self == EdgeFlag::AnyTile && other.is_tile())
            || (other == EdgeFlag::AnyTile && self.is_tile())
            || self.negation_allows(other)
            || other.negation_allows(self)
    }
}

impl From<EdgeFlag> for u8 {
    fn from(flag: EdgeFlag) -> Self {
        flag.ordinal()
    }
}

impl TryFrom<u8> for EdgeFlag {
    type Error = InvalidEdgeFlag;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        EdgeFlag::from_ordinal(value).ok_or(InvalidEdgeFlag(value))
    }
}

/// Adjacency conditions for the four sides of a face.
///
/// Indexing follows the rotation order `0=left, 1=top, 2=right, 3=bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EdgeFlags {
    #[serde(default)]
    pub top: EdgeFlag,
    #[serde(default)]
    pub bottom: EdgeFlag,
    #[serde(default)]
    pub left: EdgeFlag,
    #[serde(default)]
    pub right: EdgeFlag,
}

impl EdgeFlags {
    /// All four sides accept anything
    pub const ANY: Self = Self::uniform(EdgeFlag::Any);

    pub const fn new(top: EdgeFlag, bottom: EdgeFlag, left: EdgeFlag, right: EdgeFlag) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Same flag on every side
    pub const fn uniform(flag: EdgeFlag) -> Self {
        Self::new(flag, flag, flag, flag)
    }

    /// Rotate clockwise by `rotations` quarter turns
    pub fn rotated_clockwise(&self, rotations: usize) -> Self {
        let mut rotated = Self::ANY;
        for k in 0..4 {
            rotated[k] = self[(rotations + k) % 4];
        }
        rotated
    }

    /// All four sides match in fixed order
    pub fn matches_exact(&self, other: &EdgeFlags) -> bool {
        self.top.matches(other.top)
            && self.bottom.matches(other.bottom)
            && self.left.matches(other.left)
            && self.right.matches(other.right)
    }

    /// Match against `other`, returning the rotation that made it match.
    ///
    /// Without rotation only the fixed orientation is tried (reported as `0`).
    /// With rotation `self` is rotated clockwise 0, 1, 2, 3 times and the first
    /// successful rotation is returned, so lower rotations always win.
    pub fn matches(&self, other: &EdgeFlags, allow_rotation: bool) -> Option<usize> {
        if !allow_rotation {
            return self.matches_exact(other).then_some(0);
        }
        self.matching_rotations(*other).next()
    }

    /// Every clockwise rotation of `self` that matches `other`, ascending
    pub fn matching_rotations(self, other: EdgeFlags) -> impl Iterator<Item = usize> {
        (0..4).filter(move |&rotation| self.rotated_clockwise(rotation).matches_exact(&other))
    }

    /// Iterate sides in rotation index order (left, top, right, bottom)
    pub fn iter(&self) -> impl Iterator<Item = EdgeFlag> + '_ {
        (0..4).map(move |i| self[i])
    }
}

impl Index<usize> for EdgeFlags {
    type Output = EdgeFlag;

    fn index(&self, index: usize) -> &Self::Output {
        match index {
            0 => &self.left,
            1 => &self.top,
            2 => &self.right,
            3 => &self.bottom,
            _ => panic!("edge index {index} out of range (0..4)"),
        }
    }
}

impl IndexMut<usize> for EdgeFlags {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        match index {
            0 => &mut self.left,
            1 => &mut self.top,
            2 => &mut self.right,
            3 => &mut self.bottom,
            _ => panic!("edge index {index} out of range (0..4)"),
        }
    }
}
