//! Per-face attribute masks
//!
//! A [`FlagMask`] is a fixed-width vector of integer slots attached to faces
//! (what a face *has*) and to tiles and hide groups (what they *require*).
//! Slot value `0` means "don't care". A mask can also be undefined, which
//! places no constraint as a requirement and reads as all zeros as a subject.
//!
//! Masks are stored on the mesh as vertex colors: one RGBA block per quad
//! vertex, four slots per block.

use serde::{Deserialize, Serialize};

/// Number of slots in every defined mask
pub const FLAG_COUNT: usize = 16;

/// Number of RGBA blocks needed to encode a mask
pub const FLAG_BLOCK_COUNT: usize = FLAG_COUNT / 4;

/// One RGBA vertex color used as a storage block for four slots
pub type ColorBlock = [f32; 4];

/// Fully transparent black, the encoding of four "don't care" slots
pub const CLEAR_BLOCK: ColorBlock = [0.0; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlagMask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    flags: Option<[i32; FLAG_COUNT]>,
}

impl FlagMask {
    /// A mask with no constraint
    pub const UNDEFINED: Self = Self { flags: None };

    /// A defined mask with every slot set to "don't care"
    pub fn new() -> Self {
        Self {
            flags: Some([0; FLAG_COUNT]),
        }
    }

    pub fn from_slots(slots: [i32; FLAG_COUNT]) -> Self {
        Self { flags: Some(slots) }
    }

    /// Decode a mask from vertex colors
    pub fn from_vertex_colors(colors: &[ColorBlock]) -> Self {
        let mut mask = Self::UNDEFINED;
        mask.read_vertex_colors(colors);
        mask
    }

    pub fn is_undefined(&self) -> bool {
        self.flags.is_none()
    }

    /// Slot value, `0` when undefined
    pub fn get(&self, index: usize) -> i32 {
        self.flags.map(|flags| flags[index]).unwrap_or(0)
    }

    /// Set a slot. Writing `0` to an undefined mask leaves it undefined.
    pub fn set(&mut self, index: usize, value: i32) {
        if self.flags.is_none() && value == 0 {
            return;
        }
        self.flags.get_or_insert([0; FLAG_COUNT])[index] = value;
    }

    pub fn with_slot(mut self, index: usize, value: i32) -> Self {
        self.set(index, value);
        self
    }

    /// Slot values, if defined
    pub fn slots(&self) -> Option<&[i32; FLAG_COUNT]> {
        self.flags.as_ref()
    }

    /// Drop every slot and return to the undefined state
    pub fn clear(&mut self) {
        self.flags = None;
    }

    /// Does this mask satisfy `requirement`?
    ///
    /// Every non-zero slot of the requirement must equal the same slot here.
    /// An undefined requirement is always satisfied.
    pub fn matches(&self, requirement: &FlagMask) -> bool {
        let Some(required) = requirement.flags else {
            return true;
        };
        required
            .iter()
            .enumerate()
            .filter(|&(_, &value)| value != 0)
            .all(|(i, &value)| self.get(i) == value)
    }

    /// Encode into `colors`. Undefined masks clear every block.
    pub fn write_vertex_colors(&self, colors: &mut [ColorBlock]) {
        let Some(flags) = self.flags else {
            colors.fill(CLEAR_BLOCK);
            return;
        };
        for (block, slots) in colors.iter_mut().zip(flags.chunks_exact(4)) {
            *block = [
                slots[0] as f32,
                slots[1] as f32,
                slots[2] as f32,
                slots[3] as f32,
            ];
        }
    }

    /// Encoded blocks, or `None` when undefined
    pub fn to_vertex_colors(&self) -> Option<[ColorBlock; FLAG_BLOCK_COUNT]> {
        if self.flags.is_none() {
            return None;
        }
        let mut colors = [CLEAR_BLOCK; FLAG_BLOCK_COUNT];
        self.write_vertex_colors(&mut colors);
        Some(colors)
    }

    /// Decode from `colors`.
    ///
    /// Input with the wrong number of blocks is ignored and the mask keeps its
    /// value. All-clear input does not define an undefined mask.
    pub fn read_vertex_colors(&mut self, colors: &[ColorBlock]) {
        if colors.len() != FLAG_BLOCK_COUNT {
            tracing::trace!(
                blocks = colors.len(),
                "ignoring flag mask encoding with wrong block count"
            );
            return;
        }
        if self.flags.is_none() && are_vertex_colors_undefined(colors) {
            return;
        }
        let flags = self.flags.get_or_insert([0; FLAG_COUNT]);
        for (i, color) in colors.iter().enumerate() {
            for (c, &component) in color.iter().enumerate() {
                flags[i * 4 + c] = component as i32;
            }
        }
    }
}

/// True when every block is [`CLEAR_BLOCK`]
pub fn are_vertex_colors_undefined(colors: &[ColorBlock]) -> bool {
    colors.iter().all(|color| *color == CLEAR_BLOCK)
}

/// Authoring metadata for one mask slot of a tileset.
///
/// Toggle channels take the values `0` (undefined) or `1`; option channels take
/// `0` (undefined) or `1..=options.len()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlagChannel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_toggle: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

impl FlagChannel {
    pub fn toggle(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_toggle: true,
            options: Vec::new(),
        }
    }

    pub fn with_options(name: impl Into<String>, options: &[&str]) -> Self {
        Self {
            name: name.into(),
            is_toggle: false,
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    /// A channel is shown when it is named and has something to choose
    pub fn is_enabled(&self) -> bool {
        !self.name.is_empty() && (self.is_toggle || !self.options.is_empty())
    }

    /// Option labels with "Undefined" at index 0, so labels line up with slot values
    pub fn options_with_undefined(&self) -> Vec<String> {
        std::iter::once("Undefined".to_string())
            .chain(self.options.iter().cloned())
            .collect()
    }

    /// Label for a slot value
    pub fn label(&self, value: i32) -> Option<String> {
        if self.is_toggle {
            return match value {
                0 => Some("Undefined".to_string()),
                1 => Some("On".to_string()),
                _ => None,
            };
        }
        usize::try_from(value)
            .ok()
            .and_then(|v| self.options_with_undefined().get(v).cloned())
    }
}
