use serde::{Deserialize, Serialize};

/// A point in sheet pixels.
///
/// Either the top-left placement of one image, or the whole-sheet extent when
/// produced for the index one past the last image. `(-1, -1)` marks an
/// out-of-range query.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Pos {
    pub x: i64,
    pub y: i64,
}

impl Pos {
    /// Sentinel returned for indices outside `-1..=len`.
    pub const NOT_FOUND: Pos = Pos { x: -1, y: -1 };

    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn is_not_found(&self) -> bool {
        *self == Self::NOT_FOUND
    }
}

/// One source image as placed in the sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpriteEntry {
    /// Base name without extension, the name lookups accept.
    pub name: String,
    /// Path relative to the image directory.
    pub path: String,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Geometry of a whole sprite: every entry in packing order plus the sheet size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpriteMap {
    /// Output name (`<dir>/<hash>.png`) the sheet is addressed by.
    pub image: String,
    pub width: i64,
    pub height: i64,
    pub entries: Vec<SpriteEntry>,
}

impl SpriteMap {
    pub fn get(&self, name: &str) -> Option<&SpriteEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.name == name || e.path == name)
    }
}
