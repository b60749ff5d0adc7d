use crate::core::bounds::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell in the quadtree pyramid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileAddress {
    pub level: u32,
    pub col: u32,
    pub row: u32,
}

impl TileAddress {
    pub fn new(level: u32, col: u32, row: u32) -> Self {
        Self { level, col, row }
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}_{}", self.level, self.col, self.row)
    }
}

/// An inclusive block of columns and rows at one level.
///
/// A range with `left == right` and `top == bottom` is exactly one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRange {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl TileRange {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        debug_assert!(left <= right && top <= bottom, "inverted tile range");
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn single(col: u32, row: u32) -> Self {
        Self::new(col, row, col, row)
    }

    pub fn cols(&self) -> u32 {
        self.right - self.left + 1
    }

    pub fn rows(&self) -> u32 {
        self.bottom - self.top + 1
    }

    /// Number of tiles in the range
    pub fn count(&self) -> u32 {
        self.cols() * self.rows()
    }

    pub fn contains(&self, col: u32, row: u32) -> bool {
        (self.left..=self.right).contains(&col) && (self.top..=self.bottom).contains(&row)
    }

    /// Column-major iteration over `(col, row)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.left..=self.right).flat_map(move |col| (self.top..=self.bottom).map(move |row| (col, row)))
    }
}

/// Where to fetch a tile and which part of the fetched image it occupies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileInfo {
    pub url: String,
    /// Source crop in the fetched image's natural pixels; `None` uses the whole image.
    pub crop: Option<Rect>,
}

impl TileInfo {
    pub fn new(url: impl Into<String>, crop: Option<Rect>) -> Self {
        Self {
            url: url.into(),
            crop,
        }
    }

    pub fn uncropped(url: impl Into<String>) -> Self {
        Self::new(url, None)
    }
}
