//! Tile source abstraction
//!
//! A [`TileSource`] answers every addressing question the viewer asks about a
//! pyramid: where a tile lives, which part of the content it shows, and which
//! tiles above or below it take part in coverage bookkeeping. All answers are
//! pure functions of the source's configuration.
//!
//! The shared tiling math lives in [`PyramidGeometry`]; the trait's provided
//! methods build on it so concrete sources only override what differs.

use crate::{
    core::{
        bounds::Rect,
        geo::{Point, Size},
    },
    tiles::{
        address::{TileAddress, TileInfo, TileRange},
        collection::CollectionItemSource,
        dense::DenseSource,
    },
    Error, Result,
};
use serde::{Deserialize, Serialize};

/// Immutable tiling parameters of one image pyramid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidGeometry {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Shared border, in pixels, between neighbouring tiles.
    pub tile_overlap: u32,
    pub min_level: u32,
    /// Level at which the full image first spans `max(width, height)` pixels.
    pub max_level: u32,
    /// Best level for an overview; the deepest level that is still a single tile.
    pub overview_level: u32,
    /// `height / width`; content coordinates are normalised to width 1.
    pub norm_height: f64,
    pub aspect_ratio: f64,
    /// How far the content falls short of filling its top level, in log2 units.
    pub sharpen: f64,
}

impl PyramidGeometry {
    /// Square tiles, no overlap, minimum level zero
    pub fn new(width: u32, height: u32, tile_size: u32) -> Result<Self> {
        Self::with_options(width, height, tile_size, tile_size, 0, 0, None)
    }

    pub fn with_options(
        width: u32,
        height: u32,
        tile_width: u32,
        tile_height: u32,
        tile_overlap: u32,
        min_level: u32,
        overview_level: Option<u32>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidGeometry(format!(
                "image must have a non-empty size, got {}x{}",
                width, height
            )));
        }
        if tile_width == 0 || tile_height == 0 {
            return Err(Error::InvalidGeometry(format!(
                "tiles must have a non-empty size, got {}x{}",
                tile_width, tile_height
            )));
        }

        let ideal_level = (width.max(height) as f64).log2();
        let max_level = ideal_level.ceil() as u32;
        let max_single_tile_level = (tile_width as f64).log2().floor() as u32;
        let min_level = min_level.min(max_level);

        Ok(Self {
            width,
            height,
            tile_width,
            tile_height,
            tile_overlap,
            min_level,
            max_level,
            overview_level: overview_level
                .unwrap_or(max_single_tile_level)
                .clamp(min_level, max_level),
            norm_height: height as f64 / width as f64,
            aspect_ratio: width as f64 / height as f64,
            sharpen: max_level as f64 - ideal_level,
        })
    }

    pub fn dimensions(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }

    /// Scaling factor of a level relative to the top level, e.g. 0.25 two levels down
    pub fn level_scale(&self, level: u32) -> f64 {
        2f64.powi(level as i32 - self.max_level as i32)
    }

    /// Tile counts `(columns, rows)` at a level
    pub fn num_tiles(&self, level: u32) -> (u32, u32) {
        let scale = self.level_scale(level);
        (
            (scale * self.width as f64 / self.tile_width as f64).ceil() as u32,
            (scale * self.height as f64 / self.tile_height as f64).ceil() as u32,
        )
    }

    /// Full pixel size of a level
    pub fn level_dimensions(&self, level: u32) -> Size {
        self.dimensions().times(self.level_scale(level)).map(f64::ceil)
    }

    /// Reciprocal of a level's pixel size
    pub fn pixel_ratio(&self, level: u32) -> Size {
        self.level_dimensions(level).map(|v| 1.0 / v)
    }

    /// Column and row of the tile under `point` (normalised to width 1).
    ///
    /// With `favor_upper_left`, a point exactly on a seam picks the tile to its
    /// left/top. The result may lie outside the level's grid.
    pub fn tile_at_point(&self, level: u32, point: Point, favor_upper_left: bool) -> (i64, i64) {
        // isotropic coordinates, so both axes scale by the level width
        let mut pixel = point.multiply(self.level_dimensions(level).width);
        if favor_upper_left {
            if pixel.x.fract() == 0.0 {
                pixel.x -= 1.0;
            }
            if pixel.y.fract() == 0.0 {
                pixel.y -= 1.0;
            }
        }
        (
            (pixel.x / self.tile_width as f64).floor() as i64,
            (pixel.y / self.tile_height as f64).floor() as i64,
        )
    }

    /// Tiles needed to cover `rect`, clamped to the level's grid
    pub fn tiles_in_rect(&self, level: u32, rect: &Rect) -> Option<TileRange> {
        let (left, top) = self.tile_at_point(level, rect.top_left(), false);
        let (right, bottom) = self.tile_at_point(level, rect.bottom_right(), true);
        let (cols, rows) = self.num_tiles(level);

        let left = left.max(0);
        let top = top.max(0);
        let right = right.min(cols as i64 - 1);
        let bottom = bottom.min(rows as i64 - 1);
        if right < left || bottom < top {
            return None;
        }
        Some(TileRange::new(left as u32, top as u32, right as u32, bottom as u32))
    }

    /// Content-space bounds of a tile, overlap borders included
    pub fn tile_bounds(&self, address: TileAddress) -> Rect {
        let dimensions = self.level_dimensions(address.level);
        let pixel_scale_x = 1.0 / dimensions.width;
        let pixel_scale_y = self.norm_height / dimensions.height;
        let overlap = self.tile_overlap as f64;
        let (tile_width, tile_height) = (self.tile_width as f64, self.tile_height as f64);

        // top and left edges carry no overlap data
        let x = if address.col == 0 {
            0.0
        } else {
            tile_width * address.col as f64 - overlap
        };
        let y = if address.row == 0 {
            0.0
        } else {
            tile_height * address.row as f64 - overlap
        };
        let leading_x = if address.col == 0 { 1.0 } else { 2.0 };
        let leading_y = if address.row == 0 { 1.0 } else { 2.0 };

        Rect::new(
            pixel_scale_x * x,
            pixel_scale_y * y,
            pixel_scale_x * (tile_width + leading_x * overlap).min(dimensions.width - x),
            pixel_scale_y * (tile_height + leading_y * overlap).min(dimensions.height - y),
        )
    }

    /// Fails unless `address` names a cell of this pyramid
    pub fn check_address(&self, address: TileAddress) -> Result<()> {
        if address.level < self.min_level || address.level > self.max_level {
            return Err(Error::InvalidAddress {
                address,
                reason: format!(
                    "level outside {}..={}",
                    self.min_level, self.max_level
                ),
            });
        }
        let (cols, rows) = self.num_tiles(address.level);
        if address.col >= cols || address.row >= rows {
            return Err(Error::InvalidAddress {
                address,
                reason: format!("level grid is {}x{}", cols, rows),
            });
        }
        Ok(())
    }
}

/// Addressing protocol shared by every pyramid variant
pub trait TileSource {
    /// Tiling math for this source's own levels
    fn geometry(&self) -> &PyramidGeometry;

    /// URL to fetch and the crop within the fetched image
    fn tile_info(&self, address: TileAddress) -> Result<TileInfo>;

    fn level_exists(&self, level: u32) -> bool {
        let geometry = self.geometry();
        level >= geometry.min_level && level <= geometry.max_level
    }

    fn tile_exists(&self, _address: TileAddress) -> bool {
        true
    }

    /// Bounds in content coordinates (width 1, height `norm_height`)
    fn tile_bounds(&self, address: TileAddress) -> Rect {
        self.geometry().tile_bounds(address)
    }

    fn num_tiles(&self, level: u32) -> (u32, u32) {
        self.geometry().num_tiles(level)
    }

    fn tiles_in_rect(&self, level: u32, rect: &Rect) -> Option<TileRange> {
        self.geometry().tiles_in_rect(level, rect)
    }

    /// Column and row of the tile directly beneath `address` at `lower_level`
    /// (default `level - 1`), or `None` when there is nothing below.
    fn tile_below(&self, address: TileAddress, lower_level: Option<u32>) -> Option<(u32, u32)> {
        let lower_level = match lower_level {
            Some(level) => level,
            None => address.level.checked_sub(1)?,
        };
        let geometry = self.geometry();
        if lower_level >= address.level
            || lower_level < geometry.min_level
            || !self.level_exists(lower_level)
        {
            return None;
        }
        let ratio = geometry.level_scale(lower_level) / geometry.level_scale(address.level);
        Some((
            (address.col as f64 * ratio).floor() as u32,
            (address.row as f64 * ratio).floor() as u32,
        ))
    }

    /// Tiles at `upper_level` (default `level + 1`) that together cover `address`.
    ///
    /// This is a coverage helper: it may differ from `tiles_in_rect` over the
    /// tile's bounds, because those bounds include overlap borders. `None`
    /// means the covering set is unknown and must not be speculated about.
    fn tiles_above(&self, address: TileAddress, upper_level: Option<u32>) -> Option<TileRange> {
        let upper_level = upper_level.unwrap_or(address.level + 1);
        let geometry = self.geometry();
        if upper_level <= address.level
            || upper_level > geometry.max_level
            || !self.level_exists(upper_level)
        {
            return None;
        }

        let (cols, rows) = self.num_tiles(upper_level);
        let ratio = 1u32 << (upper_level - address.level).min(31);
        let left = address.col.saturating_mul(ratio);
        let top = address.row.saturating_mul(ratio);
        if left >= cols || top >= rows {
            return None;
        }

        // clamp to the image boundary
        Some(TileRange::new(
            left,
            top,
            left.saturating_add(ratio - 1).min(cols - 1),
            top.saturating_add(ratio - 1).min(rows - 1),
        ))
    }

    /// How many tiles above must be drawn before `address` is covered; `None` is unbounded
    fn num_tiles_above(&self, address: TileAddress, upper_level: Option<u32>) -> Option<u32> {
        self.tiles_above(address, upper_level).map(|range| range.count())
    }
}

/// Any concrete pyramid, chosen once when the content is described
#[derive(Debug)]
pub enum Source {
    Dense(DenseSource),
    CollectionItem(CollectionItemSource),
}

macro_rules! dispatch {
    ($self:ident, $source:ident => $body:expr) => {
        match $self {
            Source::Dense($source) => $body,
            Source::CollectionItem($source) => $body,
        }
    };
}

impl Source {
    pub fn as_dense(&self) -> Option<&DenseSource> {
        match self {
            Source::Dense(source) => Some(source),
            Source::CollectionItem(_) => None,
        }
    }

    pub fn as_collection_item(&self) -> Option<&CollectionItemSource> {
        match self {
            Source::CollectionItem(source) => Some(source),
            Source::Dense(_) => None,
        }
    }

    pub fn as_collection_item_mut(&mut self) -> Option<&mut CollectionItemSource> {
        match self {
            Source::CollectionItem(source) => Some(source),
            Source::Dense(_) => None,
        }
    }
}

impl TileSource for Source {
    fn geometry(&self) -> &PyramidGeometry {
        dispatch!(self, source => source.geometry())
    }

    fn tile_info(&self, address: TileAddress) -> Result<TileInfo> {
        dispatch!(self, source => source.tile_info(address))
    }

    fn level_exists(&self, level: u32) -> bool {
        dispatch!(self, source => source.level_exists(level))
    }

    fn tile_exists(&self, address: TileAddress) -> bool {
        dispatch!(self, source => source.tile_exists(address))
    }

    fn tile_bounds(&self, address: TileAddress) -> Rect {
        dispatch!(self, source => source.tile_bounds(address))
    }

    fn num_tiles(&self, level: u32) -> (u32, u32) {
        dispatch!(self, source => source.num_tiles(level))
    }

    fn tiles_in_rect(&self, level: u32, rect: &Rect) -> Option<TileRange> {
        dispatch!(self, source => source.tiles_in_rect(level, rect))
    }

    fn tile_below(&self, address: TileAddress, lower_level: Option<u32>) -> Option<(u32, u32)> {
        dispatch!(self, source => source.tile_below(address, lower_level))
    }

    fn tiles_above(&self, address: TileAddress, upper_level: Option<u32>) -> Option<TileRange> {
        dispatch!(self, source => source.tiles_above(address, upper_level))
    }

    fn num_tiles_above(&self, address: TileAddress, upper_level: Option<u32>) -> Option<u32> {
        dispatch!(self, source => source.num_tiles_above(address, upper_level))
    }
}

impl From<DenseSource> for Source {
    fn from(source: DenseSource) -> Self {
        Source::Dense(source)
    }
}

impl From<CollectionItemSource> for Source {
    fn from(source: CollectionItemSource) -> Self {
        Source::CollectionItem(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> PyramidGeometry {
        PyramidGeometry::new(1200, 800, 256).unwrap()
    }

    #[test]
    fn test_derived_levels() {
        let g = geometry();
        assert_eq!(g.max_level, 11);
        assert_eq!(g.min_level, 0);
        assert_eq!(g.overview_level, 8);
        assert!((g.norm_height - 800.0 / 1200.0).abs() < 1e-12);
        assert!(g.sharpen > 0.0 && g.sharpen < 1.0);
    }

    #[test]
    fn test_level_scale_and_counts() {
        let g = geometry();
        assert_eq!(g.level_scale(11), 1.0);
        assert_eq!(g.level_scale(9), 0.25);
        assert_eq!(g.level_dimensions(9), Size::new(300.0, 200.0));
        assert_eq!(g.num_tiles(11), (5, 4));
        assert_eq!(g.num_tiles(10), (3, 2));
        assert_eq!(g.num_tiles(0), (1, 1));
        assert_eq!(g.level_dimensions(0), Size::new(1.0, 1.0));
    }

    #[test]
    fn test_tile_bounds_clip_at_edges() {
        let g = geometry();
        // level 10 is 600x400: the last column is 600 - 512 = 88px wide
        let bounds = g.tile_bounds(TileAddress::new(10, 2, 1));
        assert!((bounds.x - 512.0 / 600.0).abs() < 1e-12);
        assert!((bounds.width - 88.0 / 600.0).abs() < 1e-12);
        assert!((bounds.y - (256.0 / 400.0) * g.norm_height).abs() < 1e-12);
        assert!((bounds.bottom() - g.norm_height).abs() < 1e-12);
    }

    #[test]
    fn test_tile_bounds_with_overlap() {
        let g = PyramidGeometry::with_options(1024, 1024, 254, 254, 1, 0, None).unwrap();
        let first = g.tile_bounds(TileAddress::new(10, 0, 0));
        let second = g.tile_bounds(TileAddress::new(10, 1, 0));
        assert!((first.width - 255.0 / 1024.0).abs() < 1e-12);
        assert!((second.x - 253.0 / 1024.0).abs() < 1e-12);
        assert!((second.width - 256.0 / 1024.0).abs() < 1e-12);
    }

    #[test]
    fn test_tiles_in_rect_is_clamped() {
        let g = geometry();
        let everything = Rect::new(-1.0, -1.0, 3.0, 3.0);
        assert_eq!(g.tiles_in_rect(10, &everything), Some(TileRange::new(0, 0, 2, 1)));

        // a seam on the far edge picks the tile before it
        let square = PyramidGeometry::new(1024, 1024, 256).unwrap();
        let half = Rect::new(0.0, 0.0, 0.5, 0.25);
        assert_eq!(
            square.tiles_in_rect(10, &half),
            Some(TileRange::new(0, 0, 1, 0))
        );

        let outside = Rect::new(2.0, 2.0, 1.0, 1.0);
        assert_eq!(g.tiles_in_rect(10, &outside), None);
    }

    #[test]
    fn test_check_address() {
        let g = geometry();
        assert!(g.check_address(TileAddress::new(10, 2, 1)).is_ok());
        assert!(g.check_address(TileAddress::new(10, 3, 0)).is_err());
        assert!(g.check_address(TileAddress::new(12, 0, 0)).is_err());
    }

    #[test]
    fn test_invalid_geometry() {
        assert!(matches!(
            PyramidGeometry::new(0, 10, 256),
            Err(Error::InvalidGeometry(_))
        ));
        assert!(PyramidGeometry::new(10, 10, 0).is_err());
    }
}
