//! Dense pyramids: one image, one tile file per cell

use crate::{
    core::{bounds::Rect, constants::TILE_SIZE},
    tiles::{
        address::{TileAddress, TileInfo},
        source::{PyramidGeometry, TileSource},
    },
    Result,
};
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A region of a sparse image that has real pixels between two levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRect {
    /// Pixel rectangle at the image's full resolution
    pub rect: Rect,
    #[serde(default)]
    pub min_level: u32,
    #[serde(default = "DisplayRect::unbounded")]
    pub max_level: u32,
}

impl DisplayRect {
    pub fn new(rect: Rect, min_level: u32, max_level: u32) -> Self {
        Self {
            rect,
            min_level,
            max_level,
        }
    }

    fn unbounded() -> u32 {
        u32::MAX
    }
}

/// Plain description of a dense pyramid, as found in a parsed manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DenseDescriptor {
    pub width: u32,
    pub height: u32,
    #[serde(default = "DenseDescriptor::default_tile_size")]
    pub tile_size: u32,
    #[serde(default)]
    pub tile_overlap: u32,
    pub tiles_url: String,
    pub image_format: String,
    #[serde(default)]
    pub display_rects: Vec<DisplayRect>,
}

impl DenseDescriptor {
    fn default_tile_size() -> u32 {
        TILE_SIZE
    }
}

/// A DZI-style pyramid with tiles at `{tiles_url}{level}/{col}_{row}.{format}`
#[derive(Debug, Clone, PartialEq)]
pub struct DenseSource {
    geometry: PyramidGeometry,
    tiles_url: String,
    image_format: String,
    display_rects: Vec<DisplayRect>,
    /// Present only for sparse images (two or more display rects).
    rects_by_level: Option<FxHashMap<u32, Vec<DisplayRect>>>,
    /// Highest level served by a collection beneath this image, if any.
    collection_max_level: Option<u32>,
}

impl DenseSource {
    pub fn new(
        width: u32,
        height: u32,
        tile_size: u32,
        tile_overlap: u32,
        tiles_url: impl Into<String>,
        image_format: impl Into<String>,
    ) -> Result<Self> {
        let geometry =
            PyramidGeometry::with_options(width, height, tile_size, tile_size, tile_overlap, 0, None)?;
        Ok(Self {
            geometry,
            tiles_url: tiles_url.into(),
            image_format: image_format.into(),
            display_rects: Vec::new(),
            rects_by_level: None,
            collection_max_level: None,
        })
    }

    pub fn from_descriptor(descriptor: DenseDescriptor) -> Result<Self> {
        Ok(Self::new(
            descriptor.width,
            descriptor.height,
            descriptor.tile_size,
            descriptor.tile_overlap,
            descriptor.tiles_url,
            descriptor.image_format,
        )?
        .with_display_rects(descriptor.display_rects))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let descriptor: DenseDescriptor = serde_json::from_str(json)?;
        Self::from_descriptor(descriptor)
    }

    /// Marks which regions of the image exist at which levels
    pub fn with_display_rects(mut self, rects: Vec<DisplayRect>) -> Self {
        self.rects_by_level = if rects.len() > 1 {
            let mut by_level: FxHashMap<u32, Vec<DisplayRect>> = FxHashMap::default();
            for rect in &rects {
                let min_level = rect.min_level.max(self.geometry.min_level);
                let max_level = rect.max_level.min(self.geometry.max_level);
                for level in min_level..=max_level {
                    by_level.entry(level).or_default().push(rect.clone());
                }
            }
            Some(by_level)
        } else {
            None
        };
        self.display_rects = rects;
        self
    }

    pub fn tiles_url(&self) -> &str {
        &self.tiles_url
    }

    pub fn image_format(&self) -> &str {
        &self.image_format
    }

    pub fn display_rects(&self) -> &[DisplayRect] {
        &self.display_rects
    }

    pub fn is_sparse(&self) -> bool {
        self.rects_by_level.is_some()
    }

    pub fn collection_max_level(&self) -> Option<u32> {
        self.collection_max_level
    }

    /// Declares that levels up to `level` are served by a collection beneath this image
    pub fn set_collection_max_level(&mut self, level: Option<u32>) {
        self.collection_max_level = level;
    }
}

impl TileSource for DenseSource {
    fn geometry(&self) -> &PyramidGeometry {
        &self.geometry
    }

    fn tile_info(&self, address: TileAddress) -> Result<TileInfo> {
        self.geometry.check_address(address)?;
        Ok(TileInfo::uncropped(format!(
            "{}{}/{}_{}.{}",
            self.tiles_url, address.level, address.col, address.row, self.image_format
        )))
    }

    fn tile_exists(&self, address: TileAddress) -> bool {
        let Some(rects_by_level) = &self.rects_by_level else {
            return true;
        };
        let Some(rects) = rects_by_level.get(&address.level) else {
            return false;
        };

        let scale = self.geometry.level_scale(address.level);
        let tile_width = self.geometry.tile_width as f64;
        let tile_height = self.geometry.tile_height as f64;
        let (col, row) = (address.col as f64, address.row as f64);

        // overlap is ignored; this errs towards false positives
        rects.iter().any(|display| {
            let scaled = display.rect.scale(scale);
            let col_min = (scaled.x / tile_width).floor();
            let row_min = (scaled.y / tile_height).floor();
            let col_max = (scaled.right() / tile_width).ceil();
            let row_max = (scaled.bottom() / tile_height).ceil();
            col_min <= col && col < col_max && row_min <= row && row < row_max
        })
    }

    fn tile_below(&self, address: TileAddress, lower_level: Option<u32>) -> Option<(u32, u32)> {
        let lower_level = match lower_level {
            Some(level) => level,
            None => address.level.checked_sub(1)?,
        };

        // falling off the bottom of this image into its collection
        if let Some(collection_max_level) = self.collection_max_level {
            if lower_level <= collection_max_level {
                if lower_level < self.geometry.min_level || !self.level_exists(lower_level) {
                    return None;
                }
                return Some((0, 0));
            }
        }

        if lower_level >= address.level
            || lower_level < self.geometry.min_level
            || !self.level_exists(lower_level)
        {
            return None;
        }
        let ratio = self.geometry.level_scale(lower_level) / self.geometry.level_scale(address.level);
        Some((
            (address.col as f64 * ratio).floor() as u32,
            (address.row as f64 * ratio).floor() as u32,
        ))
    }
}
