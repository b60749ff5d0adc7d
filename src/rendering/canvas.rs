//! Raster backend
//!
//! Each level owns an RGBA surface sized to the tiles it currently shows.
//! Tiles are composited into it with source-over blending; blending a tile in
//! over several frames paints it repeatedly with the incremental alpha that
//! takes it from its previous opacity to its new one.

use crate::{
    core::{bounds::Rect, geo::Size},
    rendering::{
        drawer::{LevelHandle, RenderBackend, TileView},
        image::TileImage,
    },
    tiles::tile::Tile,
};
use image::{
    imageops::{self, FilterType},
    Rgba, RgbaImage,
};
use std::sync::Arc;

/// Where a layer sits within its container, in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    fn from_bounds(bounds: &Rect, norm_height: f64) -> Self {
        Self {
            left: bounds.x * 100.0,
            top: bounds.y / norm_height * 100.0,
            width: bounds.width * 100.0,
            height: bounds.height / norm_height * 100.0,
        }
    }
}

/// One level's raster layer
#[derive(Debug, Clone)]
pub struct CanvasLevel {
    handle: LevelHandle,
    surface: RgbaImage,
    normalized_bounds: Rect,
    placement: Placement,
    opacity: f32,
}

impl CanvasLevel {
    fn new(handle: LevelHandle, norm_height: f64) -> Self {
        let normalized_bounds = Rect::new(0.0, 0.0, 1.0, norm_height);
        Self {
            handle,
            surface: RgbaImage::new(1, 1),
            normalized_bounds,
            placement: Placement::from_bounds(&normalized_bounds, norm_height),
            opacity: 1.0,
        }
    }

    pub fn handle(&self) -> LevelHandle {
        self.handle
    }

    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    /// Content-space area the surface covers
    pub fn normalized_bounds(&self) -> Rect {
        self.normalized_bounds
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    fn paint(&mut self, pixels: &RgbaImage, tile: &Tile, alpha: f32) {
        let bounds = tile.bounds();
        let normalized = self.normalized_bounds;
        let width_ratio = self.surface.width() as f64 / normalized.width;
        let height_ratio = self.surface.height() as f64 / normalized.height;
        let dest = Rect::new(
            (bounds.x - normalized.x) * width_ratio,
            (bounds.y - normalized.y) * height_ratio,
            bounds.width * width_ratio,
            bounds.height * height_ratio,
        );
        composite(&mut self.surface, pixels, tile.crop(), dest, alpha);
    }
}

/// Alpha that raises a tile painted at `previous` opacity to `target`
pub fn incremental_alpha(target: f32, previous: f32) -> f32 {
    if target >= 1.0 {
        return 1.0;
    }
    if previous >= 1.0 {
        return 0.0;
    }
    ((target - previous) / (1.0 - previous)).clamp(0.0, 1.0)
}

/// Paints `source` (optionally cropped) into `dest` on `target`
fn composite(target: &mut RgbaImage, source: &RgbaImage, crop: Option<Rect>, dest: Rect, alpha: f32) {
    if alpha <= 0.0 || source.width() == 0 || source.height() == 0 {
        return;
    }

    let (src_x, src_y, src_w, src_h) = match crop {
        Some(crop) => {
            let x = (crop.x.floor().max(0.0) as u32).min(source.width());
            let y = (crop.y.floor().max(0.0) as u32).min(source.height());
            (
                x,
                y,
                (crop.width.round().max(1.0) as u32).min(source.width() - x),
                (crop.height.round().max(1.0) as u32).min(source.height() - y),
            )
        }
        None => (0, 0, source.width(), source.height()),
    };
    if src_w == 0 || src_h == 0 {
        return;
    }

    let dest_w = dest.width.round().max(1.0) as u32;
    let dest_h = dest.height.round().max(1.0) as u32;
    let region = imageops::crop_imm(source, src_x, src_y, src_w, src_h).to_image();
    let scaled = if (dest_w, dest_h) == (src_w, src_h) {
        region
    } else {
        imageops::resize(&region, dest_w, dest_h, FilterType::Triangle)
    };

    let origin_x = dest.x.round() as i64;
    let origin_y = dest.y.round() as i64;
    let (width, height) = (target.width() as i64, target.height() as i64);
    for (px, py, pixel) in scaled.enumerate_pixels() {
        let x = origin_x + px as i64;
        let y = origin_y + py as i64;
        if x < 0 || y < 0 || x >= width || y >= height {
            continue;
        }
        source_over(target.get_pixel_mut(x as u32, y as u32), *pixel, alpha);
    }
}

fn source_over(dst: &mut Rgba<u8>, src: Rgba<u8>, alpha: f32) {
    let src_a = src[3] as f32 / 255.0 * alpha;
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    for channel in 0..3 {
        let value =
            (src[channel] as f32 * src_a + dst[channel] as f32 * dst_a * (1.0 - src_a)) / out_a;
        dst[channel] = value.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Raster drawer with one surface per level, stacked back to front
#[derive(Debug)]
pub struct CanvasDrawer {
    norm_height: f64,
    levels: Vec<CanvasLevel>,
    next_handle: u64,
}

impl CanvasDrawer {
    pub fn new(norm_height: f64) -> Self {
        Self {
            norm_height,
            levels: Vec::new(),
            next_handle: 0,
        }
    }

    pub fn norm_height(&self) -> f64 {
        self.norm_height
    }

    pub fn level(&self, handle: LevelHandle) -> Option<&CanvasLevel> {
        self.levels.iter().find(|level| level.handle == handle)
    }

    /// Level handles, back to front
    pub fn level_order(&self) -> Vec<LevelHandle> {
        self.levels.iter().map(|level| level.handle).collect()
    }

    /// Flattens every layer into a `width` x `height` frame
    pub fn compose(&self, width: u32, height: u32) -> RgbaImage {
        let mut frame = RgbaImage::new(width, height);
        for level in &self.levels {
            let placement = level.placement;
            let dest = Rect::new(
                placement.left / 100.0 * width as f64,
                placement.top / 100.0 * height as f64,
                placement.width / 100.0 * width as f64,
                placement.height / 100.0 * height as f64,
            );
            composite(&mut frame, &level.surface, None, dest, level.opacity);
        }
        frame
    }

    fn position(&self, handle: LevelHandle) -> Option<usize> {
        self.levels.iter().position(|level| level.handle == handle)
    }

    fn new_level(&mut self) -> CanvasLevel {
        self.next_handle += 1;
        CanvasLevel::new(LevelHandle(self.next_handle), self.norm_height)
    }
}

impl RenderBackend for CanvasDrawer {
    fn draw_tile(&mut self, image: &Arc<TileImage>, tile: &mut Tile, level: LevelHandle) -> bool {
        let Some(pixels) = image.pixels() else {
            log::warn!("attempting to draw incomplete image {}", image.src());
            return false;
        };
        let Some(index) = self.position(level) else {
            log::warn!("attempting to draw tile {} to a removed level", tile.address());
            return false;
        };

        self.levels[index].paint(pixels, tile, incremental_alpha(tile.opacity(), 0.0));
        tile.view = Some(TileView::Image(Arc::clone(image)));
        true
    }

    fn add_level_on_top(&mut self) -> LevelHandle {
        let level = self.new_level();
        let handle = level.handle;
        self.levels.push(level);
        handle
    }

    fn add_level_behind(&mut self, existing: LevelHandle) -> LevelHandle {
        let level = self.new_level();
        let handle = level.handle;
        match self.position(existing) {
            Some(index) => self.levels.insert(index, level),
            None => {
                log::warn!("level {:?} is gone, adding new level on top", existing);
                self.levels.push(level);
            }
        }
        handle
    }

    fn remove_level(&mut self, level: LevelHandle) {
        match self.position(level) {
            Some(index) => {
                self.levels.remove(index);
            }
            None => log::warn!("attempting to remove unknown level {:?}", level),
        }
    }

    fn update_blend(&mut self, tile: &Tile, level: LevelHandle, opacity: f32) {
        let Some(TileView::Image(image)) = tile.view() else {
            log::warn!("blending tile {} that was never drawn", tile.address());
            return;
        };
        let Some(pixels) = image.pixels() else {
            return;
        };
        let Some(index) = self.position(level) else {
            log::warn!("blending tile {} on a removed level", tile.address());
            return;
        };
        self.levels[index].paint(pixels, tile, incremental_alpha(opacity, tile.opacity()));
    }

    fn update_fade(&mut self, level: LevelHandle, opacity: f32) {
        match self.position(level) {
            Some(index) => self.levels[index].opacity = opacity.clamp(0.0, 1.0),
            None => log::warn!("fading unknown level {:?}", level),
        }
    }

    fn discard_tile(&mut self, tile: &mut Tile, _level: LevelHandle) {
        // pixels stay on the surface until the next resize
        tile.view = None;
    }

    fn set_level_dimensions(&mut self, level: LevelHandle, dimensions: Size, tiles: &[&Tile]) {
        let Some(bounds) = tiles.iter().map(|tile| tile.bounds()).reduce(|a, b| a.union(&b)) else {
            log::warn!("resizing level {:?} without tiles", level);
            return;
        };
        let Some(index) = self.position(level) else {
            log::warn!("resizing unknown level {:?}", level);
            return;
        };

        // content coordinates are isotropic, so both axes scale by the width
        let full = bounds.scale(dimensions.width);
        let canvas_level = &mut self.levels[index];
        canvas_level.surface = RgbaImage::new(
            full.width.round().max(1.0) as u32,
            full.height.round().max(1.0) as u32,
        );
        canvas_level.normalized_bounds = bounds;
        canvas_level.placement = Placement::from_bounds(&bounds, self.norm_height);

        // resizing cleared the surface
        for tile in tiles {
            if let Some(TileView::Image(image)) = tile.view() {
                if let Some(pixels) = image.pixels() {
                    canvas_level.paint(pixels, tile, incremental_alpha(tile.opacity(), 0.0));
                }
            }
        }
    }
}
