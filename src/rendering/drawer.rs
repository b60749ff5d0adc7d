//! Render backends
//!
//! A drawer turns loaded tiles into something visible. Every pyramid level gets
//! its own layer so levels can fade independently; layers are stacked back to
//! front and positioned in content coordinates. Which backend runs is decided
//! once per viewer from what the host can do.

use crate::{
    core::{config::BackendPreference, geo::Size},
    rendering::{canvas::CanvasDrawer, element::ElementDrawer, element::NodeId, image::TileImage},
    tiles::tile::Tile,
    Error, Result,
};
use std::sync::Arc;

/// Opaque handle to one level's layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LevelHandle(pub(crate) u64);

/// What a drawer keeps on a tile once it has been drawn
#[derive(Debug, Clone)]
pub enum TileView {
    /// Pixels composited into a raster layer
    Image(Arc<TileImage>),
    /// A node in the element tree
    Element(NodeId),
}

/// What the host environment supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderCapabilities {
    pub raster: bool,
    pub elements: bool,
}

impl RenderCapabilities {
    pub fn all() -> Self {
        Self {
            raster: true,
            elements: true,
        }
    }

    pub fn none() -> Self {
        Self {
            raster: false,
            elements: false,
        }
    }
}

impl Default for RenderCapabilities {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawerKind {
    Canvas,
    Element,
    Null,
}

/// Operations every backend provides
pub trait RenderBackend {
    /// Draws a loaded tile into a level at the tile's current opacity.
    ///
    /// Returns false, with a warning, when the image is incomplete or the
    /// level is gone; the caller retries on a later frame.
    fn draw_tile(&mut self, image: &Arc<TileImage>, tile: &mut Tile, level: LevelHandle) -> bool;

    /// Creates a layer in front of all others
    fn add_level_on_top(&mut self) -> LevelHandle;

    /// Creates a layer just behind `existing`, or on top if `existing` is gone
    fn add_level_behind(&mut self, existing: LevelHandle) -> LevelHandle;

    fn remove_level(&mut self, level: LevelHandle);

    /// Raises an already drawn tile to `opacity`
    fn update_blend(&mut self, tile: &Tile, level: LevelHandle, opacity: f32);

    /// Sets a whole layer's opacity
    fn update_fade(&mut self, level: LevelHandle, opacity: f32);

    /// Forgets a tile's drawn state
    fn discard_tile(&mut self, tile: &mut Tile, level: LevelHandle);

    /// Resizes a layer to fit `tiles` at a level of the given pixel size
    fn set_level_dimensions(&mut self, level: LevelHandle, dimensions: Size, tiles: &[&Tile]);
}

/// Backend for hosts that render nothing; useful headless and in tests
#[derive(Debug, Default)]
pub struct NullDrawer {
    next_level: u64,
}

impl NullDrawer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderBackend for NullDrawer {
    fn draw_tile(&mut self, image: &Arc<TileImage>, tile: &mut Tile, _level: LevelHandle) -> bool {
        // keep a placeholder so callers can treat the tile as drawn
        tile.view = Some(TileView::Image(Arc::clone(image)));
        true
    }

    fn add_level_on_top(&mut self) -> LevelHandle {
        self.next_level += 1;
        LevelHandle(self.next_level)
    }

    fn add_level_behind(&mut self, _existing: LevelHandle) -> LevelHandle {
        self.add_level_on_top()
    }

    fn remove_level(&mut self, _level: LevelHandle) {}

    fn update_blend(&mut self, _tile: &Tile, _level: LevelHandle, _opacity: f32) {}

    fn update_fade(&mut self, _level: LevelHandle, _opacity: f32) {}

    fn discard_tile(&mut self, tile: &mut Tile, _level: LevelHandle) {
        tile.view = None;
    }

    fn set_level_dimensions(&mut self, _level: LevelHandle, _dimensions: Size, _tiles: &[&Tile]) {}
}

/// The backend chosen for a viewer
#[derive(Debug)]
pub enum Drawer {
    Canvas(CanvasDrawer),
    Element(ElementDrawer),
    Null(NullDrawer),
}

macro_rules! dispatch {
    ($self:ident, $drawer:ident => $body:expr) => {
        match $self {
            Drawer::Canvas($drawer) => $body,
            Drawer::Element($drawer) => $body,
            Drawer::Null($drawer) => $body,
        }
    };
}

impl Drawer {
    /// Picks the raster backend when available, else the element tree
    pub fn select(capabilities: RenderCapabilities, norm_height: f64) -> Result<Self> {
        Self::from_preference(BackendPreference::Auto, capabilities, norm_height)
    }

    pub fn from_preference(
        preference: BackendPreference,
        capabilities: RenderCapabilities,
        norm_height: f64,
    ) -> Result<Self> {
        let drawer = match preference {
            BackendPreference::Null => Drawer::null(),
            BackendPreference::Canvas if capabilities.raster => {
                Drawer::Canvas(CanvasDrawer::new(norm_height))
            }
            BackendPreference::Element if capabilities.elements => {
                Drawer::Element(ElementDrawer::new(norm_height))
            }
            _ if capabilities.raster => Drawer::Canvas(CanvasDrawer::new(norm_height)),
            _ if capabilities.elements => Drawer::Element(ElementDrawer::new(norm_height)),
            _ => {
                log::error!("no render backend available");
                return Err(Error::NoRenderBackend);
            }
        };
        if preference != BackendPreference::Auto && drawer.kind() != preference_kind(preference) {
            log::warn!(
                "{:?} backend unavailable, falling back to {:?}",
                preference,
                drawer.kind()
            );
        }
        log::debug!("selected {:?} drawer", drawer.kind());
        Ok(drawer)
    }

    pub fn null() -> Self {
        Drawer::Null(NullDrawer::new())
    }

    pub fn kind(&self) -> DrawerKind {
        match self {
            Drawer::Canvas(_) => DrawerKind::Canvas,
            Drawer::Element(_) => DrawerKind::Element,
            Drawer::Null(_) => DrawerKind::Null,
        }
    }

    pub fn as_canvas(&self) -> Option<&CanvasDrawer> {
        match self {
            Drawer::Canvas(drawer) => Some(drawer),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&ElementDrawer> {
        match self {
            Drawer::Element(drawer) => Some(drawer),
            _ => None,
        }
    }
}

fn preference_kind(preference: BackendPreference) -> DrawerKind {
    match preference {
        BackendPreference::Element => DrawerKind::Element,
        BackendPreference::Null => DrawerKind::Null,
        BackendPreference::Canvas | BackendPreference::Auto => DrawerKind::Canvas,
    }
}

impl RenderBackend for Drawer {
    fn draw_tile(&mut self, image: &Arc<TileImage>, tile: &mut Tile, level: LevelHandle) -> bool {
        dispatch!(self, drawer => drawer.draw_tile(image, tile, level))
    }

    fn add_level_on_top(&mut self) -> LevelHandle {
        dispatch!(self, drawer => drawer.add_level_on_top())
    }

    fn add_level_behind(&mut self, existing: LevelHandle) -> LevelHandle {
        dispatch!(self, drawer => drawer.add_level_behind(existing))
    }

    fn remove_level(&mut self, level: LevelHandle) {
        dispatch!(self, drawer => drawer.remove_level(level))
    }

    fn update_blend(&mut self, tile: &Tile, level: LevelHandle, opacity: f32) {
        dispatch!(self, drawer => drawer.update_blend(tile, level, opacity))
    }

    fn update_fade(&mut self, level: LevelHandle, opacity: f32) {
        dispatch!(self, drawer => drawer.update_fade(level, opacity))
    }

    fn discard_tile(&mut self, tile: &mut Tile, level: LevelHandle) {
        dispatch!(self, drawer => drawer.discard_tile(tile, level))
    }

    fn set_level_dimensions(&mut self, level: LevelHandle, dimensions: Size, tiles: &[&Tile]) {
        dispatch!(self, drawer => drawer.set_level_dimensions(level, dimensions, tiles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::{address::TileAddress, dense::DenseSource};

    #[test]
    fn test_select_prefers_raster() {
        let drawer = Drawer::select(RenderCapabilities::all(), 0.5).unwrap();
        assert_eq!(drawer.kind(), DrawerKind::Canvas);

        let elements_only = RenderCapabilities {
            raster: false,
            elements: true,
        };
        let drawer = Drawer::select(elements_only, 0.5).unwrap();
        assert_eq!(drawer.kind(), DrawerKind::Element);
    }

    #[test]
    fn test_select_without_backend_fails() {
        assert!(matches!(
            Drawer::select(RenderCapabilities::none(), 0.5),
            Err(Error::NoRenderBackend)
        ));
    }

    #[test]
    fn test_preference() {
        let drawer =
            Drawer::from_preference(BackendPreference::Element, RenderCapabilities::all(), 1.0).unwrap();
        assert_eq!(drawer.kind(), DrawerKind::Element);

        let drawer =
            Drawer::from_preference(BackendPreference::Null, RenderCapabilities::none(), 1.0).unwrap();
        assert_eq!(drawer.kind(), DrawerKind::Null);

        // unavailable preference falls back
        let raster_only = RenderCapabilities {
            raster: true,
            elements: false,
        };
        let drawer =
            Drawer::from_preference(BackendPreference::Element, raster_only, 1.0).unwrap();
        assert_eq!(drawer.kind(), DrawerKind::Canvas);
    }

    #[test]
    fn test_null_drawer_sets_placeholder_view() {
        let source = DenseSource::new(256, 256, 256, 0, "t/", "png").unwrap();
        let mut tile = Tile::with_source(TileAddress::new(8, 0, 0), &source).unwrap();
        let mut drawer = Drawer::null();
        let level = drawer.add_level_on_top();
        let behind = drawer.add_level_behind(level);
        assert_ne!(level, behind);

        let image = Arc::new(TileImage::pending(tile.url()));
        assert!(drawer.draw_tile(&image, &mut tile, level));
        assert!(tile.has_view());
        drawer.discard_tile(&mut tile, level);
        assert!(!tile.has_view());
    }
}
