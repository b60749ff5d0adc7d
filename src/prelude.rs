//! Prelude module for common deepzoom types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use deepzoom::prelude::*;`

pub use crate::core::{
    bounds::Rect,
    config::{BackendPreference, EngineOptions, RenderProfile, SpringConfig},
    geo::{Point, Size},
};

pub use crate::tiles::{
    CollectionItem, CollectionItemDescriptor, CollectionItemSource, DenseDescriptor, DenseSource,
    DisplayRect, ExpansionRequest, ExpansionTicket, ManifestFetcher, PyramidGeometry, Source,
    Tile, TileAddress, TileCache, TileInfo, TileRange, TileSource,
};

pub use crate::rendering::{
    CanvasDrawer, Drawer, DrawerKind, ElementDrawer, LevelHandle, NullDrawer, RenderBackend,
    RenderCapabilities, TileImage, TileView,
};

pub use crate::animation::{
    blend_in_progress, fade_out_progress, FrameTimer, Spring, TimerToken,
};

pub use crate::{DeepZoomError, Error, Result};
