//! # Deepzoom
//!
//! A tile-pyramid rendering engine for streaming arbitrarily large images.
//!
//! Content is described by a [`TileSource`]: either a dense pyramid with one
//! file per tile, or an item of a collection whose thumbnails share tiles and
//! which can expand into its own dense pyramid. Loaded tiles track how much of
//! them is hidden by tiles above, so only visible work is drawn, and a
//! [`Drawer`] composites them level by level with blend-in and fade-out
//! animation driven by [`Spring`]s and the [`FrameTimer`].

pub mod animation;
pub mod core;
pub mod prelude;
pub mod rendering;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    bounds::Rect,
    config::{BackendPreference, EngineOptions, RenderProfile, SpringConfig},
    geo::{Point, Size},
};

pub use tiles::{
    CollectionItem, CollectionItemSource, DenseSource, ExpansionRequest, ManifestFetcher, Source,
    Tile, TileAddress, TileCache, TileInfo, TileRange, TileSource,
};

pub use rendering::{Drawer, RenderBackend, RenderCapabilities, TileImage};

pub use animation::{FrameTimer, Spring};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum DeepZoomError {
    #[error("Coverage broken at {address}: {reason}")]
    CoverageBroken { address: TileAddress, reason: String },

    #[error("Invalid tile address {address}: {reason}")]
    InvalidAddress { address: TileAddress, reason: String },

    #[error("Invalid pyramid geometry: {0}")]
    InvalidGeometry(String),

    #[error("No render backend available")]
    NoRenderBackend,

    #[error("Expansion unavailable: {0}")]
    ExpansionUnavailable(String),

    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error type alias for convenience
pub type Error = DeepZoomError;
