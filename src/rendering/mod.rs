pub mod canvas;
pub mod drawer;
pub mod element;
pub mod image;

// Re-export main types
pub use canvas::{CanvasDrawer, CanvasLevel, Placement};
pub use drawer::{
    Drawer, DrawerKind, LevelHandle, NullDrawer, RenderBackend, RenderCapabilities, TileView,
};
pub use element::{ElementDrawer, ElementTree, NodeId};
pub use image::TileImage;
