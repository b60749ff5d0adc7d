pub mod address;
pub mod cache;
pub mod collection;
pub mod dense;
pub mod expansion;
pub mod morton;
pub mod source;
pub mod tile;

// Re-exports for convenience
pub use address::{TileAddress, TileInfo, TileRange};
pub use cache::TileCache;
pub use collection::{CollectionItem, CollectionItemDescriptor, CollectionItemSource};
pub use dense::{DenseDescriptor, DenseSource, DisplayRect};
pub use expansion::{ExpansionRequest, ExpansionTicket, ManifestFetcher};
pub use source::{PyramidGeometry, Source, TileSource};
pub use tile::Tile;
