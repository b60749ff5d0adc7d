//! Collection items: thumbnails packed into shared collection tiles
//!
//! Low levels of a collection pack many items into each tile, laid out along a
//! Morton curve. [`CollectionItem`] addresses one item within those tiles.
//! [`CollectionItemSource`] wraps it and, once expanded, forwards every level
//! above the collection's range to the item's own dense pyramid.

use crate::{
    core::bounds::Rect,
    tiles::{
        address::{TileAddress, TileInfo, TileRange},
        dense::DenseSource,
        expansion::{ExpansionDelivery, ExpansionRequest, ExpansionTicket},
        morton::reverse_morton,
        source::{PyramidGeometry, TileSource},
    },
    Error, Result,
};
use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};

/// Plain description of a collection item, as found in a parsed manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItemDescriptor {
    pub width: u32,
    pub height: u32,
    pub dzc_tile_size: u32,
    pub dzc_max_level: u32,
    #[serde(default)]
    pub dzc_item_id: u32,
    pub dzc_tiles_url: String,
    pub dzc_image_format: String,
    pub dzc_item_n: u64,
    #[serde(default)]
    pub dzc_expansion_url: Option<String>,
}

/// One item of a collection, addressed natively
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionItem {
    geometry: PyramidGeometry,
    tile_size: u32,
    max_level: u32,
    item_id: u32,
    tiles_url: String,
    image_format: String,
    item_n: u64,
    /// Collection tile column and row of the item, unswizzled from `item_n`.
    item_col: u32,
    item_row: u32,
    expansion_url: Option<String>,
}

impl CollectionItem {
    pub fn from_descriptor(descriptor: CollectionItemDescriptor) -> Result<Self> {
        let geometry =
            PyramidGeometry::new(descriptor.width, descriptor.height, descriptor.dzc_tile_size)?;
        // collection mortons interleave the axes the other way around
        let (morton_x, morton_y) = reverse_morton(descriptor.dzc_item_n);
        Ok(Self {
            geometry,
            tile_size: descriptor.dzc_tile_size,
            max_level: descriptor.dzc_max_level,
            item_id: descriptor.dzc_item_id,
            tiles_url: descriptor.dzc_tiles_url,
            image_format: descriptor.dzc_image_format,
            item_n: descriptor.dzc_item_n,
            item_col: morton_y,
            item_row: morton_x,
            expansion_url: descriptor.dzc_expansion_url,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let descriptor: CollectionItemDescriptor = serde_json::from_str(json)?;
        Self::from_descriptor(descriptor)
    }

    /// Highest level the collection serves for this item
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn item_id(&self) -> u32 {
        self.item_id
    }

    pub fn item_n(&self) -> u64 {
        self.item_n
    }

    pub fn expansion_url(&self) -> Option<&str> {
        self.expansion_url.as_deref()
    }
}

impl TileSource for CollectionItem {
    fn geometry(&self) -> &PyramidGeometry {
        &self.geometry
    }

    fn tile_info(&self, address: TileAddress) -> Result<TileInfo> {
        if address.level > self.max_level {
            return Err(Error::InvalidAddress {
                address,
                reason: format!("collection stops at level {}", self.max_level),
            });
        }
        if address.col != 0 || address.row != 0 {
            return Err(Error::InvalidAddress {
                address,
                reason: "collection items have one tile per level".to_string(),
            });
        }

        let level = address.level;
        let item_size = 2f64.powi(level as i32);
        let items_per_tile = self.tile_size as f64 / item_size;
        let scale = self.geometry.level_scale(level);
        let (item_col, item_row) = (self.item_col as f64, self.item_row as f64);
        let tile_col = (item_col / items_per_tile).floor();
        let tile_row = (item_row / items_per_tile).floor();

        let url = format!(
            "{}{}/{}_{}.{}",
            self.tiles_url, level, tile_col, tile_row, self.image_format
        );
        // thumbnails are never smaller than one pixel
        let crop = Rect::new(
            (item_col % items_per_tile) * item_size,
            (item_row % items_per_tile) * item_size,
            (scale * self.geometry.width as f64).floor().max(1.0),
            (scale * self.geometry.height as f64).floor().max(1.0),
        );
        Ok(TileInfo::new(url, Some(crop)))
    }

    fn level_exists(&self, level: u32) -> bool {
        level <= self.max_level
    }

    fn tiles_above(&self, address: TileAddress, upper_level: Option<u32>) -> Option<TileRange> {
        let upper_level = upper_level.unwrap_or(address.level + 1);
        if upper_level > self.max_level {
            // nothing is known about the levels past the collection
            return None;
        }
        Some(TileRange::single(0, 0))
    }
}

/// A collection item that can expand into its dense pyramid
#[derive(Debug)]
pub struct CollectionItemSource {
    item: CollectionItem,
    expansion: Option<DenseSource>,
    /// Generation of the outstanding expansion request.
    pending: Option<u64>,
    generation: u64,
    sender: Sender<ExpansionDelivery>,
    receiver: Receiver<ExpansionDelivery>,
}

impl CollectionItemSource {
    pub fn new(item: CollectionItem) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            item,
            expansion: None,
            pending: None,
            generation: 0,
            sender,
            receiver,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(CollectionItem::from_json(json)?))
    }

    pub fn item(&self) -> &CollectionItem {
        &self.item
    }

    pub fn expansion(&self) -> Option<&DenseSource> {
        self.expansion.as_ref()
    }

    pub fn is_expanded(&self) -> bool {
        self.expansion.is_some()
    }

    pub fn is_expansion_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Requests the dense pyramid behind this item.
    ///
    /// Returns `None` when already expanded, already pending, or when the item
    /// has no expansion to offer.
    pub fn expand(&mut self) -> Option<ExpansionRequest> {
        if self.expansion.is_some() || self.pending.is_some() {
            return None;
        }
        let url = self.item.expansion_url()?.to_string();

        self.generation += 1;
        self.pending = Some(self.generation);
        log::debug!("requesting expansion {} (generation {})", url, self.generation);
        Some(ExpansionRequest {
            url,
            ticket: ExpansionTicket::new(self.generation, self.sender.clone()),
        })
    }

    /// Attaches a delivered expansion, if any. Returns true when one was attached.
    pub fn poll_expansion(&mut self) -> bool {
        let mut attached = false;
        while let Ok(delivery) = self.receiver.try_recv() {
            if self.pending == Some(delivery.generation) {
                let mut source = delivery.source;
                source.set_collection_max_level(Some(self.item.max_level()));
                self.expansion = Some(source);
                self.pending = None;
                attached = true;
                log::debug!("attached expansion for item {}", self.item.item_id());
            } else {
                log::debug!(
                    "dropping stale expansion (generation {}) for item {}",
                    delivery.generation,
                    self.item.item_id()
                );
            }
        }
        attached
    }

    /// Detaches the expansion and forgets any outstanding request
    pub fn contract(&mut self) {
        self.expansion = None;
        self.pending = None;
        // deliveries still in flight now carry an old generation
        self.generation += 1;
    }

    fn forwarded(&self, level: u32) -> Option<&DenseSource> {
        if level > self.item.max_level() {
            self.expansion.as_ref()
        } else {
            None
        }
    }
}

impl TileSource for CollectionItemSource {
    fn geometry(&self) -> &PyramidGeometry {
        self.item.geometry()
    }

    fn tile_info(&self, address: TileAddress) -> Result<TileInfo> {
        match self.forwarded(address.level) {
            Some(dense) => dense.tile_info(address),
            None => self.item.tile_info(address),
        }
    }

    fn level_exists(&self, level: u32) -> bool {
        match self.forwarded(level) {
            Some(dense) => dense.level_exists(level),
            None => self.item.level_exists(level),
        }
    }

    fn tile_exists(&self, address: TileAddress) -> bool {
        match self.forwarded(address.level) {
            Some(dense) => dense.tile_exists(address),
            None => self.item.tile_exists(address),
        }
    }

    fn tile_bounds(&self, address: TileAddress) -> Rect {
        match self.forwarded(address.level) {
            Some(dense) => dense.tile_bounds(address),
            None => self.item.tile_bounds(address),
        }
    }

    fn num_tiles(&self, level: u32) -> (u32, u32) {
        match self.forwarded(level) {
            Some(dense) => dense.num_tiles(level),
            None => self.item.num_tiles(level),
        }
    }

    fn tiles_in_rect(&self, level: u32, rect: &Rect) -> Option<TileRange> {
        match self.forwarded(level) {
            Some(dense) => dense.tiles_in_rect(level, rect),
            None => self.item.tiles_in_rect(level, rect),
        }
    }

    fn tile_below(&self, address: TileAddress, lower_level: Option<u32>) -> Option<(u32, u32)> {
        match self.forwarded(address.level) {
            Some(dense) => dense.tile_below(address, lower_level),
            None => self.item.tile_below(address, lower_level),
        }
    }

    fn tiles_above(&self, address: TileAddress, upper_level: Option<u32>) -> Option<TileRange> {
        if let Some(dense) = self.forwarded(address.level) {
            return dense.tiles_above(address, upper_level);
        }
        let upper_level = upper_level.unwrap_or(address.level + 1);
        if upper_level > self.item.max_level() {
            // the whole first expansion level sits on top of the thumbnail
            let dense = self.expansion.as_ref()?;
            if !dense.level_exists(upper_level) {
                return None;
            }
            let (cols, rows) = dense.num_tiles(upper_level);
            if cols == 0 || rows == 0 {
                return None;
            }
            return Some(TileRange::new(0, 0, cols - 1, rows - 1));
        }
        self.item.tiles_above(address, Some(upper_level))
    }
}
