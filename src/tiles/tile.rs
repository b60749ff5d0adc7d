use crate::{
    core::bounds::Rect,
    rendering::drawer::TileView,
    tiles::{address::TileAddress, source::TileSource},
    Error, Result,
};

/// One tile of a pyramid, together with its coverage bookkeeping.
///
/// A tile is *covered* once every tile above it that could be drawn has been
/// drawn opaque, at which point it no longer needs to be drawn itself. Each
/// opaque draw above a tile calls [`cover`](Tile::cover) on it; each removal
/// calls [`uncover`](Tile::uncover).
#[derive(Debug, Clone)]
pub struct Tile {
    address: TileAddress,
    below: Option<TileAddress>,
    url: String,
    crop: Option<Rect>,
    bounds: Rect,
    tiles_above: Option<u32>,
    covered: u32,
    drawn_opaque: bool,
    opacity: f32,
    /// An image request for this tile is outstanding.
    pub loading: bool,
    /// The tile intersected the viewport during the last frame.
    pub in_bounds: bool,
    pub(crate) view: Option<TileView>,
}

impl Tile {
    /// Builds a tile from its source; fails when the source has no such tile
    pub fn new<S>(address: TileAddress, source: &S, below: Option<TileAddress>) -> Result<Self>
    where
        S: TileSource + ?Sized,
    {
        let info = source.tile_info(address)?;
        Ok(Self {
            address,
            below,
            url: info.url,
            crop: info.crop,
            bounds: source.tile_bounds(address),
            tiles_above: source.num_tiles_above(address, None),
            covered: 0,
            drawn_opaque: false,
            opacity: 0.0,
            loading: false,
            in_bounds: false,
            view: None,
        })
    }

    /// Builds a tile together with the address of the tile directly beneath it
    pub fn with_source<S>(address: TileAddress, source: &S) -> Result<Self>
    where
        S: TileSource + ?Sized,
    {
        let below = address.level.checked_sub(1).and_then(|lower| {
            source
                .tile_below(address, Some(lower))
                .map(|(col, row)| TileAddress::new(lower, col, row))
        });
        Self::new(address, source, below)
    }

    pub fn address(&self) -> TileAddress {
        self.address
    }

    pub fn level(&self) -> u32 {
        self.address.level
    }

    pub fn col(&self) -> u32 {
        self.address.col
    }

    pub fn row(&self) -> u32 {
        self.address.row
    }

    pub fn tile_below(&self) -> Option<TileAddress> {
        self.below
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn crop(&self) -> Option<Rect> {
        self.crop
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Tiles above that must be drawn to cover this one; `None` is unbounded
    pub fn tiles_above(&self) -> Option<u32> {
        self.tiles_above
    }

    pub fn covered_count(&self) -> u32 {
        self.covered
    }

    pub fn is_drawn_opaque(&self) -> bool {
        self.drawn_opaque
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn view(&self) -> Option<&TileView> {
        self.view.as_ref()
    }

    pub fn has_view(&self) -> bool {
        self.view.is_some()
    }

    pub fn is_covered(&self) -> bool {
        self.tiles_above == Some(self.covered)
    }

    /// Whether this tile hides everything beneath it
    pub fn covers(&self) -> bool {
        self.drawn_opaque || self.is_covered()
    }

    /// Records one more opaque tile above. Returns true if this tile is now covered.
    pub fn cover(&mut self) -> Result<bool> {
        if let Some(limit) = self.tiles_above {
            if self.covered >= limit {
                return Err(self.broken(format!(
                    "covered {} times but only {} tiles sit above",
                    self.covered + 1,
                    limit
                )));
            }
        }
        self.covered += 1;
        Ok(self.is_covered())
    }

    /// Records one fewer opaque tile above. Returns true if this tile was covered until now.
    pub fn uncover(&mut self) -> Result<bool> {
        if self.covered == 0 {
            return Err(self.broken("uncovered more often than covered".to_string()));
        }
        let was_covered = self.is_covered();
        self.covered -= 1;
        Ok(was_covered)
    }

    /// Records that this tile has been drawn at full opacity
    pub fn drawn(&mut self) -> Result<bool> {
        if self.drawn_opaque {
            return Err(self.broken("drawn opaque twice".to_string()));
        }
        if self.is_covered() {
            return Err(self.broken("drawn while covered".to_string()));
        }
        self.drawn_opaque = true;
        Ok(true)
    }

    /// Forgets the opaque draw, e.g. after the tile's view is discarded
    pub fn forget_drawn(&mut self) {
        self.drawn_opaque = false;
    }

    /// Forgets every cover from above; the tile's own draw still counts
    pub fn reset_coverage(&mut self) {
        self.covered = 0;
    }

    fn broken(&self, reason: String) -> Error {
        log::error!("coverage broken for tile {}: {}", self.address, reason);
        Error::CoverageBroken {
            address: self.address,
            reason,
        }
    }
}
