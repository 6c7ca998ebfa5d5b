use std::sync::Arc;

use crate::foundation::core::{Point, Rect, Size};

/// Decoded tile pixels, premultiplied RGBA8.
pub type TileImage = Arc<image::RgbaImage>;

/// Identity of a tile: owning image slot, pyramid level, column and row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    /// Registry slot of the owning image.
    pub image: usize,
    /// Pyramid level of the owning image.
    pub level: u32,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl TileKey {
    /// Build a key.
    pub fn new(image: usize, level: u32, x: u32, y: u32) -> Self {
        Self { image, level, x, y }
    }
}

/// One fetchable tile and its per-frame drawing state.
///
/// Tiles are created lazily and never dropped until a reset; eviction only releases `image`.
#[derive(Clone, Debug)]
pub struct Tile {
    /// Identity.
    pub key: TileKey,
    /// Plane-space bounds (overlap included).
    pub bounds: Rect,
    /// Image bounds version `bounds` was computed from.
    pub bounds_version: u64,
    /// Fetch address.
    pub url: String,
    /// Decoded pixels are present.
    pub loaded: bool,
    /// A fetch is in flight.
    pub loading: bool,
    /// The last fetch failed; never retried until reset.
    pub failed_to_load: bool,
    /// Decoded pixels.
    pub image: Option<TileImage>,
    /// Current top-left in pixels.
    pub position: Point,
    /// Current size in pixels.
    pub size: Size,
    /// Center in target pixel space, for load ordering.
    pub target_center: Point,
    /// Level visibility score, for load ordering.
    pub visibility: f64,
    /// Effective opacity this frame.
    pub opacity: f64,
    /// Handed to the sink this frame; protected from eviction.
    pub being_drawn: bool,
    /// When the fade-in started.
    pub blend_start: Option<f64>,
    /// Last frame time this tile was in view.
    pub last_touch_time: f64,
}

impl Tile {
    /// Fresh, unloaded tile.
    pub fn new(key: TileKey, bounds: Rect, bounds_version: u64, url: String) -> Self {
        Self {
            key,
            bounds,
            bounds_version,
            url,
            loaded: false,
            loading: false,
            failed_to_load: false,
            image: None,
            position: Point::ZERO,
            size: Size::ZERO,
            target_center: Point::ZERO,
            visibility: 0.0,
            opacity: 0.0,
            being_drawn: false,
            blend_start: None,
            last_touch_time: 0.0,
        }
    }

    /// Attach decoded pixels.
    pub fn set_image(&mut self, image: TileImage) {
        self.image = Some(image);
        self.loaded = true;
        self.loading = false;
        self.blend_start = None;
    }

    /// Drop decoded pixels; identity and geometry stay.
    pub fn unload(&mut self) {
        self.image = None;
        self.loaded = false;
        self.loading = false;
        self.blend_start = None;
    }

    /// Current pixel-space rectangle.
    pub fn pixel_rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }
}

/// Scheduling snapshot of a tile that could be fetched this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoadCandidate {
    /// Tile identity.
    pub key: TileKey,
    /// Level visibility score.
    pub visibility: f64,
    /// Center in target pixel space.
    pub target_center: Point,
}

impl LoadCandidate {
    /// Snapshot `tile`.
    pub fn of(tile: &Tile) -> Self {
        Self {
            key: tile.key,
            visibility: tile.visibility,
            target_center: tile.target_center,
        }
    }
}

/// Whether `candidate` should replace `incumbent` as the next tile to fetch.
///
/// Higher visibility wins; equal visibility falls back to proximity to `focus`.
pub fn prefer_candidate(
    incumbent: Option<&LoadCandidate>,
    candidate: &LoadCandidate,
    focus: Point,
) -> bool {
    let Some(inc) = incumbent else {
        return true;
    };
    if candidate.visibility > inc.visibility {
        return true;
    }
    if candidate.visibility == inc.visibility {
        return candidate.target_center.distance(focus) < inc.target_center.distance(focus);
    }
    false
}

/// Whether `candidate` is a worse keeper than `incumbent` when making room in the cache.
///
/// Older touch time loses; ties evict the deeper level first.
pub fn prefer_eviction(incumbent: Option<&Tile>, candidate: &Tile) -> bool {
    let Some(inc) = incumbent else {
        return true;
    };
    if candidate.last_touch_time < inc.last_touch_time {
        return true;
    }
    candidate.last_touch_time == inc.last_touch_time && candidate.key.level > inc.key.level
}

#[cfg(test)]
#[path = "../../tests/unit/tiles/tile.rs"]
mod tests;
