use std::collections::HashMap;

use crate::animation::animated_rect::Animatable;
use crate::assets::loader::{TileLoader, TileRequest, TileResponse};
use crate::foundation::clock::SharedClock;
use crate::foundation::config::ViewerContext;
use crate::foundation::core::{Layer, Point, Rect};
use crate::foundation::error::ViewerResult;
use crate::foundation::geom::{clip_rect, rects_intersect};
use crate::render::coverage::{CoverageMap, TileRange};
use crate::render::sink::{DrawSink, DrawnTile};
use crate::tiles::tile::{LoadCandidate, Tile, TileKey, prefer_candidate, prefer_eviction};
use crate::tiles::tiled_image::TiledImage;
use crate::viewport::viewport::Viewport;

/// Circular overlay that shows the area under it at a higher zoom.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Magnifier {
    /// Center in container pixels.
    pub center: Point,
    /// Radius in container pixels.
    pub radius: f64,
}

impl Magnifier {
    /// Whether the circle touches pixel rectangle `r`.
    pub fn intersects(&self, r: Rect) -> bool {
        let nx = self.center.x.clamp(r.x0, r.x1);
        let ny = self.center.y.clamp(r.y0, r.y1);
        self.center.distance(Point::new(nx, ny)) <= self.radius
    }
}

/// Running counters since construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawerStats {
    /// Tiles handed to the sink in the last frame.
    pub tiles_drawn: usize,
    /// Tiles that finished loading.
    pub tiles_loaded: u64,
    /// Fetches accepted by the loader.
    pub requests_issued: u64,
    /// Fetches the loader refused because it was busy.
    pub requests_rejected: u64,
    /// Tiles whose pixels were released to honour the cache quota.
    pub evictions: u64,
    /// Fetches that failed or timed out.
    pub failures: u64,
    /// Responses that arrived after a reset.
    pub stale_discarded: u64,
}

#[derive(Debug)]
struct ImageFrame {
    index: usize,
    visible: Rect,
    drawn_any: bool,
    ended: bool,
}

/// Per-frame tile selection, fetching, caching and blending for every registered image.
pub struct Drawer {
    loader: Box<dyn TileLoader>,
    clock: SharedClock,
    quota: usize,
    min_pixel_ratio: f64,
    blend_ms: f64,
    magnifier_zoom: f64,
    magnifier: Option<Magnifier>,
    tiles: HashMap<TileKey, Tile>,
    tiles_loaded: Vec<TileKey>,
    coverage: CoverageMap,
    num_tiles_cache: HashMap<(usize, u32), (u32, u32)>,
    pixel_size_cache: HashMap<(usize, u32), f64>,
    tiles_drawn_last_frame: Vec<(TileKey, Layer)>,
    generation: u64,
    last_reset_time: f64,
    redraw_requested: bool,
    stats: DrawerStats,
}

impl std::fmt::Debug for Drawer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Drawer")
            .field("tiles", &self.tiles.len())
            .field("tiles_loaded", &self.tiles_loaded.len())
            .field("generation", &self.generation)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Drawer {
    /// Drawer fetching through `loader`, configured from `ctx`.
    pub fn new(loader: Box<dyn TileLoader>, ctx: &ViewerContext) -> Self {
        Self {
            loader,
            clock: ctx.clock.clone(),
            quota: ctx.config.image_cache_quota,
            min_pixel_ratio: ctx.config.min_pixel_ratio,
            blend_ms: ctx.config.blend_ms(),
            magnifier_zoom: ctx.config.magnifier_zoom_factor,
            magnifier: None,
            tiles: HashMap::new(),
            tiles_loaded: Vec::new(),
            coverage: CoverageMap::new(),
            num_tiles_cache: HashMap::new(),
            pixel_size_cache: HashMap::new(),
            tiles_drawn_last_frame: Vec::new(),
            generation: 0,
            last_reset_time: ctx.now_ms(),
            redraw_requested: false,
            stats: DrawerStats::default(),
        }
    }

    /// Counters so far.
    pub fn stats(&self) -> DrawerStats {
        self.stats
    }

    /// Tile state, if the tile was ever looked at.
    pub fn tile(&self, key: TileKey) -> Option<&Tile> {
        self.tiles.get(&key)
    }

    /// Keys currently holding decoded pixels, oldest first.
    pub fn loaded_tiles(&self) -> &[TileKey] {
        &self.tiles_loaded
    }

    /// What the last frame drew, in draw order, with the highest layer each tile went to.
    pub fn tiles_drawn_last_frame(&self) -> &[(TileKey, Layer)] {
        &self.tiles_drawn_last_frame
    }

    /// Reset generation; bumps on every `reset`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Clock time of the last reset.
    pub fn last_reset_time(&self) -> f64 {
        self.last_reset_time
    }

    /// Fetches the loader has not answered yet.
    pub fn in_flight(&self) -> usize {
        self.loader.in_flight()
    }

    /// Active magnifier.
    pub fn magnifier(&self) -> Option<Magnifier> {
        self.magnifier
    }

    /// Show, move or remove the magnifier.
    pub fn set_magnifier(&mut self, magnifier: Option<Magnifier>) {
        self.magnifier = magnifier;
        self.redraw_requested = true;
    }

    /// Consume a pending redraw request (set by arrivals, resets and magnifier changes).
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    /// Forget every tile, cache and coverage entry. Fetches already in flight are discarded when
    /// they arrive.
    pub fn reset(&mut self) {
        self.tiles.clear();
        self.tiles_loaded.clear();
        self.coverage.clear();
        self.num_tiles_cache.clear();
        self.pixel_size_cache.clear();
        self.tiles_drawn_last_frame.clear();
        self.generation += 1;
        self.last_reset_time = self.clock.now_ms();
        self.redraw_requested = true;
        tracing::debug!(generation = self.generation, "drawer reset");
    }

    /// Drop everything belonging to registry slot `image`.
    pub fn forget_image(&mut self, image: usize) {
        self.tiles.retain(|k, _| k.image != image);
        self.tiles_loaded.retain(|k| k.image != image);
        self.tiles_drawn_last_frame.retain(|(k, _)| k.image != image);
        self.num_tiles_cache.retain(|(i, _), _| *i != image);
        self.pixel_size_cache.retain(|(i, _), _| *i != image);
        self.redraw_requested = true;
    }

    /// Apply every response the loader has ready. Returns whether any tile state changed.
    pub fn collect_loads(&mut self) -> bool {
        let mut changed = false;
        for resp in self.loader.poll_completed() {
            changed |= self.apply_response(resp);
        }
        if changed {
            self.redraw_requested = true;
        }
        changed
    }

    fn apply_response(&mut self, resp: TileResponse) -> bool {
        if resp.generation != self.generation {
            self.stats.stale_discarded += 1;
            tracing::trace!(key = ?resp.key, generation = resp.generation, "stale tile discarded");
            return false;
        }
        let Some(tile) = self.tiles.get_mut(&resp.key) else {
            self.stats.stale_discarded += 1;
            return false;
        };

        match resp.result {
            Ok(image) => {
                tile.set_image(image);
                self.stats.tiles_loaded += 1;
                tracing::trace!(key = ?resp.key, "tile loaded");
                self.admit_loaded(resp.key);
            }
            Err(e) => {
                tile.loading = false;
                tile.failed_to_load = true;
                self.stats.failures += 1;
                tracing::debug!(key = ?resp.key, url = %tile.url, error = %e, "tile failed");
            }
        }
        true
    }

    /// Put a freshly loaded tile in the bounded list, evicting the worst unprotected tile when full.
    fn admit_loaded(&mut self, key: TileKey) {
        if self.tiles_loaded.len() >= self.quota {
            let mut worst: Option<usize> = None;
            for (idx, k) in self.tiles_loaded.iter().enumerate() {
                let Some(t) = self.tiles.get(k) else {
                    continue;
                };
                if t.being_drawn {
                    continue;
                }
                let incumbent = worst
                    .and_then(|w| self.tiles_loaded.get(w))
                    .and_then(|wk| self.tiles.get(wk));
                if prefer_eviction(incumbent, t) {
                    worst = Some(idx);
                }
            }
            match worst {
                Some(idx) => {
                    let evicted = self.tiles_loaded.remove(idx);
                    if let Some(t) = self.tiles.get_mut(&evicted) {
                        t.unload();
                    }
                    self.stats.evictions += 1;
                    tracing::trace!(key = ?evicted, "tile evicted");
                }
                None => {
                    tracing::debug!(
                        loaded = self.tiles_loaded.len(),
                        quota = self.quota,
                        "tile cache over quota; every tile is on screen"
                    );
                }
            }
        }
        self.tiles_loaded.push(key);
    }

    fn num_tiles(&mut self, index: usize, image: &TiledImage, level: u32) -> (u32, u32) {
        *self
            .num_tiles_cache
            .entry((index, level))
            .or_insert_with(|| image.num_tiles(level))
    }

    fn pixel_on_image_size(&mut self, index: usize, image: &TiledImage, level: u32) -> f64 {
        *self
            .pixel_size_cache
            .entry((index, level))
            .or_insert_with(|| image.pixel_on_image_size(level))
    }

    /// Produce one frame. Returns whether another frame is needed (blending tiles or images,
    /// or fetches still outstanding).
    ///
    /// `&mut self` rules out overlapping frames, so no re-entry guard is kept at runtime.
    #[tracing::instrument(skip(self, viewport, images, sink))]
    pub fn update(
        &mut self,
        viewport: &Viewport,
        images: &mut [Option<TiledImage>],
        sink: &mut dyn DrawSink,
    ) -> ViewerResult<bool> {
        self.collect_loads();

        for (key, _) in self.tiles_drawn_last_frame.drain(..) {
            if let Some(t) = self.tiles.get_mut(&key) {
                t.being_drawn = false;
            }
        }
        self.coverage.clear();
        sink.begin_frame(viewport.container_size())?;

        let now = self.clock.now_ms();
        let vp_rect = viewport.rect(true);
        let zoom = viewport.zoom(true);
        let focus = self
            .magnifier
            .map(|m| m.center)
            .unwrap_or_else(|| viewport.pixel_center());
        let density_boost = if self.magnifier.is_some() {
            self.magnifier_zoom
        } else {
            1.0
        };

        let mut more = false;
        let mut frames = Vec::new();
        for (index, slot) in images.iter_mut().enumerate() {
            let Some(image) = slot.as_mut() else {
                continue;
            };
            // Fades advance even while off-screen.
            if image.advance_blend(now, self.blend_ms) {
                more = true;
            }
            if image.is_hidden() {
                continue;
            }
            let bounds = image.rect(true);
            if !rects_intersect(vp_rect, bounds) {
                continue;
            }
            let Some(visible) = clip_rect(vp_rect, bounds) else {
                continue;
            };
            frames.push(ImageFrame {
                index,
                visible,
                drawn_any: false,
                ended: false,
            });
        }

        let mut draw_list: Vec<(TileKey, Layer)> = Vec::new();
        let mut best: Option<LoadCandidate> = None;

        for vp_level in (0..=viewport.max_level().max(0)).rev() {
            for frame in frames.iter_mut() {
                if frame.ended {
                    continue;
                }
                let Some(image) = images.get(frame.index).and_then(Option::as_ref) else {
                    continue;
                };
                let level = image.tiled_image_level(vp_level, true);
                if level < image.min_level() as i32 || level > image.max_level() as i32 {
                    continue;
                }
                let level = level as u32;
                // Coarsest level this walk reaches; it always draws.
                let floor = image
                    .min_level()
                    .max(image.tiled_image_level(0, true).max(0) as u32);

                let bounds = image.rect(true);
                let density = zoom * (bounds.width() / f64::from(image.width()))
                    / image.scaled_level(level)
                    * density_boost;
                let draw_level = (!frame.drawn_any && density > self.min_pixel_ratio)
                    || level == floor;
                if !draw_level && !frame.drawn_any {
                    continue;
                }
                if draw_level {
                    frame.drawn_any = true;
                }

                let (cols, rows) = self.num_tiles(frame.index, image, level);
                let tl = image.tile_at_point(level, frame.visible.origin(), true);
                let br = image.tile_at_point(
                    level,
                    Point::new(frame.visible.x1, frame.visible.y1),
                    true,
                );
                let range = TileRange {
                    x0: tl.0.clamp(0, i64::from(cols) - 1) as u32,
                    y0: tl.1.clamp(0, i64::from(rows) - 1) as u32,
                    x1: br.0.clamp(0, i64::from(cols) - 1) as u32,
                    y1: br.1.clamp(0, i64::from(rows) - 1) as u32,
                };
                self.coverage.reset_level(frame.index, level, range);

                let zero_px = self.pixel_on_image_size(frame.index, image, 0);
                let level_px = self.pixel_on_image_size(frame.index, image, level);
                let visibility = zero_px / (zero_px - level_px).abs();

                let bounds_version = image.bounds_version();
                let image_opacity = image.opacity();

                for y in range.y0..=range.y1 {
                    for x in range.x0..=range.x1 {
                        self.coverage.set(frame.index, level, x, y, false);

                        let key = TileKey::new(frame.index, level, x, y);
                        let tile = self.tiles.entry(key).or_insert_with(|| {
                            Tile::new(
                                key,
                                image.tile_bounds(level, x, y, true),
                                bounds_version,
                                image.tile_url(level, x, y),
                            )
                        });
                        if tile.failed_to_load {
                            continue;
                        }

                        if !draw_level && self.coverage.is_covered(frame.index, level, x, y) {
                            self.coverage.set(frame.index, level, x, y, true);
                            continue;
                        }

                        if tile.bounds_version != bounds_version {
                            tile.bounds = image.tile_bounds(level, x, y, true);
                            tile.bounds_version = bounds_version;
                        }
                        let px = viewport.pixel_rect_from_point_rect(tile.bounds, true);
                        let target_px = viewport.pixel_rect_from_point_rect(
                            image.tile_bounds(level, x, y, false),
                            false,
                        );
                        tile.position = px.origin();
                        tile.size = px.size();
                        tile.target_center = target_px.center();
                        tile.visibility = visibility;
                        tile.last_touch_time = now;
                        let layer = match self.magnifier {
                            Some(m) if m.intersects(tile.pixel_rect()) => Layer::Magnifier,
                            _ => Layer::Base,
                        };

                        if tile.loaded {
                            let start = *tile.blend_start.get_or_insert(now);
                            let t = if self.blend_ms <= 0.0 {
                                1.0
                            } else {
                                ((now - start) / self.blend_ms).clamp(0.0, 1.0)
                            };
                            tile.opacity = t * image_opacity;
                            draw_list.push((key, layer));
                            if t >= 1.0 {
                                self.coverage.set(frame.index, level, x, y, true);
                            } else {
                                more = true;
                            }
                        } else if !tile.loading {
                            let candidate = LoadCandidate::of(tile);
                            if prefer_candidate(best.as_ref(), &candidate, focus) {
                                best = Some(candidate);
                            }
                        }
                    }
                }

                if self.coverage.level_fully_covered(frame.index, level) {
                    frame.ended = true;
                }
            }
        }

        if let Some(candidate) = best {
            self.issue(candidate.key);
            more = true;
        }

        for (key, layer) in draw_list.into_iter().rev() {
            let Some(tile) = self.tiles.get_mut(&key) else {
                continue;
            };
            let Some(image) = tile.image.clone() else {
                continue;
            };
            let drawn = DrawnTile {
                key,
                position: tile.position,
                size: tile.size,
                opacity: tile.opacity,
                image,
            };
            for l in layer.up_to() {
                sink.draw_tile(*l, &drawn)?;
            }
            tile.being_drawn = true;
            self.tiles_drawn_last_frame.push((key, layer));
        }
        sink.end_frame()?;
        self.stats.tiles_drawn = self.tiles_drawn_last_frame.len();

        Ok(more || self.loader.in_flight() > 0)
    }

    fn issue(&mut self, key: TileKey) {
        let Some(tile) = self.tiles.get_mut(&key) else {
            return;
        };
        let request = TileRequest {
            key,
            url: tile.url.clone(),
            generation: self.generation,
        };
        match self.loader.try_load(request) {
            Ok(()) => {
                tile.loading = true;
                self.stats.requests_issued += 1;
                tracing::trace!(?key, url = %tile.url, "tile requested");
            }
            Err(_) => {
                self.stats.requests_rejected += 1;
                tracing::trace!(?key, "loader busy; retry next frame");
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/drawer.rs"]
mod tests;
