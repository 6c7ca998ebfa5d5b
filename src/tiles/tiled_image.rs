use std::sync::Arc;

use crate::animation::animated_rect::{Animatable, AnimatedRect};
use crate::animation::spring::SpringParams;
use crate::foundation::config::ViewerContext;
use crate::foundation::core::{Point, Rect, Size, Vec2};
use crate::foundation::error::{ViewerError, ViewerResult};
use crate::foundation::geom::rect;
use crate::tiles::addressing::TileAddressing;

/// Intrinsic pyramid geometry of one image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PyramidDesc {
    /// Full-resolution width in pixels.
    pub width: u32,
    /// Full-resolution height in pixels.
    pub height: u32,
    /// Tile edge in pixels, excluding overlap.
    pub tile_size: u32,
    /// Redundant border pixels shared with neighbours.
    pub tile_overlap: u32,
    /// Lowest level worth requesting.
    pub min_level: u32,
}

/// Smallest level `L` with `2^L >= max(width, height)`.
pub fn max_level_for(width: u32, height: u32) -> u32 {
    let m = u64::from(width.max(height)).max(1);
    let mut level = 0u32;
    while (1u64 << level) < m {
        level += 1;
    }
    level
}

/// One pyramid image placed on the shared plane.
///
/// Levels come in two flavours: the image's own pyramid levels, and viewport levels that are
/// shared by all images. They differ by `ceil(log2(bounds scale))`, where the scale compares the
/// current placement with the placement the image was opened with.
#[derive(Debug)]
pub struct TiledImage {
    desc: PyramidDesc,
    max_level: u32,
    native_bounds: Rect,
    bounds: AnimatedRect,
    opacity: f64,
    blend_from: f64,
    blending: bool,
    hiding: bool,
    blend_start: Option<f64>,
    align_requested: bool,
    addressing: Arc<dyn TileAddressing>,
}

impl TiledImage {
    /// Validate `desc` and place the image at `bounds` (default: unit width at the origin).
    pub fn new(
        desc: PyramidDesc,
        bounds: Option<Rect>,
        addressing: Arc<dyn TileAddressing>,
        ctx: &ViewerContext,
    ) -> ViewerResult<Self> {
        if desc.width == 0 || desc.height == 0 {
            return Err(ViewerError::validation("image width and height must be > 0"));
        }
        if desc.tile_size == 0 {
            return Err(ViewerError::validation("tile size must be > 0"));
        }
        let max_level = max_level_for(desc.width, desc.height);
        if desc.min_level > max_level {
            return Err(ViewerError::validation(format!(
                "min level {} exceeds max level {max_level}",
                desc.min_level
            )));
        }
        let native_bounds = bounds.unwrap_or_else(|| {
            rect(0.0, 0.0, 1.0, f64::from(desc.height) / f64::from(desc.width))
        });
        if !(native_bounds.width() > 0.0 && native_bounds.height() > 0.0)
            || !native_bounds.is_finite()
        {
            return Err(ViewerError::validation(
                "image bounds must be finite with positive size",
            ));
        }

        Ok(Self {
            desc,
            max_level,
            native_bounds,
            bounds: AnimatedRect::new(
                native_bounds,
                SpringParams::from_context(ctx),
                ctx.clock.clone(),
            ),
            opacity: 1.0,
            blend_from: 1.0,
            blending: false,
            hiding: false,
            blend_start: None,
            align_requested: false,
            addressing,
        })
    }

    /// Intrinsic geometry.
    pub fn desc(&self) -> PyramidDesc {
        self.desc
    }

    /// Full-resolution width in pixels.
    pub fn width(&self) -> u32 {
        self.desc.width
    }

    /// Full-resolution height in pixels.
    pub fn height(&self) -> u32 {
        self.desc.height
    }

    /// Lowest requested level.
    pub fn min_level(&self) -> u32 {
        self.desc.min_level
    }

    /// Full-resolution level.
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Placement the image was opened with.
    pub fn native_bounds(&self) -> Rect {
        self.native_bounds
    }

    /// Change counter of the placement springs.
    pub fn bounds_version(&self) -> u64 {
        self.bounds.version()
    }

    /// Current placement size relative to the native placement, per axis.
    pub fn bounds_scale(&self, current: bool) -> Vec2 {
        let b = self.bounds.rect(current);
        Vec2::new(
            b.width() / self.native_bounds.width(),
            b.height() / self.native_bounds.height(),
        )
    }

    fn level_shift(&self, current: bool) -> i32 {
        let s = self.bounds_scale(current);
        let m = s.x.max(s.y);
        if !(m.is_finite() && m > 0.0) {
            return 0;
        }
        // Absorb float noise so an unscaled image shifts by exactly zero.
        (m.log2() - 1e-9).ceil() as i32
    }

    /// Viewport level to this image's pyramid level.
    pub fn tiled_image_level(&self, viewport_level: i32, current: bool) -> i32 {
        viewport_level + self.level_shift(current)
    }

    /// This image's pyramid level to viewport level.
    pub fn viewport_level(&self, level: i32, current: bool) -> i32 {
        level - self.level_shift(current)
    }

    /// Fraction of full resolution at `level`.
    pub fn scaled_level(&self, level: u32) -> f64 {
        2f64.powi(level as i32 - self.max_level as i32)
    }

    /// Source pixels covered by one pixel at `level`.
    pub fn pixel_on_image_size(&self, level: u32) -> f64 {
        1.0 / self.scaled_level(level)
    }

    /// Column and row counts at `level`.
    pub fn num_tiles(&self, level: u32) -> (u32, u32) {
        let s = self.scaled_level(level);
        let ts = f64::from(self.desc.tile_size);
        let cols = (s * f64::from(self.desc.width) / ts).ceil().max(1.0);
        let rows = (s * f64::from(self.desc.height) / ts).ceil().max(1.0);
        (cols as u32, rows as u32)
    }

    /// Plane point to full-resolution source pixels.
    pub fn plane_to_source(&self, p: Point, current: bool) -> Point {
        let b = self.bounds.rect(current);
        Point::new(
            (p.x - b.x0) * f64::from(self.desc.width) / b.width(),
            (p.y - b.y0) * f64::from(self.desc.height) / b.height(),
        )
    }

    /// Full-resolution source pixel rectangle to plane coordinates.
    pub fn source_to_plane(&self, r: Rect, current: bool) -> Rect {
        let b = self.bounds.rect(current);
        let sx = b.width() / f64::from(self.desc.width);
        let sy = b.height() / f64::from(self.desc.height);
        rect(
            b.x0 + r.x0 * sx,
            b.y0 + r.y0 * sy,
            r.width() * sx,
            r.height() * sy,
        )
    }

    /// Column/row of the tile containing plane point `point` at `level`.
    ///
    /// Not clamped: points outside the image yield out-of-range (possibly negative) indices.
    pub fn tile_at_point(&self, level: u32, point: Point, current: bool) -> (i64, i64) {
        let src = self.plane_to_source(point, current);
        let s = self.scaled_level(level);
        let ts = f64::from(self.desc.tile_size);
        (
            (src.x * s / ts).floor() as i64,
            (src.y * s / ts).floor() as i64,
        )
    }

    /// Tile rectangle in full-resolution source pixels, overlap included.
    ///
    /// Leading tiles carry overlap only on their trailing side; trailing tiles are clipped to the
    /// image edge.
    pub fn tile_source_bounds(&self, level: u32, x: u32, y: u32) -> Rect {
        let s = self.scaled_level(level);
        let ts = f64::from(self.desc.tile_size);
        let ov = f64::from(self.desc.tile_overlap);
        let level_size = Size::new(
            f64::from(self.desc.width) * s,
            f64::from(self.desc.height) * s,
        );

        let axis = |i: u32, extent: f64| -> (f64, f64) {
            let (pos, span) = if i == 0 {
                (0.0, ts + ov)
            } else {
                (ts * f64::from(i) - ov, ts + 2.0 * ov)
            };
            (pos, span.min(extent - pos).max(0.0))
        };
        let (px, sx) = axis(x, level_size.width);
        let (py, sy) = axis(y, level_size.height);

        rect(px / s, py / s, sx / s, sy / s)
    }

    /// Tile rectangle on the plane under the current (or target) placement.
    pub fn tile_bounds(&self, level: u32, x: u32, y: u32, current: bool) -> Rect {
        self.source_to_plane(self.tile_source_bounds(level, x, y), current)
    }

    /// Address handed to the tile fetcher.
    pub fn tile_url(&self, level: u32, x: u32, y: u32) -> String {
        self.addressing.tile_url(level, x, y)
    }

    /// Image opacity in `[0, 1]`.
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Whether an opacity fade is in progress.
    pub fn is_blending(&self) -> bool {
        self.blending
    }

    /// Whether the image is (fading) out.
    pub fn is_hiding(&self) -> bool {
        self.hiding
    }

    /// Fully transparent and not fading.
    pub fn is_hidden(&self) -> bool {
        self.opacity <= 0.0 && !self.blending
    }

    /// Fade in (or jump to opaque).
    pub fn show(&mut self, immediate: bool) {
        self.set_visibility(false, immediate);
    }

    /// Fade out (or jump to transparent).
    pub fn hide(&mut self, immediate: bool) {
        self.set_visibility(true, immediate);
    }

    fn set_visibility(&mut self, hiding: bool, immediate: bool) {
        self.hiding = hiding;
        let target = if hiding { 0.0 } else { 1.0 };
        if immediate {
            self.opacity = target;
            self.blending = false;
            self.blend_start = None;
        } else if self.opacity != target {
            self.blend_from = self.opacity;
            self.blending = true;
            self.blend_start = None;
        }
    }

    /// Advance the opacity fade linearly. Returns whether the fade is still running.
    pub fn advance_blend(&mut self, now_ms: f64, blend_ms: f64) -> bool {
        if !self.blending {
            return false;
        }
        let start = *self.blend_start.get_or_insert(now_ms);
        let target = if self.hiding { 0.0 } else { 1.0 };
        let t = if blend_ms <= 0.0 {
            1.0
        } else {
            ((now_ms - start) / blend_ms).clamp(0.0, 1.0)
        };
        self.opacity = self.blend_from + (target - self.blend_from) * t;
        if t >= 1.0 {
            self.opacity = target;
            self.blending = false;
            self.blend_start = None;
        }
        self.blending
    }

    /// Consume a pending "bounds changed, re-align" notification.
    pub fn take_align_request(&mut self) -> bool {
        std::mem::take(&mut self.align_requested)
    }
}

impl Animatable for TiledImage {
    fn rect(&self, current: bool) -> Rect {
        self.bounds.rect(current)
    }

    fn update(&mut self) -> bool {
        self.bounds.update()
    }

    fn fit_bounds(&mut self, bounds: Rect, immediate: bool) {
        self.bounds.fit_bounds(bounds, immediate);
        self.align_requested = true;
    }

    fn is_animating(&self) -> bool {
        self.bounds.is_animating()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tiles/tiled_image.rs"]
mod tests;
