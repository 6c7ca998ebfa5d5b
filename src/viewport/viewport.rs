use crate::animation::animated_rect::{Animatable, AnimatedRect};
use crate::animation::spring::SpringParams;
use crate::foundation::config::{BlockPanning, ViewerContext};
use crate::foundation::core::{Axis, Point, Rect, Size, Vec2};
use crate::foundation::error::{ViewerError, ViewerResult};
use crate::foundation::geom::{aspect_ratio, grow_to_aspect, rect};

const REL_EPS: f64 = 1e-9;

fn exceeds(a: f64, b: f64) -> bool {
    a > b * (1.0 + REL_EPS)
}

fn same(a: f64, b: f64) -> bool {
    (a - b).abs() <= REL_EPS * a.abs().max(b.abs()).max(1.0)
}

/// Visible window onto the plane, animated, with zoom semantics.
///
/// `zoom` is container pixels per plane unit: `container.width / rect.width`.
#[derive(Clone, Debug)]
pub struct Viewport {
    rect: AnimatedRect,
    container: Size,
    home_bounds: Rect,
    max_level: i32,
    max_zoom: Option<f64>,
    constraint_bounds: Option<Rect>,
    constrain: bool,
    block_panning: BlockPanning,
    block_zoom: bool,
}

impl Viewport {
    /// Create a viewport for a container of `container` pixels showing (at least) `bounds`.
    pub fn new(container: Size, bounds: Rect, ctx: &ViewerContext) -> ViewerResult<Self> {
        if !(container.width > 0.0 && container.height > 0.0) || !container.is_finite() {
            return Err(ViewerError::validation(
                "viewport container size must be finite and > 0",
            ));
        }
        if !(bounds.width() > 0.0 && bounds.height() > 0.0) || !bounds.is_finite() {
            return Err(ViewerError::validation(
                "viewport bounds must be finite with positive size",
            ));
        }
        let initial = grow_to_aspect(bounds, container.width / container.height);
        Ok(Self {
            rect: AnimatedRect::new(initial, SpringParams::from_context(ctx), ctx.clock.clone()),
            container,
            home_bounds: bounds,
            max_level: 0,
            max_zoom: None,
            constraint_bounds: None,
            constrain: ctx.config.constrain_viewport,
            block_panning: ctx.config.block_panning,
            block_zoom: ctx.config.block_zoom,
        })
    }

    /// Cached container size in pixels.
    pub fn container_size(&self) -> Size {
        self.container
    }

    /// Version of the underlying rectangle springs.
    pub fn version(&self) -> u64 {
        self.rect.version()
    }

    /// Highest viewport level across all images.
    pub fn max_level(&self) -> i32 {
        self.max_level
    }

    /// Set the highest viewport level across all images.
    pub fn set_max_level(&mut self, level: i32) {
        self.max_level = level;
    }

    /// Largest useful zoom (pixels per plane unit), if known.
    pub fn max_zoom(&self) -> Option<f64> {
        self.max_zoom
    }

    /// Set the largest useful zoom.
    pub fn set_max_zoom(&mut self, max_zoom: Option<f64>) {
        self.max_zoom = max_zoom.filter(|z| z.is_finite() && *z > 0.0);
    }

    /// Bounds the viewport is kept within when constraining is on.
    pub fn constraint_bounds(&self) -> Option<Rect> {
        self.constraint_bounds
    }

    /// Set the constraint rectangle.
    pub fn set_constraint_bounds(&mut self, bounds: Option<Rect>) {
        self.constraint_bounds = bounds;
    }

    /// Toggle constraint enforcement.
    pub fn set_constrain(&mut self, constrain: bool) {
        self.constrain = constrain;
    }

    /// Rectangle `go_home` returns to.
    pub fn home_bounds(&self) -> Rect {
        self.home_bounds
    }

    /// Set the rectangle `go_home` returns to.
    pub fn set_home_bounds(&mut self, bounds: Rect) {
        self.home_bounds = bounds;
    }

    /// Pixels per plane unit.
    pub fn zoom(&self, current: bool) -> f64 {
        self.container.width / self.rect.rect(current).width()
    }

    /// Center of the container in pixels.
    pub fn pixel_center(&self) -> Point {
        Point::new(self.container.width / 2.0, self.container.height / 2.0)
    }

    /// Zoom to `zoom`, keeping `ref_point` (default: the center) at the same relative position.
    pub fn zoom_to(&mut self, zoom: f64, immediate: bool, ref_point: Option<Point>) {
        if self.block_zoom {
            return;
        }
        self.zoom_to_unconstrained(zoom, immediate, ref_point);
        self.apply_constraints(immediate, ref_point);
    }

    /// Multiply the target zoom by `factor`.
    pub fn zoom_by(&mut self, factor: f64, immediate: bool, ref_point: Option<Point>) {
        self.zoom_to(self.zoom(false) * factor, immediate, ref_point);
    }

    fn zoom_to_unconstrained(&mut self, zoom: f64, immediate: bool, ref_point: Option<Point>) {
        if !(zoom.is_finite() && zoom > 0.0) {
            return;
        }
        let r = self.rect.rect(false);
        let reference = ref_point.unwrap_or_else(|| r.center());
        let fx = (reference.x - r.x0) / r.width();
        let fy = (reference.y - r.y0) / r.height();
        let w = self.container.width / zoom;
        let h = w * r.height() / r.width();
        self.rect.spring_fields(
            Some(reference.x - fx * w),
            Some(reference.y - fy * h),
            Some(w),
            Some(h),
            immediate,
        );
    }

    /// Center the viewport on `center`. Blocked axes keep their position.
    pub fn pan_to(&mut self, center: Point, immediate: bool) {
        let current = self.rect.rect(false).center();
        let center = Point::new(
            if self.block_panning.horizontal {
                current.x
            } else {
                center.x
            },
            if self.block_panning.vertical {
                current.y
            } else {
                center.y
            },
        );
        self.rect.pan_to(center, immediate);
        self.apply_constraints(immediate, None);
    }

    /// Move the viewport by `delta` plane units.
    pub fn pan_by(&mut self, delta: Vec2, immediate: bool) {
        self.pan_to(self.rect.rect(false).center() + delta, immediate);
    }

    /// Return to the home bounds.
    pub fn go_home(&mut self, immediate: bool) {
        self.fit_bounds(self.home_bounds, immediate);
    }

    /// Keep the viewport inside `constraint_bounds`; no-op unless constraining is enabled.
    ///
    /// Zoom is corrected first (too far out for the constraint, or past the maximum useful
    /// zoom), then each axis is panned back independently.
    pub fn apply_constraints(&mut self, immediate: bool, ref_point: Option<Point>) {
        if !self.constrain {
            return;
        }
        let Some(c) = self.constraint_bounds else {
            return;
        };

        let r = self.rect.rect(false);
        let factor = if aspect_ratio(r) >= aspect_ratio(c) {
            exceeds(r.height(), c.height()).then(|| r.height() / c.height())
        } else {
            exceeds(r.width(), c.width()).then(|| r.width() / c.width())
        };
        let factor = factor.or_else(|| {
            let max_zoom = self.max_zoom?;
            let px = self.delta_pixels_from_points(c.size().to_vec2(), false);
            let ratio = (px.x / (c.width() * max_zoom)).max(px.y / (c.height() * max_zoom));
            exceeds(ratio, 1.0).then(|| 1.0 / ratio)
        });
        if let Some(factor) = factor {
            let zoom = self.zoom(false) * factor;
            self.zoom_to_unconstrained(zoom, immediate, ref_point);
        }

        let r = self.rect.rect(false);
        let mut origin = [r.x0, r.y0];
        for (i, axis) in Axis::BOTH.into_iter().enumerate() {
            let r_lo = axis.of_point(r.origin());
            let r_len = axis.of_size(r.size());
            let c_lo = axis.of_point(c.origin());
            let c_len = axis.of_size(c.size());
            if exceeds(r_len, c_len) {
                origin[i] = c_lo + (c_len - r_len) / 2.0;
            } else if r_lo + r_len < c_lo || r_lo > c_lo + c_len {
                let to_lo = c_lo - r_lo;
                let to_hi = (c_lo + c_len) - (r_lo + r_len);
                origin[i] = r_lo + if to_lo.abs() < to_hi.abs() { to_lo } else { to_hi };
            }
        }
        let x = (!same(origin[0], r.x0)).then_some(origin[0]);
        let y = (!same(origin[1], r.y0)).then_some(origin[1]);
        if x.is_some() || y.is_some() {
            self.rect.spring_fields(x, y, None, None, immediate);
        }
    }

    /// Track a container resize, keeping zoom and top-left; constraints are re-applied at once.
    pub fn resize(&mut self, container: Size) {
        if !(container.width > 0.0 && container.height > 0.0) || container == self.container {
            return;
        }
        let zoom = self.zoom(false);
        self.container = container;
        self.rect.spring_fields(
            None,
            None,
            Some(container.width / zoom),
            Some(container.height / zoom),
            true,
        );
        self.apply_constraints(true, None);
    }

    /// Plane point to container pixels.
    pub fn pixel_from_point(&self, p: Point, current: bool) -> Point {
        let r = self.rect.rect(current);
        let zoom = self.container.width / r.width();
        Point::new((p.x - r.x0) * zoom, (p.y - r.y0) * zoom)
    }

    /// Container pixels to plane point.
    pub fn point_from_pixel(&self, px: Point, current: bool) -> Point {
        let r = self.rect.rect(current);
        let zoom = self.container.width / r.width();
        Point::new(px.x / zoom + r.x0, px.y / zoom + r.y0)
    }

    /// Plane-space vector to pixel-space vector.
    pub fn delta_pixels_from_points(&self, v: Vec2, current: bool) -> Vec2 {
        v * self.zoom(current)
    }

    /// Pixel-space vector to plane-space vector.
    pub fn delta_points_from_pixels(&self, v: Vec2, current: bool) -> Vec2 {
        v / self.zoom(current)
    }

    /// Plane rectangle to pixel rectangle.
    pub fn pixel_rect_from_point_rect(&self, r: Rect, current: bool) -> Rect {
        let origin = self.pixel_from_point(r.origin(), current);
        let size = self.delta_pixels_from_points(r.size().to_vec2(), current);
        rect(origin.x, origin.y, size.x, size.y)
    }

    /// Pixel rectangle to plane rectangle.
    pub fn point_rect_from_pixel_rect(&self, r: Rect, current: bool) -> Rect {
        let origin = self.point_from_pixel(r.origin(), current);
        let size = self.delta_points_from_pixels(r.size().to_vec2(), current);
        rect(origin.x, origin.y, size.x, size.y)
    }
}

impl Animatable for Viewport {
    fn rect(&self, current: bool) -> Rect {
        self.rect.rect(current)
    }

    fn update(&mut self) -> bool {
        self.rect.update()
    }

    /// Show `bounds`, grown on one axis to the viewport's aspect ratio around the same center.
    fn fit_bounds(&mut self, bounds: Rect, immediate: bool) {
        if !(bounds.width() > 0.0 && bounds.height() > 0.0) {
            return;
        }
        let aspect = aspect_ratio(self.rect.rect(false));
        self.rect.fit_bounds(grow_to_aspect(bounds, aspect), immediate);
        self.apply_constraints(immediate, None);
    }

    fn is_animating(&self) -> bool {
        self.rect.is_animating()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/viewport/viewport.rs"]
mod tests;
