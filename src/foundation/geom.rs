//! Plane geometry helpers on top of `kurbo`.
//!
//! Rectangles are `{x, y, width, height}` boxes expressed as [`Rect`]; containment here is
//! inclusive on every edge, unlike `Rect::contains`.

use crate::foundation::core::{Axis, Point, Rect, Size};

/// Build a rectangle from its top-left corner and size.
pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect::from_origin_size((x, y), (width, height))
}

/// Width over height. Degenerate (zero-height) rectangles report `f64::INFINITY`.
pub fn aspect_ratio(r: Rect) -> f64 {
    let h = r.height();
    if h == 0.0 { f64::INFINITY } else { r.width() / h }
}

/// Inclusive point containment.
pub fn contains_point(r: Rect, p: Point) -> bool {
    p.x >= r.x0 && p.x <= r.x1 && p.y >= r.y0 && p.y <= r.y1
}

/// Axis-aligned segment starting at `start` and running `length` units along `axis`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Start point.
    pub start: Point,
    /// Non-negative extent along `axis`.
    pub length: f64,
    /// Axis the segment runs along.
    pub axis: Axis,
}

impl Segment {
    /// Create a segment.
    pub fn new(start: Point, length: f64, axis: Axis) -> Self {
        Self {
            start,
            length,
            axis,
        }
    }

    /// Whether this segment touches `r`.
    ///
    /// Only meaningful for axis-aligned segments, which is all this type can express.
    pub fn intersects_rect(&self, r: Rect) -> bool {
        let (lo, hi, fixed) = match self.axis {
            Axis::Horizontal => (self.start.x, self.start.x + self.length, self.start.y),
            Axis::Vertical => (self.start.y, self.start.y + self.length, self.start.x),
        };
        let (r_lo, r_hi, c_lo, c_hi) = match self.axis {
            Axis::Horizontal => (r.x0, r.x1, r.y0, r.y1),
            Axis::Vertical => (r.y0, r.y1, r.x0, r.x1),
        };
        fixed >= c_lo && fixed <= c_hi && lo <= r_hi && hi >= r_lo
    }
}

/// The four edges of `r`: top, bottom, left, right.
pub fn edges(r: Rect) -> [Segment; 4] {
    [
        Segment::new(Point::new(r.x0, r.y0), r.width(), Axis::Horizontal),
        Segment::new(Point::new(r.x0, r.y1), r.width(), Axis::Horizontal),
        Segment::new(Point::new(r.x0, r.y0), r.height(), Axis::Vertical),
        Segment::new(Point::new(r.x1, r.y0), r.height(), Axis::Vertical),
    ]
}

/// Whether two rectangles overlap or touch.
///
/// Containment of either center short-circuits; otherwise any edge of `b` crossing `a` (or any
/// edge of `a` crossing `b`) counts.
pub fn rects_intersect(a: Rect, b: Rect) -> bool {
    if contains_point(a, b.center()) || contains_point(b, a.center()) {
        return true;
    }
    edges(b).iter().any(|s| s.intersects_rect(a)) || edges(a).iter().any(|s| s.intersects_rect(b))
}

/// Intersection of `a` and `b`, or `None` when they are disjoint.
pub fn clip_rect(a: Rect, b: Rect) -> Option<Rect> {
    let x0 = a.x0.max(b.x0);
    let y0 = a.y0.max(b.y0);
    let x1 = a.x1.min(b.x1);
    let y1 = a.y1.min(b.y1);
    if x0 > x1 || y0 > y1 {
        return None;
    }
    Some(Rect::new(x0, y0, x1, y1))
}

/// Grow `r` along one axis until its aspect ratio equals `aspect`, keeping its center.
pub fn grow_to_aspect(r: Rect, aspect: f64) -> Rect {
    let c = r.center();
    let (w, h) = (r.width(), r.height());
    let size = if aspect_ratio(r) >= aspect {
        Size::new(w, w / aspect)
    } else {
        Size::new(h * aspect, h)
    };
    Rect::from_center_size(c, size)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/geom.rs"]
mod tests;
