use crate::animation::spring::{Spring, SpringParams};
use crate::foundation::clock::SharedClock;
use crate::foundation::core::{Point, Rect};
use crate::foundation::geom::rect;

/// Anything exposing an animated rectangle on the plane.
pub trait Animatable {
    /// Current (animated) rectangle when `current` is set, else the target rectangle.
    fn rect(&self, current: bool) -> Rect;
    /// Advance animations. Returns whether anything moved this tick.
    fn update(&mut self) -> bool;
    /// Animate (or jump) to `bounds`.
    fn fit_bounds(&mut self, bounds: Rect, immediate: bool);
    /// Whether any animation is still in flight.
    fn is_animating(&self) -> bool;
}

/// Rectangle whose `x`, `y`, `width` and `height` are independent springs.
///
/// `version` increases every time the current rectangle changes, so consumers can cheaply
/// detect "bounds moved since I last looked".
#[derive(Clone, Debug)]
pub struct AnimatedRect {
    x: Spring,
    y: Spring,
    width: Spring,
    height: Spring,
    version: u64,
}

impl AnimatedRect {
    /// Create a resting rectangle at `bounds`.
    pub fn new(bounds: Rect, params: SpringParams, clock: SharedClock) -> Self {
        Self {
            x: Spring::new(bounds.x0, params, clock.clone()),
            y: Spring::new(bounds.y0, params, clock.clone()),
            width: Spring::new(bounds.width(), params, clock.clone()),
            height: Spring::new(bounds.height(), params, clock),
            version: 0,
        }
    }

    /// Monotonic change counter.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Re-target `x`/`y` so the target rectangle is centered on `center`.
    pub fn pan_to(&mut self, center: Point, immediate: bool) {
        let w = self.width.target();
        let h = self.height.target();
        self.x.spring_to(center.x - w / 2.0, immediate);
        self.y.spring_to(center.y - h / 2.0, immediate);
        self.touch(immediate);
    }

    /// Re-target individual fields. `None` leaves a field untouched.
    pub fn spring_fields(
        &mut self,
        x: Option<f64>,
        y: Option<f64>,
        width: Option<f64>,
        height: Option<f64>,
        immediate: bool,
    ) {
        for (spring, v) in [
            (&mut self.x, x),
            (&mut self.y, y),
            (&mut self.width, width),
            (&mut self.height, height),
        ] {
            if let Some(v) = v {
                spring.spring_to(v, immediate);
            }
        }
        self.touch(immediate);
    }

    fn touch(&mut self, immediate: bool) {
        if immediate {
            self.version = self.version.wrapping_add(1);
        }
    }
}

impl Animatable for AnimatedRect {
    fn rect(&self, current: bool) -> Rect {
        rect(
            self.x.get(current),
            self.y.get(current),
            self.width.get(current),
            self.height.get(current),
        )
    }

    fn update(&mut self) -> bool {
        let mut changed = false;
        for s in [
            &mut self.x,
            &mut self.y,
            &mut self.width,
            &mut self.height,
        ] {
            changed |= s.update();
        }
        if changed {
            self.version = self.version.wrapping_add(1);
        }
        changed
    }

    fn fit_bounds(&mut self, bounds: Rect, immediate: bool) {
        self.spring_fields(
            Some(bounds.x0),
            Some(bounds.y0),
            Some(bounds.width()),
            Some(bounds.height()),
            immediate,
        );
    }

    fn is_animating(&self) -> bool {
        self.x.is_animating()
            || self.y.is_animating()
            || self.width.is_animating()
            || self.height.is_animating()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/animated_rect.rs"]
mod tests;
