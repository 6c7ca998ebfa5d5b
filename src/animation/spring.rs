use crate::animation::ease::Ease;
use crate::foundation::clock::SharedClock;
use crate::foundation::config::ViewerContext;

/// Timing parameters shared by every spring of one component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringParams {
    /// Length of one `spring_to` segment in milliseconds.
    pub duration_ms: f64,
    /// Progress easing.
    pub ease: Ease,
}

impl SpringParams {
    /// Parameters derived from the viewer configuration.
    pub fn from_context(ctx: &ViewerContext) -> Self {
        Self {
            duration_ms: ctx.config.animation_ms(),
            ease: Ease::Exponential {
                stiffness: ctx.config.spring_stiffness,
            },
        }
    }
}

/// Scalar animated from a start value to a target value over a fixed duration.
///
/// `current` always lies on the eased path between `start_value` and `target`, and equals
/// `target` once the clock passes `target_time`.
#[derive(Clone)]
pub struct Spring {
    current: f64,
    start_value: f64,
    target: f64,
    start_time: f64,
    target_time: f64,
    animating: bool,
    params: SpringParams,
    clock: SharedClock,
}

impl std::fmt::Debug for Spring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spring")
            .field("current", &self.current)
            .field("target", &self.target)
            .field("start_time", &self.start_time)
            .field("target_time", &self.target_time)
            .field("animating", &self.animating)
            .finish()
    }
}

impl Spring {
    /// Create a spring resting at `value`.
    pub fn new(value: f64, params: SpringParams, clock: SharedClock) -> Self {
        let now = clock.now_ms();
        Self {
            current: value,
            start_value: value,
            target: value,
            start_time: now,
            target_time: now,
            animating: false,
            params,
            clock,
        }
    }

    /// Start a new segment from the current value towards `target`.
    ///
    /// Immediate segments land on `target` without waiting for an `update`.
    pub fn spring_to(&mut self, target: f64, immediate: bool) {
        let now = self.clock.now_ms();
        self.start_value = self.current;
        self.start_time = now;
        self.target = target;
        if immediate || self.params.duration_ms <= 0.0 {
            self.target_time = now;
            self.current = target;
            self.animating = false;
        } else {
            self.target_time = now + self.params.duration_ms;
            self.animating = self.current != target;
        }
    }

    /// Jump to `target`.
    pub fn reset_to(&mut self, target: f64) {
        self.spring_to(target, true);
    }

    /// Advance `current` to the clock's now. Returns whether `current` changed.
    pub fn update(&mut self) -> bool {
        if !self.animating {
            return false;
        }
        let before = self.current;
        let now = self.clock.now_ms();
        if now >= self.target_time {
            self.current = self.target;
        } else {
            let t = (now - self.start_time) / (self.target_time - self.start_time);
            self.current =
                self.start_value + (self.target - self.start_value) * self.params.ease.apply(t);
        }
        if self.current == self.target {
            self.animating = false;
        }
        self.current != before
    }

    /// Whether `current` has not yet reached `target`.
    pub fn is_animating(&self) -> bool {
        self.animating
    }

    /// `current` if `current` is set, else the target.
    pub fn get(&self, current: bool) -> f64 {
        if current { self.current } else { self.target }
    }

    /// Target value.
    pub fn target(&self) -> f64 {
        self.target
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/spring.rs"]
mod tests;
