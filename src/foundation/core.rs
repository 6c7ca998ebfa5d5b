pub use kurbo::{Point, Rect, Size, Vec2};

/// One of the two plane axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Axis {
    /// Horizontal axis (`x`, width).
    Horizontal,
    /// Vertical axis (`y`, height).
    Vertical,
}

impl Axis {
    /// Both axes, horizontal first.
    pub const BOTH: [Axis; 2] = [Axis::Horizontal, Axis::Vertical];

    /// Component of `p` along this axis.
    pub fn of_point(self, p: Point) -> f64 {
        match self {
            Self::Horizontal => p.x,
            Self::Vertical => p.y,
        }
    }

    /// Extent of `s` along this axis.
    pub fn of_size(self, s: Size) -> f64 {
        match self {
            Self::Horizontal => s.width,
            Self::Vertical => s.height,
        }
    }
}

/// Draw layer a tile is assigned to.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Layer {
    /// Regular canvas layer.
    Base,
    /// Magnifier overlay layer.
    Magnifier,
}

impl Layer {
    /// All layers from `Base` up to and including `self`.
    pub fn up_to(self) -> &'static [Layer] {
        match self {
            Self::Base => &[Layer::Base],
            Self::Magnifier => &[Layer::Base, Layer::Magnifier],
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
