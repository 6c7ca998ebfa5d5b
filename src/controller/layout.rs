use crate::foundation::core::{Rect, Size};
use crate::foundation::geom::rect;

/// Automatic placement of several images on the plane.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Layout {
    /// Left to right, every image one unit tall.
    Row {
        /// Horizontal spacing in plane units.
        gap: f64,
    },
    /// Unit-square cells filled row by row; images are centered in their cell.
    Grid {
        /// Cells per row (at least one).
        columns: usize,
        /// Spacing between cells in plane units.
        gap: f64,
    },
}

impl Layout {
    /// Placement rectangle for each of `sizes`, in order.
    pub fn place(&self, sizes: &[Size]) -> Vec<Rect> {
        match *self {
            Layout::Row { gap } => {
                let gap = gap.max(0.0);
                let mut x = 0.0;
                sizes
                    .iter()
                    .map(|s| {
                        let w = aspect(*s);
                        let r = rect(x, 0.0, w, 1.0);
                        x += w + gap;
                        r
                    })
                    .collect()
            }
            Layout::Grid { columns, gap } => {
                let columns = columns.max(1);
                let gap = gap.max(0.0);
                sizes
                    .iter()
                    .enumerate()
                    .map(|(i, s)| {
                        let cx = (i % columns) as f64 * (1.0 + gap);
                        let cy = (i / columns) as f64 * (1.0 + gap);
                        let a = aspect(*s);
                        let (w, h) = if a >= 1.0 { (1.0, 1.0 / a) } else { (a, 1.0) };
                        rect(cx + (1.0 - w) / 2.0, cy + (1.0 - h) / 2.0, w, h)
                    })
                    .collect()
            }
        }
    }
}

fn aspect(s: Size) -> f64 {
    if s.height > 0.0 && s.width > 0.0 {
        s.width / s.height
    } else {
        1.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/controller/layout.rs"]
mod tests;
