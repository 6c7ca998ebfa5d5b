use std::collections::HashMap;

/// Inclusive column/row range of tiles considered at one level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRange {
    /// First column.
    pub x0: u32,
    /// First row.
    pub y0: u32,
    /// Last column.
    pub x1: u32,
    /// Last row.
    pub y1: u32,
}

impl TileRange {
    /// Whether `(x, y)` falls inside the range.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.x0..=self.x1).contains(&x) && (self.y0..=self.y1).contains(&y)
    }
}

#[derive(Debug, Default)]
struct LevelCoverage {
    range: Option<TileRange>,
    covers: HashMap<(u32, u32), bool>,
}

/// Which on-screen tiles are already fully painted, per `(image, level)`.
///
/// Only tiles inside the range enumerated this frame can contribute "not covered". Tiles outside it
/// are off screen, need nothing drawn, and therefore count as covered. A level that was never
/// enumerated provides no coverage at all.
#[derive(Debug, Default)]
pub struct CoverageMap {
    levels: HashMap<(usize, u32), LevelCoverage>,
}

impl CoverageMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.levels.clear();
    }

    /// Start a fresh table for `(image, level)` whose visible tiles are `range`.
    pub fn reset_level(&mut self, image: usize, level: u32, range: TileRange) {
        let entry = self.levels.entry((image, level)).or_default();
        entry.range = Some(range);
        entry.covers.clear();
    }

    /// Record whether tile `(x, y)` paints its full area.
    pub fn set(&mut self, image: usize, level: u32, x: u32, y: u32, covers: bool) {
        self.levels
            .entry((image, level))
            .or_default()
            .covers
            .insert((x, y), covers);
    }

    /// Whether tile `(x, y)` at `level` needs nothing beneath it.
    pub fn provides_coverage(&self, image: usize, level: u32, x: u32, y: u32) -> bool {
        let Some(table) = self.levels.get(&(image, level)) else {
            return false;
        };
        match table.range {
            Some(r) if r.contains(x, y) => table.covers.get(&(x, y)).copied().unwrap_or(false),
            Some(_) => true,
            None => table.covers.get(&(x, y)).copied().unwrap_or(false),
        }
    }

    /// Whether the four children of `(x, y)` one level up all provide coverage.
    pub fn is_covered(&self, image: usize, level: u32, x: u32, y: u32) -> bool {
        let (cx, cy) = (x * 2, y * 2);
        let up = level + 1;
        self.provides_coverage(image, up, cx, cy)
            && self.provides_coverage(image, up, cx + 1, cy)
            && self.provides_coverage(image, up, cx, cy + 1)
            && self.provides_coverage(image, up, cx + 1, cy + 1)
    }

    /// Whether every tile in the visible range of `(image, level)` provides coverage.
    pub fn level_fully_covered(&self, image: usize, level: u32) -> bool {
        let Some(table) = self.levels.get(&(image, level)) else {
            return false;
        };
        let Some(r) = table.range else {
            return table.covers.values().all(|c| *c);
        };
        (r.y0..=r.y1).all(|y| {
            (r.x0..=r.x1).all(|x| table.covers.get(&(x, y)).copied().unwrap_or(false))
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/coverage.rs"]
mod tests;
