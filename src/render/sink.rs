use crate::foundation::core::{Layer, Point, Size};
use crate::foundation::error::ViewerResult;
use crate::tiles::tile::{TileImage, TileKey};

/// One tile as handed to a [`DrawSink`]: pixel placement, opacity, decoded pixels.
#[derive(Clone, Debug)]
pub struct DrawnTile {
    /// Tile identity.
    pub key: TileKey,
    /// Top-left in container pixels.
    pub position: Point,
    /// Size in container pixels.
    pub size: Size,
    /// Blend opacity times image opacity.
    pub opacity: f64,
    /// Premultiplied RGBA8 pixels.
    pub image: TileImage,
}

/// Consumer of the per-frame draw list.
///
/// Ordering contract: within a frame, `draw_tile` calls arrive back to front (lower resolution
/// first), and a tile assigned to [`Layer::Magnifier`] is also sent to [`Layer::Base`].
pub trait DrawSink {
    /// A new frame starts; clear whatever the previous frame left behind.
    fn begin_frame(&mut self, container: Size) -> ViewerResult<()>;
    /// Paint one tile on one layer.
    fn draw_tile(&mut self, layer: Layer, tile: &DrawnTile) -> ViewerResult<()>;
    /// The frame is complete.
    fn end_frame(&mut self) -> ViewerResult<()>;
}

/// Draw calls of one frame.
#[derive(Clone, Debug, Default)]
pub struct RecordedFrame {
    /// Container size passed to `begin_frame`.
    pub container: Size,
    /// Draw calls in arrival order.
    pub draws: Vec<(Layer, DrawnTile)>,
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Completed frames in order.
    pub frames: Vec<RecordedFrame>,
    open: Option<RecordedFrame>,
}

impl RecordingSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently completed frame.
    pub fn last(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }

    /// Keys drawn on `layer` in the last frame, in draw order.
    pub fn last_keys(&self, layer: Layer) -> Vec<TileKey> {
        self.last()
            .map(|f| {
                f.draws
                    .iter()
                    .filter(|(l, _)| *l == layer)
                    .map(|(_, t)| t.key)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl DrawSink for RecordingSink {
    fn begin_frame(&mut self, container: Size) -> ViewerResult<()> {
        self.open = Some(RecordedFrame {
            container,
            draws: Vec::new(),
        });
        Ok(())
    }

    fn draw_tile(&mut self, layer: Layer, tile: &DrawnTile) -> ViewerResult<()> {
        self.open
            .get_or_insert_with(RecordedFrame::default)
            .draws
            .push((layer, tile.clone()));
        Ok(())
    }

    fn end_frame(&mut self) -> ViewerResult<()> {
        if let Some(f) = self.open.take() {
            self.frames.push(f);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/sink.rs"]
mod tests;
