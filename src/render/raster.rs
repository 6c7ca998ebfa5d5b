use std::path::Path;

use anyhow::Context;
use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::foundation::core::{Layer, Size};
use crate::foundation::error::{ViewerError, ViewerResult};
use crate::foundation::math::{PremulRgba8, over};
use crate::render::sink::{DrawSink, DrawnTile};

/// CPU sink compositing tiles into one premultiplied RGBA8 canvas per layer.
#[derive(Debug)]
pub struct RasterSink {
    base: RgbaImage,
    magnifier: RgbaImage,
    filter: FilterType,
}

impl Default for RasterSink {
    fn default() -> Self {
        Self {
            base: RgbaImage::new(0, 0),
            magnifier: RgbaImage::new(0, 0),
            filter: FilterType::Triangle,
        }
    }
}

impl RasterSink {
    /// Sink with empty canvases; they are sized on the first `begin_frame`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resampling filter used when scaling tiles.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Canvas of `layer` as painted so far.
    pub fn canvas(&self, layer: Layer) -> &RgbaImage {
        match layer {
            Layer::Base => &self.base,
            Layer::Magnifier => &self.magnifier,
        }
    }

    /// Write the base layer as PNG (pixels stay premultiplied; opaque content is unaffected).
    pub fn save_png(&self, path: &Path) -> ViewerResult<()> {
        self.base
            .save(path)
            .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }

    fn composite(&mut self, layer: Layer, tile: &DrawnTile) -> ViewerResult<()> {
        let filter = self.filter;
        let canvas = match layer {
            Layer::Base => &mut self.base,
            Layer::Magnifier => &mut self.magnifier,
        };
        let (cw, ch) = canvas.dimensions();
        let (tw, th) = tile.image.dimensions();
        if tw == 0 || th == 0 || tile.size.width <= 0.0 || tile.size.height <= 0.0 {
            return Ok(());
        }

        // Destination span in whole pixels, clipped to the canvas.
        let dx0 = tile.position.x.round().max(0.0);
        let dy0 = tile.position.y.round().max(0.0);
        let dx1 = (tile.position.x + tile.size.width).round().min(f64::from(cw));
        let dy1 = (tile.position.y + tile.size.height).round().min(f64::from(ch));
        if dx1 <= dx0 || dy1 <= dy0 {
            return Ok(());
        }

        // Matching source span.
        let sx_per_px = f64::from(tw) / tile.size.width;
        let sy_per_px = f64::from(th) / tile.size.height;
        let sx0 = ((dx0 - tile.position.x) * sx_per_px).floor().clamp(0.0, f64::from(tw - 1));
        let sy0 = ((dy0 - tile.position.y) * sy_per_px).floor().clamp(0.0, f64::from(th - 1));
        let sx1 = ((dx1 - tile.position.x) * sx_per_px).ceil().clamp(sx0 + 1.0, f64::from(tw));
        let sy1 = ((dy1 - tile.position.y) * sy_per_px).ceil().clamp(sy0 + 1.0, f64::from(th));

        let (dw, dh) = ((dx1 - dx0) as u32, (dy1 - dy0) as u32);
        let crop = imageops::crop_imm(
            &*tile.image,
            sx0 as u32,
            sy0 as u32,
            (sx1 - sx0) as u32,
            (sy1 - sy0) as u32,
        )
        .to_image();
        let scaled = if crop.dimensions() == (dw, dh) {
            crop
        } else {
            imageops::resize(&crop, dw, dh, filter)
        };

        let opacity = tile.opacity as f32;
        let (ox, oy) = (dx0 as u32, dy0 as u32);
        for (x, y, src) in scaled.enumerate_pixels() {
            let (cx, cy) = (ox + x, oy + y);
            if cx >= cw || cy >= ch {
                continue;
            }
            let dst = canvas.get_pixel_mut(cx, cy);
            let out: PremulRgba8 = over(dst.0, src.0, opacity);
            dst.0 = out;
        }
        Ok(())
    }
}

impl DrawSink for RasterSink {
    fn begin_frame(&mut self, container: Size) -> ViewerResult<()> {
        if !(container.width >= 1.0 && container.height >= 1.0) || !container.is_finite() {
            return Err(ViewerError::validation(format!(
                "raster canvas must be at least 1x1 pixels, got {}x{}",
                container.width, container.height
            )));
        }
        let (w, h) = (container.width.round() as u32, container.height.round() as u32);
        for canvas in [&mut self.base, &mut self.magnifier] {
            if canvas.dimensions() == (w, h) {
                canvas.pixels_mut().for_each(|p| p.0 = [0, 0, 0, 0]);
            } else {
                *canvas = RgbaImage::new(w, h);
            }
        }
        Ok(())
    }

    fn draw_tile(&mut self, layer: Layer, tile: &DrawnTile) -> ViewerResult<()> {
        self.composite(layer, tile)
    }

    fn end_frame(&mut self) -> ViewerResult<()> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
