use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{ViewerError, ViewerResult};
use crate::foundation::math::premultiply_rgba8_in_place;
use crate::tiles::tile::TileImage;

/// Decode encoded tile bytes (PNG, JPEG, ...) into premultiplied RGBA8.
pub fn decode_tile(bytes: &[u8]) -> ViewerResult<TileImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode tile from memory")?;
    let mut rgba = dyn_img.to_rgba8();
    premultiply_rgba8_in_place(&mut rgba);
    Ok(Arc::new(rgba))
}

/// Read and decode a tile file.
pub fn load_tile_file(path: &Path) -> ViewerResult<TileImage> {
    let bytes = std::fs::read(path)
        .map_err(|e| ViewerError::load(format!("read tile '{}': {e}", path.display())))?;
    decode_tile(&bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
