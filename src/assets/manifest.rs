use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::config::ViewerContext;
use crate::foundation::core::Rect;
use crate::foundation::error::{ViewerError, ViewerResult};
use crate::foundation::geom::rect;
use crate::tiles::addressing::DziAddressing;
use crate::tiles::tiled_image::{PyramidDesc, TiledImage, max_level_for};

/// Placement rectangle as written in manifests.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ManifestBounds {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

fn default_format() -> String {
    "jpg".to_string()
}

/// Everything needed to build a [`TiledImage`]: pyramid geometry, tile location, placement.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageManifest {
    /// Full-resolution width in pixels.
    pub width: u32,
    /// Full-resolution height in pixels.
    pub height: u32,
    /// Tile edge in pixels.
    pub tile_size: u32,
    /// Overlap in pixels.
    #[serde(default)]
    pub tile_overlap: u32,
    /// Lowest level to request.
    #[serde(default)]
    pub min_level: u32,
    /// Tile directory (the DZI `*_files` folder).
    pub tiles_url: String,
    /// Tile file extension.
    #[serde(default = "default_format")]
    pub format: String,
    /// Default placement on the plane.
    #[serde(default)]
    pub bounds: Option<ManifestBounds>,
}

impl ImageManifest {
    /// Parse a manifest from JSON text.
    pub fn from_json_str(s: &str) -> ViewerResult<Self> {
        let m: Self = serde_json::from_str(s)
            .map_err(|e| ViewerError::format(format!("parse image manifest JSON: {e}")))?;
        m.validate()?;
        Ok(m)
    }

    /// Parse a manifest file.
    pub fn from_path(path: impl AsRef<Path>) -> ViewerResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ViewerError::format(format!("open image manifest '{}': {e}", path.display()))
        })?;
        let m: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            ViewerError::format(format!("parse image manifest '{}': {e}", path.display()))
        })?;
        m.validate()?;
        Ok(m)
    }

    /// Reject descriptors no pyramid can be built from.
    pub fn validate(&self) -> ViewerResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ViewerError::format("manifest width and height must be > 0"));
        }
        if self.tile_size == 0 {
            return Err(ViewerError::format("manifest tileSize must be > 0"));
        }
        if self.min_level > max_level_for(self.width, self.height) {
            return Err(ViewerError::format("manifest minLevel exceeds the pyramid depth"));
        }
        if self.tiles_url.is_empty() {
            return Err(ViewerError::format("manifest tilesUrl must be non-empty"));
        }
        if let Some(b) = self.bounds
            && !(b.width > 0.0 && b.height > 0.0 && b.x.is_finite() && b.y.is_finite())
        {
            return Err(ViewerError::format(
                "manifest bounds must be finite with positive size",
            ));
        }
        Ok(())
    }

    /// Pyramid geometry.
    pub fn pyramid(&self) -> PyramidDesc {
        PyramidDesc {
            width: self.width,
            height: self.height,
            tile_size: self.tile_size,
            tile_overlap: self.tile_overlap,
            min_level: self.min_level,
        }
    }

    /// Default placement, if the manifest names one.
    pub fn placement(&self) -> Option<Rect> {
        self.bounds.map(|b| rect(b.x, b.y, b.width, b.height))
    }

    /// Build the image this manifest describes, addressed with the DZI layout.
    pub fn build(&self, ctx: &ViewerContext) -> ViewerResult<TiledImage> {
        self.validate()?;
        TiledImage::new(
            self.pyramid(),
            self.placement(),
            Arc::new(DziAddressing::new(self.tiles_url.clone(), self.format.clone())),
            ctx,
        )
    }
}

/// Where an image descriptor comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageSource {
    /// Manifest file on disk.
    Path(PathBuf),
    /// Already-parsed manifest.
    Inline(ImageManifest),
}

/// Turns an [`ImageSource`] into a manifest.
pub trait ManifestResolver {
    /// Resolve `source`, or fail with a [`ViewerError::Format`].
    fn resolve(&self, source: &ImageSource) -> ViewerResult<ImageManifest>;
}

/// Reads JSON manifests from disk; relative tile directories are kept relative to the manifest.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonManifestResolver;

impl ManifestResolver for JsonManifestResolver {
    fn resolve(&self, source: &ImageSource) -> ViewerResult<ImageManifest> {
        match source {
            ImageSource::Inline(m) => {
                m.validate()?;
                Ok(m.clone())
            }
            ImageSource::Path(p) => {
                let mut m = ImageManifest::from_path(p)?;
                if Path::new(&m.tiles_url).is_relative()
                    && let Some(dir) = p.parent()
                    && !dir.as_os_str().is_empty()
                {
                    m.tiles_url = dir.join(&m.tiles_url).to_string_lossy().into_owned();
                }
                Ok(m)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/manifest.rs"]
mod tests;
