/// Resolves a tile identity to the opaque string handed to the tile fetcher.
pub trait TileAddressing: Send + Sync + std::fmt::Debug {
    /// Address of tile `(x, y)` at pyramid `level`.
    fn tile_url(&self, level: u32, x: u32, y: u32) -> String;
}

/// Deep Zoom layout: `{base}/{level}/{x}_{y}.{format}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DziAddressing {
    base: String,
    format: String,
}

impl DziAddressing {
    /// `base` is the `*_files` directory (trailing slashes are ignored), `format` the extension.
    pub fn new(base: impl Into<String>, format: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
            format: format.into(),
        }
    }
}

impl TileAddressing for DziAddressing {
    fn tile_url(&self, level: u32, x: u32, y: u32) -> String {
        format!("{}/{level}/{x}_{y}.{}", self.base, self.format)
    }
}
