use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::clock::{SharedClock, SystemClock};
use crate::foundation::error::{ViewerError, ViewerResult};

/// Per-axis panning locks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BlockPanning {
    /// Ignore horizontal pans.
    pub horizontal: bool,
    /// Ignore vertical pans.
    pub vertical: bool,
}

/// Viewer tuning knobs. Every field has a default, so partial JSON documents are accepted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Spring animation length in seconds.
    pub animation_duration: f64,
    /// Tile and image fade-in length in seconds.
    pub blend_duration: f64,
    /// Exponential easing stiffness (`k`), must be > 0.
    pub spring_stiffness: f64,
    /// Maximum simultaneous tile fetches.
    pub loader_concurrency_limit: usize,
    /// Tile fetch timeout in milliseconds.
    pub loader_timeout: u64,
    /// Zoom factor applied per scroll step.
    pub zoom_per_scroll_step: f64,
    /// Maximum number of decoded tiles kept in memory.
    pub image_cache_quota: usize,
    /// Extra zoom the magnifier applies over the viewport.
    pub magnifier_zoom_factor: f64,
    /// Magnifier radius in pixels.
    pub magnifier_radius: f64,
    /// Minimum rendered pixel ratio before a level is drawn.
    pub min_pixel_ratio: f64,
    /// Keep the viewport within the content bounds.
    pub constrain_viewport: bool,
    /// Axis pan locks.
    pub block_panning: BlockPanning,
    /// Ignore zoom requests.
    pub block_zoom: bool,
    /// How far past full resolution (screen pixels per image pixel) zooming may go.
    pub max_zoom_pixel_ratio: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            animation_duration: 1.5,
            blend_duration: 0.5,
            spring_stiffness: 5.0,
            loader_concurrency_limit: 4,
            loader_timeout: 15_000,
            zoom_per_scroll_step: 1.2,
            image_cache_quota: 500,
            magnifier_zoom_factor: 2.0,
            magnifier_radius: 100.0,
            min_pixel_ratio: 0.5,
            constrain_viewport: false,
            block_panning: BlockPanning::default(),
            block_zoom: false,
            max_zoom_pixel_ratio: 2.0,
        }
    }
}

impl ViewerConfig {
    /// Parse and validate a configuration from a JSON string.
    pub fn from_json_str(s: &str) -> ViewerResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| ViewerError::serde(format!("parse viewer config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse and validate a configuration from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> ViewerResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| ViewerError::serde(format!("parse viewer config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse and validate a configuration file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ViewerResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ViewerError::validation(format!("open viewer config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> ViewerResult<()> {
        fn non_negative(name: &str, v: f64) -> ViewerResult<()> {
            if !v.is_finite() || v < 0.0 {
                return Err(ViewerError::validation(format!(
                    "{name} must be finite and >= 0"
                )));
            }
            Ok(())
        }
        fn positive(name: &str, v: f64) -> ViewerResult<()> {
            if !v.is_finite() || v <= 0.0 {
                return Err(ViewerError::validation(format!(
                    "{name} must be finite and > 0"
                )));
            }
            Ok(())
        }

        non_negative("animationDuration", self.animation_duration)?;
        non_negative("blendDuration", self.blend_duration)?;
        positive("springStiffness", self.spring_stiffness)?;
        positive("zoomPerScrollStep", self.zoom_per_scroll_step)?;
        positive("magnifierZoomFactor", self.magnifier_zoom_factor)?;
        non_negative("magnifierRadius", self.magnifier_radius)?;
        positive("minPixelRatio", self.min_pixel_ratio)?;
        positive("maxZoomPixelRatio", self.max_zoom_pixel_ratio)?;
        if self.loader_concurrency_limit == 0 {
            return Err(ViewerError::validation(
                "loaderConcurrencyLimit must be > 0",
            ));
        }
        if self.image_cache_quota == 0 {
            return Err(ViewerError::validation("imageCacheQuota must be > 0"));
        }
        Ok(())
    }

    /// Animation duration in milliseconds.
    pub fn animation_ms(&self) -> f64 {
        self.animation_duration * 1000.0
    }

    /// Blend duration in milliseconds.
    pub fn blend_ms(&self) -> f64 {
        self.blend_duration * 1000.0
    }
}

/// Explicit context handed to every component: configuration plus the shared time source.
#[derive(Clone)]
pub struct ViewerContext {
    /// Validated configuration.
    pub config: ViewerConfig,
    /// Time source for springs, blending and cache bookkeeping.
    pub clock: SharedClock,
}

impl std::fmt::Debug for ViewerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerContext")
            .field("config", &self.config)
            .field("now_ms", &self.clock.now_ms())
            .finish()
    }
}

impl ViewerContext {
    /// Validate `config` and bundle it with `clock`.
    pub fn new(config: ViewerConfig, clock: SharedClock) -> ViewerResult<Self> {
        config.validate()?;
        Ok(Self { config, clock })
    }

    /// Context with the given configuration and a wall clock.
    pub fn with_system_clock(config: ViewerConfig) -> ViewerResult<Self> {
        Self::new(config, SystemClock::shared())
    }

    /// Current time in milliseconds.
    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
