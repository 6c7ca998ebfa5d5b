//! Deepzoom is an engine for viewing very large images that were pre-sliced into tile pyramids.
//!
//! Several pyramid images share one virtual plane. An animated [`Viewport`] looks onto that plane,
//! and every frame the [`Drawer`] works out which tiles are needed, fetches the most urgent one,
//! blends tiles in as they arrive and keeps the decoded-tile cache within its quota.
//!
//! # Frame overview
//!
//! 1. **Input**: pan/zoom/resize calls on the [`Viewer`] retarget springs and wake the frame loop.
//! 2. **Animate**: viewport and image springs advance against the shared [`Clock`].
//! 3. **Select**: per image, pick the level to draw, enumerate visible tiles, track coverage.
//! 4. **Fetch**: hand the single best unloaded tile to the bounded [`TileLoader`].
//! 5. **Draw**: emit tiles back to front to a [`DrawSink`]; report whether more frames are needed.
//!
//! Coordinates come in three flavours: *plane points* (stable under pan and zoom), *container
//! pixels*, and per-image *source pixels* at full resolution.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Explicit context**: configuration and the clock travel in a [`ViewerContext`]; there are
//!   no globals.
//! - **Single-threaded frames**: only tile fetches run off-thread; their results are polled back
//!   onto the frame loop.
//! - **Premultiplied RGBA8** tiles end-to-end.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod assets;
mod controller;
mod foundation;
mod render;
mod tiles;
mod viewport;

pub use animation::animated_rect::{Animatable, AnimatedRect};
pub use animation::ease::Ease;
pub use animation::spring::{Spring, SpringParams};
pub use assets::decode::{decode_tile, load_tile_file};
pub use assets::loader::{
    FsTileFetcher, ThreadedLoader, TileFetcher, TileLoader, TileRequest, TileResponse,
};
pub use assets::manifest::{
    ImageManifest, ImageSource, JsonManifestResolver, ManifestBounds, ManifestResolver,
};
pub use controller::layout::Layout;
pub use controller::viewer::{FrameOutcome, FrameState, PendingOpen, Viewer};
pub use foundation::clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use foundation::config::{BlockPanning, ViewerConfig, ViewerContext};
pub use foundation::core::{Axis, Layer, Point, Rect, Size, Vec2};
pub use foundation::error::{ViewerError, ViewerResult};
pub use foundation::geom::{
    Segment, aspect_ratio, clip_rect, contains_point, grow_to_aspect, rect, rects_intersect,
};
pub use render::coverage::{CoverageMap, TileRange};
pub use render::drawer::{Drawer, DrawerStats, Magnifier};
pub use render::raster::RasterSink;
pub use render::sink::{DrawSink, DrawnTile, RecordedFrame, RecordingSink};
pub use tiles::addressing::{DziAddressing, TileAddressing};
pub use tiles::tile::{LoadCandidate, Tile, TileImage, TileKey, prefer_candidate, prefer_eviction};
pub use tiles::tiled_image::{PyramidDesc, TiledImage, max_level_for};
pub use viewport::viewport::Viewport;
