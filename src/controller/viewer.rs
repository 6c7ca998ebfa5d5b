use crate::animation::animated_rect::Animatable;
use crate::assets::loader::TileLoader;
use crate::assets::manifest::{ImageManifest, ImageSource, ManifestResolver};
use crate::controller::layout::Layout;
use crate::foundation::config::ViewerContext;
use crate::foundation::core::{Point, Rect, Size, Vec2};
use crate::foundation::error::{ViewerError, ViewerResult};
use crate::foundation::geom::rect;
use crate::render::drawer::{Drawer, Magnifier};
use crate::render::sink::DrawSink;
use crate::tiles::tiled_image::TiledImage;
use crate::viewport::viewport::Viewport;

/// Scheduling state of the frame loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameState {
    /// Frames are being produced.
    Running,
    /// Nothing is animating or loading; frames are no-ops until an input restores updating.
    Idle,
    /// Images are being registered; frames are paused until every open completes.
    LoadingGate,
}

/// What one call to [`Viewer::frame`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameOutcome {
    /// State after the frame.
    pub state: FrameState,
    /// Whether the drawer produced a frame for the sink.
    pub drew: bool,
}

/// Handle for an image open that has been started but not completed.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an open that is never completed keeps the frame loop gated"]
pub struct PendingOpen {
    slot: usize,
}

impl PendingOpen {
    /// Registry slot the image will occupy.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// Viewer controller: image registry, viewport, drawer and the frame loop that ties them together.
#[derive(Debug)]
pub struct Viewer {
    ctx: ViewerContext,
    viewport: Viewport,
    images: Vec<Option<TiledImage>>,
    drawer: Drawer,
    state: FrameState,
    force_redraw: bool,
    force_align: bool,
    pending_opens: usize,
    pending_container: Option<Size>,
    homed: bool,
}

impl Viewer {
    /// Viewer for a container of `container` pixels, fetching tiles through `loader`.
    pub fn new(
        ctx: ViewerContext,
        container: Size,
        loader: Box<dyn TileLoader>,
    ) -> ViewerResult<Self> {
        if !(container.width > 0.0 && container.height > 0.0) {
            return Err(ViewerError::validation("container size must be > 0"));
        }
        let viewport = Viewport::new(
            container,
            rect(0.0, 0.0, 1.0, container.height / container.width),
            &ctx,
        )?;
        let drawer = Drawer::new(loader, &ctx);
        Ok(Self {
            ctx,
            viewport,
            images: Vec::new(),
            drawer,
            state: FrameState::Running,
            force_redraw: true,
            force_align: false,
            pending_opens: 0,
            pending_container: None,
            homed: false,
        })
    }

    /// Shared configuration and clock.
    pub fn context(&self) -> &ViewerContext {
        &self.ctx
    }

    /// The viewport.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Mutable viewport access; wakes the frame loop.
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        self.restore_updating();
        &mut self.viewport
    }

    /// The drawer.
    pub fn drawer(&self) -> &Drawer {
        &self.drawer
    }

    /// Image in registry slot `slot`, if it opened successfully.
    pub fn image(&self, slot: usize) -> Option<&TiledImage> {
        self.images.get(slot).and_then(Option::as_ref)
    }

    /// Number of registry slots, including failed or closed ones.
    pub fn slot_count(&self) -> usize {
        self.images.len()
    }

    /// Current loop state.
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Whether nothing is animating, blending, loading or waiting to open.
    pub fn is_settled(&self) -> bool {
        self.state == FrameState::Idle && self.pending_opens == 0 && self.drawer.in_flight() == 0
    }

    /// Wake the frame loop and request a redraw.
    pub fn restore_updating(&mut self) {
        self.force_redraw = true;
        if self.state == FrameState::Idle {
            tracing::debug!("frame loop resumed");
            self.state = FrameState::Running;
        }
    }

    /// Request a re-alignment (max level, max zoom, constraint and home bounds) on the next frame.
    pub fn force_align(&mut self) {
        self.force_align = true;
        self.restore_updating();
    }

    /// Reserve a registry slot for an image whose descriptor is still being resolved.
    pub fn begin_open(&mut self) -> PendingOpen {
        let slot = self.images.len();
        self.images.push(None);
        self.pending_opens += 1;
        self.state = FrameState::LoadingGate;
        PendingOpen { slot }
    }

    /// Finish an open started with [`Viewer::begin_open`].
    ///
    /// A failed descriptor leaves the slot empty; other images are unaffected.
    pub fn complete_open(
        &mut self,
        pending: PendingOpen,
        manifest: ViewerResult<ImageManifest>,
    ) -> ViewerResult<usize> {
        let slot = pending.slot;
        self.pending_opens = self.pending_opens.saturating_sub(1);
        if self.pending_opens == 0 && self.state == FrameState::LoadingGate {
            self.state = FrameState::Running;
        }
        self.force_redraw = true;

        let image = manifest.and_then(|m| m.build(&self.ctx));
        match image {
            Ok(image) => {
                if let Some(entry) = self.images.get_mut(slot) {
                    *entry = Some(image);
                }
                self.force_align = true;
                tracing::debug!(slot, "image opened");
                Ok(slot)
            }
            Err(e) => {
                tracing::warn!(slot, error = %e, "image open failed");
                Err(e)
            }
        }
    }

    /// Resolve `source` and register the image it describes.
    #[tracing::instrument(skip(self, resolver))]
    pub fn open_image(
        &mut self,
        resolver: &dyn ManifestResolver,
        source: &ImageSource,
    ) -> ViewerResult<usize> {
        let pending = self.begin_open();
        let manifest = resolver.resolve(source);
        self.complete_open(pending, manifest)
    }

    /// Drop the image in `slot`.
    pub fn close_image(&mut self, slot: usize) {
        if let Some(entry) = self.images.get_mut(slot)
            && entry.take().is_some()
        {
            self.drawer.forget_image(slot);
            self.force_align();
        }
    }

    /// Fade the image in `slot` in.
    pub fn show_image(&mut self, slot: usize, immediate: bool) {
        if let Some(img) = self.images.get_mut(slot).and_then(Option::as_mut) {
            img.show(immediate);
            self.restore_updating();
        }
    }

    /// Fade the image in `slot` out.
    pub fn hide_image(&mut self, slot: usize, immediate: bool) {
        if let Some(img) = self.images.get_mut(slot).and_then(Option::as_mut) {
            img.hide(immediate);
            self.restore_updating();
        }
    }

    /// Move the image in `slot` to `bounds`.
    pub fn place_image(&mut self, slot: usize, bounds: Rect, immediate: bool) {
        if let Some(img) = self.images.get_mut(slot).and_then(Option::as_mut) {
            img.fit_bounds(bounds, immediate);
            self.force_align();
        }
    }

    /// Re-place every open image according to `layout`.
    pub fn arrange(&mut self, layout: Layout, immediate: bool) {
        let slots: Vec<usize> = (0..self.images.len())
            .filter(|i| self.images[*i].is_some())
            .collect();
        let sizes: Vec<Size> = slots
            .iter()
            .filter_map(|i| self.images[*i].as_ref())
            .map(|img| Size::new(f64::from(img.width()), f64::from(img.height())))
            .collect();
        for (slot, bounds) in slots.into_iter().zip(layout.place(&sizes)) {
            if let Some(img) = self.images[slot].as_mut() {
                img.fit_bounds(bounds, immediate);
            }
        }
        self.force_align();
    }

    /// Show all content (the home bounds).
    pub fn fit_all(&mut self, immediate: bool) {
        self.align();
        self.viewport.go_home(immediate);
        self.restore_updating();
    }

    /// Move the view by `delta` container pixels.
    pub fn pan_by_pixels(&mut self, delta: Vec2, immediate: bool) {
        let d = self.viewport.delta_points_from_pixels(delta, false);
        self.viewport.pan_by(d, immediate);
        self.restore_updating();
    }

    /// Zoom by `factor` keeping the plane point under `pixel` fixed.
    pub fn zoom_at_pixel(&mut self, factor: f64, pixel: Point, immediate: bool) {
        let reference = self.viewport.point_from_pixel(pixel, true);
        self.viewport.zoom_by(factor, immediate, Some(reference));
        self.restore_updating();
    }

    /// Zoom by `steps` scroll-wheel notches at `pixel` (negative steps zoom out).
    pub fn scroll_at_pixel(&mut self, steps: f64, pixel: Point) {
        let factor = self.ctx.config.zoom_per_scroll_step.powf(steps);
        self.zoom_at_pixel(factor, pixel, false);
    }

    /// The container changed size; applied at the start of the next frame.
    pub fn resize(&mut self, container: Size) {
        self.pending_container = Some(container);
        self.restore_updating();
    }

    /// Show the magnifier centered at `center` (container pixels), or hide it.
    pub fn set_magnifier(&mut self, center: Option<Point>) {
        let radius = self.ctx.config.magnifier_radius;
        self.drawer
            .set_magnifier(center.map(|center| Magnifier { center, radius }));
        self.restore_updating();
    }

    /// Forget every tile; everything is fetched again.
    pub fn reset(&mut self) {
        self.drawer.reset();
        self.restore_updating();
    }

    /// Recompute what depends on the set of images and their target bounds.
    fn align(&mut self) {
        let mut max_level: Option<i32> = None;
        let mut max_zoom: Option<f64> = None;
        let mut union: Option<Rect> = None;
        for img in self.images.iter().flatten() {
            let target = img.rect(false);
            let level = img.viewport_level(img.max_level() as i32, false);
            max_level = Some(max_level.map_or(level, |m| m.max(level)));
            let zoom =
                f64::from(img.width()) / target.width() * self.ctx.config.max_zoom_pixel_ratio;
            max_zoom = Some(max_zoom.map_or(zoom, |m| m.max(zoom)));
            union = Some(union.map_or(target, |u| u.union(target)));
        }

        if let Some(level) = max_level {
            self.viewport.set_max_level(level.max(0));
        }
        self.viewport.set_max_zoom(max_zoom);
        if let Some(u) = union {
            self.viewport.set_constraint_bounds(Some(u));
            self.viewport.set_home_bounds(u);
            if !self.homed {
                self.homed = true;
                self.viewport.go_home(true);
            } else {
                self.viewport.apply_constraints(false, None);
            }
        }
        tracing::debug!(?max_level, ?max_zoom, "viewer aligned");
    }

    /// Run one frame: apply arrivals and resizes, advance animations and draw when anything moved.
    ///
    /// Call it once per display refresh. Once the loop is idle it only polls for tile arrivals,
    /// which wake it up again.
    pub fn frame(&mut self, sink: &mut dyn DrawSink) -> ViewerResult<FrameOutcome> {
        self.drawer.collect_loads();
        if self.drawer.take_redraw_request() {
            self.restore_updating();
        }

        if self.pending_opens > 0 {
            self.state = FrameState::LoadingGate;
            return Ok(self.outcome(false));
        }
        if self.state == FrameState::Idle {
            return Ok(self.outcome(false));
        }

        if let Some(container) = self.pending_container.take() {
            self.viewport.resize(container);
            self.force_align = true;
        }

        let mut animated = self.viewport.update();

        for img in self.images.iter_mut().flatten() {
            animated |= img.update();
            if img.take_align_request() || img.is_animating() {
                self.force_align = true;
            }
            animated |= img.is_blending();
        }
        if std::mem::take(&mut self.force_align) {
            self.align();
            animated = true;
        }

        if animated || std::mem::take(&mut self.force_redraw) {
            let more = self
                .drawer
                .update(&self.viewport, &mut self.images, sink)?;
            self.force_redraw = more || self.viewport.is_animating();
            self.state = FrameState::Running;
            return Ok(self.outcome(true));
        }

        tracing::debug!("frame loop idle");
        self.state = FrameState::Idle;
        Ok(self.outcome(false))
    }

    fn outcome(&self, drew: bool) -> FrameOutcome {
        FrameOutcome {
            state: self.state,
            drew,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/controller/viewer.rs"]
mod tests;
