use std::sync::Arc;

use super::*;
use crate::assets::loader::{TileRequest, TileResponse};
use crate::assets::manifest::JsonManifestResolver;
use crate::foundation::clock::ManualClock;
use crate::foundation::config::ViewerConfig;
use crate::foundation::core::Layer;
use crate::render::sink::RecordingSink;

/// Answers every request on the next poll.
#[derive(Default)]
struct InstantLoader {
    done: Vec<TileResponse>,
}

impl TileLoader for InstantLoader {
    fn try_load(&mut self, request: TileRequest) -> Result<(), TileRequest> {
        self.done.push(TileResponse {
            key: request.key,
            generation: request.generation,
            result: Ok(Arc::new(image::RgbaImage::from_pixel(
                1,
                1,
                image::Rgba([1, 2, 3, 255]),
            ))),
        });
        Ok(())
    }

    fn poll_completed(&mut self) -> Vec<TileResponse> {
        std::mem::take(&mut self.done)
    }

    fn in_flight(&self) -> usize {
        self.done.len()
    }
}

fn manifest(width: u32, height: u32) -> ImageManifest {
    ImageManifest {
        width,
        height,
        tile_size: 256,
        tile_overlap: 0,
        min_level: 0,
        tiles_url: "tiles".to_string(),
        format: "png".to_string(),
        bounds: None,
    }
}

fn viewer() -> (Viewer, Arc<ManualClock>) {
    let clock = ManualClock::new(0.0);
    let ctx = ViewerContext::new(ViewerConfig::default(), clock.clone()).unwrap();
    let v = Viewer::new(ctx, Size::new(1000.0, 600.0), Box::new(InstantLoader::default())).unwrap();
    (v, clock)
}

fn open(v: &mut Viewer, m: ImageManifest) -> ViewerResult<usize> {
    v.open_image(&JsonManifestResolver, &ImageSource::Inline(m))
}

fn run_until_idle(v: &mut Viewer, clock: &ManualClock, sink: &mut RecordingSink) -> usize {
    for n in 0..5_000 {
        let out = v.frame(sink).unwrap();
        if out.state == FrameState::Idle {
            return n;
        }
        clock.advance(100.0);
    }
    panic!("viewer never went idle: {:?}", v.drawer().stats());
}

#[test]
fn opening_aligns_and_homes_the_viewport() {
    let (mut v, _clock) = viewer();
    let slot = open(&mut v, manifest(1000, 600)).unwrap();
    assert_eq!(slot, 0);
    assert!(v.image(0).is_some());

    let mut sink = RecordingSink::new();
    assert!(v.frame(&mut sink).unwrap().drew);
    assert_eq!(v.viewport().max_level(), 10);
    assert_eq!(v.viewport().max_zoom(), Some(2000.0));
    assert!((v.viewport().zoom(false) - 1000.0).abs() < 1e-9);
    assert_eq!(v.viewport().home_bounds(), rect(0.0, 0.0, 1.0, 0.6));
}

#[test]
fn failed_open_leaves_slot_empty_and_others_work() {
    let (mut v, _clock) = viewer();
    let err = open(&mut v, manifest(0, 600)).unwrap_err();
    assert!(matches!(err, ViewerError::Format(_)));
    assert_eq!(v.slot_count(), 1);
    assert!(v.image(0).is_none());

    assert_eq!(open(&mut v, manifest(1000, 600)).unwrap(), 1);
    let mut sink = RecordingSink::new();
    v.frame(&mut sink).unwrap();
    v.frame(&mut sink).unwrap();
    assert_eq!(v.drawer().stats().requests_issued, 2);
    assert_eq!(v.drawer().stats().tiles_loaded, 1);
}

#[test]
fn frames_wait_while_an_open_is_pending() {
    let (mut v, _clock) = viewer();
    let pending = v.begin_open();
    assert_eq!(pending.slot(), 0);

    let mut sink = RecordingSink::new();
    let out = v.frame(&mut sink).unwrap();
    assert_eq!(out.state, FrameState::LoadingGate);
    assert!(!out.drew);
    assert!(sink.frames.is_empty());

    v.complete_open(pending, Ok(manifest(1000, 600))).unwrap();
    let out = v.frame(&mut sink).unwrap();
    assert_eq!(out.state, FrameState::Running);
    assert!(out.drew);
}

#[test]
fn loop_settles_then_input_wakes_it() {
    let (mut v, clock) = viewer();
    open(&mut v, manifest(1000, 600)).unwrap();
    let mut sink = RecordingSink::new();
    run_until_idle(&mut v, &clock, &mut sink);
    assert!(v.is_settled());
    assert_eq!(sink.last_keys(Layer::Base).len(), 12);

    let frames = sink.frames.len();
    assert!(!v.frame(&mut sink).unwrap().drew);
    assert_eq!(sink.frames.len(), frames);

    v.pan_by_pixels(Vec2::new(100.0, 0.0), true);
    assert_eq!(v.state(), FrameState::Running);
    assert!(v.frame(&mut sink).unwrap().drew);
    assert!((v.viewport().rect(true).x0 - 0.1).abs() < 1e-9);
}

#[test]
fn scroll_zooms_by_configured_step_about_the_cursor() {
    let (mut v, clock) = viewer();
    open(&mut v, manifest(1000, 600)).unwrap();
    let mut sink = RecordingSink::new();
    v.frame(&mut sink).unwrap();

    let cursor = Point::new(250.0, 150.0);
    let under = v.viewport().point_from_pixel(cursor, true);
    v.scroll_at_pixel(2.0, cursor);
    assert!((v.viewport().zoom(false) - 1000.0 * 1.44).abs() < 1e-6);

    clock.advance(5_000.0);
    v.frame(&mut sink).unwrap();
    let back = v.viewport().pixel_from_point(under, true);
    assert!((back - cursor).hypot() < 1e-6);
}

#[test]
fn hidden_image_fades_out_and_stops_drawing() {
    let (mut v, clock) = viewer();
    open(&mut v, manifest(1000, 600)).unwrap();
    let mut sink = RecordingSink::new();
    run_until_idle(&mut v, &clock, &mut sink);

    v.hide_image(0, false);
    run_until_idle(&mut v, &clock, &mut sink);
    assert!(v.image(0).unwrap().is_hidden());
    assert!(sink.last_keys(Layer::Base).is_empty());

    v.show_image(0, true);
    v.frame(&mut sink).unwrap();
    assert_eq!(sink.last_keys(Layer::Base).len(), 12);
}

#[test]
fn off_screen_fade_still_settles() {
    let (mut v, clock) = viewer();
    open(&mut v, manifest(1000, 600)).unwrap();
    let mut sink = RecordingSink::new();
    run_until_idle(&mut v, &clock, &mut sink);

    v.viewport_mut().pan_to(Point::new(50.0, 50.0), true);
    v.hide_image(0, false);
    run_until_idle(&mut v, &clock, &mut sink);
    let img = v.image(0).unwrap();
    assert!(img.is_hidden());
    assert!(!img.is_blending());
    assert!(sink.last_keys(Layer::Base).is_empty());
}

#[test]
fn arrange_row_places_images_side_by_side() {
    let (mut v, clock) = viewer();
    open(&mut v, manifest(1000, 500)).unwrap();
    open(&mut v, manifest(500, 500)).unwrap();
    v.arrange(Layout::Row { gap: 0.5 }, true);
    let mut sink = RecordingSink::new();
    v.frame(&mut sink).unwrap();

    assert_eq!(v.image(0).unwrap().rect(false), rect(0.0, 0.0, 2.0, 1.0));
    assert_eq!(v.image(1).unwrap().rect(false), rect(2.5, 0.0, 1.0, 1.0));
    assert_eq!(v.viewport().home_bounds(), rect(0.0, 0.0, 3.5, 1.0));

    v.fit_all(true);
    clock.advance(10.0);
    v.frame(&mut sink).unwrap();
    let shown = v.viewport().rect(true);
    assert!(shown.x0 <= 0.0 + 1e-9 && shown.x1 >= 3.5 - 1e-9);
}

#[test]
fn resize_applies_on_next_frame() {
    let (mut v, _clock) = viewer();
    open(&mut v, manifest(1000, 600)).unwrap();
    let mut sink = RecordingSink::new();
    v.frame(&mut sink).unwrap();

    v.resize(Size::new(500.0, 300.0));
    assert_eq!(v.viewport().container_size(), Size::new(1000.0, 600.0));
    v.frame(&mut sink).unwrap();
    assert_eq!(v.viewport().container_size(), Size::new(500.0, 300.0));
    assert_eq!(sink.last().unwrap().container, Size::new(500.0, 300.0));
}

#[test]
fn closing_an_image_forgets_its_tiles() {
    let (mut v, clock) = viewer();
    open(&mut v, manifest(1000, 600)).unwrap();
    let mut sink = RecordingSink::new();
    run_until_idle(&mut v, &clock, &mut sink);
    assert!(!v.drawer().loaded_tiles().is_empty());

    v.close_image(0);
    assert!(v.image(0).is_none());
    assert!(v.drawer().loaded_tiles().is_empty());
    v.frame(&mut sink).unwrap();
    assert!(sink.last_keys(Layer::Base).is_empty());
}

#[test]
fn magnifier_adds_a_layer() {
    let (mut v, clock) = viewer();
    open(&mut v, manifest(1000, 600)).unwrap();
    let mut sink = RecordingSink::new();
    run_until_idle(&mut v, &clock, &mut sink);

    v.set_magnifier(Some(Point::new(500.0, 300.0)));
    run_until_idle(&mut v, &clock, &mut sink);
    assert!(!sink.last_keys(Layer::Magnifier).is_empty());

    v.set_magnifier(None);
    v.frame(&mut sink).unwrap();
    assert!(sink.last_keys(Layer::Magnifier).is_empty());
}
