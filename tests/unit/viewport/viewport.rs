use super::*;
use crate::foundation::clock::ManualClock;
use crate::foundation::config::ViewerConfig;

fn ctx_with(config: ViewerConfig) -> ViewerContext {
    ViewerContext::new(config, ManualClock::new(0.0)).unwrap()
}

fn viewport(container: (f64, f64), bounds: Rect) -> Viewport {
    Viewport::new(
        Size::new(container.0, container.1),
        bounds,
        &ctx_with(ViewerConfig::default()),
    )
    .unwrap()
}

fn assert_rect_near(a: Rect, b: Rect) {
    let close = |x: f64, y: f64| (x - y).abs() < 1e-9;
    assert!(
        close(a.x0, b.x0) && close(a.y0, b.y0) && close(a.x1, b.x1) && close(a.y1, b.y1),
        "{a:?} != {b:?}"
    );
}

#[test]
fn pan_by_moves_immediately() {
    let mut vp = viewport((100.0, 100.0), rect(0.0, 0.0, 100.0, 100.0));
    vp.pan_by(Vec2::new(10.0, 0.0), true);
    assert_rect_near(vp.rect(true), rect(10.0, 0.0, 100.0, 100.0));
}

#[test]
fn zoom_under_cursor_keeps_reference_fixed() {
    let mut vp = viewport((100.0, 100.0), rect(0.0, 0.0, 100.0, 100.0));
    assert_eq!(vp.zoom(true), 1.0);
    let p = Point::new(50.0, 50.0);
    let px_before = vp.pixel_from_point(p, true);
    vp.zoom_to(2.0, true, Some(p));
    assert_rect_near(vp.rect(true), rect(25.0, 25.0, 50.0, 50.0));
    assert_eq!(vp.zoom(true), 2.0);
    let px_after = vp.pixel_from_point(p, true);
    assert!((px_after - px_before).hypot() < 1e-9);
    assert!((vp.point_from_pixel(px_after, true) - p).hypot() < 1e-9);
}

#[test]
fn zoom_about_off_center_point() {
    let mut vp = viewport((100.0, 100.0), rect(0.0, 0.0, 100.0, 100.0));
    let p = Point::new(20.0, 80.0);
    let px = vp.pixel_from_point(p, true);
    vp.zoom_by(4.0, true, Some(p));
    assert!((vp.pixel_from_point(p, true) - px).hypot() < 1e-9);
    assert!((vp.rect(true).width() - 25.0).abs() < 1e-12);
}

#[test]
fn conversions_round_trip() {
    let mut vp = viewport((640.0, 480.0), rect(0.0, 0.0, 1.0, 0.75));
    vp.zoom_to(3000.0, true, Some(Point::new(0.3, 0.2)));
    vp.pan_by(Vec2::new(0.01, -0.02), true);
    for p in [
        Point::new(0.0, 0.0),
        Point::new(0.31, 0.17),
        Point::new(-4.0, 9.5),
    ] {
        let back = vp.point_from_pixel(vp.pixel_from_point(p, true), true);
        assert!((back - p).hypot() < 1e-9);
    }
    let v = Vec2::new(0.5, -0.25);
    let back = vp.delta_points_from_pixels(vp.delta_pixels_from_points(v, false), false);
    assert!((back - v).hypot() < 1e-12);

    let r = rect(0.2, 0.1, 0.05, 0.05);
    assert_rect_near(
        vp.point_rect_from_pixel_rect(vp.pixel_rect_from_point_rect(r, true), true),
        r,
    );
}

#[test]
fn animated_zoom_converges() {
    let clock = ManualClock::new(0.0);
    let ctx = ViewerContext::new(ViewerConfig::default(), clock.clone()).unwrap();
    let mut vp = Viewport::new(Size::new(100.0, 100.0), rect(0.0, 0.0, 100.0, 100.0), &ctx).unwrap();
    vp.zoom_to(2.0, false, None);
    assert!(vp.is_animating());
    assert_eq!(vp.zoom(true), 1.0);
    assert_eq!(vp.zoom(false), 2.0);
    clock.advance(500.0);
    assert!(vp.update());
    assert!(vp.zoom(true) > 1.0 && vp.zoom(true) < 2.0);
    clock.advance(2000.0);
    vp.update();
    assert_eq!(vp.zoom(true), 2.0);
    assert!(!vp.is_animating());
}

#[test]
fn fit_bounds_grows_to_viewport_aspect() {
    let mut vp = viewport((200.0, 100.0), rect(0.0, 0.0, 200.0, 100.0));
    vp.fit_bounds(rect(0.0, 0.0, 10.0, 10.0), true);
    assert_rect_near(vp.rect(true), rect(-5.0, 0.0, 20.0, 10.0));
    vp.fit_bounds(rect(0.0, 0.0, 40.0, 5.0), true);
    assert_rect_near(vp.rect(true), rect(0.0, -7.5, 40.0, 20.0));
}

#[test]
fn resize_preserves_zoom() {
    let mut vp = viewport((100.0, 100.0), rect(0.0, 0.0, 100.0, 100.0));
    vp.resize(Size::new(200.0, 100.0));
    assert_eq!(vp.container_size(), Size::new(200.0, 100.0));
    assert_rect_near(vp.rect(true), rect(0.0, 0.0, 200.0, 100.0));
    assert_eq!(vp.zoom(true), 1.0);
}

fn constrained(container: (f64, f64), bounds: Rect, c: Rect) -> Viewport {
    let config = ViewerConfig {
        constrain_viewport: true,
        ..ViewerConfig::default()
    };
    let mut vp = Viewport::new(Size::new(container.0, container.1), bounds, &ctx_with(config)).unwrap();
    vp.set_constraint_bounds(Some(c));
    vp
}

#[test]
fn constraints_zoom_in_when_too_far_out() {
    let mut vp = constrained(
        (200.0, 200.0),
        rect(0.0, 0.0, 200.0, 200.0),
        rect(0.0, 0.0, 100.0, 100.0),
    );
    vp.apply_constraints(true, None);
    assert_rect_near(vp.rect(true), rect(50.0, 50.0, 100.0, 100.0));
}

#[test]
fn constraints_pull_back_by_smaller_delta() {
    let mut vp = constrained(
        (50.0, 50.0),
        rect(300.0, 0.0, 50.0, 50.0),
        rect(0.0, 0.0, 100.0, 100.0),
    );
    vp.apply_constraints(true, None);
    assert_rect_near(vp.rect(true), rect(50.0, 0.0, 50.0, 50.0));

    vp.pan_by(Vec2::new(-500.0, 0.0), true);
    assert_rect_near(vp.rect(true), rect(0.0, 0.0, 50.0, 50.0));
}

#[test]
fn constraints_center_axis_wider_than_bounds() {
    let mut vp = constrained(
        (200.0, 100.0),
        rect(0.0, 0.0, 200.0, 100.0),
        rect(0.0, 0.0, 100.0, 100.0),
    );
    vp.apply_constraints(true, None);
    assert_rect_near(vp.rect(true), rect(-50.0, 0.0, 200.0, 100.0));
}

#[test]
fn constraints_cap_zoom_at_max() {
    let mut vp = constrained(
        (100.0, 100.0),
        rect(0.0, 0.0, 100.0, 100.0),
        rect(0.0, 0.0, 100.0, 100.0),
    );
    vp.set_max_zoom(Some(4.0));
    vp.zoom_to(10.0, true, None);
    assert!((vp.zoom(true) - 4.0).abs() < 1e-9);
}

#[test]
fn constraints_are_idempotent() {
    for (container, bounds) in [
        ((200.0, 200.0), rect(0.0, 0.0, 200.0, 200.0)),
        ((50.0, 50.0), rect(300.0, 0.0, 50.0, 50.0)),
        ((200.0, 100.0), rect(-30.0, 0.0, 200.0, 100.0)),
        ((100.0, 100.0), rect(12.5, 3.0, 0.5, 0.5)),
    ] {
        let mut vp = constrained(container, bounds, rect(0.0, 0.0, 100.0, 100.0));
        vp.set_max_zoom(Some(50.0));
        vp.apply_constraints(true, None);
        let once = vp.rect(true);
        let version = vp.version();
        vp.apply_constraints(true, None);
        assert_eq!(vp.rect(true), once);
        assert_eq!(vp.version(), version);
    }
}

#[test]
fn unconstrained_viewport_ignores_bounds() {
    let mut vp = viewport((100.0, 100.0), rect(0.0, 0.0, 100.0, 100.0));
    vp.set_constraint_bounds(Some(rect(0.0, 0.0, 10.0, 10.0)));
    vp.zoom_to(0.01, true, None);
    assert!((vp.zoom(true) - 0.01).abs() < 1e-12);
}

#[test]
fn blocked_axes_and_zoom() {
    let config = ViewerConfig {
        block_panning: BlockPanning {
            horizontal: true,
            vertical: false,
        },
        block_zoom: true,
        ..ViewerConfig::default()
    };
    let mut vp = Viewport::new(
        Size::new(100.0, 100.0),
        rect(0.0, 0.0, 100.0, 100.0),
        &ctx_with(config),
    )
    .unwrap();
    vp.pan_by(Vec2::new(10.0, 10.0), true);
    assert_rect_near(vp.rect(true), rect(0.0, 10.0, 100.0, 100.0));
    vp.zoom_to(5.0, true, None);
    assert_eq!(vp.zoom(true), 1.0);
}

#[test]
fn invalid_construction_is_rejected() {
    let ctx = ctx_with(ViewerConfig::default());
    assert!(Viewport::new(Size::new(0.0, 10.0), rect(0.0, 0.0, 1.0, 1.0), &ctx).is_err());
    assert!(Viewport::new(Size::new(10.0, 10.0), rect(0.0, 0.0, 0.0, 1.0), &ctx).is_err());
}
