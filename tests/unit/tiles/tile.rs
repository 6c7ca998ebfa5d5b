use super::*;

fn candidate(x: u32, visibility: f64, center: (f64, f64)) -> LoadCandidate {
    LoadCandidate {
        key: TileKey::new(0, 5, x, 0),
        visibility,
        target_center: Point::new(center.0, center.1),
    }
}

fn tile(level: u32, touched: f64) -> Tile {
    let mut t = Tile::new(
        TileKey::new(0, level, 0, 0),
        Rect::ZERO,
        0,
        String::new(),
    );
    t.last_touch_time = touched;
    t
}

#[test]
fn first_candidate_always_wins() {
    assert!(prefer_candidate(None, &candidate(0, 1.0, (0.0, 0.0)), Point::ZERO));
}

#[test]
fn higher_visibility_wins_regardless_of_distance() {
    let near = candidate(0, 1.0, (0.0, 0.0));
    let far = candidate(1, 2.0, (1000.0, 1000.0));
    assert!(prefer_candidate(Some(&near), &far, Point::ZERO));
    assert!(!prefer_candidate(Some(&far), &near, Point::ZERO));
}

#[test]
fn equal_visibility_prefers_closer_to_focus() {
    let focus = Point::new(50.0, 50.0);
    let a = candidate(0, 1.5, (10.0, 10.0));
    let b = candidate(1, 1.5, (45.0, 55.0));
    assert!(prefer_candidate(Some(&a), &b, focus));
    assert!(!prefer_candidate(Some(&b), &a, focus));
    assert!(!prefer_candidate(Some(&b), &b, focus));
}

#[test]
fn infinite_visibility_ties_use_distance() {
    let a = candidate(0, f64::INFINITY, (100.0, 0.0));
    let b = candidate(1, f64::INFINITY, (1.0, 0.0));
    assert!(prefer_candidate(Some(&a), &b, Point::ZERO));
}

#[test]
fn eviction_prefers_oldest_then_deepest() {
    let old = tile(3, 10.0);
    let new = tile(3, 20.0);
    assert!(prefer_eviction(Some(&new), &old));
    assert!(!prefer_eviction(Some(&old), &new));

    let shallow = tile(2, 10.0);
    let deep = tile(7, 10.0);
    assert!(prefer_eviction(Some(&shallow), &deep));
    assert!(!prefer_eviction(Some(&deep), &shallow));
}

#[test]
fn unload_keeps_identity() {
    let mut t = tile(4, 0.0);
    t.set_image(Arc::new(image::RgbaImage::new(1, 1)));
    assert!(t.loaded);
    t.unload();
    assert!(!t.loaded && !t.loading && t.image.is_none());
    assert_eq!(t.key.level, 4);
}
