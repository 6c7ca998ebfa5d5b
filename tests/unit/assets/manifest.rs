use super::*;
use crate::animation::animated_rect::Animatable;
use crate::foundation::clock::ManualClock;
use crate::foundation::config::ViewerConfig;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "deepzoom_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

const DOC: &str = r#"{
    "width": 1000,
    "height": 600,
    "tileSize": 256,
    "tileOverlap": 1,
    "tilesUrl": "photo_files",
    "format": "png"
}"#;

#[test]
fn parse_fills_defaults() {
    let m = ImageManifest::from_json_str(DOC).unwrap();
    assert_eq!(m.tile_overlap, 1);
    assert_eq!(m.min_level, 0);
    assert!(m.placement().is_none());

    let m = ImageManifest::from_json_str(
        r#"{ "width": 10, "height": 10, "tileSize": 4, "tilesUrl": "t" }"#,
    )
    .unwrap();
    assert_eq!(m.format, "jpg");
}

#[test]
fn malformed_manifests_are_format_errors() {
    for doc in [
        "{",
        r#"{ "width": 10 }"#,
        r#"{ "width": 0, "height": 10, "tileSize": 4, "tilesUrl": "t" }"#,
        r#"{ "width": 10, "height": 10, "tileSize": 0, "tilesUrl": "t" }"#,
        r#"{ "width": 10, "height": 10, "tileSize": 4, "tilesUrl": "t", "minLevel": 30 }"#,
        r#"{ "width": 10, "height": 10, "tileSize": 4, "tilesUrl": "t",
             "bounds": { "x": 0, "y": 0, "width": -1, "height": 1 } }"#,
    ] {
        let err = ImageManifest::from_json_str(doc).unwrap_err();
        assert!(matches!(err, ViewerError::Format(_)), "{doc}: {err}");
    }
}

#[test]
fn build_uses_placement_and_dzi_urls() {
    let ctx = ViewerContext::new(ViewerConfig::default(), ManualClock::new(0.0)).unwrap();
    let mut m = ImageManifest::from_json_str(DOC).unwrap();
    m.bounds = Some(ManifestBounds {
        x: 2.0,
        y: 3.0,
        width: 10.0,
        height: 6.0,
    });
    let img = m.build(&ctx).unwrap();
    assert_eq!(img.rect(true), rect(2.0, 3.0, 10.0, 6.0));
    assert_eq!(img.max_level(), 10);
    assert_eq!(img.tile_url(9, 1, 0), "photo_files/9/1_0.png");
}

#[test]
fn resolver_reads_files_and_anchors_tile_dir() {
    let dir = temp_dir("manifest_resolve");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("photo.json");
    std::fs::write(&path, DOC).unwrap();

    let m = JsonManifestResolver
        .resolve(&ImageSource::Path(path.clone()))
        .unwrap();
    assert_eq!(PathBuf::from(&m.tiles_url), dir.join("photo_files"));

    let inline = JsonManifestResolver
        .resolve(&ImageSource::Inline(ImageManifest::from_json_str(DOC).unwrap()))
        .unwrap();
    assert_eq!(inline.tiles_url, "photo_files");

    assert!(
        JsonManifestResolver
            .resolve(&ImageSource::Path(dir.join("missing.json")))
            .is_err()
    );
    std::fs::remove_dir_all(&dir).ok();
}
