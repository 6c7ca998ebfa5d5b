use super::*;
use crate::foundation::clock::ManualClock;

#[test]
fn defaults_match_documented_values() {
    let c = ViewerConfig::default();
    assert_eq!(c.image_cache_quota, 500);
    assert_eq!(c.loader_concurrency_limit, 4);
    assert_eq!(c.loader_timeout, 15_000);
    assert_eq!(c.min_pixel_ratio, 0.5);
    assert!(!c.constrain_viewport);
    c.validate().unwrap();
}

#[test]
fn partial_json_fills_defaults() {
    let c = ViewerConfig::from_json_str(
        r#"{ "imageCacheQuota": 12, "blockPanning": { "vertical": true } }"#,
    )
    .unwrap();
    assert_eq!(c.image_cache_quota, 12);
    assert!(c.block_panning.vertical);
    assert!(!c.block_panning.horizontal);
    assert_eq!(c.blend_duration, 0.5);
}

#[test]
fn invalid_values_are_rejected() {
    let err = ViewerConfig::from_json_str(r#"{ "springStiffness": 0.0 }"#).unwrap_err();
    assert!(err.to_string().contains("springStiffness"));

    let err = ViewerConfig::from_json_str(r#"{ "imageCacheQuota": 0 }"#).unwrap_err();
    assert!(err.to_string().contains("imageCacheQuota"));

    let err = ViewerConfig::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, ViewerError::Serde(_)));
}

#[test]
fn context_validates_config() {
    let bad = ViewerConfig {
        loader_concurrency_limit: 0,
        ..ViewerConfig::default()
    };
    assert!(ViewerContext::new(bad, ManualClock::new(0.0)).is_err());

    let ctx = ViewerContext::new(ViewerConfig::default(), ManualClock::new(42.0)).unwrap();
    assert_eq!(ctx.now_ms(), 42.0);
    assert_eq!(ctx.config.animation_ms(), 1500.0);
}
