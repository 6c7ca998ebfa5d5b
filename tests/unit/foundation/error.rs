use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ViewerError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(ViewerError::format("x").to_string().contains("format error:"));
    assert!(ViewerError::load("x").to_string().contains("load error:"));
    assert!(ViewerError::timeout("x").to_string().contains("timeout:"));
    assert!(
        ViewerError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ViewerError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
