use super::*;

#[test]
fn axis_components() {
    let p = Point::new(3.0, 4.0);
    let s = Size::new(10.0, 20.0);
    assert_eq!(Axis::Horizontal.of_point(p), 3.0);
    assert_eq!(Axis::Vertical.of_point(p), 4.0);
    assert_eq!(Axis::Horizontal.of_size(s), 10.0);
    assert_eq!(Axis::Vertical.of_size(s), 20.0);
}

#[test]
fn magnifier_layer_includes_base() {
    assert_eq!(Layer::Base.up_to(), &[Layer::Base]);
    assert_eq!(Layer::Magnifier.up_to(), &[Layer::Base, Layer::Magnifier]);
}
