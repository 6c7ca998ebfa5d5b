use super::*;

#[test]
fn endpoints_are_fixed() {
    for ease in [Ease::Exponential { stiffness: 5.0 }, Ease::Exponential { stiffness: 0.0 }] {
        assert_eq!(ease.apply(0.0), 0.0);
        assert!((ease.apply(1.0) - 1.0).abs() < 1e-12);
        assert_eq!(ease.apply(-1.0), 0.0);
    }
}

#[test]
fn exponential_is_monotonic_and_front_loaded() {
    let e = Ease::Exponential { stiffness: 5.0 };
    let mut prev = 0.0;
    for i in 1..=100 {
        let v = e.apply(i as f64 / 100.0);
        assert!(v > prev);
        prev = v;
    }
    assert!(e.apply(0.5) > 0.5);
}
