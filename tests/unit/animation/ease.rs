use super::*;

#[test]
fn in_out_sine_endpoints_and_midpoint() {
    assert!(Ease::InOutSine.apply(0.0).abs() < 1e-12);
    assert!((Ease::InOutSine.apply(1.0) - 1.0).abs() < 1e-12);
    assert!((Ease::InOutSine.apply(0.5) - 0.5).abs() < 1e-12);
}

#[test]
fn apply_clamps_input() {
    assert_eq!(Ease::InOutSine.apply(-1.0), 0.0);
    assert_eq!(Ease::InOutSine.apply(2.0), 1.0);
}

#[test]
fn in_out_sine_is_monotonic() {
    let mut prev = 0.0;
    for i in 0..=100 {
        let v = Ease::InOutSine.apply(f64::from(i) / 100.0);
        assert!(v + 1e-12 >= prev);
        prev = v;
    }
}
