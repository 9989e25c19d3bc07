use super::*;
use crate::foundation::core::{Fps, FrameIndex};

fn motion() -> CropMotion {
    CropMotion::new(
        CropRect::new(0.0, 0.0, 100.0, 100.0),
        CropRect::new(100.0, 100.0, 100.0, 100.0),
        2.0,
    )
    .unwrap()
}

#[test]
fn eased_is_zero_at_ends_and_one_at_midpoint() {
    let m = motion();
    assert!(m.eased(0.0).abs() < 1e-12);
    assert!(m.eased(2.0).abs() < 1e-12);
    assert!((m.eased(1.0) - 1.0).abs() < 1e-12);
}

#[test]
fn crop_matches_keyframes_at_extremes() {
    let m = motion();
    assert_eq!(m.crop_at(0.0), m.start);
    assert_eq!(m.crop_at(1.0), m.end);
    assert_eq!(m.crop_at(2.0), m.start);
}

#[test]
fn motion_is_symmetric_around_midpoint() {
    let m = motion();
    for t in [0.1, 0.37, 0.8] {
        assert!((m.eased(t) - m.eased(2.0 - t)).abs() < 1e-12);
    }
}

#[test]
fn frame_windows_follow_frame_times() {
    let m = CropMotion::new(
        CropRect::new(0.0, 0.0, 100.0, 100.0),
        CropRect::new(50.0, 50.0, 100.0, 100.0),
        2.0,
    )
    .unwrap();
    let fps = Fps::new(25, 1).unwrap();
    let at = |i: u64| m.crop_at(fps.frame_time_secs(FrameIndex(i))).to_pixel_rect();
    assert_eq!(at(0), crate::foundation::core::PixelRect::new(0, 0, 100, 100));
    assert_eq!(at(25), crate::foundation::core::PixelRect::new(50, 50, 100, 100));
    assert_eq!(at(49), crate::foundation::core::PixelRect::new(0, 0, 100, 100));
}

#[test]
fn rejects_non_positive_duration() {
    let r = CropRect::new(0.0, 0.0, 10.0, 10.0);
    assert!(CropMotion::new(r, r, 0.0).is_err());
    assert!(CropMotion::new(r, r, f64::INFINITY).is_err());
}
