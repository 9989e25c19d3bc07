use super::*;

#[test]
fn frame_range_contains_boundaries() {
    let r = FrameRange::new(FrameIndex(2), FrameIndex(5)).unwrap();
    assert!(!r.contains(FrameIndex(1)));
    assert!(r.contains(FrameIndex(2)));
    assert!(r.contains(FrameIndex(4)));
    assert!(!r.contains(FrameIndex(5)));
    assert_eq!(r.len_frames(), 3);
    assert!(FrameRange::new(FrameIndex(5), FrameIndex(2)).is_err());
}

#[test]
fn fps_frame_count_and_times() {
    let fps = Fps::new(25, 1).unwrap();
    assert_eq!(fps.secs_to_frames_floor(2.0), 50);
    assert_eq!(fps.secs_to_frames_floor(0.03), 0);
    assert!((fps.frame_time_secs(FrameIndex(25)) - 1.0).abs() < 1e-12);
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(25, 0).is_err());
}

#[test]
fn crop_lerp_endpoints() {
    let a = CropRect::new(0.0, 0.0, 100.0, 100.0);
    let b = CropRect::new(50.0, 50.0, 100.0, 100.0);
    assert_eq!(a.lerp(b, 0.0), a);
    assert_eq!(a.lerp(b, 1.0), b);
    assert_eq!(a.lerp(b, 0.5), CropRect::new(25.0, 25.0, 100.0, 100.0));
}

#[test]
fn pixel_rect_truncates_toward_zero() {
    let r = CropRect::new(0.197, 49.9, 100.8, 0.4).to_pixel_rect();
    assert_eq!(r, PixelRect::new(0, 49, 100, 1));
}

#[test]
fn crop_validation_rejects_degenerate_windows() {
    assert!(CropRect::new(0.0, 0.0, 10.0, 10.0).validate().is_ok());
    assert!(CropRect::new(-1.0, 0.0, 10.0, 10.0).validate().is_err());
    assert!(CropRect::new(0.0, 0.0, 0.0, 10.0).validate().is_err());
    assert!(CropRect::new(f64::NAN, 0.0, 10.0, 10.0).validate().is_err());
}

#[test]
fn crop_rect_parses_from_comma_list() {
    let r: CropRect = "50, 50,100,100".parse().unwrap();
    assert_eq!(r, CropRect::new(50.0, 50.0, 100.0, 100.0));
    assert!("1,2,3".parse::<CropRect>().is_err());
    assert!("1,2,x,4".parse::<CropRect>().is_err());
}
