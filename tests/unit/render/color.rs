use super::*;

fn frame(px: &[[u8; 3]]) -> Frame {
    Frame::from_raw(px.len() as u32, 1, px.iter().flatten().copied().collect()).unwrap()
}

#[test]
fn zero_saturation_is_identity() {
    let mut f = frame(&[[10, 200, 30], [255, 0, 128]]);
    let before = f.clone();
    apply_saturation(&mut f, 0.0);
    assert_eq!(f, before);
}

#[test]
fn full_desaturation_yields_grey() {
    let mut f = frame(&[[10, 200, 30], [255, 0, 128]]);
    apply_saturation(&mut f, -100.0);
    for px in f.data.chunks_exact(3) {
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }
    assert_eq!(f.pixel(0, 0).unwrap()[0], luma([10, 200, 30]).round() as u8);
}

#[test]
fn boost_stays_in_range_and_grey_is_fixed() {
    let mut f = frame(&[[250, 5, 128], [77, 77, 77]]);
    apply_saturation(&mut f, 100.0);
    assert_eq!(f.pixel(0, 0).unwrap()[0], 255);
    assert_eq!(f.pixel(0, 0).unwrap()[1], 0);
    let grey = f.pixel(1, 0).unwrap();
    assert!(grey.iter().all(|&c| (i32::from(c) - 77).abs() <= 1));
}
