use std::io::Cursor;

use super::*;

fn png_bytes(img: image::DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_drops_alpha_and_keeps_dimensions() {
    let img = image::RgbaImage::from_raw(2, 1, vec![100, 50, 200, 128, 1, 2, 3, 255]).unwrap();
    let decoded = decode_image(&png_bytes(image::DynamicImage::ImageRgba8(img))).unwrap();
    assert_eq!((decoded.width, decoded.height), (2, 1));
    assert_eq!(decoded.rgb8.as_slice(), &[100, 50, 200, 1, 2, 3]);
}

#[test]
fn decode_rgba_frame_keeps_straight_alpha() {
    let img = image::RgbaImage::from_raw(1, 1, vec![100, 50, 200, 128]).unwrap();
    let frame = decode_rgba_frame(&png_bytes(image::DynamicImage::ImageRgba8(img))).unwrap();
    assert_eq!(frame.data, vec![100, 50, 200, 128]);
}

#[test]
fn decode_image_rejects_garbage() {
    assert!(decode_image(b"definitely not an image").is_err());
}
