use super::*;

fn gradient(w: u32, h: u32) -> Vec<u8> {
    (0..h)
        .flat_map(|y| (0..w).flat_map(move |x| [(x * 10) as u8, (y * 10) as u8, 7]))
        .collect()
}

#[test]
fn same_size_window_is_an_exact_copy() {
    let data = gradient(4, 3);
    let view = ImageView {
        width: 4,
        height: 3,
        channels: 3,
        data: &data,
    };
    let out = resample_region(
        view,
        PixelRect::new(0, 0, 4, 3),
        Canvas {
            width: 4,
            height: 3,
        },
    )
    .unwrap();
    assert_eq!(out, data);
}

#[test]
fn sub_window_copy_picks_offset_pixels() {
    let data = gradient(6, 6);
    let view = ImageView {
        width: 6,
        height: 6,
        channels: 3,
        data: &data,
    };
    let out = resample_region(
        view,
        PixelRect::new(2, 3, 2, 2),
        Canvas {
            width: 2,
            height: 2,
        },
    )
    .unwrap();
    assert_eq!(&out[..3], &[20, 30, 7]);
    assert_eq!(&out[9..12], &[30, 40, 7]);
}

#[test]
fn downscale_averages_blocks() {
    let data = vec![0u8, 255, 0, 255, 0, 255, 0, 255];
    let view = ImageView {
        width: 4,
        height: 2,
        channels: 1,
        data: &data,
    };
    let out = resample_region(
        view,
        PixelRect::new(0, 0, 4, 2),
        Canvas {
            width: 1,
            height: 1,
        },
    )
    .unwrap();
    assert!((i32::from(out[0]) - 128).abs() <= 1);
}

#[test]
fn constant_image_stays_constant_when_upscaled() {
    let data = vec![90u8; 2 * 2 * 4];
    let view = ImageView {
        width: 2,
        height: 2,
        channels: 4,
        data: &data,
    };
    let out = resample_region(
        view,
        PixelRect::new(0, 0, 2, 2),
        Canvas {
            width: 5,
            height: 7,
        },
    )
    .unwrap();
    assert_eq!(out.len(), 5 * 7 * 4);
    assert!(out.iter().all(|&v| v == 90));
}

#[test]
fn window_is_clipped_to_source_bounds() {
    let data = gradient(4, 4);
    let view = ImageView {
        width: 4,
        height: 4,
        channels: 3,
        data: &data,
    };
    let canvas = Canvas {
        width: 2,
        height: 2,
    };
    let clipped = resample_region(view, PixelRect::new(2, 2, 10, 10), canvas).unwrap();
    let exact = resample_region(view, PixelRect::new(2, 2, 2, 2), canvas).unwrap();
    assert_eq!(clipped, exact);
    assert!(resample_region(view, PixelRect::new(4, 0, 2, 2), canvas).is_err());
}

#[test]
fn fit_rgba_borrows_matching_frames() {
    let frame = FrameRGBA::solid(3, 3, [1, 2, 3, 4]);
    let canvas = Canvas {
        width: 3,
        height: 3,
    };
    assert!(matches!(fit_rgba(&frame, canvas).unwrap(), Cow::Borrowed(_)));
    let bigger = Canvas {
        width: 6,
        height: 4,
    };
    let fitted = fit_rgba(&frame, bigger).unwrap();
    assert_eq!((fitted.width, fitted.height), (6, 4));
    assert!(fitted.data.chunks_exact(4).all(|px| px == [1, 2, 3, 4]));
}
