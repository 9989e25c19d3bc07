use super::*;

fn fps(n: u32) -> Fps {
    Fps::new(n, 1).unwrap()
}

fn tagged(tag: u8) -> FrameRGBA {
    FrameRGBA::solid(2, 2, [tag, 0, 0, 255])
}

#[test]
fn frame_at_wraps_modulo_loop_length() {
    let asset = OverlayAsset::from_frames((0..4).map(tagged).collect(), fps(4)).unwrap();
    assert!((asset.duration_secs() - 1.0).abs() < 1e-12);
    assert_eq!(asset.frame_at(0.0).data[0], 0);
    assert_eq!(asset.frame_at(0.5).data[0], 2);
    assert_eq!(asset.frame_at(0.99).data[0], 3);
    assert_eq!(asset.frame_at(1.25).data[0], 1);
    assert_eq!(asset.frame_at(7.0).data[0], 0);
}

#[test]
fn from_frames_rejects_empty_and_mismatched() {
    assert!(OverlayAsset::from_frames(Vec::new(), fps(25)).is_err());
    let frames = vec![tagged(0), FrameRGBA::solid(3, 2, [0, 0, 0, 0])];
    assert!(OverlayAsset::from_frames(frames, fps(25)).is_err());
}

#[test]
fn load_reads_sorted_frame_directory() {
    let dir = tempfile::tempdir().unwrap();
    for (name, tag) in [("b.png", 20u8), ("a.png", 10u8)] {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([tag, 0, 0, 128]));
        img.save(dir.path().join(name)).unwrap();
    }
    let asset = OverlayAsset::load(dir.path(), fps(2)).unwrap();
    assert_eq!(asset.frame_count(), 2);
    assert_eq!(asset.frame_at(0.0).data[0], 10);
    assert_eq!(asset.frame_at(0.5).data[0], 20);
    assert_eq!(asset.frame_at(0.0).data[3], 128);
}

#[test]
fn load_missing_path_is_resource_error() {
    let err = OverlayAsset::load(Path::new("/nonexistent/overlay"), fps(25)).unwrap_err();
    assert!(matches!(err, PipelineError::Resource(_)));
}
