use super::*;

#[test]
fn parse_ff_ratio_accepts_rationals() {
    assert_eq!(parse_ff_ratio("25/1"), Some((25, 1)));
    assert_eq!(parse_ff_ratio("30000/1001"), Some((30000, 1001)));
}

#[test]
fn parse_ff_ratio_rejects_zero_den_and_junk() {
    assert_eq!(parse_ff_ratio("25/0"), None);
    assert_eq!(parse_ff_ratio("abc"), None);
    assert_eq!(parse_ff_ratio("25"), None);
}

#[test]
fn source_fps_handles_zero_den() {
    let info = VideoSourceInfo {
        source_path: PathBuf::from("a.mp4"),
        width: 2,
        height: 2,
        fps_num: 25,
        fps_den: 0,
        duration_sec: 1.0,
    };
    assert_eq!(info.source_fps(), 0.0);
}
