use super::*;

#[test]
fn defaults_are_valid() {
    let cfg = PipelineConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.canvas(), Canvas {
        width: 768,
        height: 1024
    });
    assert_eq!(cfg.max_active_per_owner, 8);
    assert_eq!(cfg.max_queue_size, 10);
    assert_eq!(cfg.processing_timeout(), Duration::from_secs(300));
    assert_eq!(cfg.retention_policy().max_age, Duration::from_secs(3600));
    assert_eq!(cfg.retention_policy().retained_per_owner, 5);
    assert_eq!(cfg.status_poll_interval(), Duration::from_millis(500));
    assert_eq!(cfg.default_saturation, -20.0);
    assert!(cfg.workers >= 1);
}

#[test]
fn partial_json_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cfg.json");
    std::fs::write(
        &path,
        r#"{ "workers": 2, "encoder": { "preset": "veryfast" }, "overlays": { "fps": 30 } }"#,
    )
    .unwrap();
    let cfg = PipelineConfig::from_path(&path).unwrap();
    assert_eq!(cfg.workers, 2);
    assert_eq!(cfg.encoder.preset, "veryfast");
    assert_eq!(cfg.encoder.codec, "libx264");
    assert_eq!(cfg.overlays.fps, 30);
    assert_eq!(cfg.fps, 25);
}

#[test]
fn validate_rejects_zeroes_and_bad_ranges() {
    let mut cfg = PipelineConfig::default();
    cfg.workers = 0;
    assert!(cfg.validate().unwrap_err().to_string().contains("workers"));

    let mut cfg = PipelineConfig::default();
    cfg.duration_secs = 0.01;
    assert!(cfg.validate().is_err());

    let mut cfg = PipelineConfig::default();
    cfg.default_saturation = -120.0;
    assert!(cfg.validate().is_err());
}

#[test]
fn from_path_reports_missing_and_malformed_files() {
    let dir = tempfile::tempdir().unwrap();
    assert!(PipelineConfig::from_path(&dir.path().join("nope.json")).is_err());
    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "{ not json").unwrap();
    assert!(PipelineConfig::from_path(&bad).is_err());
}
