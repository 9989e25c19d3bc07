use super::*;

#[test]
fn ids_accept_alnum_and_dash() {
    assert!(OwnerId::new("123456789").is_ok());
    assert!(OwnerId::new("-100200300").is_ok());
    assert!(TaskId::new("a1-b2").is_ok());
}

#[test]
fn ids_reject_separators_and_bad_lengths() {
    assert!(OwnerId::new("").is_err());
    assert!(OwnerId::new("a_b").is_err());
    assert!(OwnerId::new("../etc").is_err());
    assert!(TaskId::new("x".repeat(65)).is_err());
    assert!(TaskId::new("x".repeat(64)).is_ok());
}

#[test]
fn generated_task_ids_are_valid_and_distinct() {
    let a = TaskId::generate();
    let b = TaskId::generate();
    assert_ne!(a, b);
    assert!(TaskId::new(a.as_str()).is_ok());
    assert_eq!(a.as_str().len(), 36);
}

#[test]
fn ids_deserialize_through_validation() {
    let ok: OwnerId = serde_json::from_str("\"u1\"").unwrap();
    assert_eq!(ok.as_str(), "u1");
    assert!(serde_json::from_str::<OwnerId>("\"u/1\"").is_err());
}

#[test]
fn lifecycle_only_moves_forward() {
    use TaskStatus::*;
    assert!(Pending.can_transition_to(Processing));
    assert!(Pending.can_transition_to(Error));
    assert!(Processing.can_transition_to(Completed));
    assert!(Processing.can_transition_to(Timeout));
    assert!(!Pending.can_transition_to(Completed));
    assert!(!Processing.can_transition_to(Pending));
    for terminal in [Completed, Error, Timeout] {
        assert!(terminal.is_terminal());
        for next in [Pending, Processing, Completed, Error, Timeout] {
            assert!(!terminal.can_transition_to(next));
        }
    }
}

#[test]
fn snapshot_serializes_uppercase_status() {
    let key = TaskKey::new(OwnerId::new("u1").unwrap(), TaskId::new("t1").unwrap());
    let params = RenderParams {
        crop_start: CropRect::new(0.0, 0.0, 10.0, 10.0),
        crop_end: CropRect::new(0.0, 0.0, 10.0, 10.0),
        saturation: 0.0,
        duration_secs: 2.0,
        fps: crate::foundation::core::Fps::new(25, 1).unwrap(),
    };
    let rec = TaskRecord::pending(key, params, 0);
    let json = serde_json::to_value(rec.snapshot()).unwrap();
    assert_eq!(json["task_id"], "t1");
    assert_eq!(json["status"], "PENDING");
    assert_eq!(json["progress"], 0);
    assert!(json.get("message").is_none());
}
