use super::*;

fn key() -> TaskKey {
    TaskKey::new(OwnerId::new("u1").unwrap(), TaskId::new("t1").unwrap())
}

#[test]
fn names_are_owner_task_qualified() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();
    let k = key();
    assert_eq!(store.source_path(&k), dir.path().join("u1_t1_image"));
    assert_eq!(store.video_path(&k), dir.path().join("u1_t1_video.mp4"));
    assert_eq!(
        store.partial_path(&k),
        dir.path().join("u1_t1_video.partial.mp4")
    );
    assert_eq!(store.marker_path(&k), dir.path().join("u1_t1_done"));
}

#[test]
fn parse_artifact_name_round_trips_every_kind() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();
    for kind in ArtifactKind::ALL {
        let path = store.path(&key(), kind);
        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(parse_artifact_name(name), Some((key(), kind)));
    }
    assert_eq!(parse_artifact_name("random.txt"), None);
    assert_eq!(parse_artifact_name("u1_t1_video.webm"), None);
}

#[test]
fn deposit_source_generates_task_and_writes_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();
    let owner = OwnerId::new("u1").unwrap();
    let task = store.deposit_source(&owner, b"pixels").unwrap();
    let k = TaskKey::new(owner, task);
    assert!(store.has_source(&k));
    assert_eq!(std::fs::read(store.source_path(&k)).unwrap(), b"pixels");
    assert!(!store.path(&k, ArtifactKind::SourcePartial).exists());
}

#[test]
fn publish_renames_and_writes_marker() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();
    let k = key();
    assert!(!store.is_ready(&k));
    std::fs::write(store.partial_path(&k), b"mp4").unwrap();
    let video = store.publish(&k).unwrap();
    assert_eq!(video, store.video_path(&k));
    assert!(!store.partial_path(&k).exists());
    assert_eq!(
        std::fs::read_to_string(store.marker_path(&k)).unwrap(),
        MARKER_CONTENT
    );
    assert!(store.is_ready(&k));
}

#[test]
fn publish_rejects_empty_or_missing_output() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();
    let k = key();
    assert!(store.publish(&k).is_err());
    std::fs::write(store.partial_path(&k), b"").unwrap();
    assert!(store.publish(&k).is_err());
    assert!(!store.video_path(&k).exists());
    assert!(!store.marker_path(&k).exists());
}

#[test]
fn remove_all_deletes_every_task_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();
    let k = key();
    store.write_source(&k, b"img").unwrap();
    std::fs::write(store.partial_path(&k), b"mp4").unwrap();
    store.publish(&k).unwrap();
    assert_eq!(store.remove_all(&k), 3);
    assert!(store.scan().unwrap().is_empty());
}

#[test]
fn scan_classifies_known_and_unknown_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();
    store.write_source(&key(), b"img").unwrap();
    std::fs::write(dir.path().join("stray.bin"), b"?").unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();

    let mut files = store.scan().unwrap();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    assert_eq!(files.len(), 2);
    let stray = files.iter().find(|f| f.key.is_none()).unwrap();
    assert!(stray.path.ends_with("stray.bin"));
    let src = files.iter().find(|f| f.key.is_some()).unwrap();
    assert_eq!(src.kind, Some(ArtifactKind::Source));
}
