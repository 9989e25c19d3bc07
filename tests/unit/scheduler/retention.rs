use super::*;
use crate::foundation::core::{CropRect, Fps};
use crate::render::compositor::RenderParams;
use crate::scheduler::storage::ArtifactKind;
use crate::scheduler::task::{TaskId, TaskStatus};

struct Fixture {
    dir: tempfile::TempDir,
    registry: Arc<TaskRegistry>,
    store: Arc<ArtifactStore>,
    sweeper: RetentionSweeper,
}

fn fixture(retained_per_owner: usize) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ArtifactStore::open(dir.path()).unwrap());
    let registry = Arc::new(TaskRegistry::new());
    let sweeper = RetentionSweeper::new(
        registry.clone(),
        store.clone(),
        RetentionPolicy {
            retained_per_owner,
            max_age: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
        },
    );
    Fixture {
        dir,
        registry,
        store,
        sweeper,
    }
}

fn params() -> RenderParams {
    RenderParams {
        crop_start: CropRect::new(0.0, 0.0, 10.0, 10.0),
        crop_end: CropRect::new(0.0, 0.0, 10.0, 10.0),
        saturation: 0.0,
        duration_secs: 2.0,
        fps: Fps::new(25, 1).unwrap(),
    }
}

fn add_task(fx: &Fixture, owner: &str, task: &str, terminal: bool) -> TaskKey {
    let key = TaskKey::new(OwnerId::new(owner).unwrap(), TaskId::new(task).unwrap());
    fx.store.write_source(&key, b"img").unwrap();
    fx.registry
        .admit_with(key.clone(), params(), |_| Ok::<(), ()>(()))
        .unwrap();
    if terminal {
        fx.registry
            .transition(&key, TaskStatus::Pending, TaskStatus::Processing, None);
        std::fs::write(fx.store.partial_path(&key), b"mp4").unwrap();
        fx.registry
            .finish_with(&key, || fx.store.publish(&key).map(|_| ()));
    }
    key
}

fn age(path: &std::path::Path, secs: u64) {
    let f = std::fs::File::options().write(true).open(path).unwrap();
    f.set_modified(SystemTime::now() - Duration::from_secs(secs))
        .unwrap();
}

#[test]
fn count_rule_evicts_oldest_terminal_tasks_and_their_files() {
    let fx = fixture(5);
    let keys: Vec<TaskKey> = (0..7)
        .map(|i| add_task(&fx, "u1", &format!("t{i}"), true))
        .collect();
    let live = add_task(&fx, "u1", "live", false);

    assert_eq!(fx.sweeper.sweep_owner(&OwnerId::new("u1").unwrap()), 2);
    for key in &keys[..2] {
        assert!(fx.registry.get(key).is_none());
        assert!(!fx.store.source_path(key).exists());
        assert!(!fx.store.is_ready(key));
    }
    for key in &keys[2..] {
        assert!(fx.store.is_ready(key));
    }
    assert!(fx.store.has_source(&live));
}

#[test]
fn age_rule_removes_stale_orphans_but_not_active_files() {
    let fx = fixture(5);
    let live = add_task(&fx, "u1", "live", false);
    age(&fx.store.source_path(&live), 7200);

    let orphan = fx.dir.path().join("u2_gone_image");
    std::fs::write(&orphan, b"x").unwrap();
    age(&orphan, 7200);
    let stray = fx.dir.path().join("leftover.tmp");
    std::fs::write(&stray, b"x").unwrap();
    age(&stray, 7200);
    let fresh = fx.dir.path().join("u3_new_image");
    std::fs::write(&fresh, b"x").unwrap();

    let stats = fx.sweeper.sweep_aged().unwrap();
    assert_eq!(stats.files, 2);
    assert!(!orphan.exists());
    assert!(!stray.exists());
    assert!(fresh.exists());
    assert!(fx.store.has_source(&live));
}

#[test]
fn age_rule_keeps_recent_terminal_records() {
    let fx = fixture(5);
    let done = add_task(&fx, "u1", "done", true);
    let stats = fx.sweeper.sweep_aged().unwrap();
    assert_eq!(stats, SweepStats::default());
    assert!(fx.registry.get(&done).is_some());
}

#[test]
fn release_only_removes_terminal_tasks() {
    let fx = fixture(5);
    let live = add_task(&fx, "u1", "live", false);
    let done = add_task(&fx, "u1", "done", true);

    assert!(!fx.sweeper.release(&live));
    assert!(fx.store.has_source(&live));

    assert!(fx.sweeper.release(&done));
    assert!(fx.registry.get(&done).is_none());
    for kind in ArtifactKind::ALL {
        assert!(!fx.store.path(&done, kind).exists());
    }
}

#[tokio::test(start_paused = true)]
async fn run_stops_on_shutdown() {
    let fx = fixture(5);
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(fx.sweeper.clone().run(shutdown.clone()));
    tokio::time::sleep(Duration::from_secs(125)).await;
    shutdown.cancel();
    handle.await.unwrap();
}
