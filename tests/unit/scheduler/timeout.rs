use super::*;
use crate::foundation::core::{CropRect, Fps};
use crate::render::compositor::RenderParams;
use crate::scheduler::task::{OwnerId, TaskId};

fn processing_task(reg: &TaskRegistry) -> TaskKey {
    let key = TaskKey::new(OwnerId::new("u1").unwrap(), TaskId::new("t1").unwrap());
    let params = RenderParams {
        crop_start: CropRect::new(0.0, 0.0, 10.0, 10.0),
        crop_end: CropRect::new(0.0, 0.0, 10.0, 10.0),
        saturation: 0.0,
        duration_secs: 2.0,
        fps: Fps::new(25, 1).unwrap(),
    };
    reg.admit_with(key.clone(), params, |_| Ok::<(), ()>(()))
        .unwrap();
    reg.transition(&key, TaskStatus::Pending, TaskStatus::Processing, None);
    key
}

#[tokio::test(start_paused = true)]
async fn fires_after_ceiling() {
    let reg = Arc::new(TaskRegistry::new());
    let key = processing_task(&reg);
    let sup = TimeoutSupervisor::new(reg.clone(), Duration::from_secs(300));
    let cancel = CancellationToken::new();
    let _guard = sup.arm(key.clone(), cancel.clone());

    tokio::time::sleep(Duration::from_secs(299)).await;
    assert!(!cancel.is_cancelled());
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(cancel.is_cancelled());
    let rec = reg.get(&key).unwrap();
    assert_eq!(rec.status, TaskStatus::Timeout);
    assert!(rec.message.unwrap().contains("exceeded"));
}

#[tokio::test(start_paused = true)]
async fn dropped_guard_disarms() {
    let reg = Arc::new(TaskRegistry::new());
    let key = processing_task(&reg);
    let sup = TimeoutSupervisor::new(reg.clone(), Duration::from_secs(5));
    let cancel = CancellationToken::new();
    drop(sup.arm(key.clone(), cancel.clone()));

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(!cancel.is_cancelled());
    assert_eq!(reg.status(&key), Some(TaskStatus::Processing));
}

#[tokio::test(start_paused = true)]
async fn completed_task_is_not_overridden() {
    let reg = Arc::new(TaskRegistry::new());
    let key = processing_task(&reg);
    let sup = TimeoutSupervisor::new(reg.clone(), Duration::from_secs(1));
    let cancel = CancellationToken::new();
    let _guard = sup.arm(key.clone(), cancel.clone());
    reg.finish_with(&key, || Ok(()));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(!cancel.is_cancelled());
    assert_eq!(reg.status(&key), Some(TaskStatus::Completed));
}
