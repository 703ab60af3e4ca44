use std::sync::mpsc;
use std::time::Duration;

use desk_engine::{Scheduler, TokioScheduler};
use tokio::runtime::Runtime;

#[test]
fn task_runs_after_delay() {
    let runtime = Runtime::new().unwrap();
    let scheduler = TokioScheduler::new(runtime.handle().clone());
    let (tx, rx) = mpsc::channel();

    let handle = scheduler.schedule_after(
        Duration::from_millis(10),
        Box::new(move || {
            let _ = tx.send("fired");
        }),
    );

    assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok("fired"));
    assert!(!handle.is_cancelled());
}

#[test]
fn cancelled_task_never_runs() {
    let runtime = Runtime::new().unwrap();
    let scheduler = TokioScheduler::new(runtime.handle().clone());
    let (tx, rx) = mpsc::channel::<()>();

    let handle = scheduler.schedule_after(
        Duration::from_millis(50),
        Box::new(move || {
            let _ = tx.send(());
        }),
    );
    handle.cancel();
    handle.cancel();

    assert!(handle.is_cancelled());
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}
