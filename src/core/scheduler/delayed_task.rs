// Fire-and-forget delayed callbacks.
//
// Not a job queue: each call site gets one detached timer that outlives the
// originating command. There is no cancellation and no persistence - a task
// runs to completion or dies with the process.

use std::future::Future;
use std::time::Duration;

/// Run `task` after `delay` on a detached tokio task. Returns immediately;
/// failures inside the task must be handled (or swallowed) by the task
/// itself, since nothing awaits it.
pub fn schedule<F>(delay: Duration, task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        task.await;
    });
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn returns_before_delay_and_fires_after_it() {
        let fired = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&fired);
        schedule(Duration::from_secs(60), async move {
            flag.store(true, Ordering::SeqCst);
        });

        // The call itself must not wait out the delay.
        assert!(!fired.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_tasks_run_independently() {
        let first = Arc::new(AtomicBool::new(false));
        let second = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&first);
        schedule(Duration::from_secs(10), async move {
            flag.store(true, Ordering::SeqCst);
        });
        let flag = Arc::clone(&second);
        schedule(Duration::from_secs(30), async move {
            flag.store(true, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(first.load(Ordering::SeqCst));
        assert!(!second.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(second.load(Ordering::SeqCst));
    }
}
