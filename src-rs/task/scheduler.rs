use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Runs deferred work after the submitting call has returned.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, job: Job);
}

/// Spawns each job on the ambient tokio runtime after `delay`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, job: Job) {
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            job.await;
        });
    }
}

/// Holds jobs until `run_pending` is called. Delays are ignored.
#[derive(Default)]
pub struct QueuedScheduler {
    jobs: Mutex<VecDeque<Job>>,
}

impl QueuedScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.jobs.lock().map(|jobs| jobs.len()).unwrap_or(0)
    }

    /// Drains the queue in FIFO order, awaiting each job. Jobs scheduled
    /// while draining run in the same call.
    pub async fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = match self.jobs.lock() {
                Ok(mut jobs) => jobs.pop_front(),
                Err(_) => None,
            };
            match next {
                Some(job) => {
                    job.await;
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl Scheduler for QueuedScheduler {
    fn schedule(&self, _delay: Duration, job: Job) {
        if let Ok(mut jobs) = self.jobs.lock() {
            jobs.push_back(job);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn queued_jobs_wait_for_run_pending() {
        let scheduler = QueuedScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let hits = hits.clone();
            scheduler.schedule(
                Duration::from_secs(5),
                Box::pin(async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }

        assert_eq!(scheduler.pending(), 3);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.run_pending().await, 3);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_scheduler_honours_delay() {
        let hits = Arc::new(AtomicUsize::new(0));
        let job_hits = hits.clone();
        TokioScheduler.schedule(
            Duration::from_secs(5),
            Box::pin(async move {
                job_hits.fetch_add(1, Ordering::SeqCst);
            }),
        );

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
