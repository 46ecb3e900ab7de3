//! Ready queue: a condvar-guarded FIFO of dispatchable jobs.
//!
//! The queue is the only contended hot path. A single `push` wakes one
//! idle worker; a batch push and the lifecycle transitions broadcast,
//! since any number of workers may need to re-check the pause/stop flags.

use crate::core::job::JobHandle;
use crate::core::worker_pool::LifecycleFlags;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

pub(crate) struct ReadyQueue {
    jobs: Mutex<VecDeque<JobHandle>>,
    available: Condvar,
}

impl ReadyQueue {
    pub(crate) fn new() -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    /// Enqueue one job and wake one idle worker.
    pub(crate) fn push(&self, job: JobHandle) {
        let mut jobs = self.jobs.lock();
        jobs.push_back(job);
        self.available.notify_one();
    }

    /// Enqueue a batch and wake every idle worker.
    pub(crate) fn push_many(&self, batch: &[JobHandle]) {
        if batch.is_empty() {
            return;
        }
        let mut jobs = self.jobs.lock();
        jobs.extend(batch.iter().copied());
        self.available.notify_all();
    }

    pub(crate) fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub(crate) fn clear(&self) {
        self.jobs.lock().clear();
    }

    /// Wake all idle workers so they re-check the lifecycle flags.
    pub(crate) fn notify_all(&self) {
        let _jobs = self.jobs.lock();
        self.available.notify_all();
    }

    /// Worker idle protocol: block until a job can be popped, returning
    /// `None` once `running` clears. While `paused` is set nothing is
    /// popped, so no new body can start; in-flight bodies are unaffected.
    pub(crate) fn wait_pop(&self, flags: &LifecycleFlags) -> Option<JobHandle> {
        let mut jobs = self.jobs.lock();
        loop {
            if !flags.is_running() {
                return None;
            }
            if !flags.is_paused() {
                if let Some(job) = jobs.pop_front() {
                    return Some(job);
                }
            }
            self.available.wait(&mut jobs);
        }
    }
}
