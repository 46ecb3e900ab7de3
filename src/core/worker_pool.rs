//! Worker pool: dedicated OS threads pulling from the shared ready queue.
//!
//! Each worker runs a small state machine: idle-wait on the ready queue
//! condvar, re-check the lifecycle flags, pop and run one job, repeat.
//! Clearing `running` drains the pool: in-flight bodies finish, no new
//! body starts, every thread exits and is joined at teardown.

use crate::config::SchedulerConfig;
use crate::core::scheduler::EngineState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Pause/stop flags shared between the pool, the queue, and the façade.
pub(crate) struct LifecycleFlags {
    running: AtomicBool,
    paused: AtomicBool,
}

impl LifecycleFlags {
    pub(crate) fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            paused: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }
}

pub(crate) struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `config.num_threads` workers over the shared engine state.
    pub(crate) fn spawn(config: &SchedulerConfig, engine: &Arc<EngineState>) -> Self {
        let mut handles = Vec::with_capacity(config.num_threads);
        for worker_id in 0..config.num_threads {
            let engine = Arc::clone(engine);
            let handle = thread::Builder::new()
                .name(format!("jobgraph-worker-{worker_id}"))
                .stack_size(config.thread_stack_size)
                .spawn(move || worker_loop(worker_id, &engine))
                .expect("failed to spawn worker thread");
            handles.push(handle);
        }
        Self { handles }
    }

    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Join every worker. Callers must have cleared `running` and
    /// broadcast on the queue first.
    pub(crate) fn join_all(&mut self) {
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(worker_id: usize, engine: &EngineState) {
    debug!(worker_id, "worker thread started");
    while let Some(job) = engine.queue.wait_pop(&engine.flags) {
        engine.run_job(job);
    }
    debug!(worker_id, "worker thread exiting");
}
