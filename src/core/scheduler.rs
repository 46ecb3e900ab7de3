//! Scheduler façade: graph building, kick, wait primitives, lifecycle.
//!
//! A graph's lifetime is `reset() -> create_job*/create_group*/depend* ->
//! kick() -> wait(...)`. The build phase is single-threaded by contract
//! and writes through the graph lock; after `kick()` the graph is sealed
//! and workers only read it, so the lock is effectively uncontended on the
//! hot path. Misuse (building after kick, resetting with jobs in flight,
//! handles from a previous graph) is rejected with typed errors instead of
//! being left undefined.
//!
//! # Design
//!
//! - **Dispatch**: every job starts with one pending self reference;
//!   `depend` adds one per edge; `kick()` releases the self references and
//!   enqueues the jobs that reach zero. Workers release their successors
//!   the same way at completion. The AcqRel decrement is the
//!   happens-before edge from a predecessor's body to its successors.
//! - **Wait-on-job**: a per-job done flag plus a scheduler-wide epoch
//!   condvar bumped once per completion. The epoch is mutated under its
//!   mutex, so a waiter cannot miss the final wakeup.
//! - **Wait-on-counter**: delegates to [`Counter::wait`].

use crate::config::SchedulerConfig;
use crate::core::counter::Counter;
use crate::core::error::SchedulerError;
use crate::core::job::{GraphStorage, JobBody, JobHandle, JobSlot};
use crate::core::ready_queue::ReadyQueue;
use crate::core::worker_pool::{LifecycleFlags, WorkerPool};
use parking_lot::{Condvar, Mutex, RwLock};
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Engine state shared between the façade and the workers.
pub(crate) struct EngineState {
    graph: RwLock<GraphStorage>,
    pub(crate) queue: ReadyQueue,
    pub(crate) flags: LifecycleFlags,
    /// Set by `kick()`, cleared by `reset()`.
    kicked: AtomicBool,
    /// Jobs created / completed in the current graph.
    created: AtomicU32,
    completed: AtomicU32,
    total_completed: AtomicU64,
    /// Completion epoch for wait-on-job, bumped once per finished job.
    wait_lock: Mutex<u64>,
    wait_cv: Condvar,
}

impl EngineState {
    fn new(capacity: usize) -> Self {
        Self {
            graph: RwLock::new(GraphStorage::new(capacity)),
            queue: ReadyQueue::new(),
            flags: LifecycleFlags::new(),
            kicked: AtomicBool::new(false),
            created: AtomicU32::new(0),
            completed: AtomicU32::new(0),
            total_completed: AtomicU64::new(0),
            wait_lock: Mutex::new(0),
            wait_cv: Condvar::new(),
        }
    }

    /// Completion protocol, run on a worker thread.
    ///
    /// Lock discipline: the graph read guard is dropped before touching
    /// the queue mutex, the counter, or the wait mutex.
    pub(crate) fn run_job(&self, handle: JobHandle) {
        let (body, counter) = {
            let graph = self.graph.read();
            let Ok(slot) = graph.slot(handle) else {
                return;
            };
            (slot.take_body(), slot.take_counter())
        };

        if let Some(body) = body {
            if panic::catch_unwind(AssertUnwindSafe(body)).is_err() {
                error!(job = handle.index, "job body panicked; dependents still released");
            }
        }

        // Completion order: counts, then the counter decrement, then the
        // successor release, then the done flag. Anyone released by this
        // job's completion (a waiter on its done flag, a successor, a
        // counter waiter) must also observe its bookkeeping as finished.
        self.completed.fetch_add(1, Ordering::AcqRel);
        self.total_completed.fetch_add(1, Ordering::Relaxed);

        if let Some(counter) = counter {
            counter.sub(1);
        }

        let mut ready = Vec::new();
        {
            let graph = self.graph.read();
            if let Ok(slot) = graph.slot(handle) {
                for &successor in slot.successors() {
                    if let Ok(succ) = graph.slot(successor) {
                        if succ.release_dependency() {
                            ready.push(successor);
                        }
                    }
                }
                slot.mark_done();
            }
        }

        match ready.len() {
            0 => {}
            1 => self.queue.push(ready[0]),
            _ => self.queue.push_many(&ready),
        }

        self.signal_completion();
    }

    fn job_done(&self, handle: JobHandle) -> Result<bool, SchedulerError> {
        let graph = self.graph.read();
        Ok(graph.slot(handle)?.is_done())
    }

    fn signal_completion(&self) {
        let mut epoch = self.wait_lock.lock();
        *epoch = epoch.wrapping_add(1);
        self.wait_cv.notify_all();
    }
}

/// Point-in-time scheduler statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerStats {
    /// Number of live worker threads.
    pub worker_count: usize,
    /// Jobs sitting in the ready queue right now.
    pub queued_jobs: usize,
    /// Jobs created in the current graph.
    pub jobs_created: u32,
    /// Jobs of the current graph that have completed.
    pub jobs_completed: u32,
    /// Jobs completed over the scheduler's lifetime.
    pub total_jobs_completed: u64,
}

/// DAG job scheduler over a pool of worker threads.
///
/// Independent instances are fully isolated; each owns its workers, its
/// scratch arena, and its lifecycle flags.
pub struct Scheduler {
    engine: Arc<EngineState>,
    workers: WorkerPool,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Validate `config`, size the scratch arena, and spawn the workers.
    ///
    /// The arena's slot capacity is `scratch_bytes` divided by the job
    /// slot footprint; see [`Scheduler::scratch_capacity`].
    ///
    /// # Errors
    ///
    /// `SchedulerError::InvalidConfig` if validation fails or
    /// `scratch_bytes` is smaller than a single job slot.
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;

        let capacity = config.scratch_bytes / JobSlot::footprint();
        if capacity == 0 {
            return Err(SchedulerError::InvalidConfig(format!(
                "scratch_bytes {} is smaller than one job slot ({} bytes)",
                config.scratch_bytes,
                JobSlot::footprint()
            )));
        }

        let engine = Arc::new(EngineState::new(capacity));
        let workers = WorkerPool::spawn(&config, &engine);

        info!(
            num_threads = config.num_threads,
            scratch_bytes = config.scratch_bytes,
            scratch_capacity = capacity,
            "scheduler initialized"
        );

        Ok(Self {
            engine,
            workers,
            config,
        })
    }

    /// Hardware concurrency as reported by the platform. Callers
    /// typically reserve one thread for themselves.
    #[must_use]
    pub fn max_threads() -> usize {
        num_cpus::get()
    }

    /// The configuration this scheduler was built from.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Slot capacity of the scratch arena. Stable across resets.
    #[must_use]
    pub fn scratch_capacity(&self) -> usize {
        self.engine.graph.read().capacity()
    }

    /// Create a job whose body runs once its dependencies are satisfied.
    ///
    /// # Errors
    ///
    /// `ScratchExhausted` when the arena is full, `SealedGraph` after
    /// `kick()`.
    pub fn create_job<F>(&self, body: F) -> Result<JobHandle, SchedulerError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.create_internal(Some(Box::new(body)), None)
    }

    /// Create a job that also increments `counter` now and decrements it
    /// when the body returns.
    ///
    /// # Errors
    ///
    /// As [`Scheduler::create_job`].
    pub fn create_job_with_counter<F>(
        &self,
        counter: &Counter,
        body: F,
    ) -> Result<JobHandle, SchedulerError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.create_internal(Some(Box::new(body)), Some(counter))
    }

    /// Create a bodyless group node. Groups fan many children into a
    /// single successor without duplicating edges.
    ///
    /// # Errors
    ///
    /// As [`Scheduler::create_job`].
    pub fn create_group(&self) -> Result<JobHandle, SchedulerError> {
        self.create_internal(None, None)
    }

    /// Create a group that `parent` depends on.
    ///
    /// # Errors
    ///
    /// As [`Scheduler::create_job`], plus `StaleHandle` if `parent` is
    /// from a previous graph.
    pub fn create_group_under(&self, parent: JobHandle) -> Result<JobHandle, SchedulerError> {
        let group = self.create_internal(None, None)?;
        self.depend(parent, group)?;
        Ok(group)
    }

    fn create_internal(
        &self,
        body: Option<JobBody>,
        counter: Option<&Counter>,
    ) -> Result<JobHandle, SchedulerError> {
        if self.engine.kicked.load(Ordering::Acquire) {
            return Err(SchedulerError::SealedGraph);
        }
        let handle = {
            let mut graph = self.engine.graph.write();
            graph.create(body, counter.cloned())?
        };
        self.engine.created.fetch_add(1, Ordering::AcqRel);
        if let Some(counter) = counter {
            counter.add(1);
        }
        Ok(handle)
    }

    /// Declare that `parent` cannot run until `child` has completed.
    ///
    /// Edges must be added before `kick()`. Cycles are not detected; a
    /// cyclic graph never completes and `wait` on it blocks forever.
    ///
    /// # Errors
    ///
    /// `SealedGraph` after `kick()`, `StaleHandle` for handles from a
    /// previous graph.
    pub fn depend(&self, parent: JobHandle, child: JobHandle) -> Result<(), SchedulerError> {
        if self.engine.kicked.load(Ordering::Acquire) {
            return Err(SchedulerError::SealedGraph);
        }
        let mut graph = self.engine.graph.write();
        graph.add_edge(parent, child)
    }

    /// Seal the graph and release it to the workers.
    ///
    /// Every job's self reference is dropped; jobs with no unsatisfied
    /// dependencies are enqueued in creation order and the workers are
    /// woken.
    ///
    /// # Errors
    ///
    /// `SealedGraph` if the current graph was already kicked.
    pub fn kick(&self) -> Result<(), SchedulerError> {
        if self.engine.kicked.swap(true, Ordering::AcqRel) {
            return Err(SchedulerError::SealedGraph);
        }

        let mut ready = Vec::new();
        {
            let graph = self.engine.graph.read();
            for (handle, slot) in graph.iter() {
                if slot.release_dependency() {
                    ready.push(handle);
                }
            }
        }

        debug!(
            jobs = self.engine.created.load(Ordering::Acquire),
            roots = ready.len(),
            "graph kicked"
        );
        self.engine.queue.push_many(&ready);
        Ok(())
    }

    /// Block until `job`'s body (and, transitively, every job it depends
    /// on) has completed.
    ///
    /// Blocks forever if the graph cannot complete: not yet kicked from
    /// another thread, cyclic, or the scheduler was stopped.
    ///
    /// # Errors
    ///
    /// `StaleHandle` if `job` is from a previous graph.
    pub fn wait(&self, job: JobHandle) -> Result<(), SchedulerError> {
        if self.engine.job_done(job)? {
            return Ok(());
        }
        let mut epoch = self.engine.wait_lock.lock();
        while !self.engine.job_done(job)? {
            self.engine.wait_cv.wait(&mut epoch);
        }
        Ok(())
    }

    /// Block until `counter` reaches zero. Equivalent to
    /// [`Counter::wait`].
    pub fn wait_counter(&self, counter: &Counter) {
        counter.wait();
    }

    /// Create one job per index over a fresh graph, kick, and block until
    /// every body has run. The graph is consumed; `reset()` before
    /// building the next one.
    ///
    /// # Errors
    ///
    /// As [`Scheduler::create_job`] and [`Scheduler::kick`]. On error the
    /// partially built graph should be discarded with `reset()`.
    pub fn parallel_for<F>(&self, range: Range<u32>, body: F) -> Result<(), SchedulerError>
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        let counter = Counter::new();
        let body = Arc::new(body);
        for index in range {
            let body = Arc::clone(&body);
            self.create_job_with_counter(&counter, move || body(index))?;
        }
        self.kick()?;
        counter.wait();
        Ok(())
    }

    /// Rewind the arena and invalidate every handle of the current graph.
    ///
    /// A built-but-never-kicked graph is discarded (its counters are
    /// decremented so increments stay paired with decrements).
    ///
    /// # Errors
    ///
    /// `ResetWhileInFlight` if kicked jobs have not all completed; wait on
    /// a sink job or a counter first.
    pub fn reset(&self) -> Result<(), SchedulerError> {
        let kicked = self.engine.kicked.load(Ordering::Acquire);
        let created = self.engine.created.load(Ordering::Acquire);
        let completed = self.engine.completed.load(Ordering::Acquire);
        if kicked && completed < created {
            let in_flight = (created - completed) as usize;
            warn!(in_flight, "reset rejected while jobs are in flight");
            return Err(SchedulerError::ResetWhileInFlight { in_flight });
        }

        self.engine.graph.write().reset();
        self.engine.queue.clear();
        self.engine.kicked.store(false, Ordering::Release);
        self.engine.created.store(0, Ordering::Release);
        self.engine.completed.store(0, Ordering::Release);
        Ok(())
    }

    /// Pause dispatch. In-flight bodies run to completion; no new body
    /// starts until unpaused.
    pub fn set_paused(&self, paused: bool) {
        self.engine.flags.set_paused(paused);
        self.engine.queue.notify_all();
        debug!(paused, "pause flag updated");
    }

    /// `true` while dispatch is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.engine.flags.is_paused()
    }

    /// Clearing `running` drains the pool: in-flight bodies finish, no
    /// new body starts, workers exit. This is terminal for the pool;
    /// construct a new scheduler to run further graphs.
    pub fn set_running(&self, running: bool) {
        self.engine.flags.set_running(running);
        self.engine.queue.notify_all();
        debug!(running, "running flag updated");
    }

    /// `true` until the scheduler is stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.engine.flags.is_running()
    }

    /// Cooperative sleep of the calling thread.
    pub fn sleep(duration: Duration) {
        thread::sleep(duration);
    }

    /// Snapshot of queue depth and job counts.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            worker_count: self.workers.len(),
            queued_jobs: self.engine.queue.len(),
            jobs_created: self.engine.created.load(Ordering::Acquire),
            jobs_completed: self.engine.completed.load(Ordering::Acquire),
            total_jobs_completed: self.engine.total_completed.load(Ordering::Relaxed),
        }
    }

    /// Stop and join every worker. Idempotent; also runs on `Drop`.
    pub fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.set_running(false);
        self.workers.join_all();
        info!("scheduler shut down");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
