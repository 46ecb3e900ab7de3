//! Job nodes and per-graph storage.
//!
//! A job is a slot in the scratch arena: a take-once body, an atomic
//! dependency count, a successor list frozen at kick time, and an optional
//! counter link. Handles are generation-stamped indices, so a handle that
//! survives a `reset()` is rejected instead of silently addressing a slot
//! of the next graph.

use crate::core::arena::ScratchArena;
use crate::core::counter::Counter;
use crate::core::error::SchedulerError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Erased job body. Callers pack whatever state they need into the
/// closure's captures.
pub(crate) type JobBody = Box<dyn FnOnce() + Send + 'static>;

/// Non-owning reference to a job of the current graph.
///
/// Handles are `Copy` and valid from the job's creation until the next
/// [`Scheduler::reset`](crate::Scheduler::reset); after that, scheduler
/// operations on the handle fail with
/// [`SchedulerError::StaleHandle`](crate::SchedulerError::StaleHandle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// One node of the dependency DAG.
pub(crate) struct JobSlot {
    /// Taken exactly once; `None` for group nodes (and after execution).
    body: Mutex<Option<JobBody>>,
    /// Unsatisfied dependencies plus one self reference until kick.
    pending: AtomicU32,
    /// Set with Release ordering once the body has returned and the
    /// job's counter decrement has been issued.
    done: AtomicBool,
    /// Jobs that depend on this one. Frozen at kick.
    successors: Vec<JobHandle>,
    /// Claimed exactly once: by the completing worker, or by a reset
    /// discarding a job that never completed. Whoever claims it performs
    /// the single matching decrement.
    counter: Mutex<Option<Counter>>,
}

impl JobSlot {
    pub(crate) fn new(body: Option<JobBody>, counter: Option<Counter>) -> Self {
        Self {
            body: Mutex::new(body),
            // The self reference keeps the job off the ready queue until
            // kick() releases it, even if it never gains an edge.
            pending: AtomicU32::new(1),
            done: AtomicBool::new(false),
            successors: Vec::new(),
            counter: Mutex::new(counter),
        }
    }

    /// Bytes one slot occupies in the arena.
    pub(crate) fn footprint() -> usize {
        std::mem::size_of::<Self>()
    }

    pub(crate) fn take_body(&self) -> Option<JobBody> {
        self.body.lock().take()
    }

    /// Drop one pending dependency. Returns `true` when the job became
    /// eligible for dispatch, which happens exactly once per job.
    ///
    /// AcqRel so the successor's body observes every write made by the
    /// predecessor that performed the release.
    pub(crate) fn release_dependency(&self) -> bool {
        self.pending.fetch_sub(1, Ordering::AcqRel) == 1
    }

    pub(crate) fn add_dependency(&self) {
        self.pending.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn mark_done(&self) {
        self.done.store(true, Ordering::Release);
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    pub(crate) fn successors(&self) -> &[JobHandle] {
        &self.successors
    }

    pub(crate) fn take_counter(&self) -> Option<Counter> {
        self.counter.lock().take()
    }
}

/// Per-graph job storage: the slot arena plus the generation stamp used to
/// invalidate handles across resets.
pub(crate) struct GraphStorage {
    arena: ScratchArena<JobSlot>,
    generation: u32,
}

impl GraphStorage {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            // Indices must fit a handle's u32.
            arena: ScratchArena::with_capacity(capacity.min(u32::MAX as usize)),
            generation: 0,
        }
    }

    pub(crate) fn create(
        &mut self,
        body: Option<JobBody>,
        counter: Option<Counter>,
    ) -> Result<JobHandle, SchedulerError> {
        let index = self.arena.try_push(JobSlot::new(body, counter))?;
        Ok(JobHandle {
            index: index as u32,
            generation: self.generation,
        })
    }

    pub(crate) fn slot(&self, handle: JobHandle) -> Result<&JobSlot, SchedulerError> {
        if handle.generation != self.generation {
            return Err(SchedulerError::StaleHandle);
        }
        self.arena
            .get(handle.index as usize)
            .ok_or(SchedulerError::StaleHandle)
    }

    /// Record `parent` depends on `child`: the child learns its successor,
    /// the parent gains a pending dependency.
    pub(crate) fn add_edge(
        &mut self,
        parent: JobHandle,
        child: JobHandle,
    ) -> Result<(), SchedulerError> {
        self.slot(parent)?;
        self.slot(child)?;
        if let Some(child_slot) = self.arena.get_mut(child.index as usize) {
            child_slot.successors.push(parent);
        }
        if let Some(parent_slot) = self.arena.get(parent.index as usize) {
            parent_slot.add_dependency();
        }
        Ok(())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (JobHandle, &JobSlot)> + '_ {
        let generation = self.generation;
        self.arena.iter().enumerate().map(move |(index, slot)| {
            (
                JobHandle {
                    index: index as u32,
                    generation,
                },
                slot,
            )
        })
    }

    pub(crate) fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Rewind for the next graph. Counter claims not already consumed by
    /// a completion (a built-but-never-kicked graph being discarded) are
    /// decremented here so counter increments and decrements stay paired.
    /// Claiming through the slot's take-once cell means a completion and
    /// a reset can never both decrement for the same job.
    pub(crate) fn reset(&mut self) {
        for slot in self.arena.iter() {
            if let Some(counter) = slot.take_counter() {
                counter.sub(1);
            }
        }
        self.arena.reset();
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_accounting() {
        let slot = JobSlot::new(None, None);
        slot.add_dependency();
        slot.add_dependency();
        assert!(!slot.release_dependency());
        assert!(!slot.release_dependency());
        // The final release reports eligibility exactly once.
        assert!(slot.release_dependency());
    }

    #[test]
    fn test_body_taken_once() {
        let slot = JobSlot::new(Some(Box::new(|| {})), None);
        assert!(slot.take_body().is_some());
        assert!(slot.take_body().is_none());
    }

    #[test]
    fn test_edges_and_handles() {
        let mut graph = GraphStorage::new(8);
        let parent = graph.create(None, None).unwrap();
        let child = graph.create(None, None).unwrap();
        graph.add_edge(parent, child).unwrap();

        assert_eq!(graph.slot(child).unwrap().successors(), &[parent]);
        // Self reference plus one edge: two releases until eligible.
        let parent_slot = graph.slot(parent).unwrap();
        assert!(!parent_slot.release_dependency());
        assert!(parent_slot.release_dependency());
    }

    #[test]
    fn test_stale_handle_after_reset() {
        let mut graph = GraphStorage::new(8);
        let handle = graph.create(None, None).unwrap();
        graph.reset();
        assert!(matches!(
            graph.slot(handle),
            Err(SchedulerError::StaleHandle)
        ));
        // A handle of the new generation addresses the new graph.
        let fresh = graph.create(None, None).unwrap();
        assert!(graph.slot(fresh).is_ok());
    }

    #[test]
    fn test_reset_releases_abandoned_counters() {
        let counter = Counter::new();
        let mut graph = GraphStorage::new(8);
        counter.add(1);
        graph.create(None, Some(counter.clone())).unwrap();
        assert_eq!(counter.value(), 1);
        graph.reset();
        assert_eq!(counter.value(), 0);
    }

    #[test]
    fn test_counter_claim_is_take_once() {
        let counter = Counter::new();
        let mut graph = GraphStorage::new(8);
        counter.add(1);
        let handle = graph.create(None, Some(counter.clone())).unwrap();

        // A completion claims the counter; the reset that follows must
        // not decrement the same claim again.
        let claimed = graph.slot(handle).unwrap().take_counter().unwrap();
        assert!(graph.slot(handle).unwrap().take_counter().is_none());
        claimed.sub(1);
        graph.reset();
        assert_eq!(counter.value(), 0);
    }
}
