//! Scratch arena: fixed-capacity slot storage rewound once per graph.
//!
//! Jobs have uniform lifetimes bounded by `reset()`, so the arena never
//! frees individual slots. `try_push` is an O(1) append that fails loudly
//! when the configured capacity is exhausted rather than spilling to the
//! heap, and `reset()` clears the slots while keeping the backing
//! allocation, so repeated graphs cause no allocator growth.

use crate::core::error::SchedulerError;

/// Fixed-capacity slot arena.
///
/// Allocation is single-threaded by contract: the scheduler serializes
/// access through its graph lock (the build phase writes, the run phase
/// reads). Workers never allocate.
pub struct ScratchArena<T> {
    slots: Vec<T>,
    cap: usize,
}

impl<T> ScratchArena<T> {
    /// Create an arena that can hold up to `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            cap: capacity,
        }
    }

    /// Append a slot, returning its index.
    ///
    /// # Errors
    ///
    /// `SchedulerError::ScratchExhausted` once `capacity` slots are live.
    pub fn try_push(&mut self, value: T) -> Result<usize, SchedulerError> {
        if self.slots.len() >= self.cap {
            return Err(SchedulerError::ScratchExhausted { capacity: self.cap });
        }
        self.slots.push(value);
        Ok(self.slots.len() - 1)
    }

    /// Shared access to a slot.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)
    }

    /// Exclusive access to a slot.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)
    }

    /// Number of live slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// `true` if no slots are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Configured slot capacity. Stable for the arena's lifetime.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Iterate over the live slots in allocation order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.slots.iter()
    }

    /// Rewind the arena. Drops all live slots but retains the backing
    /// allocation. Idempotent.
    pub fn reset(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_exhausted() {
        let mut arena = ScratchArena::with_capacity(3);
        assert_eq!(arena.try_push(10).unwrap(), 0);
        assert_eq!(arena.try_push(20).unwrap(), 1);
        assert_eq!(arena.try_push(30).unwrap(), 2);
        assert!(matches!(
            arena.try_push(40),
            Err(SchedulerError::ScratchExhausted { capacity: 3 })
        ));
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.get(1), Some(&20));
    }

    #[test]
    fn test_reset_retains_capacity() {
        let mut arena = ScratchArena::with_capacity(8);
        for i in 0..8 {
            arena.try_push(i).unwrap();
        }
        arena.reset();
        assert!(arena.is_empty());
        assert_eq!(arena.capacity(), 8);
        // The arena is fully usable again after a reset.
        for i in 0..8 {
            arena.try_push(i * 2).unwrap();
        }
        assert!(arena.try_push(99).is_err());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut arena = ScratchArena::with_capacity(4);
        arena.try_push(1).unwrap();
        arena.reset();
        arena.reset();
        assert!(arena.is_empty());
        assert_eq!(arena.capacity(), 4);
    }

    #[test]
    fn test_zero_capacity_rejects_all() {
        let mut arena: ScratchArena<u32> = ScratchArena::with_capacity(0);
        assert!(matches!(
            arena.try_push(1),
            Err(SchedulerError::ScratchExhausted { capacity: 0 })
        ));
    }
}
