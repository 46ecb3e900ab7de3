//! Core scheduling engine: scratch arena, jobs, ready queue, workers, and
//! the [`Scheduler`] façade.

pub mod arena;
pub mod counter;
pub mod error;
pub mod job;
mod ready_queue;
pub mod scheduler;
mod worker_pool;

pub use arena::ScratchArena;
pub use counter::Counter;
pub use error::{AppResult, SchedulerError};
pub use job::JobHandle;
pub use scheduler::{Scheduler, SchedulerStats};
