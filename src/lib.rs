//! # jobgraph
//!
//! A job scheduler for compute-bound parallel work on a single machine.
//!
//! Callers build a directed acyclic graph of jobs with data dependencies,
//! submit it to a pool of worker threads with [`Scheduler::kick`], and block
//! until completion either on a specific job or on a shared [`Counter`].
//! Graphs are allocated from a scratch arena that is rewound per graph, so
//! interactive applications (frame graphs, build pipelines, batch data
//! processing) can construct thousands of short-lived graphs without
//! per-job heap traffic on the hot path.
//!
//! ## Modules
//!
//! - [`core`] - the scheduling engine: arena, jobs, ready queue, workers,
//!   counters, and the [`Scheduler`] façade
//! - [`config`] - [`SchedulerConfig`] with defaults, builder methods, and
//!   validation
//! - [`util`] - telemetry bootstrap helpers
//!
//! ## Example
//!
//! ```
//! use jobgraph::{Counter, Scheduler, SchedulerConfig};
//!
//! let sch = Scheduler::new(SchedulerConfig::new().with_num_threads(2)).unwrap();
//! let counter = Counter::new();
//!
//! // `parent` runs only after `child` has completed.
//! let parent = sch.create_job(|| println!("parent")).unwrap();
//! let child = sch.create_job_with_counter(&counter, || println!("child")).unwrap();
//! sch.depend(parent, child).unwrap();
//!
//! sch.kick().unwrap();
//! sch.wait(parent).unwrap();
//! assert_eq!(counter.value(), 0);
//!
//! // Rewind the arena before building the next graph.
//! sch.reset().unwrap();
//! ```
//!
//! ## Index-range fan-out
//!
//! ```
//! use jobgraph::{Scheduler, SchedulerConfig};
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//!
//! let sch = Scheduler::new(SchedulerConfig::new().with_num_threads(2)).unwrap();
//! let hits = Arc::new(AtomicU32::new(0));
//! let h = Arc::clone(&hits);
//! sch.parallel_for(0..64, move |_| {
//!     h.fetch_add(1, Ordering::Relaxed);
//! })
//! .unwrap();
//! assert_eq!(hits.load(Ordering::Relaxed), 64);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod util;

// Re-export main types for convenience
pub use config::SchedulerConfig;
pub use core::{
    AppResult, Counter, JobHandle, ScratchArena, Scheduler, SchedulerError, SchedulerStats,
};
