//! Scheduler configuration.

use serde::{Deserialize, Serialize};

/// Default number of worker threads: hardware concurrency minus one,
/// reserving the calling thread.
fn default_num_threads() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

/// Default scratch arena size: 4 MiB.
fn default_scratch_bytes() -> usize {
    4 * 1024 * 1024
}

/// Default thread stack size: 2MB.
fn default_thread_stack_size() -> usize {
    2 * 1024 * 1024 // 2MB
}

/// Configuration for a [`Scheduler`](crate::Scheduler).
///
/// # Example
///
/// ```
/// use jobgraph::SchedulerConfig;
///
/// let config = SchedulerConfig::new()
///     .with_num_threads(4)
///     .with_scratch_bytes(1024 * 1024);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of worker threads.
    ///
    /// Default: hardware concurrency minus one (at least 1). A value of
    /// `1` gives single-worker serial execution with deterministic FIFO
    /// ordering.
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,

    /// Scratch arena size in bytes.
    ///
    /// Divided by the job slot footprint to derive how many jobs one
    /// graph may hold. Exhaustion is reported at graph-build time.
    /// Default: 4 MiB.
    #[serde(default = "default_scratch_bytes")]
    pub scratch_bytes: usize,

    /// Stack size per worker thread in bytes.
    ///
    /// Default: 2MB (2 * 1024 * 1024 bytes).
    #[serde(default = "default_thread_stack_size")]
    pub thread_stack_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            num_threads: default_num_threads(),
            scratch_bytes: default_scratch_bytes(),
            thread_stack_size: default_thread_stack_size(),
        }
    }
}

impl SchedulerConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    #[must_use]
    pub fn with_num_threads(mut self, count: usize) -> Self {
        self.num_threads = count;
        self
    }

    /// Set the scratch arena size in bytes.
    #[must_use]
    pub fn with_scratch_bytes(mut self, bytes: usize) -> Self {
        self.scratch_bytes = bytes;
        self
    }

    /// Set the thread stack size.
    #[must_use]
    pub fn with_thread_stack_size(mut self, size: usize) -> Self {
        self.thread_stack_size = size;
        self
    }

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// A human-readable description of the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_threads == 0 {
            return Err("num_threads must be greater than 0".into());
        }
        if self.scratch_bytes == 0 {
            return Err("scratch_bytes must be greater than 0".into());
        }
        if self.thread_stack_size < 64 * 1024 {
            return Err("thread_stack_size must be at least 64KB".into());
        }
        Ok(())
    }

    /// Parse a configuration from a JSON string and validate it.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// A parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
