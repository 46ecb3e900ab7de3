//! Error types for scheduler operations.

use thiserror::Error;

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scratch arena cannot hold another job this graph.
    #[error("scratch arena exhausted: all {capacity} job slots in use")]
    ScratchExhausted {
        /// Slot capacity the arena was sized for.
        capacity: usize,
    },
    /// A build operation (or a second kick) arrived after `kick()`.
    #[error("graph already kicked; call reset() before building the next graph")]
    SealedGraph,
    /// `reset()` was called while kicked jobs had not yet completed.
    #[error("reset with {in_flight} job(s) still in flight")]
    ResetWhileInFlight {
        /// Number of jobs that were kicked but have not completed.
        in_flight: usize,
    },
    /// The job handle was minted before the most recent `reset()`.
    #[error("job handle refers to a graph that has been reset")]
    StaleHandle,
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchedulerError::ScratchExhausted { capacity: 128 };
        assert_eq!(
            format!("{err}"),
            "scratch arena exhausted: all 128 job slots in use"
        );

        let err = SchedulerError::SealedGraph;
        assert_eq!(
            format!("{err}"),
            "graph already kicked; call reset() before building the next graph"
        );

        let err = SchedulerError::ResetWhileInFlight { in_flight: 3 };
        assert_eq!(format!("{err}"), "reset with 3 job(s) still in flight");

        let err = SchedulerError::InvalidConfig("num_threads must be greater than 0".into());
        assert_eq!(
            format!("{err}"),
            "invalid configuration: num_threads must be greater than 0"
        );
    }
}
