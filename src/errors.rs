use crate::types::{Backend, ExecutionMode, Operation};

#[derive(thiserror::Error, Debug)]
pub enum BenchError {
    #[error("Invariant violated in {tag}: {detail}")]
    InvariantViolation { tag: String, detail: String },

    #[error("{backend}::{operation} has no {mode} implementation on this machine")]
    UnsupportedMode {
        backend: Backend,
        operation: Operation,
        mode: ExecutionMode,
    },

    #[error("{operation}: expected {expected} elements, got {actual}")]
    LengthMismatch {
        operation: Operation,
        expected: usize,
        actual: usize,
    },

    #[error("Problem size must be at least {min} element(s), got {size}")]
    SizeTooSmall { size: usize, min: usize },

    #[error("Failed to build rayon thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to write report: {0}")]
    Output(#[from] std::io::Error),
}
