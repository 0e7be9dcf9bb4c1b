use crate::dataset::Seed;
use crate::errors::BenchError;
use crate::types::{Backend, ExecutionMode, Operation};

pub const DEFAULT_SIZE: usize = 100_000_000;
pub const DEFAULT_REPEATS: usize = 5;
pub const DEFAULT_SEED: u64 = 1234;
pub const MIN_SIZE: usize = 1;

/// Everything one harness run needs to know.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    /// Element count per dataset. Merges use two inputs of this size.
    pub size: usize,
    pub repeats: usize,
    pub seed: Seed,
    /// `None` uses the available parallelism.
    pub threads: Option<usize>,
    pub backends: Vec<Backend>,
    pub modes: Vec<ExecutionMode>,
    pub operations: Vec<Operation>,
    pub simd: bool,
    /// `sort<f64>` regenerates into a new allocation every trial instead of
    /// reusing its buffer.
    pub fresh_buffers: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            size: DEFAULT_SIZE,
            repeats: DEFAULT_REPEATS,
            seed: Seed::Fixed(DEFAULT_SEED),
            threads: None,
            backends: Backend::ALL.to_vec(),
            modes: ExecutionMode::ALL.to_vec(),
            operations: Operation::DEFAULT_SUITE.to_vec(),
            simd: true,
            fresh_buffers: false,
        }
    }
}

impl BenchConfig {
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.size < MIN_SIZE {
            return Err(BenchError::SizeTooSmall {
                size: self.size,
                min: MIN_SIZE,
            });
        }
        Ok(())
    }
}

/// Removes repeats while keeping first-seen order.
pub fn dedup_in_order<T: PartialEq + Copy>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for &item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
