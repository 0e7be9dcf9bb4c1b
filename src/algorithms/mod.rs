pub mod element;
pub mod lanes;
pub mod rayon_backend;
pub mod std_backend;

use std::cmp::Ordering;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

pub use element::Element;

use crate::capability::Capabilities;
use crate::errors::BenchError;
use crate::types::{Backend, ExecutionMode, Operation};

/// Dispatches an operation to a backend under an execution mode.
///
/// Owns the two rayon pools: a one-thread pool for the serial modes and a
/// `threads`-wide pool for the parallel ones. The std backend uses the same
/// thread count for its scoped blocks.
pub struct Engine {
    capabilities: Capabilities,
    threads: usize,
    serial_pool: ThreadPool,
    parallel_pool: ThreadPool,
}

impl Engine {
    pub fn new(capabilities: Capabilities, threads: Option<usize>) -> Result<Self, BenchError> {
        let threads = threads
            .filter(|&n| n > 0)
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1);

        let serial_pool = ThreadPoolBuilder::new()
            .num_threads(1)
            .thread_name(|i| format!("parbench-serial-{}", i))
            .build()?;
        let parallel_pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("parbench-worker-{}", i))
            .build()?;

        debug!(threads, vector_bits = capabilities.vector_bits, "engine ready");

        Ok(Engine {
            capabilities,
            threads,
            serial_pool,
            parallel_pool,
        })
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn supports(&self, backend: Backend, operation: Operation, mode: ExecutionMode) -> bool {
        self.capabilities.supports(backend, operation, mode)
    }

    fn ensure(&self, backend: Backend, operation: Operation, mode: ExecutionMode) -> Result<(), BenchError> {
        if self.supports(backend, operation, mode) {
            Ok(())
        } else {
            Err(BenchError::UnsupportedMode {
                backend,
                operation,
                mode,
            })
        }
    }

    fn on_pool<R, F>(&self, mode: ExecutionMode, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        if mode.is_parallel() {
            self.parallel_pool.install(op)
        } else {
            self.serial_pool.install(op)
        }
    }

    pub fn fill<T: Element>(
        &self,
        backend: Backend,
        mode: ExecutionMode,
        operation: Operation,
        data: &mut [T],
        value: T,
    ) -> Result<(), BenchError> {
        self.ensure(backend, operation, mode)?;
        let simd = mode.is_vectorized();
        match (backend, mode) {
            (Backend::Std, ExecutionMode::Serial) => std_backend::fill(data, value),
            (Backend::Std, ExecutionMode::SerialSimd) => lanes::fill(data, value),
            (Backend::Std, _) => std_backend::par_fill(data, value, self.threads, simd),
            (Backend::Rayon, _) => self.on_pool(mode, || rayon_backend::fill(data, value, simd)),
        }
        Ok(())
    }

    /// Fill with non-temporal stores. Only the std serial mode offers it.
    pub fn fill_streaming(
        &self,
        backend: Backend,
        mode: ExecutionMode,
        data: &mut [i32],
        value: i32,
    ) -> Result<(), BenchError> {
        self.ensure(backend, Operation::FillStream, mode)?;
        std_backend::fill_streaming(data, value);
        Ok(())
    }

    pub fn sort<T: Element>(
        &self,
        backend: Backend,
        mode: ExecutionMode,
        operation: Operation,
        data: &mut [T],
    ) -> Result<(), BenchError> {
        self.ensure(backend, operation, mode)?;
        match backend {
            Backend::Std => std_backend::sort(data),
            Backend::Rayon => self.on_pool(mode, || rayon_backend::sort(data)),
        }
        Ok(())
    }

    pub fn stable_sort<T: Element>(
        &self,
        backend: Backend,
        mode: ExecutionMode,
        data: &mut [T],
    ) -> Result<(), BenchError> {
        self.ensure(backend, Operation::StableSort, mode)?;
        match backend {
            Backend::Std => std_backend::stable_sort(data),
            Backend::Rayon => self.on_pool(mode, || rayon_backend::stable_sort(data)),
        }
        Ok(())
    }

    pub fn merge<T: Element>(
        &self,
        backend: Backend,
        mode: ExecutionMode,
        left: &[T],
        right: &[T],
        out: &mut [T],
    ) -> Result<(), BenchError> {
        self.ensure(backend, Operation::Merge, mode)?;
        check_len(Operation::Merge, left.len() + right.len(), out.len())?;
        match backend {
            Backend::Std => std_backend::merge(left, right, out),
            Backend::Rayon => self.on_pool(mode, || rayon_backend::merge(left, right, out)),
        }
        Ok(())
    }

    /// Merges the sorted runs `data[..mid]` and `data[mid..]`.
    pub fn inplace_merge<T: Element>(
        &self,
        backend: Backend,
        mode: ExecutionMode,
        data: &mut [T],
        mid: usize,
    ) -> Result<(), BenchError> {
        self.ensure(backend, Operation::InplaceMerge, mode)?;
        if mid > data.len() {
            return Err(BenchError::LengthMismatch {
                operation: Operation::InplaceMerge,
                expected: data.len(),
                actual: mid,
            });
        }
        debug_assert!(
            is_run(&data[..mid]) && is_run(&data[mid..]),
            "inplace_merge needs two sorted runs split at {}",
            mid
        );
        match backend {
            Backend::Std => std_backend::inplace_merge(data),
            Backend::Rayon => self.on_pool(mode, || rayon_backend::inplace_merge(data)),
        }
        Ok(())
    }

    pub fn all_of<T, P>(
        &self,
        backend: Backend,
        mode: ExecutionMode,
        data: &[T],
        pred: P,
    ) -> Result<bool, BenchError>
    where
        T: Element,
        P: Fn(T) -> bool + Sync + Send,
    {
        self.ensure(backend, Operation::AllOf, mode)?;
        let simd = mode.is_vectorized();
        Ok(match (backend, mode) {
            (Backend::Std, ExecutionMode::Serial) => std_backend::all_of(data, pred),
            (Backend::Std, ExecutionMode::SerialSimd) => lanes::all(data, pred),
            (Backend::Std, _) => std_backend::par_all_of(data, pred, self.threads, simd),
            (Backend::Rayon, _) => self.on_pool(mode, || rayon_backend::all_of(data, pred, simd)),
        })
    }

    pub fn any_of<T, P>(
        &self,
        backend: Backend,
        mode: ExecutionMode,
        data: &[T],
        pred: P,
    ) -> Result<bool, BenchError>
    where
        T: Element,
        P: Fn(T) -> bool + Sync + Send,
    {
        self.ensure(backend, Operation::AnyOf, mode)?;
        let simd = mode.is_vectorized();
        Ok(match (backend, mode) {
            (Backend::Std, ExecutionMode::Serial) => std_backend::any_of(data, pred),
            (Backend::Std, ExecutionMode::SerialSimd) => lanes::any(data, pred),
            (Backend::Std, _) => std_backend::par_any_of(data, pred, self.threads, simd),
            (Backend::Rayon, _) => self.on_pool(mode, || rayon_backend::any_of(data, pred, simd)),
        })
    }

    pub fn copy<T: Element>(
        &self,
        backend: Backend,
        mode: ExecutionMode,
        src: &[T],
        dst: &mut [T],
    ) -> Result<(), BenchError> {
        self.ensure(backend, Operation::Copy, mode)?;
        check_len(Operation::Copy, src.len(), dst.len())?;
        let simd = mode.is_vectorized();
        match (backend, mode) {
            (Backend::Std, ExecutionMode::Serial) => std_backend::copy(src, dst),
            (Backend::Std, ExecutionMode::SerialSimd) => lanes::copy(src, dst),
            (Backend::Std, _) => std_backend::par_copy(src, dst, self.threads, simd),
            (Backend::Rayon, _) => self.on_pool(mode, || rayon_backend::copy(src, dst, simd)),
        }
        Ok(())
    }

    pub fn equal<T: Element>(
        &self,
        backend: Backend,
        mode: ExecutionMode,
        a: &[T],
        b: &[T],
    ) -> Result<bool, BenchError> {
        self.ensure(backend, Operation::Equal, mode)?;
        let simd = mode.is_vectorized();
        Ok(match (backend, mode) {
            (Backend::Std, ExecutionMode::Serial) => std_backend::equal(a, b),
            (Backend::Std, ExecutionMode::SerialSimd) => lanes::equal(a, b),
            (Backend::Std, _) => std_backend::par_equal(a, b, self.threads, simd),
            (Backend::Rayon, _) => self.on_pool(mode, || rayon_backend::equal(a, b, simd)),
        })
    }

    pub fn count<T: Element>(
        &self,
        backend: Backend,
        mode: ExecutionMode,
        data: &[T],
        value: T,
    ) -> Result<usize, BenchError> {
        self.ensure(backend, Operation::Count, mode)?;
        let simd = mode.is_vectorized();
        Ok(match (backend, mode) {
            (Backend::Std, ExecutionMode::Serial) => std_backend::count(data, value),
            (Backend::Std, ExecutionMode::SerialSimd) => lanes::count(data, value),
            (Backend::Std, _) => std_backend::par_count(data, value, self.threads, simd),
            (Backend::Rayon, _) => self.on_pool(mode, || rayon_backend::count(data, value, simd)),
        })
    }

    pub fn adjacent_find<T: Element>(
        &self,
        backend: Backend,
        mode: ExecutionMode,
        data: &[T],
    ) -> Result<Option<usize>, BenchError> {
        self.ensure(backend, Operation::AdjacentFind, mode)?;
        let simd = mode.is_vectorized();
        Ok(match (backend, mode) {
            (Backend::Std, ExecutionMode::Serial) => std_backend::adjacent_find(data),
            (Backend::Std, ExecutionMode::SerialSimd) => lanes::adjacent_find(data),
            (Backend::Std, _) => std_backend::par_adjacent_find(data, self.threads, simd),
            (Backend::Rayon, _) => self.on_pool(mode, || rayon_backend::adjacent_find(data, simd)),
        })
    }

    pub fn adjacent_difference<T: Element>(
        &self,
        backend: Backend,
        mode: ExecutionMode,
        src: &[T],
        dst: &mut [T],
    ) -> Result<(), BenchError> {
        self.ensure(backend, Operation::AdjacentDifference, mode)?;
        check_len(Operation::AdjacentDifference, src.len(), dst.len())?;
        let simd = mode.is_vectorized();
        match (backend, mode) {
            (Backend::Std, ExecutionMode::Serial) => std_backend::adjacent_difference(src, dst),
            (Backend::Std, ExecutionMode::SerialSimd) => lanes::adjacent_difference(src, dst, 0),
            (Backend::Std, _) => std_backend::par_adjacent_difference(src, dst, self.threads, simd),
            (Backend::Rayon, _) => {
                self.on_pool(mode, || rayon_backend::adjacent_difference(src, dst, simd))
            }
        }
        Ok(())
    }

    pub fn max_element<T: Element>(
        &self,
        backend: Backend,
        mode: ExecutionMode,
        data: &[T],
    ) -> Result<Option<usize>, BenchError> {
        self.ensure(backend, Operation::MaxElement, mode)?;
        let simd = mode.is_vectorized();
        Ok(match (backend, mode) {
            (Backend::Std, ExecutionMode::Serial) => std_backend::max_element(data),
            (Backend::Std, ExecutionMode::SerialSimd) => lanes::max_element(data),
            (Backend::Std, _) => std_backend::par_max_element(data, self.threads, simd),
            (Backend::Rayon, _) => self.on_pool(mode, || rayon_backend::max_element(data, simd)),
        })
    }
}

fn is_run<T: Element>(data: &[T]) -> bool {
    data.is_sorted_by(|a, b| a.order(b) != Ordering::Greater)
}

fn check_len(operation: Operation, expected: usize, actual: usize) -> Result<(), BenchError> {
    if expected == actual {
        Ok(())
    } else {
        Err(BenchError::LengthMismatch {
            operation,
            expected,
            actual,
        })
    }
}
