use crate::types::{Backend, ExecutionMode, Operation};

/// Run-time answer to "which (backend, operation, mode) triples can run here".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Widest vector register the CPU offers, in bits. Zero means none.
    pub vector_bits: u32,
    /// Set by `--no-simd`.
    pub simd_disabled: bool,
    /// Non-temporal store instructions are available (x86_64 only).
    pub streaming_stores: bool,
}

impl Capabilities {
    pub fn detect() -> Self {
        Capabilities {
            vector_bits: detect_vector_bits(),
            simd_disabled: false,
            streaming_stores: cfg!(target_arch = "x86_64"),
        }
    }

    pub fn without_simd(self) -> Self {
        Capabilities {
            simd_disabled: true,
            ..self
        }
    }

    pub fn vectorized(&self) -> bool {
        self.vector_bits > 0 && !self.simd_disabled
    }

    pub fn supports(&self, backend: Backend, operation: Operation, mode: ExecutionMode) -> bool {
        if operation.streaming() && !(self.streaming_stores && backend == Backend::Std) {
            return false;
        }
        if mode.is_vectorized() && !(self.vectorized() && operation.vectorizable()) {
            return false;
        }
        match backend {
            Backend::Std => !mode.is_parallel() || operation.partitionable(),
            Backend::Rayon => true,
        }
    }

    /// Modes from `modes` available for this backend and operation, in order.
    pub fn modes_for(
        &self,
        backend: Backend,
        operation: Operation,
        modes: &[ExecutionMode],
    ) -> Vec<ExecutionMode> {
        modes
            .iter()
            .copied()
            .filter(|&mode| self.supports(backend, operation, mode))
            .collect()
    }
}

#[cfg(target_arch = "x86_64")]
fn detect_vector_bits() -> u32 {
    if std::arch::is_x86_feature_detected!("avx512f") {
        512
    } else if std::arch::is_x86_feature_detected!("avx2") {
        256
    } else if std::arch::is_x86_feature_detected!("sse2") {
        128
    } else {
        0
    }
}

#[cfg(target_arch = "aarch64")]
fn detect_vector_bits() -> u32 {
    if std::arch::is_aarch64_feature_detected!("neon") {
        128
    } else {
        0
    }
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn detect_vector_bits() -> u32 {
    0
}
