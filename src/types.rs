use std::fmt;
use std::time::Duration;

use clap::ValueEnum;
use serde::Serialize;

/// Concurrency/vectorization contract an operation must honor for one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    Serial,
    SerialSimd,
    Parallel,
    ParallelSimd,
}

impl ExecutionMode {
    pub const ALL: [ExecutionMode; 4] = [
        ExecutionMode::Serial,
        ExecutionMode::SerialSimd,
        ExecutionMode::Parallel,
        ExecutionMode::ParallelSimd,
    ];

    /// Label used as the first part of a report tag.
    pub fn label(self) -> &'static str {
        match self {
            ExecutionMode::Serial => "Serial",
            ExecutionMode::SerialSimd => "Serial SIMD",
            ExecutionMode::Parallel => "Parallel",
            ExecutionMode::ParallelSimd => "Parallel SIMD",
        }
    }

    pub fn is_parallel(self) -> bool {
        matches!(self, ExecutionMode::Parallel | ExecutionMode::ParallelSimd)
    }

    pub fn is_vectorized(self) -> bool {
        matches!(self, ExecutionMode::SerialSimd | ExecutionMode::ParallelSimd)
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Library family supplying the algorithm implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Std,
    Rayon,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Std, Backend::Rayon];

    pub fn label(self) -> &'static str {
        match self {
            Backend::Std => "std",
            Backend::Rayon => "rayon",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    I32,
    I64,
    F64,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ElementKind::I32 => "i32",
            ElementKind::I64 => "i64",
            ElementKind::F64 => "f64",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    MaxElement,
    AdjacentDifference,
    AdjacentFind,
    AllOf,
    AnyOf,
    Count,
    Equal,
    Copy,
    Fill,
    FillStream,
    Merge,
    InplaceMerge,
    Sort,
    StableSort,
    FillI64,
    SortF64,
    MergeDualBuffer,
    MergeSingleBuffer,
}

impl Operation {
    /// Operations run when no `--only` filter is given, in run order.
    pub const DEFAULT_SUITE: [Operation; 14] = [
        Operation::MaxElement,
        Operation::AdjacentDifference,
        Operation::AdjacentFind,
        Operation::AllOf,
        Operation::AnyOf,
        Operation::Count,
        Operation::Equal,
        Operation::Copy,
        Operation::Fill,
        Operation::FillStream,
        Operation::Merge,
        Operation::InplaceMerge,
        Operation::Sort,
        Operation::StableSort,
    ];

    /// The default suite followed by the opt-in operations.
    pub const ALL: [Operation; 18] = [
        Operation::MaxElement,
        Operation::AdjacentDifference,
        Operation::AdjacentFind,
        Operation::AllOf,
        Operation::AnyOf,
        Operation::Count,
        Operation::Equal,
        Operation::Copy,
        Operation::Fill,
        Operation::FillStream,
        Operation::Merge,
        Operation::InplaceMerge,
        Operation::Sort,
        Operation::StableSort,
        Operation::FillI64,
        Operation::SortF64,
        Operation::MergeDualBuffer,
        Operation::MergeSingleBuffer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::MaxElement => "max_element",
            Operation::AdjacentDifference => "adjacent_difference",
            Operation::AdjacentFind => "adjacent_find",
            Operation::AllOf => "all_of",
            Operation::AnyOf => "any_of",
            Operation::Count => "count",
            Operation::Equal => "equal",
            Operation::Copy => "copy",
            Operation::Fill => "fill",
            Operation::FillStream => "fill_stream",
            Operation::Merge => "merge",
            Operation::InplaceMerge => "inplace_merge",
            Operation::Sort => "sort",
            Operation::StableSort => "stable_sort",
            Operation::FillI64 => "fill<i64>",
            Operation::SortF64 => "sort<f64>",
            Operation::MergeDualBuffer => "merge_dual_buffer",
            Operation::MergeSingleBuffer => "merge_single_buffer",
        }
    }

    pub fn element(self) -> ElementKind {
        match self {
            Operation::FillI64 => ElementKind::I64,
            Operation::SortF64 => ElementKind::F64,
            _ => ElementKind::I32,
        }
    }

    /// Orderings and merges carry data-dependent control flow, so there is
    /// no vectorized formulation for them. The streaming fill is a scalar
    /// store loop by construction.
    pub fn vectorizable(self) -> bool {
        !self.is_ordering() && !self.streaming()
    }

    /// Whether the work splits into independent contiguous blocks.
    pub fn partitionable(self) -> bool {
        !self.is_ordering() && !self.streaming()
    }

    /// Writes with non-temporal stores that bypass the cache.
    pub fn streaming(self) -> bool {
        self == Operation::FillStream
    }

    fn is_ordering(self) -> bool {
        matches!(
            self,
            Operation::Sort
                | Operation::StableSort
                | Operation::SortF64
                | Operation::Merge
                | Operation::MergeDualBuffer
                | Operation::MergeSingleBuffer
                | Operation::InplaceMerge
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Representative result of one trial.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    None,
    Flag(bool),
    Count(usize),
    Position(Option<usize>),
    Located { index: usize, value: String },
}

impl Sample {
    /// Rendered value for the `Result:` column; `None` when there is nothing
    /// to show. A located element shows its value only.
    pub fn render(&self) -> Option<String> {
        match self {
            Sample::None => None,
            Sample::Flag(flag) => Some(flag.to_string()),
            Sample::Count(count) => Some(count.to_string()),
            Sample::Position(Some(index)) => Some(index.to_string()),
            Sample::Position(None) => Some("none".to_string()),
            Sample::Located { value, .. } => Some(value.clone()),
        }
    }

    /// Index carried by the sample, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            Sample::Position(index) => *index,
            Sample::Located { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Size and boundary values of the buffer a trial reports on.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundaries {
    pub size: usize,
    pub lowest: String,
    pub highest: String,
}

impl Boundaries {
    /// First and last element, matching a front()/back() readout.
    pub fn of<T: fmt::Display>(data: &[T]) -> Self {
        let show = |value: Option<&T>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
        Boundaries {
            size: data.len(),
            lowest: show(data.first()),
            highest: show(data.last()),
        }
    }
}

/// One timed trial, handed straight to the report sink.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub operation: Operation,
    pub backend: Backend,
    pub mode: ExecutionMode,
    pub trial: usize,
    pub sample: Sample,
    pub boundaries: Boundaries,
    pub elapsed: Duration,
}

impl Measurement {
    pub fn tag(&self) -> String {
        trial_tag(self.operation, self.backend, self.mode)
    }
}

/// `"{mode} {backend}::{operation}"`, e.g. `"Parallel SIMD rayon::count"`.
pub fn trial_tag(operation: Operation, backend: Backend, mode: ExecutionMode) -> String {
    format!("{} {}::{}", mode.label(), backend.label(), operation.name())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Default,
    Json,
}
