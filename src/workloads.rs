//! The benchmarked operations and the datasets each one runs against.

use std::marker::PhantomData;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::algorithms::{Element, Engine};
use crate::config::BenchConfig;
use crate::dataset;
use crate::errors::BenchError;
use crate::runner::{RunSummary, Runner, Sink, Workload};
use crate::types::{Backend, Boundaries, ExecutionMode, Operation, Sample};
use crate::verify::{self, Check};

const FILL_VALUE: i32 = 42;
const COUNT_TARGET: i32 = 42;
const ALL_OF_VALUE: i32 = 2;
const ANY_OF_VALUE: i32 = 3;
const MERGE_DST_INIT: i32 = 1;
const ADJACENT_DST_INIT: i32 = 10;

/// Runs every configured operation in order. Each operation draws its data
/// from a freshly seeded generator so results do not depend on which other
/// operations were selected.
pub fn run_suite<S: Sink>(engine: &Engine, config: &BenchConfig, sink: &mut S) -> Result<RunSummary, BenchError> {
    let mut runner = Runner::new(engine, config, sink);
    for &operation in &config.operations {
        let mut rng = config.seed.rng();
        match operation {
            Operation::MaxElement => runner.run(&MaxElement, &mut rng)?,
            Operation::AdjacentDifference => runner.run(&AdjacentDifference, &mut rng)?,
            Operation::AdjacentFind => runner.run(&AdjacentFind, &mut rng)?,
            Operation::AllOf => runner.run(&AllOf, &mut rng)?,
            Operation::AnyOf => runner.run(&AnyOf, &mut rng)?,
            Operation::Count => runner.run(&Count, &mut rng)?,
            Operation::Equal => runner.run(&Equal, &mut rng)?,
            Operation::Copy => runner.run(&CopyBuffer, &mut rng)?,
            Operation::Fill => runner.run(&Fill::<i32>::new(Operation::Fill), &mut rng)?,
            Operation::FillStream => runner.run(&StreamingFill, &mut rng)?,
            Operation::FillI64 => runner.run(&Fill::<i64>::new(Operation::FillI64), &mut rng)?,
            Operation::Merge => runner.run(&Merge, &mut rng)?,
            Operation::InplaceMerge => runner.run(&InplaceMerge, &mut rng)?,
            Operation::Sort => runner.run(&Sort { stable: false }, &mut rng)?,
            Operation::StableSort => runner.run(&Sort { stable: true }, &mut rng)?,
            Operation::SortF64 => runner.run(
                &SortF64 {
                    fresh_buffers: config.fresh_buffers,
                },
                &mut rng,
            )?,
            Operation::MergeDualBuffer => runner.run(&MergeRuns { single_buffer: false }, &mut rng)?,
            Operation::MergeSingleBuffer => runner.run(&MergeRuns { single_buffer: true }, &mut rng)?,
        }
    }
    runner.finish()
}

fn expect_flag(sample: &Sample, expected: bool) -> Check {
    match sample {
        Sample::Flag(actual) => verify::flag(*actual, expected),
        other => Err(format!("unexpected sample {:?}", other)),
    }
}

/// Restores `work` from `pristine` with the fastest copy available.
fn restore<T: Element>(engine: &Engine, pristine: &[T], work: &mut [T]) -> Result<(), BenchError> {
    engine.copy(Backend::Rayon, ExecutionMode::Parallel, pristine, work)
}

pub struct MaxElement;

impl Workload for MaxElement {
    type State = Vec<i32>;

    fn operation(&self) -> Operation {
        Operation::MaxElement
    }

    fn setup(&self, size: usize, _rng: &mut StdRng) -> Vec<i32> {
        dataset::ascending(size)
    }

    fn invoke(&self, engine: &Engine, backend: Backend, mode: ExecutionMode, data: &mut Vec<i32>) -> Result<Sample, BenchError> {
        Ok(match engine.max_element(backend, mode, data)? {
            Some(index) => Sample::Located {
                index,
                value: data[index].to_string(),
            },
            None => Sample::Position(None),
        })
    }

    fn verify(&self, data: &Vec<i32>, sample: &Sample) -> Check {
        let index = match sample {
            Sample::Located { index, .. } => Some(*index),
            _ => None,
        };
        verify::first_maximum(data, index)
    }

    fn boundaries(&self, data: &Vec<i32>) -> Boundaries {
        Boundaries::of(data)
    }
}

pub struct AdjacentDifference;

pub struct SourceAndTarget<T> {
    src: Vec<T>,
    dst: Vec<T>,
}

impl Workload for AdjacentDifference {
    type State = SourceAndTarget<i32>;

    fn operation(&self) -> Operation {
        Operation::AdjacentDifference
    }

    fn setup(&self, size: usize, _rng: &mut StdRng) -> Self::State {
        SourceAndTarget {
            src: dataset::ascending(size),
            dst: dataset::constant(size, ADJACENT_DST_INIT),
        }
    }

    fn invoke(&self, engine: &Engine, backend: Backend, mode: ExecutionMode, state: &mut Self::State) -> Result<Sample, BenchError> {
        engine.adjacent_difference(backend, mode, &state.src, &mut state.dst)?;
        Ok(Sample::None)
    }

    fn verify(&self, state: &Self::State, _sample: &Sample) -> Check {
        verify::adjacent_differences(&state.src, &state.dst)
    }

    fn boundaries(&self, state: &Self::State) -> Boundaries {
        Boundaries::of(&state.dst)
    }
}

/// Alternating 3, 2, 3, 2, ... so the search never finds a pair and scans
/// the whole input.
pub struct AdjacentFind;

impl Workload for AdjacentFind {
    type State = Vec<i32>;

    fn operation(&self) -> Operation {
        Operation::AdjacentFind
    }

    fn setup(&self, size: usize, _rng: &mut StdRng) -> Vec<i32> {
        dataset::alternating(size, 3, 2)
    }

    fn invoke(&self, engine: &Engine, backend: Backend, mode: ExecutionMode, data: &mut Vec<i32>) -> Result<Sample, BenchError> {
        Ok(Sample::Position(engine.adjacent_find(backend, mode, data)?))
    }

    fn verify(&self, data: &Vec<i32>, sample: &Sample) -> Check {
        match sample {
            Sample::Position(found) => verify::first_adjacent_pair(data, *found),
            other => Err(format!("unexpected sample {:?}", other)),
        }
    }

    fn boundaries(&self, data: &Vec<i32>) -> Boundaries {
        Boundaries::of(data)
    }
}

pub struct AllOf;

impl Workload for AllOf {
    type State = Vec<i32>;

    fn operation(&self) -> Operation {
        Operation::AllOf
    }

    fn setup(&self, size: usize, _rng: &mut StdRng) -> Vec<i32> {
        dataset::constant(size, ALL_OF_VALUE)
    }

    fn invoke(&self, engine: &Engine, backend: Backend, mode: ExecutionMode, data: &mut Vec<i32>) -> Result<Sample, BenchError> {
        let all = engine.all_of(backend, mode, data, |x| x == ALL_OF_VALUE)?;
        Ok(Sample::Flag(all))
    }

    fn verify(&self, _data: &Vec<i32>, sample: &Sample) -> Check {
        expect_flag(sample, true)
    }

    fn boundaries(&self, data: &Vec<i32>) -> Boundaries {
        Boundaries::of(data)
    }
}

pub struct AnyOf;

impl Workload for AnyOf {
    type State = Vec<i32>;

    fn operation(&self) -> Operation {
        Operation::AnyOf
    }

    fn setup(&self, size: usize, _rng: &mut StdRng) -> Vec<i32> {
        dataset::constant(size, ALL_OF_VALUE)
    }

    fn invoke(&self, engine: &Engine, backend: Backend, mode: ExecutionMode, data: &mut Vec<i32>) -> Result<Sample, BenchError> {
        let any = engine.any_of(backend, mode, data, |x| x == ANY_OF_VALUE)?;
        Ok(Sample::Flag(any))
    }

    fn verify(&self, _data: &Vec<i32>, sample: &Sample) -> Check {
        expect_flag(sample, false)
    }

    fn boundaries(&self, data: &Vec<i32>) -> Boundaries {
        Boundaries::of(data)
    }
}

pub struct Count;

impl Workload for Count {
    type State = Vec<i32>;

    fn operation(&self) -> Operation {
        Operation::Count
    }

    fn setup(&self, size: usize, _rng: &mut StdRng) -> Vec<i32> {
        dataset::ascending(size)
    }

    fn invoke(&self, engine: &Engine, backend: Backend, mode: ExecutionMode, data: &mut Vec<i32>) -> Result<Sample, BenchError> {
        Ok(Sample::Count(engine.count(backend, mode, data, COUNT_TARGET)?))
    }

    fn verify(&self, data: &Vec<i32>, sample: &Sample) -> Check {
        let expected = data.iter().filter(|&&x| x == COUNT_TARGET).count();
        match sample {
            Sample::Count(n) if *n == expected => Ok(()),
            other => Err(format!("counted {:?}, expected {}", other, expected)),
        }
    }

    fn boundaries(&self, data: &Vec<i32>) -> Boundaries {
        Boundaries::of(data)
    }
}

/// Two identically initialized buffers; a false result means the library
/// is broken and the run must stop.
pub struct Equal;

pub struct Pair<T> {
    a: Vec<T>,
    b: Vec<T>,
}

impl Workload for Equal {
    type State = Pair<i32>;

    fn operation(&self) -> Operation {
        Operation::Equal
    }

    fn setup(&self, size: usize, _rng: &mut StdRng) -> Self::State {
        Pair {
            a: dataset::constant(size, 0),
            b: dataset::constant(size, 0),
        }
    }

    fn invoke(&self, engine: &Engine, backend: Backend, mode: ExecutionMode, state: &mut Self::State) -> Result<Sample, BenchError> {
        Ok(Sample::Flag(engine.equal(backend, mode, &state.a, &state.b)?))
    }

    fn verify(&self, _state: &Self::State, sample: &Sample) -> Check {
        expect_flag(sample, true)
    }

    fn boundaries(&self, state: &Self::State) -> Boundaries {
        Boundaries::of(&state.a)
    }
}

pub struct CopyBuffer;

impl Workload for CopyBuffer {
    type State = SourceAndTarget<i32>;

    fn operation(&self) -> Operation {
        Operation::Copy
    }

    fn setup(&self, size: usize, _rng: &mut StdRng) -> Self::State {
        SourceAndTarget {
            src: dataset::ascending(size),
            dst: dataset::constant(size, 0),
        }
    }

    fn invoke(&self, engine: &Engine, backend: Backend, mode: ExecutionMode, state: &mut Self::State) -> Result<Sample, BenchError> {
        engine.copy(backend, mode, &state.src, &mut state.dst)?;
        Ok(Sample::None)
    }

    fn verify(&self, state: &Self::State, _sample: &Sample) -> Check {
        verify::identical(&state.dst, &state.src)
    }

    fn boundaries(&self, state: &Self::State) -> Boundaries {
        Boundaries::of(&state.dst)
    }
}

/// Fill overwrites every slot, so the buffer is reused across trials.
pub struct Fill<T> {
    operation: Operation,
    _element: PhantomData<T>,
}

impl<T: Element> Fill<T> {
    pub fn new(operation: Operation) -> Self {
        Fill {
            operation,
            _element: PhantomData,
        }
    }

    fn value() -> T {
        T::from_small(FILL_VALUE)
    }
}

impl<T: Element> Workload for Fill<T> {
    type State = Vec<T>;

    fn operation(&self) -> Operation {
        self.operation
    }

    fn setup(&self, size: usize, _rng: &mut StdRng) -> Vec<T> {
        dataset::constant(size, T::ZERO)
    }

    fn invoke(&self, engine: &Engine, backend: Backend, mode: ExecutionMode, data: &mut Vec<T>) -> Result<Sample, BenchError> {
        engine.fill(backend, mode, self.operation, data, Self::value())?;
        Ok(Sample::None)
    }

    fn verify(&self, data: &Vec<T>, _sample: &Sample) -> Check {
        verify::all_equal_to(data, Self::value())
    }

    fn boundaries(&self, data: &Vec<T>) -> Boundaries {
        Boundaries::of(data)
    }
}

/// Same buffer and value as `fill`, written with non-temporal stores.
pub struct StreamingFill;

impl Workload for StreamingFill {
    type State = Vec<i32>;

    fn operation(&self) -> Operation {
        Operation::FillStream
    }

    fn setup(&self, size: usize, _rng: &mut StdRng) -> Vec<i32> {
        dataset::constant(size, 0)
    }

    fn invoke(&self, engine: &Engine, backend: Backend, mode: ExecutionMode, data: &mut Vec<i32>) -> Result<Sample, BenchError> {
        engine.fill_streaming(backend, mode, data, FILL_VALUE)?;
        Ok(Sample::None)
    }

    fn verify(&self, data: &Vec<i32>, _sample: &Sample) -> Check {
        verify::all_equal_to(data, FILL_VALUE)
    }

    fn boundaries(&self, data: &Vec<i32>) -> Boundaries {
        Boundaries::of(data)
    }
}

/// Two sorted random inputs of `size` elements merged into a `2 * size`
/// destination. The inputs are never modified, so nothing is reset.
pub struct Merge;

pub struct MergeState {
    left: Vec<i32>,
    right: Vec<i32>,
    out: Vec<i32>,
    expected: Vec<i32>,
}

impl Workload for Merge {
    type State = MergeState;

    fn operation(&self) -> Operation {
        Operation::Merge
    }

    fn setup(&self, size: usize, rng: &mut StdRng) -> MergeState {
        let left = dataset::sorted_random(size, rng);
        let right = dataset::sorted_random(size, rng);
        let expected = dataset::sorted_copy(&[left.as_slice(), right.as_slice()].concat());
        MergeState {
            left,
            right,
            out: dataset::constant(2 * size, MERGE_DST_INIT),
            expected,
        }
    }

    fn invoke(&self, engine: &Engine, backend: Backend, mode: ExecutionMode, state: &mut MergeState) -> Result<Sample, BenchError> {
        engine.merge(backend, mode, &state.left, &state.right, &mut state.out)?;
        Ok(Sample::None)
    }

    fn verify(&self, state: &MergeState, _sample: &Sample) -> Check {
        verify::length(&state.out, state.left.len() + state.right.len())?;
        verify::sorted_like(&state.out, &state.expected)
    }

    fn boundaries(&self, state: &MergeState) -> Boundaries {
        Boundaries::of(&state.out)
    }
}

/// Two sorted runs of `size` stored back to back in one buffer.
///
/// With `single_buffer` the destination is the back half of that same
/// buffer (`4 * size` in total); otherwise it is a separate `2 * size`
/// buffer. The runs are only read, so nothing is reset between trials.
pub struct MergeRuns {
    pub single_buffer: bool,
}

pub struct RunsState {
    buffer: Vec<i32>,
    dst: Vec<i32>,
    run: usize,
    expected: Vec<i32>,
}

impl RunsState {
    fn output(&self) -> &[i32] {
        if self.dst.is_empty() {
            &self.buffer[2 * self.run..]
        } else {
            &self.dst
        }
    }
}

impl Workload for MergeRuns {
    type State = RunsState;

    fn operation(&self) -> Operation {
        if self.single_buffer {
            Operation::MergeSingleBuffer
        } else {
            Operation::MergeDualBuffer
        }
    }

    fn setup(&self, size: usize, rng: &mut StdRng) -> RunsState {
        let mut buffer = dataset::sorted_random(size, rng);
        buffer.extend(dataset::sorted_random::<i32>(size, rng));
        let expected = dataset::sorted_copy(&buffer);
        let dst = if self.single_buffer {
            buffer.extend(dataset::constant(2 * size, MERGE_DST_INIT));
            Vec::new()
        } else {
            dataset::constant(2 * size, MERGE_DST_INIT)
        };
        RunsState {
            buffer,
            dst,
            run: size,
            expected,
        }
    }

    fn invoke(&self, engine: &Engine, backend: Backend, mode: ExecutionMode, state: &mut RunsState) -> Result<Sample, BenchError> {
        let run = state.run;
        if self.single_buffer {
            let (runs, dst) = state.buffer.split_at_mut(2 * run);
            engine.merge(backend, mode, &runs[..run], &runs[run..], dst)?;
        } else {
            let runs = &state.buffer[..2 * run];
            engine.merge(backend, mode, &runs[..run], &runs[run..], &mut state.dst)?;
        }
        Ok(Sample::None)
    }

    fn verify(&self, state: &RunsState, _sample: &Sample) -> Check {
        verify::sorted_like(state.output(), &state.expected)
    }

    fn boundaries(&self, state: &RunsState) -> Boundaries {
        if self.single_buffer {
            Boundaries::of(&state.buffer)
        } else {
            Boundaries::of(&state.dst)
        }
    }
}

/// A pristine copy kept aside, a working buffer the timed call destroys,
/// and the sorted reference the result must equal.
pub struct Reshuffled<T> {
    pristine: Vec<T>,
    work: Vec<T>,
    expected: Vec<T>,
}

impl<T: Element> Reshuffled<T> {
    fn new(pristine: Vec<T>) -> Self {
        Reshuffled {
            work: pristine.clone(),
            expected: dataset::sorted_copy(&pristine),
            pristine,
        }
    }
}

/// `2 * size` random elements. Before every trial the pristine data is
/// copied back and both halves are sorted, leaving two runs to merge.
pub struct InplaceMerge;

impl Workload for InplaceMerge {
    type State = Reshuffled<i32>;

    fn operation(&self) -> Operation {
        Operation::InplaceMerge
    }

    fn setup(&self, size: usize, rng: &mut StdRng) -> Self::State {
        Reshuffled::new(dataset::random(2 * size, rng))
    }

    fn prepare(&self, engine: &Engine, state: &mut Self::State) -> Result<(), BenchError> {
        restore(engine, &state.pristine, &mut state.work)?;
        let mid = state.work.len() / 2;
        let (left, right) = state.work.split_at_mut(mid);
        engine.sort(Backend::Rayon, ExecutionMode::Parallel, Operation::Sort, left)?;
        engine.sort(Backend::Rayon, ExecutionMode::Parallel, Operation::Sort, right)
    }

    fn invoke(&self, engine: &Engine, backend: Backend, mode: ExecutionMode, state: &mut Self::State) -> Result<Sample, BenchError> {
        let mid = state.work.len() / 2;
        engine.inplace_merge(backend, mode, &mut state.work, mid)?;
        Ok(Sample::None)
    }

    fn verify(&self, state: &Self::State, _sample: &Sample) -> Check {
        verify::sorted_like(&state.work, &state.expected)
    }

    fn boundaries(&self, state: &Self::State) -> Boundaries {
        Boundaries::of(&state.work)
    }
}

/// Sorting destroys its input, so each trial starts from a fresh copy of
/// the same random data.
pub struct Sort {
    pub stable: bool,
}

impl Workload for Sort {
    type State = Reshuffled<i32>;

    fn operation(&self) -> Operation {
        if self.stable {
            Operation::StableSort
        } else {
            Operation::Sort
        }
    }

    fn setup(&self, size: usize, rng: &mut StdRng) -> Self::State {
        Reshuffled::new(dataset::random(size, rng))
    }

    fn prepare(&self, engine: &Engine, state: &mut Self::State) -> Result<(), BenchError> {
        restore(engine, &state.pristine, &mut state.work)
    }

    fn invoke(&self, engine: &Engine, backend: Backend, mode: ExecutionMode, state: &mut Self::State) -> Result<Sample, BenchError> {
        if self.stable {
            engine.stable_sort(backend, mode, &mut state.work)?;
        } else {
            engine.sort(backend, mode, Operation::Sort, &mut state.work)?;
        }
        Ok(Sample::None)
    }

    fn verify(&self, state: &Self::State, _sample: &Sample) -> Check {
        verify::sorted_like(&state.work, &state.expected)
    }

    fn boundaries(&self, state: &Self::State) -> Boundaries {
        Boundaries::of(&state.work)
    }
}

/// Doubles regenerated before every trial, either into the same buffer or
/// into a brand new allocation.
pub struct SortF64 {
    pub fresh_buffers: bool,
}

pub struct Regenerated {
    rng: StdRng,
    data: Vec<f64>,
    expected: Vec<f64>,
}

impl Workload for SortF64 {
    type State = Regenerated;

    fn operation(&self) -> Operation {
        Operation::SortF64
    }

    fn setup(&self, size: usize, rng: &mut StdRng) -> Regenerated {
        let mut rng = StdRng::seed_from_u64(rng.next_u64());
        let data: Vec<f64> = dataset::random(size, &mut rng);
        Regenerated {
            expected: dataset::sorted_copy(&data),
            rng,
            data,
        }
    }

    fn prepare(&self, _engine: &Engine, state: &mut Regenerated) -> Result<(), BenchError> {
        if self.fresh_buffers {
            state.data = dataset::random(state.data.len(), &mut state.rng);
        } else {
            dataset::refill_random(&mut state.data, &mut state.rng);
        }
        state.expected = dataset::sorted_copy(&state.data);
        Ok(())
    }

    fn invoke(&self, engine: &Engine, backend: Backend, mode: ExecutionMode, state: &mut Regenerated) -> Result<Sample, BenchError> {
        engine.sort(backend, mode, Operation::SortF64, &mut state.data)?;
        Ok(Sample::None)
    }

    fn verify(&self, state: &Regenerated, _sample: &Sample) -> Check {
        verify::sorted_like(&state.data, &state.expected)
    }

    fn boundaries(&self, state: &Regenerated) -> Boundaries {
        Boundaries::of(&state.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capabilities;
    use crate::dataset::Seed;
    use crate::types::Measurement;

    #[derive(Default)]
    struct Collect(Vec<Measurement>);

    impl Sink for Collect {
        fn record(&mut self, measurement: &Measurement) -> Result<(), BenchError> {
            self.0.push(measurement.clone());
            Ok(())
        }
    }

    fn engine() -> Engine {
        let caps = Capabilities {
            vector_bits: 256,
            simd_disabled: false,
            streaming_stores: true,
        };
        Engine::new(caps, Some(3)).unwrap()
    }

    fn small_config(operations: Vec<Operation>) -> BenchConfig {
        BenchConfig {
            size: 5_000,
            repeats: 2,
            operations,
            ..BenchConfig::default()
        }
    }

    fn run(operations: Vec<Operation>) -> (RunSummary, Vec<Measurement>) {
        let engine = engine();
        let config = small_config(operations);
        let mut sink = Collect::default();
        let summary = run_suite(&engine, &config, &mut sink).unwrap();
        (summary, sink.0)
    }

    #[test]
    fn every_operation_passes_its_post_conditions() {
        let all = Operation::ALL.to_vec();
        let (summary, records) = run(all.clone());
        assert_eq!(summary.operations, 18);
        assert_eq!(summary.trials, records.len());
        for op in all {
            if op.streaming() && !cfg!(target_arch = "x86_64") {
                continue;
            }
            assert!(records.iter().any(|m| m.operation == op), "{} never ran", op);
        }
    }

    #[test]
    fn orderings_run_serially_or_on_rayon_only() {
        // std serial, rayon serial, rayon parallel
        let (summary, records) = run(vec![Operation::Sort]);
        assert_eq!(records.len(), 3 * 2);
        assert_eq!(summary.skipped_modes, 5);
        let tags: Vec<String> = records.iter().map(|m| m.tag()).collect();
        assert!(tags.contains(&"Serial std::sort".to_string()));
        assert!(tags.contains(&"Parallel rayon::sort".to_string()));
        assert!(!tags.iter().any(|t| t.contains("SIMD")));
    }

    #[test]
    fn fill_reports_the_fill_value() {
        let (_, records) = run(vec![Operation::Fill]);
        assert_eq!(records.len(), 2 * 4 * 2);
        for m in &records {
            assert_eq!(m.boundaries.lowest, "42");
            assert_eq!(m.boundaries.highest, "42");
            assert_eq!(m.sample, Sample::None);
        }
    }

    #[test]
    fn merge_reports_double_length() {
        let (_, records) = run(vec![Operation::Merge]);
        assert!(records.iter().all(|m| m.boundaries.size == 10_000));
    }

    #[test]
    fn merge_runs_fill_the_destination_region() {
        for (op, total) in [
            (Operation::MergeDualBuffer, 10_000),
            (Operation::MergeSingleBuffer, 20_000),
        ] {
            let (_, records) = run(vec![op]);
            assert!(!records.is_empty());
            assert!(records.iter().all(|m| m.boundaries.size == total), "{}", op);
        }
    }

    #[test]
    fn single_buffer_merge_keeps_its_runs() {
        let engine = engine();
        let mut rng = Seed::Fixed(8).rng();
        let workload = MergeRuns { single_buffer: true };
        let mut state = workload.setup(300, &mut rng);
        let runs = state.buffer[..600].to_vec();
        workload
            .invoke(&engine, Backend::Rayon, ExecutionMode::Parallel, &mut state)
            .unwrap();
        assert_eq!(&state.buffer[..600], runs.as_slice());
        assert!(workload.verify(&state, &Sample::None).is_ok());
    }

    #[test]
    fn streaming_fill_runs_on_std_serial() {
        let (summary, records) = run(vec![Operation::FillStream]);
        if cfg!(target_arch = "x86_64") {
            assert_eq!(records.len(), 2);
            assert!(records.iter().all(|m| m.tag() == "Serial std::fill_stream"));
            assert!(records.iter().all(|m| m.boundaries.lowest == "42"));
        } else {
            assert!(records.is_empty());
        }
        assert_eq!(summary.operations, 1);
    }

    #[test]
    fn sort_check_catches_substituted_elements() {
        let mut state = Reshuffled::new(vec![3, 1, 2, 4]);
        // same length, sorted, and the same wrapping sum as 1, 2, 3, 4
        state.work = vec![2, 2, 2, 4];
        let result = Sort { stable: false }.verify(&state, &Sample::None);
        assert!(result.unwrap_err().contains("multiset changed"));
    }

    #[test]
    fn merge_check_catches_substituted_elements() {
        let mut rng = Seed::Fixed(3).rng();
        let mut state = Merge.setup(4, &mut rng);
        state.out = state.expected.clone();
        assert!(Merge.verify(&state, &Sample::None).is_ok());
        state.out[0] = i32::MIN;
        assert!(Merge.verify(&state, &Sample::None).is_err());
    }

    #[test]
    fn samples_carry_the_expected_answers() {
        let (_, records) = run(vec![
            Operation::AllOf,
            Operation::AnyOf,
            Operation::Count,
            Operation::AdjacentFind,
            Operation::MaxElement,
            Operation::Equal,
        ]);
        for m in &records {
            let expected = match m.operation {
                Operation::AllOf | Operation::Equal => Sample::Flag(true),
                Operation::AnyOf => Sample::Flag(false),
                Operation::Count => Sample::Count(1),
                Operation::AdjacentFind => Sample::Position(None),
                Operation::MaxElement => Sample::Located {
                    index: 4_999,
                    value: "4999".to_string(),
                },
                other => panic!("unexpected operation {}", other),
            };
            assert_eq!(m.sample, expected, "{}", m.tag());
        }
    }

    #[test]
    fn sort_trials_start_from_pristine_data() {
        let engine = engine();
        let mut rng = Seed::Fixed(1234).rng();
        let workload = Sort { stable: false };
        let mut state = workload.setup(1_000, &mut rng);
        let pristine = state.pristine.clone();

        workload.prepare(&engine, &mut state).unwrap();
        workload
            .invoke(&engine, Backend::Std, ExecutionMode::Serial, &mut state)
            .unwrap();
        assert_eq!(state.pristine, pristine);
        assert!(verify::sorted(&state.work).is_ok());

        workload.prepare(&engine, &mut state).unwrap();
        assert_eq!(state.work, pristine);
    }

    #[test]
    fn inplace_merge_prepare_leaves_two_sorted_runs() {
        let engine = engine();
        let mut rng = Seed::Fixed(1234).rng();
        let mut state = InplaceMerge.setup(500, &mut rng);
        InplaceMerge.prepare(&engine, &mut state).unwrap();
        let (left, right) = state.work.split_at(500);
        assert!(verify::sorted(left).is_ok());
        assert!(verify::sorted(right).is_ok());
    }

    #[test]
    fn fresh_buffers_regenerate_each_trial() {
        let engine = engine();
        let mut rng = Seed::Fixed(5).rng();
        let workload = SortF64 { fresh_buffers: true };
        let mut state = workload.setup(256, &mut rng);
        let before = state.data.clone();
        workload.prepare(&engine, &mut state).unwrap();
        assert_eq!(state.data.len(), 256);
        assert_ne!(state.data, before);
    }

    #[test]
    fn copy_leaves_source_untouched() {
        let engine = engine();
        let mut rng = Seed::Fixed(1).rng();
        let mut state = CopyBuffer.setup(1_000, &mut rng);
        let src = state.src.clone();
        CopyBuffer.invoke(&engine, Backend::Std, ExecutionMode::ParallelSimd, &mut state)
            .unwrap();
        assert_eq!(state.src, src);
        assert!(CopyBuffer.verify(&state, &Sample::None).is_ok());
    }
}
