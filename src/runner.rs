use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::algorithms::Engine;
use crate::config::BenchConfig;
use crate::errors::BenchError;
use crate::types::{Backend, Boundaries, ElementKind, ExecutionMode, Measurement, Operation, Sample, trial_tag};
use crate::verify::Check;

/// One benchmarked operation: how to build its data, reset it between
/// trials, call it, and check what it produced.
pub trait Workload {
    type State;

    fn operation(&self) -> Operation;

    /// Allocates and initializes the datasets. Untimed.
    fn setup(&self, size: usize, rng: &mut StdRng) -> Self::State;

    /// Restores whatever the previous trial destroyed. Untimed.
    fn prepare(&self, _engine: &Engine, _state: &mut Self::State) -> Result<(), BenchError> {
        Ok(())
    }

    /// The timed call.
    fn invoke(
        &self,
        engine: &Engine,
        backend: Backend,
        mode: ExecutionMode,
        state: &mut Self::State,
    ) -> Result<Sample, BenchError>;

    /// Post-condition over the trial's output. Untimed; failure is fatal.
    fn verify(&self, _state: &Self::State, _sample: &Sample) -> Check {
        Ok(())
    }

    /// Size and front/back values of the buffer the report line describes.
    fn boundaries(&self, state: &Self::State) -> Boundaries;
}

/// Receives measurements as soon as they exist.
pub trait Sink {
    fn begin(&mut self, _operation: Operation, _element: ElementKind, _size: usize) -> Result<(), BenchError> {
        Ok(())
    }

    fn record(&mut self, measurement: &Measurement) -> Result<(), BenchError>;

    fn finish(&mut self, _summary: &RunSummary) -> Result<(), BenchError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub operations: usize,
    pub trials: usize,
    pub skipped_modes: usize,
    pub timed: Duration,
}

pub struct Runner<'a, S: Sink> {
    engine: &'a Engine,
    config: &'a BenchConfig,
    sink: &'a mut S,
    summary: RunSummary,
}

impl<'a, S: Sink> Runner<'a, S> {
    pub fn new(engine: &'a Engine, config: &'a BenchConfig, sink: &'a mut S) -> Self {
        Runner {
            engine,
            config,
            sink,
            summary: RunSummary::default(),
        }
    }

    /// For each backend, for each supported mode, for each repeat:
    /// prepare, time the call, verify, report.
    pub fn run<W: Workload>(&mut self, workload: &W, rng: &mut StdRng) -> Result<(), BenchError> {
        let operation = workload.operation();
        let mut state = workload.setup(self.config.size, rng);
        let size = workload.boundaries(&state).size;

        info!(%operation, size, repeats = self.config.repeats, "running");
        self.sink.begin(operation, operation.element(), size)?;
        self.summary.operations += 1;

        for &backend in &self.config.backends {
            for &mode in &self.config.modes {
                if !self.engine.supports(backend, operation, mode) {
                    debug!(%backend, %operation, %mode, "mode unavailable, skipping");
                    self.summary.skipped_modes += 1;
                    continue;
                }

                for trial in 0..self.config.repeats {
                    workload.prepare(self.engine, &mut state)?;

                    let started = Instant::now();
                    let sample = workload.invoke(self.engine, backend, mode, &mut state)?;
                    let elapsed = started.elapsed();

                    workload.verify(&state, &sample).map_err(|detail| BenchError::InvariantViolation {
                        tag: trial_tag(operation, backend, mode),
                        detail,
                    })?;

                    let measurement = Measurement {
                        operation,
                        backend,
                        mode,
                        trial,
                        sample,
                        boundaries: workload.boundaries(&state),
                        elapsed,
                    };
                    debug!(tag = %measurement.tag(), trial, ?elapsed, "trial done");
                    self.summary.trials += 1;
                    self.summary.timed += elapsed;
                    self.sink.record(&measurement)?;
                }
            }
        }

        Ok(())
    }

    pub fn finish(self) -> Result<RunSummary, BenchError> {
        self.sink.finish(&self.summary)?;
        Ok(self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capabilities;
    use crate::dataset::Seed;

    #[derive(Default)]
    struct Collect(Vec<Measurement>);

    impl Sink for Collect {
        fn record(&mut self, measurement: &Measurement) -> Result<(), BenchError> {
            self.0.push(measurement.clone());
            Ok(())
        }
    }

    /// Compares a zero buffer with itself; `lie` flips the answer.
    struct Probe {
        lie: bool,
    }

    struct ProbeState {
        data: Vec<i32>,
    }

    impl Workload for Probe {
        type State = ProbeState;

        fn operation(&self) -> Operation {
            Operation::Equal
        }

        fn setup(&self, size: usize, _rng: &mut StdRng) -> ProbeState {
            ProbeState { data: vec![0; size] }
        }

        fn invoke(
            &self,
            engine: &Engine,
            backend: Backend,
            mode: ExecutionMode,
            state: &mut ProbeState,
        ) -> Result<Sample, BenchError> {
            let eq = engine.equal(backend, mode, &state.data, &state.data)?;
            Ok(Sample::Flag(eq && !self.lie))
        }

        fn verify(&self, _state: &ProbeState, sample: &Sample) -> Check {
            match sample {
                Sample::Flag(true) => Ok(()),
                other => Err(format!("unexpected {:?}", other)),
            }
        }

        fn boundaries(&self, state: &ProbeState) -> Boundaries {
            Boundaries::of(&state.data)
        }
    }

    fn engine(simd: bool) -> Engine {
        let caps = Capabilities {
            vector_bits: 128,
            simd_disabled: !simd,
            streaming_stores: true,
        };
        Engine::new(caps, Some(2)).unwrap()
    }

    fn config(repeats: usize) -> BenchConfig {
        BenchConfig {
            size: 64,
            repeats,
            ..BenchConfig::default()
        }
    }

    #[test]
    fn runs_every_backend_mode_and_repeat() {
        let engine = engine(true);
        let config = config(3);
        let mut sink = Collect::default();
        let mut runner = Runner::new(&engine, &config, &mut sink);
        runner.run(&Probe { lie: false }, &mut Seed::Fixed(1).rng()).unwrap();
        let summary = runner.finish().unwrap();

        assert_eq!(summary.trials, 2 * 4 * 3);
        assert_eq!(summary.operations, 1);
        assert_eq!(sink.0.len(), 24);
        assert_eq!(sink.0[0].tag(), "Serial std::equal");
        assert_eq!(sink.0[23].tag(), "Parallel SIMD rayon::equal");
        assert!(sink.0.iter().all(|m| m.boundaries.size == 64));
        assert_eq!(sink.0[2].trial, 2);
    }

    #[test]
    fn skips_modes_the_engine_cannot_run() {
        let engine = engine(false);
        let config = config(1);
        let mut sink = Collect::default();
        let mut runner = Runner::new(&engine, &config, &mut sink);
        runner.run(&Probe { lie: false }, &mut Seed::Fixed(1).rng()).unwrap();
        let summary = runner.finish().unwrap();

        assert_eq!(summary.skipped_modes, 4);
        assert!(sink.0.iter().all(|m| !m.mode.is_vectorized()));
    }

    #[test]
    fn failed_post_condition_aborts_the_run() {
        let engine = engine(true);
        let config = config(2);
        let mut sink = Collect::default();
        let mut runner = Runner::new(&engine, &config, &mut sink);
        let err = runner
            .run(&Probe { lie: true }, &mut Seed::Fixed(1).rng())
            .unwrap_err();

        match err {
            BenchError::InvariantViolation { tag, .. } => assert_eq!(tag, "Serial std::equal"),
            other => panic!("expected invariant violation, got {:?}", other),
        }
        assert!(sink.0.is_empty());
    }

    #[test]
    fn zero_repeats_records_nothing() {
        let engine = engine(true);
        let config = config(0);
        let mut sink = Collect::default();
        let mut runner = Runner::new(&engine, &config, &mut sink);
        runner.run(&Probe { lie: false }, &mut Seed::Fixed(1).rng()).unwrap();
        assert_eq!(runner.finish().unwrap().trials, 0);
        assert!(sink.0.is_empty());
    }
}
