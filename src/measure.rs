//! Measurement protocol: repeated timed spans reduced to a robust estimate.
//!
//! One measurement consists of `trials` timed spans. Each span reads the
//! counter, runs the workload's unrolled block `iterations` times, reads the
//! counter again and records the difference. The first `warmup` samples are
//! discarded (cold caches, untrained branch predictors, frequency ramp-up),
//! the rest are sorted, and the median is the reported cost of one span.
//!
//! The median is used instead of the mean because interrupts, preemption and
//! migration produce a long right tail of outliers; with trial counts this
//! small, sorting the whole set is cheaper than being clever about it.

use crate::counter::{self, CycleValue};

/// Parameters for one measurement run.
#[derive(Clone, Debug)]
pub struct MeasureParams {
    /// Times the workload's unrolled block repeats within one timed span
    /// (default: 1000). Large enough that counter-read overhead is
    /// negligible, so the per-pass cost is accurate to ~1/iterations of a
    /// cycle.
    pub iterations: usize,
    /// Total timed spans to execute (default: 120).
    pub trials: usize,
    /// Leading spans to discard (default: 20).
    pub warmup: usize,
}

impl Default for MeasureParams {
    fn default() -> Self {
        Self {
            iterations: 1000,
            trials: 120,
            warmup: 20,
        }
    }
}

/// The samples recorded by one measurement run, in execution order.
///
/// Filled once during the run; read-only afterwards.
#[derive(Clone, Debug)]
pub struct SampleSet {
    samples: Vec<u64>,
}

impl SampleSet {
    /// Run `params.trials` timed spans of `pass` against an arbitrary clock.
    ///
    /// The clock is a parameter so that the protocol can be exercised with
    /// synthetic readers in tests; [`measure`] instantiates it with the real
    /// counter.
    pub fn collect_with<C, F>(mut clock: C, mut pass: F, params: &MeasureParams) -> SampleSet
    where
        C: FnMut() -> CycleValue,
        F: FnMut(),
    {
        assert!(
            params.warmup < params.trials,
            "warmup ({}) must leave at least one trial ({})",
            params.warmup,
            params.trials
        );

        let mut samples = Vec::with_capacity(params.trials);
        for _ in 0..params.trials {
            let begin = clock();
            for _ in 0..params.iterations {
                pass();
            }
            let end = clock();
            samples.push(end.wrapping_sub(begin));
        }
        SampleSet { samples }
    }

    /// Build a sample set directly from recorded values (tests, replays).
    pub fn from_samples(samples: Vec<u64>) -> SampleSet {
        SampleSet { samples }
    }

    /// Number of recorded samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The recorded samples, in execution order.
    pub fn as_slice(&self) -> &[u64] {
        &self.samples
    }

    /// Reduce to the steady-state estimate: drop the first `warmup` samples,
    /// sort the remainder and take the median.
    ///
    /// With an even number of retained samples this returns the upper of the
    /// two central values; callers must not rely on which one it is.
    pub fn steady_state(&self, warmup: usize) -> TrialResult {
        assert!(
            warmup < self.samples.len(),
            "warmup ({}) must leave at least one sample ({})",
            warmup,
            self.samples.len()
        );

        let mut sorted = self.samples[warmup..].to_vec();
        sorted.sort_unstable();
        TrialResult {
            span_cycles: sorted[sorted.len() / 2],
            sample_count: sorted.len(),
        }
    }
}

/// The steady-state cost estimate for one measurement run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrialResult {
    /// Median cost of one timed span, in counter units.
    pub span_cycles: u64,
    /// Samples that survived the warm-up discard.
    pub sample_count: usize,
}

impl TrialResult {
    /// Cost of a single primitive operation, given how many of them one
    /// pass of the unrolled block performs and how many passes one span ran.
    pub fn per_operation(&self, ops_per_pass: usize, iterations: usize) -> f64 {
        self.span_cycles as f64 / (ops_per_pass * iterations) as f64
    }
}

/// Measure a workload block with the configured counter.
///
/// `pass` is one pass of the workload's unrolled block; it must carry its
/// state in captured variables so that consecutive passes stay
/// dependency-chained. See [`crate::workloads`] for the reference blocks.
pub fn measure<F: FnMut()>(pass: F, params: &MeasureParams) -> TrialResult {
    SampleSet::collect_with(counter::now, pass, params).steady_state(params.warmup)
}
