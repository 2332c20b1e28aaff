//! # cycle-probe
//!
//! Cycle-accurate latency measurement of short instruction sequences, for
//! micro-optimization and constant-time verification of tight loops
//! (chained multiplications being the reference case).
//!
//! The crate has two halves. [`enable`] is the privileged side: it switches
//! on unprivileged access to the per-core cycle counter on architectures
//! where that access is off by default, broadcast to every core. The rest
//! is the unprivileged measurement harness: [`counter`] reads the counter
//! with the right fencing for the target architecture, the `measure`
//! module turns repeated timed spans into a median-based estimate, and
//! [`workloads`] provides the dependency-chained multiplication blocks
//! under test.
//!
//! The measuring process is expected to be pinned to one core (see
//! [`utils::cpu_affinity`]); counter values are meaningless across cores.

pub mod counter;
pub mod enable;
pub mod measure;
pub mod registry;
pub mod tui;
pub mod utils;
pub mod workloads;

pub use measure::{measure, MeasureParams, SampleSet, TrialResult};

/// Re-export commonly used items.
pub mod prelude {
    pub use crate::measure::{measure, MeasureParams, SampleSet, TrialResult};
    pub use crate::registry::{build_registry, WorkloadRegistry, WorkloadRunner};
    pub use crate::utils::CpuPinGuard;
    pub use crate::workloads::{NarrowMul, WideMul, WideningMul};
}

#[cfg(test)]
mod tests {
    use crate::measure::MeasureParams;
    use crate::registry::build_registry;

    #[test]
    fn all_workloads_verify() {
        let registry = build_registry();
        for workload in registry.all() {
            if let Err(e) = workload.verify() {
                panic!("workload '{}' failed verification: {}", workload.name(), e);
            }
        }
    }

    // End-to-end run against the real counter. Needs a prepared machine
    // (see README), so it only runs on demand; with `use_time` it runs
    // against the wall clock instead.
    #[test]
    #[cfg_attr(
        all(feature = "cycle_counter", not(feature = "use_time")),
        ignore = "requires unprivileged cycle-counter access"
    )]
    fn end_to_end_generic_seed() {
        let params = MeasureParams::default();
        let registry = build_registry();

        let reports: Vec<_> = registry.all().iter().map(|w| w.run(3, &params)).collect();
        assert_eq!(reports.len(), 3);
        for report in &reports {
            assert!(
                report.cycles_per_op > 0.0,
                "{} reported a non-positive cost",
                report.name
            );
            assert_eq!(report.sample_count, 100);
        }

        // Reaching the upper half of the product costs at least as much as
        // a same-width multiplication.
        let wide = reports.iter().find(|r| r.name == "mul64").unwrap();
        let widening = reports.iter().find(|r| r.name == "mul64hi").unwrap();
        assert!(
            widening.cycles_per_op >= wide.cycles_per_op,
            "mul64hi ({:.3}) should not be cheaper than mul64 ({:.3})",
            widening.cycles_per_op,
            wide.cycles_per_op
        );
    }
}
