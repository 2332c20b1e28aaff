//! Workload registry for uniform discovery and execution.
//!
//! The harness binary and the library tests drive workloads through this
//! seam instead of hard-coding the three reference workloads everywhere.

use crate::measure::MeasureParams;

/// Result from one measured workload run.
#[derive(Clone, Debug)]
pub struct WorkloadReport {
    /// Workload name (e.g. "mul32").
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Median cost of one timed span, in counter units.
    pub span_cycles: u64,
    /// Samples that survived the warm-up discard.
    pub sample_count: usize,
    /// Cost of one multiplication, in counter units.
    pub cycles_per_op: f64,
    /// Final accumulator value; printed to keep the chain observable.
    pub residue: u64,
}

/// Trait that all measurable workloads implement.
pub trait WorkloadRunner: Send + Sync {
    /// Workload name (e.g. "mul32").
    fn name(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    /// Multiplications performed by one pass of the unrolled block.
    fn ops_per_pass(&self) -> usize;

    /// Seed the workload, measure it and report the per-operation cost.
    fn run(&self, seed: u64, params: &MeasureParams) -> WorkloadReport;

    /// Self-check the workload's accumulator discipline (determinism,
    /// special-case seeds). Does not touch the counter.
    fn verify(&self) -> Result<(), String>;
}

/// Registry of all workloads.
pub struct WorkloadRegistry {
    workloads: Vec<Box<dyn WorkloadRunner>>,
}

impl WorkloadRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            workloads: Vec::new(),
        }
    }

    /// Register a workload.
    pub fn register<W: WorkloadRunner + 'static>(&mut self, workload: W) {
        self.workloads.push(Box::new(workload));
    }

    /// Get all registered workloads.
    pub fn all(&self) -> &[Box<dyn WorkloadRunner>] {
        &self.workloads
    }

    /// Find a workload by name.
    pub fn find(&self, name: &str) -> Option<&dyn WorkloadRunner> {
        self.workloads
            .iter()
            .find(|w| w.name() == name)
            .map(|w| w.as_ref())
    }

    /// List workload names.
    pub fn list_names(&self) -> Vec<&'static str> {
        self.workloads.iter().map(|w| w.name()).collect()
    }
}

impl Default for WorkloadRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the default registry with the three reference workloads.
pub fn build_registry() -> WorkloadRegistry {
    let mut registry = WorkloadRegistry::new();

    registry.register(crate::workloads::NarrowMulRunner);
    registry.register(crate::workloads::WideMulRunner);
    registry.register(crate::workloads::WideningMulRunner);

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_the_reference_workloads() {
        let registry = build_registry();
        assert_eq!(registry.list_names(), vec!["mul32", "mul64", "mul64hi"]);
    }

    #[test]
    fn find_resolves_by_name() {
        let registry = build_registry();
        let wide = registry.find("mul64").expect("mul64 not registered");
        assert_eq!(wide.ops_per_pass(), 20);
        assert!(registry.find("mul128").is_none());
    }
}
