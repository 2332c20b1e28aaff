//! 32x32->32 chained multiplication workload.

use super::seed32;
use crate::measure::{measure, MeasureParams};
use crate::registry::{WorkloadReport, WorkloadRunner};
use rand::Rng;

/// Multiplications performed by one pass of the unrolled block.
pub const NARROW_MULS_PER_PASS: usize = 20;

/// Two 32-bit accumulators fed through an unrolled multiplication chain.
pub struct NarrowMul {
    x: u32,
    y: u32,
}

impl NarrowMul {
    /// Seed the accumulators from the program seed.
    pub fn seeded(seed: u64) -> Self {
        let (x, y) = seed32(seed);
        Self { x, y }
    }

    /// One pass of the unrolled block: 20 multiplications, each result an
    /// operand of the next.
    #[inline(always)]
    pub fn pass(&mut self) {
        self.x = self.x.wrapping_mul(self.y);
        self.y = self.y.wrapping_mul(self.x);
        self.x = self.x.wrapping_mul(self.y);
        self.y = self.y.wrapping_mul(self.x);
        self.x = self.x.wrapping_mul(self.y);
        self.y = self.y.wrapping_mul(self.x);
        self.x = self.x.wrapping_mul(self.y);
        self.y = self.y.wrapping_mul(self.x);
        self.x = self.x.wrapping_mul(self.y);
        self.y = self.y.wrapping_mul(self.x);
        self.x = self.x.wrapping_mul(self.y);
        self.y = self.y.wrapping_mul(self.x);
        self.x = self.x.wrapping_mul(self.y);
        self.y = self.y.wrapping_mul(self.x);
        self.x = self.x.wrapping_mul(self.y);
        self.y = self.y.wrapping_mul(self.x);
        self.x = self.x.wrapping_mul(self.y);
        self.y = self.y.wrapping_mul(self.x);
        self.x = self.x.wrapping_mul(self.y);
        self.y = self.y.wrapping_mul(self.x);
    }

    /// The externally observable accumulator value.
    pub fn residue(&self) -> u64 {
        self.x as u64
    }
}

pub struct NarrowMulRunner;

impl WorkloadRunner for NarrowMulRunner {
    fn name(&self) -> &'static str {
        "mul32"
    }

    fn description(&self) -> &'static str {
        "32x32->32 chained multiplications"
    }

    fn ops_per_pass(&self) -> usize {
        NARROW_MULS_PER_PASS
    }

    fn run(&self, seed: u64, params: &MeasureParams) -> WorkloadReport {
        let mut workload = NarrowMul::seeded(seed);
        let trial = measure(|| workload.pass(), params);
        WorkloadReport {
            name: self.name(),
            description: self.description(),
            span_cycles: trial.span_cycles,
            sample_count: trial.sample_count,
            cycles_per_op: trial.per_operation(NARROW_MULS_PER_PASS, params.iterations),
            residue: workload.residue(),
        }
    }

    fn verify(&self) -> Result<(), String> {
        // Degenerate seeds must stay degenerate.
        for seed in [0u64, 1] {
            let mut w = NarrowMul::seeded(seed);
            for _ in 0..50 {
                w.pass();
            }
            if w.residue() != seed {
                return Err(format!(
                    "mul32 seed {} drifted to residue {}",
                    seed,
                    w.residue()
                ));
            }
        }

        // Generic seeds must be deterministic.
        let mut rng = rand::rng();
        for _ in 0..4 {
            let seed: u64 = rng.random();
            let mut a = NarrowMul::seeded(seed);
            let mut b = NarrowMul::seeded(seed);
            for _ in 0..50 {
                a.pass();
                b.pass();
            }
            if a.residue() != b.residue() {
                return Err(format!("mul32 not deterministic for seed {}", seed));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_advances_the_chain() {
        let mut w = NarrowMul::seeded(3);
        let before = w.residue();
        w.pass();
        assert_ne!(w.residue(), before);
    }

    #[test]
    fn degenerate_seeds_stay_put() {
        for seed in [0u64, 1] {
            let mut w = NarrowMul::seeded(seed);
            w.pass();
            w.pass();
            assert_eq!(w.residue(), seed);
        }
    }

    #[test]
    fn runner_verifies() {
        assert!(NarrowMulRunner.verify().is_ok());
    }
}
