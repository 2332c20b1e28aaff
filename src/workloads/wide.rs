//! 64x64->64 chained multiplication workload.

use super::seed64;
use crate::measure::{measure, MeasureParams};
use crate::registry::{WorkloadReport, WorkloadRunner};
use rand::Rng;

/// Multiplications performed by one pass of the unrolled block.
pub const WIDE_MULS_PER_PASS: usize = 20;

/// Two 64-bit accumulators fed through an unrolled multiplication chain.
pub struct WideMul {
    x: u64,
    y: u64,
}

impl WideMul {
    /// Seed the accumulators from the program seed.
    pub fn seeded(seed: u64) -> Self {
        let (x, y) = seed64(seed);
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
        self.x
    }
}

pub struct WideMulRunner;

impl WorkloadRunner for WideMulRunner {
    fn name(&self) -> &'static str {
        "mul64"
    }

    fn description(&self) -> &'static str {
        "64x64->64 chained multiplications"
    }

    fn ops_per_pass(&self) -> usize {
        WIDE_MULS_PER_PASS
    }

    fn run(&self, seed: u64, params: &MeasureParams) -> WorkloadReport {
        let mut workload = WideMul::seeded(seed);
        let trial = measure(|| workload.pass(), params);
        WorkloadReport {
            name: self.name(),
            description: self.description(),
            span_cycles: trial.span_cycles,
            sample_count: trial.sample_count,
            cycles_per_op: trial.per_operation(WIDE_MULS_PER_PASS, params.iterations),
            residue: workload.residue(),
        }
    }

    fn verify(&self) -> Result<(), String> {
        for seed in [0u64, 1] {
            let mut w = WideMul::seeded(seed);
            for _ in 0..50 {
                w.pass();
            }
            if w.residue() != seed {
                return Err(format!(
                    "mul64 seed {} drifted to residue {}",
                    seed,
                    w.residue()
                ));
            }
        }

        let mut rng = rand::rng();
        for _ in 0..4 {
            let seed: u64 = rng.random();
            let mut a = WideMul::seeded(seed);
            let mut b = WideMul::seeded(seed);
            for _ in 0..50 {
                a.pass();
                b.pass();
            }
            if a.residue() != b.residue() {
                return Err(format!("mul64 not deterministic for seed {}", seed));
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
        let mut w = WideMul::seeded(3);
        let before = w.residue();
        w.pass();
        assert_ne!(w.residue(), before);
    }

    #[test]
    fn degenerate_seeds_stay_put() {
        for seed in [0u64, 1] {
            let mut w = WideMul::seeded(seed);
            w.pass();
            w.pass();
            assert_eq!(w.residue(), seed);
        }
    }

    #[test]
    fn runner_verifies() {
        assert!(WideMulRunner.verify().is_ok());
    }
}
