//! 64x64->128 chained multiplication workload, high half retained.
//!
//! This measures the latency of reaching the upper half of the full
//! product. A plain high-half chain decays toward zero (the high half of a
//! product of small values is zero, and zero is absorbing), which would let
//! a variable-time multiplier drift into its early-out path mid-run. Each
//! pass therefore XORs the accumulators with their saved top-bit-set
//! originals before multiplying, keeping the operands wide without breaking
//! the dependency chain.

use super::seed64;
use crate::measure::{measure, MeasureParams};
use crate::registry::{WorkloadReport, WorkloadRunner};
use rand::Rng;

/// Multiplications performed by one pass of the unrolled block.
pub const WIDENING_MULS_PER_PASS: usize = 8;

/// Two 64-bit accumulators chained through high-half multiplications.
pub struct WideningMul {
    x: u64,
    y: u64,
    x_orig: u64,
    y_orig: u64,
}

#[inline(always)]
fn mulhi(a: u64, b: u64) -> u64 {
    ((a as u128 * b as u128) >> 64) as u64
}

impl WideningMul {
    /// Seed the accumulators from the program seed.
    ///
    /// Bit 63 is forced into both originals unless the seed chain is
    /// degenerate (0 or 1), so the re-injection has something to inject.
    pub fn seeded(seed: u64) -> Self {
        let (mut x, mut y) = seed64(seed);
        let t = ((y >> 1 != 0) as u64) << 63;
        x |= t;
        y |= t;
        Self {
            x,
            y,
            x_orig: x,
            y_orig: y,
        }
    }

    /// One pass of the unrolled block: re-inject the originals, then 8
    /// high-half multiplications, each result an operand of the next.
    #[inline(always)]
    pub fn pass(&mut self) {
        self.x ^= self.x_orig;
        self.y ^= self.y_orig;
        self.x = mulhi(self.x, self.y);
        self.y = mulhi(self.y, self.x);
        self.x = mulhi(self.x, self.y);
        self.y = mulhi(self.y, self.x);
        self.x = mulhi(self.x, self.y);
        self.y = mulhi(self.y, self.x);
        self.x = mulhi(self.x, self.y);
        self.y = mulhi(self.y, self.x);
    }

    /// The externally observable accumulator value.
    pub fn residue(&self) -> u64 {
        self.x
    }
}

pub struct WideningMulRunner;

impl WorkloadRunner for WideningMulRunner {
    fn name(&self) -> &'static str {
        "mul64hi"
    }

    fn description(&self) -> &'static str {
        "64x64->128 chained multiplications, high half"
    }

    fn ops_per_pass(&self) -> usize {
        WIDENING_MULS_PER_PASS
    }

    fn run(&self, seed: u64, params: &MeasureParams) -> WorkloadReport {
        let mut workload = WideningMul::seeded(seed);
        let trial = measure(|| workload.pass(), params);
        WorkloadReport {
            name: self.name(),
            description: self.description(),
            span_cycles: trial.span_cycles,
            sample_count: trial.sample_count,
            cycles_per_op: trial.per_operation(WIDENING_MULS_PER_PASS, params.iterations),
            residue: workload.residue(),
        }
    }

    fn verify(&self) -> Result<(), String> {
        // Degenerate seeds collapse the whole chain to zero.
        for seed in [0u64, 1] {
            let mut w = WideningMul::seeded(seed);
            for _ in 0..50 {
                w.pass();
            }
            if w.residue() != 0 {
                return Err(format!(
                    "mul64hi seed {} should collapse to 0, got {}",
                    seed,
                    w.residue()
                ));
            }
        }

        let mut rng = rand::rng();
        for _ in 0..4 {
            let seed: u64 = rng.random();
            let mut a = WideningMul::seeded(seed);
            let mut b = WideningMul::seeded(seed);
            for _ in 0..50 {
                a.pass();
                b.pass();
            }
            if a.residue() != b.residue() {
                return Err(format!("mul64hi not deterministic for seed {}", seed));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mulhi_keeps_the_high_half() {
        assert_eq!(mulhi(1 << 63, 2), 1);
        assert_eq!(mulhi(u64::MAX, u64::MAX), u64::MAX - 1);
        assert_eq!(mulhi(1, 1), 0);
    }

    #[test]
    fn generic_seed_forces_top_bit() {
        let w = WideningMul::seeded(3);
        assert_eq!(w.x_orig >> 63, 1);
        assert_eq!(w.y_orig >> 63, 1);
    }

    #[test]
    fn degenerate_seed_does_not_force_top_bit() {
        for seed in [0u64, 1] {
            let w = WideningMul::seeded(seed);
            assert_eq!(w.x_orig >> 63, 0);
        }
    }

    #[test]
    fn accumulators_do_not_decay() {
        let mut w = WideningMul::seeded(3);
        for _ in 0..1000 {
            w.pass();
        }
        // With re-injection the operands keep their top bit, so the high
        // halves stay populated.
        assert_ne!(w.residue(), 0);
    }

    #[test]
    fn runner_verifies() {
        assert!(WideningMulRunner.verify().is_ok());
    }
}
