//! Reference workloads: chained integer multiplications.
//!
//! Each workload is a short unrolled block of multiplications over two
//! mutable accumulators, alternating so that every result is an operand of
//! the next multiplication. The dependency chain serves two purposes: the
//! CPU cannot overlap the multiplications however deep its out-of-order
//! window is, and the optimizer cannot delete them as long as the final
//! accumulator is observed (the harness prints a byte derived from it).
//!
//! Accumulators are derived from a caller-supplied seed. Seeds 0 and 1 keep
//! the chain degenerate (all zeros / all ones), exercising the early-out
//! paths of a variable-time multiplier; any other seed goes pseudorandom
//! after the expansion below and exercises the general case.

pub mod narrow;
pub mod wide;
pub mod widening;

pub use narrow::{NarrowMul, NarrowMulRunner, NARROW_MULS_PER_PASS};
pub use wide::{WideMul, WideMulRunner, WIDE_MULS_PER_PASS};
pub use widening::{WideningMul, WideningMulRunner, WIDENING_MULS_PER_PASS};

/// Expand the program seed into the 32-bit accumulator pair.
///
/// 100 chained multiplications spread the seed across the word. 0 stays 0
/// and 1 stays 1, which is exactly what the special-case seeds are for.
pub fn seed32(seed: u64) -> (u32, u32) {
    let x = seed as u32;
    let mut y = x;
    for _ in 0..100 {
        y = y.wrapping_mul(x);
    }
    (y, y)
}

/// Expand the program seed into the 64-bit accumulator pair.
pub fn seed64(seed: u64) -> (u64, u64) {
    let (x32, _) = seed32(seed);
    let mut x = x32 as u64;
    x = x.wrapping_mul(x.wrapping_mul(x));
    (x, x)
}

/// Fold an accumulator into one byte, XORing all eight bytes together.
///
/// Printing this byte is what keeps the whole multiplication chain
/// observable; the value carries no meaning.
pub fn residue_byte(value: u64) -> u8 {
    let mut v = value;
    let mut x = 0u8;
    for _ in 0..8 {
        x ^= v as u8;
        v >>= 8;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_expansion_keeps_special_cases() {
        assert_eq!(seed32(0), (0, 0));
        assert_eq!(seed32(1), (1, 1));
        assert_eq!(seed64(0), (0, 0));
        assert_eq!(seed64(1), (1, 1));
    }

    #[test]
    fn seed_expansion_spreads_generic_seeds() {
        let (x, y) = seed32(3);
        assert_eq!(x, y);
        assert_ne!(x, 3, "a generic seed must not survive expansion as-is");
        let (x64, _) = seed64(3);
        assert!(x64 > u32::MAX as u64, "64-bit expansion should fill the word");
    }

    #[test]
    fn residue_byte_folds_all_bytes() {
        assert_eq!(residue_byte(0), 0);
        assert_eq!(residue_byte(0xFF), 0xFF);
        assert_eq!(residue_byte(0xFF00_0000_0000_00FF), 0);
        assert_eq!(residue_byte(0x0102_0304_0506_0708), 1 ^ 2 ^ 3 ^ 4 ^ 5 ^ 6 ^ 7 ^ 8);
    }
}
