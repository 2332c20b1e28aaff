//! Per-core cycle counter access for precise micro-benchmarking.
//!
//! This module provides architecture-specific cycle counter reads for
//! x86, x86_64, aarch64 and riscv64. The implementation is selected at
//! compile time; the instructions involved are not valid opcodes on any
//! other architecture, so there is deliberately no runtime dispatch.
//!
//! All of these counters start out inaccessible from userland. On x86 the
//! access toggle is a sysfs write (see README); on aarch64 and riscv64 the
//! counter must be switched on from supervisor mode first, which is what
//! [`crate::enable`] is for. Reading the counter before that has happened
//! raises an illegal-instruction or privilege fault, and this module makes
//! no attempt to catch it: a crash here means the machine was not prepared.

/// A raw cycle counter reading.
///
/// Monotonically non-decreasing on one core while the counter is enabled;
/// wraps at 2^64 (ignored, measured intervals are far below that). Values
/// from different cores or from different enable periods are not comparable.
pub type CycleValue = u64;

/// Read the current cycle counter of the executing core.
///
/// On x86_64/x86: LFENCE followed by RDPMC of the fixed cycle counter.
/// On aarch64: DSB followed by a PMCCNTR_EL0 read.
/// On riscv64: RDCYCLE (the ISA already orders this read, no fence needed).
#[cfg(all(feature = "cycle_counter", not(feature = "use_time")))]
#[inline(always)]
pub fn read_cycles() -> CycleValue {
    #[cfg(target_arch = "x86_64")]
    {
        read_cycles_x86_64()
    }

    #[cfg(target_arch = "x86")]
    {
        read_cycles_x86()
    }

    #[cfg(target_arch = "aarch64")]
    {
        read_cycles_aarch64()
    }

    #[cfg(target_arch = "riscv64")]
    {
        read_cycles_riscv64()
    }

    #[cfg(not(any(
        target_arch = "x86_64",
        target_arch = "x86",
        target_arch = "aarch64",
        target_arch = "riscv64"
    )))]
    {
        compile_error!(
            "cycle_counter feature requires x86, x86_64, aarch64, or riscv64 architecture"
        );
    }
}

#[cfg(all(
    any(target_arch = "x86_64", target_arch = "x86"),
    feature = "cycle_counter",
    not(feature = "use_time")
))]
macro_rules! rdpmc_fixed_cycles {
    () => {{
        let lo: u32;
        let hi: u32;
        // 0x4000_0001 selects the fixed-function "unhalted core cycles"
        // counter. The LFENCE bounds reordering of surrounding instructions
        // into the measured window. There is no _rdpmc intrinsic in
        // core::arch, hence the inline asm.
        unsafe {
            core::arch::asm!(
                "lfence",
                "rdpmc",
                in("ecx") 0x4000_0001u32,
                out("eax") lo,
                out("edx") hi,
                options(nostack, preserves_flags),
            );
        }
        ((hi as u64) << 32) | lo as u64
    }};
}

#[cfg(all(
    target_arch = "x86_64",
    feature = "cycle_counter",
    not(feature = "use_time")
))]
#[inline(always)]
fn read_cycles_x86_64() -> u64 {
    rdpmc_fixed_cycles!()
}

#[cfg(all(target_arch = "x86", feature = "cycle_counter", not(feature = "use_time")))]
#[inline(always)]
fn read_cycles_x86() -> u64 {
    rdpmc_fixed_cycles!()
}

#[cfg(all(
    target_arch = "aarch64",
    feature = "cycle_counter",
    not(feature = "use_time")
))]
#[inline(always)]
fn read_cycles_aarch64() -> u64 {
    // PMCCNTR_EL0 counts true core cycles (unlike CNTVCT_EL0, which is a
    // fixed-frequency timer). The DSB keeps earlier memory operations out
    // of the measured window.
    let val: u64;
    unsafe {
        core::arch::asm!(
            "dsb sy",
            "mrs {}, pmccntr_el0",
            out(reg) val,
            options(nostack, preserves_flags),
        );
    }
    val
}

#[cfg(all(
    target_arch = "riscv64",
    feature = "cycle_counter",
    not(feature = "use_time")
))]
#[inline(always)]
fn read_cycles_riscv64() -> u64 {
    let val: u64;
    unsafe {
        core::arch::asm!(
            "rdcycle {}",
            out(reg) val,
            options(nomem, nostack, preserves_flags),
        );
    }
    val
}

// ============================================================================
// Measurement source: cycles or wall-clock time depending on feature flags
// ============================================================================

/// Read the current measurement clock (cycles, or nanoseconds with the
/// `use_time` feature).
#[cfg(all(feature = "cycle_counter", not(feature = "use_time")))]
#[inline(always)]
pub fn now() -> CycleValue {
    read_cycles()
}

/// Read the current measurement clock (nanoseconds since the first call).
#[cfg(any(not(feature = "cycle_counter"), feature = "use_time"))]
#[inline(always)]
pub fn now() -> CycleValue {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

/// Get the measurement unit name for display.
#[cfg(all(feature = "cycle_counter", not(feature = "use_time")))]
pub const fn unit_name() -> &'static str {
    "cycles"
}

#[cfg(any(not(feature = "cycle_counter"), feature = "use_time"))]
pub const fn unit_name() -> &'static str {
    "ns"
}

#[cfg(test)]
mod tests {
    use super::*;

    // With the default features this reads the real counter, which faults
    // unless the machine has been prepared (see README), so it only runs on
    // demand. With `use_time` it exercises the wall-clock substitute.
    #[test]
    #[cfg_attr(
        all(feature = "cycle_counter", not(feature = "use_time")),
        ignore = "requires unprivileged cycle-counter access"
    )]
    fn now_is_roughly_monotonic() {
        let c1 = now();
        let c2 = now();
        let c3 = now();

        assert!(c2 >= c1, "clock went backwards: {} -> {}", c1, c2);
        assert!(c3 >= c2, "clock went backwards: {} -> {}", c2, c3);
    }

    #[test]
    fn unit_name_is_stable() {
        let name = unit_name();
        assert!(name == "cycles" || name == "ns");
    }
}
