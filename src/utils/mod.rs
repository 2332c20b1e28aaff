//! Support modules for the measurement harness.

pub mod cpu_affinity;

pub use cpu_affinity::CpuPinGuard;
