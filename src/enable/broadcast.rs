//! Synchronous all-core fan-out/join.
//!
//! The privileged counter registers are per-core, so a state change is only
//! complete once the routine has executed on every core. This is the
//! userland rendition of a kernel cross-call: one scoped thread per core,
//! pinned to it, with the scope exit as the join barrier. The caller is
//! guaranteed that every core has finished before the function returns.

use crate::utils::cpu_affinity;

/// Run `f(core)` once on each of the first `cores` cores and return only
/// after every invocation has completed.
///
/// A core whose pin fails still runs the routine (logged, diagnosable);
/// there is no rollback on partial failure.
pub fn run_on_each_core<F>(cores: usize, f: F)
where
    F: Fn(usize) + Sync,
{
    std::thread::scope(|scope| {
        for core in 0..cores {
            let f = &f;
            scope.spawn(move || {
                if !cpu_affinity::pin_to_core(core) {
                    log::warn!("could not pin broadcast thread to core {}", core);
                }
                f(core);
            });
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn reaches_every_core_before_returning() {
        let visited = AtomicUsize::new(0);
        run_on_each_core(8, |_| {
            visited.fetch_add(1, Ordering::SeqCst);
        });
        // The join barrier means all invocations are visible here.
        assert_eq!(visited.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn passes_each_core_id_exactly_once() {
        let seen: Vec<AtomicUsize> = (0..4).map(|_| AtomicUsize::new(0)).collect();
        run_on_each_core(4, |core| {
            seen[core].fetch_add(1, Ordering::SeqCst);
        });
        for (core, count) in seen.iter().enumerate() {
            assert_eq!(count.load(Ordering::SeqCst), 1, "core {} visited", core);
        }
    }

    #[test]
    fn zero_cores_is_a_no_op() {
        run_on_each_core(0, |_| panic!("no core should run"));
    }
}
