//! Privileged enablement of unprivileged cycle-counter access.
//!
//! On aarch64 and riscv64 the cycle counter is invisible to userland until
//! supervisor-mode code switches it on, core by core. This module is the
//! counterpart the hosting privileged environment links in: `activate()`
//! runs the per-core enable routine on every core and returns once all of
//! them are done, `deactivate()` reverses it on unload so the counter does
//! not stay open as an information channel. (On x86 the equivalent toggle
//! is a sysfs write, see the README; there is nothing for this module to
//! do there.)
//!
//! The per-core register work sits behind [`CounterBackend`] so the state
//! machine and the broadcast can be exercised anywhere with a recording
//! backend, while `arch::Native` carries the real register writes.
//!
//! Nothing here is callable usefully from an ordinary process: executing
//! the native routines unprivileged faults, and that fault is deliberately
//! not caught.

pub mod broadcast;

#[cfg(any(target_arch = "aarch64", target_arch = "riscv64"))]
pub mod arch;

use std::sync::atomic::{AtomicBool, Ordering};

/// Per-core counter enablement state, mirrored from the privileged
/// hardware registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnablementState {
    /// Counter inaccessible from userland (boot state).
    Disabled,
    /// Counter incrementing and readable from userland.
    Enabled,
}

/// The per-core privileged routines, the only place allowed to touch the
/// counter-control registers.
///
/// `Sync` because the broadcast invokes it from one pinned thread per core.
/// Both routines must be idempotent: re-enabling an enabled core is a
/// no-op at the hardware level.
pub trait CounterBackend: Sync {
    /// Enable counting and unprivileged access on the executing core.
    fn enable_core(&self, core: usize);

    /// Revoke unprivileged access (and stop counting where the
    /// architecture allows it) on the executing core.
    fn disable_core(&self, core: usize);
}

/// Per-core enablement state machine with synchronous all-core broadcast.
pub struct Controller<B: CounterBackend> {
    backend: B,
    cores: Vec<AtomicBool>,
}

impl<B: CounterBackend> Controller<B> {
    /// Controller covering every online core.
    pub fn new(backend: B) -> Self {
        let cores = crate::utils::cpu_affinity::get_core_ids()
            .map(|ids| ids.len())
            .unwrap_or(1);
        Self::with_cores(backend, cores)
    }

    /// Controller covering a fixed number of cores (tests).
    pub fn with_cores(backend: B, cores: usize) -> Self {
        Self {
            backend,
            cores: (0..cores).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    /// Number of cores under control.
    pub fn core_count(&self) -> usize {
        self.cores.len()
    }

    /// The backend in use.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mirror state of one core.
    pub fn state(&self, core: usize) -> EnablementState {
        if self.cores[core].load(Ordering::SeqCst) {
            EnablementState::Enabled
        } else {
            EnablementState::Disabled
        }
    }

    /// Mirror states of every core.
    pub fn states(&self) -> Vec<EnablementState> {
        (0..self.cores.len()).map(|c| self.state(c)).collect()
    }

    /// Enable the counter on every core; returns once every core has run
    /// the routine. Safe to call again on an already-active controller.
    pub fn activate(&self) {
        log::info!("enabling cycle counter on {} core(s)", self.cores.len());
        broadcast::run_on_each_core(self.cores.len(), |core| {
            self.backend.enable_core(core);
            self.cores[core].store(true, Ordering::SeqCst);
        });
    }

    /// Disable the counter on every core; returns once every core has run
    /// the routine. Safe to call on an already-inactive controller.
    pub fn deactivate(&self) {
        log::info!("disabling cycle counter on {} core(s)", self.cores.len());
        broadcast::run_on_each_core(self.cores.len(), |core| {
            self.backend.disable_core(core);
            self.cores[core].store(false, Ordering::SeqCst);
        });
    }
}

/// Load-time hook for the hosting privileged environment: enable the
/// counter on every core.
#[cfg(any(target_arch = "aarch64", target_arch = "riscv64"))]
pub fn activate() {
    Controller::new(arch::Native).activate();
}

/// Unload-time hook for the hosting privileged environment: disable the
/// counter on every core.
#[cfg(any(target_arch = "aarch64", target_arch = "riscv64"))]
pub fn deactivate() {
    Controller::new(arch::Native).deactivate();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every routine invocation instead of touching registers.
    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<(usize, bool)>>,
    }

    impl RecordingBackend {
        fn calls(&self) -> Vec<(usize, bool)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CounterBackend for RecordingBackend {
        fn enable_core(&self, core: usize) {
            self.calls.lock().unwrap().push((core, true));
        }

        fn disable_core(&self, core: usize) {
            self.calls.lock().unwrap().push((core, false));
        }
    }

    #[test]
    fn activate_enables_every_core() {
        let controller = Controller::with_cores(RecordingBackend::default(), 4);
        assert!(controller
            .states()
            .iter()
            .all(|&s| s == EnablementState::Disabled));

        controller.activate();

        assert!(controller
            .states()
            .iter()
            .all(|&s| s == EnablementState::Enabled));
        let mut enabled: Vec<usize> = controller
            .backend()
            .calls()
            .iter()
            .filter(|&&(_, en)| en)
            .map(|&(core, _)| core)
            .collect();
        enabled.sort_unstable();
        assert_eq!(enabled, vec![0, 1, 2, 3]);
    }

    #[test]
    fn activate_is_idempotent() {
        let controller = Controller::with_cores(RecordingBackend::default(), 3);
        controller.activate();
        controller.activate();

        assert!(controller
            .states()
            .iter()
            .all(|&s| s == EnablementState::Enabled));
        // The routine ran again on each core, which the hardware contract
        // allows; the state is unchanged.
        assert_eq!(controller.backend().calls().len(), 6);
    }

    #[test]
    fn deactivate_returns_every_core_to_disabled() {
        let controller = Controller::with_cores(RecordingBackend::default(), 4);
        controller.activate();
        controller.deactivate();

        assert!(controller
            .states()
            .iter()
            .all(|&s| s == EnablementState::Disabled));
    }

    #[test]
    fn deactivate_without_activate_is_safe() {
        let controller = Controller::with_cores(RecordingBackend::default(), 2);
        controller.deactivate();
        assert!(controller
            .states()
            .iter()
            .all(|&s| s == EnablementState::Disabled));
    }
}
