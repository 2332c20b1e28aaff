//! CPU core enumeration and thread pinning.
//!
//! Cycle-counter readings are only comparable on one core, so the harness
//! pins the measuring thread for the duration of a run, and the enablement
//! broadcast pins one thread per core to reach each core's registers. Linux
//! gets the real libc implementation; everywhere else pinning degrades to a
//! no-op that reports failure.

// ============================================================================
// Linux implementation using libc
// ============================================================================

#[cfg(target_os = "linux")]
mod platform {
    pub type AffinityMask = libc::cpu_set_t;

    /// All available CPU core IDs.
    pub fn get_core_ids() -> Option<Vec<usize>> {
        unsafe {
            let num_cpus = libc::sysconf(libc::_SC_NPROCESSORS_ONLN);
            if num_cpus <= 0 {
                return None;
            }
            Some((0..num_cpus as usize).collect())
        }
    }

    /// The core the calling thread is currently running on.
    pub fn get_current_cpu() -> Option<usize> {
        unsafe {
            let cpu = libc::sched_getcpu();
            if cpu >= 0 {
                Some(cpu as usize)
            } else {
                None
            }
        }
    }

    /// The calling thread's current affinity mask.
    pub fn current_mask() -> Option<AffinityMask> {
        unsafe {
            let mut set: AffinityMask = std::mem::zeroed();
            if libc::sched_getaffinity(0, std::mem::size_of::<AffinityMask>(), &mut set) == 0 {
                Some(set)
            } else {
                None
            }
        }
    }

    /// Restore a previously captured affinity mask.
    pub fn set_mask(mask: &AffinityMask) -> bool {
        unsafe { libc::sched_setaffinity(0, std::mem::size_of::<AffinityMask>(), mask) == 0 }
    }

    /// Restrict the calling thread to one core.
    pub fn set_affinity(core_id: usize) -> bool {
        unsafe {
            let mut set: AffinityMask = std::mem::zeroed();
            libc::CPU_ZERO(&mut set);
            libc::CPU_SET(core_id, &mut set);
            libc::sched_setaffinity(0, std::mem::size_of::<AffinityMask>(), &set) == 0
        }
    }
}

// ============================================================================
// Fallback for platforms without affinity control
// ============================================================================

#[cfg(not(target_os = "linux"))]
mod platform {
    pub type AffinityMask = ();

    pub fn get_core_ids() -> Option<Vec<usize>> {
        None
    }

    pub fn get_current_cpu() -> Option<usize> {
        None
    }

    pub fn current_mask() -> Option<AffinityMask> {
        None
    }

    pub fn set_mask(_mask: &AffinityMask) -> bool {
        false
    }

    pub fn set_affinity(_core_id: usize) -> bool {
        false
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Get all available CPU core IDs.
pub fn get_core_ids() -> Option<Vec<usize>> {
    platform::get_core_ids()
}

/// Get the core the calling thread is currently running on.
pub fn get_current_cpu() -> Option<usize> {
    platform::get_current_cpu()
}

/// Pin the calling thread to a specific core, without remembering the
/// previous affinity. For threads that only exist for the pinned work
/// (e.g. the enablement broadcast); use [`CpuPinGuard`] when the thread
/// lives on afterwards.
///
/// # Returns
/// `true` if pinning took effect.
pub fn pin_to_core(core_id: usize) -> bool {
    platform::set_affinity(core_id)
}

/// RAII guard: pins on creation, restores the previous affinity on drop.
pub struct CpuPinGuard {
    pinned_core: Option<usize>,
    saved: Option<platform::AffinityMask>,
}

impl CpuPinGuard {
    /// Pin to the core the thread is currently running on (falls back to
    /// core 0 if the current core cannot be determined).
    ///
    /// Pinning to the current core avoids a migration right at the start
    /// of the measurement.
    pub fn new() -> Self {
        let core = platform::get_current_cpu().unwrap_or(0);
        Self::with_core(core)
    }

    /// Pin to a specific core.
    pub fn with_core(core_id: usize) -> Self {
        let saved = platform::current_mask();
        let pinned = platform::set_affinity(core_id);
        Self {
            pinned_core: if pinned { Some(core_id) } else { None },
            saved,
        }
    }

    /// The core this thread is pinned to, if pinning took effect.
    pub fn core_id(&self) -> Option<usize> {
        self.pinned_core
    }

    /// Whether the thread was successfully pinned.
    pub fn is_pinned(&self) -> bool {
        self.pinned_core.is_some()
    }
}

impl Drop for CpuPinGuard {
    fn drop(&mut self) {
        if self.pinned_core.is_some() {
            if let Some(mask) = self.saved.take() {
                platform::set_mask(&mask);
            }
        }
    }
}

impl Default for CpuPinGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_os = "linux")]
    fn core_ids_are_available() {
        let cores = get_core_ids();
        assert!(cores.is_some(), "should be able to enumerate cores");
        assert!(!cores.unwrap().is_empty(), "should have at least one core");
    }

    #[test]
    fn pin_guard_restores_on_drop() {
        let guard = CpuPinGuard::new();
        if guard.is_pinned() {
            assert!(guard.core_id().is_some());
        }
        drop(guard);
        // On Linux the original mask is back; either way this must not
        // leave the thread in a broken state.
        let _ = get_current_cpu();
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn pin_to_core_restricts_the_thread() {
        let cores = get_core_ids().unwrap();
        let target = *cores.first().unwrap();
        // Save and restore around the bare pin so the test thread is not
        // left restricted.
        let saved = platform::current_mask().unwrap();
        assert!(pin_to_core(target));
        assert_eq!(get_current_cpu(), Some(target));
        assert!(platform::set_mask(&saved));
    }
}
