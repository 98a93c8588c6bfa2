//! Heap trimming via the C allocator.

use crate::port::MemoryReclaimer;

/// Calls glibc `malloc_trim(0)`; a no-op on other platforms.
#[derive(Debug, Default, Clone, Copy)]
pub struct MallocTrimReclaimer;

impl MemoryReclaimer for MallocTrimReclaimer {
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    fn reclaim(&self) -> bool {
        // SAFETY: malloc_trim only inspects allocator state.
        unsafe { libc::malloc_trim(0) == 1 }
    }

    #[cfg(not(all(target_os = "linux", target_env = "gnu")))]
    fn reclaim(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "malloc_trim"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reclaim_never_panics() {
        let reclaimer = MallocTrimReclaimer;
        let _ = reclaimer.reclaim();
        assert_eq!(reclaimer.name(), "malloc_trim");
    }
}
