//! Memory reclamation hint port.

/// Best-effort request to hand freed heap memory back to the OS.
pub trait MemoryReclaimer: Send + Sync {
    /// Returns `true` when the runtime actually released something.
    /// Lack of support is not an error.
    fn reclaim(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Reclaimer for runtimes without any such hint.
#[derive(Debug, Default)]
pub struct NoopReclaimer;

impl MemoryReclaimer for NoopReclaimer {
    fn reclaim(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
