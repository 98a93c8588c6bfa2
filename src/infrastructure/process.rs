//! Process resource snapshots for the performance monitor's self-sampling.

/// Resource usage of the current process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSample {
    /// Peak resident set size in bytes.
    pub peak_rss_bytes: u64,
    /// User plus system CPU time consumed so far, in seconds.
    pub cpu_seconds: f64,
    /// Logical CPUs available to the process.
    pub logical_cpus: usize,
}

#[cfg(unix)]
fn timeval_secs(tv: libc::timeval) -> f64 {
    tv.tv_sec as f64 + tv.tv_usec as f64 / 1_000_000.0
}

/// Take a snapshot via `getrusage(RUSAGE_SELF)`.
///
/// Returns `None` when the platform offers no such call or it fails.
#[cfg(unix)]
#[must_use]
pub fn sample() -> Option<ProcessSample> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    // SAFETY: getrusage only writes into the provided struct.
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    // SAFETY: getrusage returned 0, so the struct is initialized.
    let usage = unsafe { usage.assume_init() };

    // ru_maxrss is in bytes on macOS and kilobytes elsewhere.
    let max_rss = u64::try_from(usage.ru_maxrss).unwrap_or(0);
    let peak_rss_bytes = if cfg!(target_os = "macos") {
        max_rss
    } else {
        max_rss.saturating_mul(1024)
    };

    Some(ProcessSample {
        peak_rss_bytes,
        cpu_seconds: timeval_secs(usage.ru_utime) + timeval_secs(usage.ru_stime),
        logical_cpus: num_cpus::get(),
    })
}

#[cfg(not(unix))]
#[must_use]
pub fn sample() -> Option<ProcessSample> {
    None
}
