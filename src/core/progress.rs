use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub struct ProgressTracker {
    pub files_scanned: AtomicUsize,
    pub unsafe_files: AtomicUsize,
    pub threats_found: AtomicUsize,
    pub bytes_scanned: AtomicU64,
    pub errors_count: AtomicUsize,
    pub start_time: Instant,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            files_scanned: AtomicUsize::new(0),
            unsafe_files: AtomicUsize::new(0),
            threats_found: AtomicUsize::new(0),
            bytes_scanned: AtomicU64::new(0),
            errors_count: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_file(&self, size: u64, threats: usize) {
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
        self.bytes_scanned.fetch_add(size, Ordering::Relaxed);
        if threats > 0 {
            self.unsafe_files.fetch_add(1, Ordering::Relaxed);
            self.threats_found.fetch_add(threats, Ordering::Relaxed);
        }
    }

    pub fn increment_errors(&self) {
        self.errors_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn files_per_second(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed < f64::EPSILON {
            return 0.0;
        }
        self.files_scanned.load(Ordering::Relaxed) as f64 / elapsed
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            files_scanned: self.files_scanned.load(Ordering::Relaxed),
            unsafe_files: self.unsafe_files.load(Ordering::Relaxed),
            threats_found: self.threats_found.load(Ordering::Relaxed),
            bytes_scanned: self.bytes_scanned.load(Ordering::Relaxed),
            errors_count: self.errors_count.load(Ordering::Relaxed),
            elapsed: self.elapsed(),
            files_per_second: self.files_per_second(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub files_scanned: usize,
    pub unsafe_files: usize,
    pub threats_found: usize,
    pub bytes_scanned: u64,
    pub errors_count: usize,
    pub elapsed: Duration,
    pub files_per_second: f64,
}
