use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashSet;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::ScanError;
use crate::models::batch::{BatchReport, FileReport};
use crate::models::scan_result::ScanResult;

use super::events::{Event, EventSender};
use super::progress::ProgressTracker;
use super::scanner::{display_name, FileScanner};

/// Scans many paths at once, at most `max_concurrent_io` files at a time.
///
/// Each `scan_paths` call is an independent batch. The progress counters
/// span every batch run on this instance.
pub struct BatchScanner {
    scanner: Arc<FileScanner>,
    semaphore: Arc<Semaphore>,
    event_tx: EventSender,
    progress: Arc<ProgressTracker>,
}

/// A path produced by expanding the batch roots.
enum Target {
    File(PathBuf),
    Unreadable(PathBuf, ScanError),
}

struct PendingScan {
    path: PathBuf,
    name: String,
    started: Instant,
    handle: JoinHandle<Result<ScanResult, ScanError>>,
}

impl BatchScanner {
    pub fn new(
        scanner: Arc<FileScanner>,
        max_concurrent_io: usize,
        event_tx: EventSender,
    ) -> Self {
        Self {
            scanner,
            semaphore: Arc::new(Semaphore::new(max_concurrent_io.max(1))),
            event_tx,
            progress: Arc::new(ProgressTracker::new()),
        }
    }

    pub fn progress(&self) -> &Arc<ProgressTracker> {
        &self.progress
    }

    pub async fn scan_paths(&self, roots: Vec<PathBuf>) -> anyhow::Result<BatchReport> {
        let started = Instant::now();
        let _ = self.event_tx.send(Event::ScanStarted {
            roots: roots.clone(),
        });

        let mut targets = Vec::new();
        for root in &roots {
            let root = root.clone();
            let expanded = tokio::task::spawn_blocking(move || expand_root(&root)).await?;
            targets.extend(expanded);
        }

        let seen: DashSet<PathBuf> = DashSet::new();
        let mut pending = Vec::new();
        let mut reports = Vec::new();

        for target in targets {
            match target {
                Target::File(path) => {
                    let key = tokio::fs::canonicalize(&path)
                        .await
                        .unwrap_or_else(|_| path.clone());
                    if !seen.insert(key) {
                        debug!(path = %path.display(), "Skipping duplicate path");
                        continue;
                    }
                    pending.push(self.spawn_scan(path));
                }
                Target::Unreadable(path, err) => {
                    reports.push((pending.len(), self.failed_report(path, err, Instant::now())));
                }
            }
        }

        // Unreadable entries keep their slot relative to the scans around them.
        let mut files = Vec::with_capacity(pending.len() + reports.len());
        let mut failed = reports.into_iter().peekable();
        for (idx, scan) in pending.into_iter().enumerate() {
            while let Some((_, report)) = failed.next_if(|(slot, _)| *slot == idx) {
                files.push(report);
            }
            files.push(self.collect(scan).await);
        }
        files.extend(failed.map(|(_, report)| report));

        let report = BatchReport::from_files(files, roots, started.elapsed());

        info!(
            files = report.total_files,
            unsafe_files = report.unsafe_files,
            threats = report.total_threats,
            duration_ms = report.scan_duration.as_millis() as u64,
            "Batch scan completed"
        );
        let _ = self.event_tx.send(Event::BatchCompleted {
            total_files: report.total_files,
            unsafe_files: report.unsafe_files,
            duration_ms: report.scan_duration.as_millis() as u64,
        });

        Ok(report)
    }

    fn spawn_scan(&self, path: PathBuf) -> PendingScan {
        let name = display_name(&path);
        let scanner = Arc::clone(&self.scanner);
        let semaphore = Arc::clone(&self.semaphore);
        let task_path = path.clone();
        let task_name = name.clone();

        // The permit is held for the whole blocking read + scan.
        let handle = tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| ScanError::Task(e.to_string()))?;
            tokio::task::spawn_blocking(move || scanner.try_scan_file(&task_path, &task_name))
                .await
                .map_err(|e| ScanError::Task(e.to_string()))?
        });

        PendingScan {
            path,
            name,
            started: Instant::now(),
            handle,
        }
    }

    async fn collect(&self, scan: PendingScan) -> FileReport {
        let outcome = match scan.handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(ScanError::Task(e.to_string())),
        };

        match outcome {
            Ok(result) => {
                self.progress
                    .record_file(result.file_size_bytes, result.threat_count());
                let _ = self.event_tx.send(Event::FileScanned {
                    path: scan.path.clone(),
                    is_safe: result.is_safe,
                    threats: result.threat_count(),
                });
                FileReport {
                    path: scan.path,
                    declared_name: scan.name,
                    result,
                }
            }
            Err(err) => self.failed_report(scan.path, err, scan.started),
        }
    }

    fn failed_report(&self, path: PathBuf, err: ScanError, started: Instant) -> FileReport {
        let name = display_name(&path);
        let result = self.scanner.failed(&name, &err, started);
        self.progress.increment_errors();
        self.progress.record_file(0, result.threat_count());
        let _ = self.event_tx.send(Event::ScanFailed {
            path: path.clone(),
            error: err.to_string(),
        });
        FileReport {
            path,
            declared_name: name,
            result,
        }
    }
}

/// Expand a root into the regular files to scan. Roots may be symlinks;
/// links found while walking a directory are skipped.
fn expand_root(root: &Path) -> Vec<Target> {
    let mut targets = Vec::new();
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_file() => targets.push(Target::File(root.to_path_buf())),
        Ok(meta) if meta.is_dir() => walk_dir(root, &mut targets),
        Ok(_) => targets.push(Target::Unreadable(
            root.to_path_buf(),
            ScanError::NotAFile(root.to_path_buf()),
        )),
        Err(e) => targets.push(Target::Unreadable(root.to_path_buf(), ScanError::Io(e))),
    }
    targets
}

fn walk_dir(dir: &Path, targets: &mut Vec<Target>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            targets.push(Target::Unreadable(dir.to_path_buf(), ScanError::Io(e)));
            return;
        }
    };

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => paths.push(entry.path()),
            Err(e) => targets.push(Target::Unreadable(dir.to_path_buf(), ScanError::Io(e))),
        }
    }
    paths.sort();

    for path in paths {
        match std::fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_dir() => walk_dir(&path, targets),
            Ok(meta) if meta.is_file() => targets.push(Target::File(path)),
            Ok(_) => {}
            Err(e) => targets.push(Target::Unreadable(path, ScanError::Io(e))),
        }
    }
}
