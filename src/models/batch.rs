use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use super::scan_result::ScanResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub declared_name: String,
    pub result: ScanResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    pub total_files: usize,
    pub unsafe_files: usize,
    pub total_bytes: u64,
    pub total_threats: usize,
    pub scan_duration: Duration,
    pub timestamp: SystemTime,
    pub roots: Vec<PathBuf>,
}

impl BatchReport {
    pub fn from_files(files: Vec<FileReport>, roots: Vec<PathBuf>, scan_duration: Duration) -> Self {
        let unsafe_files = files.iter().filter(|f| !f.result.is_safe).count();
        let total_bytes = files.iter().map(|f| f.result.file_size_bytes).sum();
        let total_threats = files.iter().map(|f| f.result.threat_count()).sum();

        Self {
            total_files: files.len(),
            unsafe_files,
            total_bytes,
            total_threats,
            scan_duration,
            timestamp: SystemTime::now(),
            roots,
            files,
        }
    }

    pub fn all_safe(&self) -> bool {
        self.unsafe_files == 0
    }
}
