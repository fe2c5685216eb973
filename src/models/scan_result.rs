use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Document,
    Image,
    Archive,
    #[default]
    Unknown,
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileCategory::Document => "document",
            FileCategory::Image => "image",
            FileCategory::Archive => "archive",
            FileCategory::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanDetails {
    pub scanned_at: DateTime<Utc>,
    pub scan_duration_ms: u64,
    pub engine_version: String,
}

impl ScanDetails {
    fn finish(started: Instant) -> Self {
        Self {
            scanned_at: Utc::now(),
            scan_duration_ms: started.elapsed().as_millis() as u64,
            engine_version: ENGINE_VERSION.to_string(),
        }
    }
}

/// Verdict of a single scan. Built once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub is_safe: bool,
    pub file_type: FileCategory,
    pub file_size_bytes: u64,
    pub checksum: String,
    pub threats: Vec<String>,
    pub scan_details: ScanDetails,
}

impl ScanResult {
    pub fn new(
        file_type: FileCategory,
        file_size_bytes: u64,
        checksum: String,
        threats: Vec<String>,
        started: Instant,
    ) -> Self {
        Self {
            is_safe: threats.is_empty(),
            file_type,
            file_size_bytes,
            checksum,
            threats,
            scan_details: ScanDetails::finish(started),
        }
    }

    /// Result for a scan that could not read or process its input.
    pub fn failed(error: &ScanError, started: Instant) -> Self {
        Self::new(
            FileCategory::Unknown,
            0,
            String::new(),
            vec![format!("File scan error: {}", error)],
            started,
        )
    }

    pub fn threat_count(&self) -> usize {
        self.threats.len()
    }

    pub fn audit_record(&self, file_name: &str) -> AuditRecord {
        AuditRecord {
            file_name: file_name.to_string(),
            is_safe: self.is_safe,
            file_type: self.file_type,
            file_size_bytes: self.file_size_bytes,
            checksum: self.checksum.clone(),
            threats: self.threats.clone(),
            scanned_at: self.scan_details.scanned_at,
            scan_duration_ms: self.scan_details.scan_duration_ms,
            engine_version: self.scan_details.engine_version.clone(),
        }
    }
}

/// Flattened scan outcome for compliance logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub file_name: String,
    pub is_safe: bool,
    pub file_type: FileCategory,
    pub file_size_bytes: u64,
    pub checksum: String,
    pub threats: Vec<String>,
    pub scanned_at: DateTime<Utc>,
    pub scan_duration_ms: u64,
    pub engine_version: String,
}

pub fn human_readable_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
