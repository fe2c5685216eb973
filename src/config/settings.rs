use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::tables;
use crate::error::ConfigError;
use crate::models::scan_result::FileCategory;
use crate::models::signature::{MagicSignature, PatternRule};

/// Scanner limits and detection tables. Every key is optional in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub max_file_size_bytes: u64,
    pub text_window_bytes: usize,
    pub entropy_threshold: f64,
    pub max_url_count: usize,
    pub max_concurrent_io: usize,
    pub allowed_extensions: Vec<String>,
    pub blocked_extensions: Vec<String>,
    pub expected_mime_types: BTreeMap<String, Vec<String>>,
    pub file_categories: BTreeMap<String, FileCategory>,
    pub malicious_patterns: Vec<PatternRule>,
    pub mime_signatures: Vec<MagicSignature>,
    pub executable_signatures: Vec<MagicSignature>,
}

impl Default for Settings {
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            max_file_size_bytes: tables::DEFAULT_MAX_FILE_SIZE_BYTES,
            text_window_bytes: tables::DEFAULT_TEXT_WINDOW_BYTES,
            entropy_threshold: tables::DEFAULT_ENTROPY_THRESHOLD,
            max_url_count: tables::DEFAULT_MAX_URL_COUNT,
            max_concurrent_io: cap_by_fd_limit(parallelism * 2),
            allowed_extensions: tables::allowed_extensions(),
            blocked_extensions: tables::blocked_extensions(),
            expected_mime_types: tables::expected_mime_types(),
            file_categories: tables::file_categories(),
            malicious_patterns: tables::malicious_patterns(),
            mime_signatures: tables::mime_signatures(),
            executable_signatures: tables::executable_signatures(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, filling missing keys with defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_file_size_bytes == 0 {
            return Err(invalid("max_file_size_bytes", "must be greater than 0"));
        }
        if self.text_window_bytes == 0 {
            return Err(invalid("text_window_bytes", "must be greater than 0"));
        }
        if self.max_concurrent_io == 0 {
            return Err(invalid("max_concurrent_io", "must be greater than 0"));
        }
        if !(self.entropy_threshold > 0.0 && self.entropy_threshold <= 8.0) {
            return Err(invalid(
                "entropy_threshold",
                format!("{} is outside (0, 8]", self.entropy_threshold),
            ));
        }
        if self.allowed_extensions.iter().any(|e| e.trim().is_empty()) {
            return Err(invalid("allowed_extensions", "contains an empty entry"));
        }
        if self.blocked_extensions.iter().any(|e| e.trim().is_empty()) {
            return Err(invalid("blocked_extensions", "contains an empty entry"));
        }
        if let Some(sig) = self.mime_signatures.iter().find(|s| s.bytes.is_empty()) {
            return Err(invalid("mime_signatures", format!("`{}` has no bytes", sig.name)));
        }
        if let Some(sig) = self
            .mime_signatures
            .iter()
            .find(|s| s.mime_type.trim().is_empty())
        {
            return Err(invalid(
                "mime_signatures",
                format!("`{}` has no mime_type", sig.name),
            ));
        }
        if let Some(sig) = self.executable_signatures.iter().find(|s| s.bytes.is_empty()) {
            return Err(invalid(
                "executable_signatures",
                format!("`{}` has no bytes", sig.name),
            ));
        }
        Ok(())
    }

    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        let ext = normalize_extension(ext);
        self.allowed_extensions
            .iter()
            .any(|allowed| normalize_extension(allowed) == ext)
    }

    pub fn is_blocked_extension(&self, ext: &str) -> bool {
        let ext = normalize_extension(ext);
        self.blocked_extensions
            .iter()
            .any(|blocked| normalize_extension(blocked) == ext)
    }

    pub fn is_file_size_allowed(&self, size: u64) -> bool {
        size <= self.max_file_size_bytes
    }

    /// Size limit in MB as shown to users (`10`, `2.5`).
    pub fn max_file_size_mb(&self) -> f64 {
        self.max_file_size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Lowercase with a leading dot, so `PDF`, `.pdf` and `.Pdf` compare equal.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Cap batch concurrency by the fd soft limit, keeping a quarter in reserve.
fn cap_by_fd_limit(max_io: usize) -> usize {
    #[cfg(unix)]
    {
        let mut rlim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        let ret = unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut rlim) };
        if ret == 0 && rlim.rlim_cur != libc::RLIM_INFINITY {
            let usable = rlim.rlim_cur as usize * 3 / 4;
            return max_io.min(usable).max(1);
        }
    }
    max_io.max(1)
}
