use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use regex::{Regex, RegexBuilder};
use tracing::{debug, error, info, warn};

use crate::config::settings::{normalize_extension, Settings};
use crate::error::{ConfigError, ScanError};
use crate::models::scan_result::{FileCategory, ScanResult};

use super::analyzer::{Analyzer, ContentDigest};
use super::filename::{extension_of, sanitize_file_name};

const EMBEDDED_EXECUTABLE_MARKER: &[u8] = b"MZ";
const URL_PATTERN: &str = r#"https?://[^\s"'<>]+"#;

struct CompiledPattern {
    name: String,
    regex: Regex,
}

/// Heuristic scanner for uploaded files.
///
/// Holds only immutable, pre-compiled settings; share it behind an `Arc`
/// to scan from several threads at once.
pub struct FileScanner {
    settings: Settings,
    patterns: Vec<CompiledPattern>,
    url_regex: Regex,
    allowed: HashSet<String>,
    blocked: HashSet<String>,
    expected_mime: HashMap<String, Vec<String>>,
    categories: HashMap<String, FileCategory>,
    head_limit: usize,
}

impl FileScanner {
    pub fn new(settings: Settings) -> Result<Self, ConfigError> {
        settings.validate()?;

        let patterns = settings
            .malicious_patterns
            .iter()
            .map(|rule| {
                compile(&rule.pattern)
                    .map(|regex| CompiledPattern {
                        name: rule.name.clone(),
                        regex,
                    })
                    .map_err(|source| ConfigError::InvalidPattern {
                        name: rule.name.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let url_regex = compile(URL_PATTERN).map_err(|source| ConfigError::InvalidPattern {
            name: "url".to_string(),
            source,
        })?;

        let allowed = settings
            .allowed_extensions
            .iter()
            .map(|e| normalize_extension(e))
            .collect();
        let blocked = settings
            .blocked_extensions
            .iter()
            .map(|e| normalize_extension(e))
            .collect();
        let expected_mime = settings
            .expected_mime_types
            .iter()
            .map(|(ext, mimes)| (normalize_extension(ext), mimes.clone()))
            .collect();
        let categories = settings
            .file_categories
            .iter()
            .map(|(ext, category)| (normalize_extension(ext), *category))
            .collect();

        let longest_signature = settings
            .mime_signatures
            .iter()
            .chain(&settings.executable_signatures)
            .map(|sig| sig.bytes.len())
            .max()
            .unwrap_or(0);
        let head_limit = settings.text_window_bytes.max(longest_signature);

        debug!(
            patterns = patterns.len(),
            max_file_size_bytes = settings.max_file_size_bytes,
            "File scanner initialized"
        );

        Ok(Self {
            settings,
            patterns,
            url_regex,
            allowed,
            blocked,
            expected_mime,
            categories,
            head_limit,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Scan an in-memory upload.
    pub fn scan(&self, bytes: &[u8], declared_name: &str) -> ScanResult {
        let started = Instant::now();
        let mut digest = self.digest();
        digest.update(bytes);
        let result = self.run_checks(&digest, declared_name, started);
        log_outcome(declared_name, &result);
        result
    }

    /// Scan a file on disk. The declared name defaults to the path's file name.
    pub fn scan_file(&self, path: &Path, declared_name: Option<&str>) -> ScanResult {
        let started = Instant::now();
        let name = match declared_name {
            Some(name) => name.to_string(),
            None => display_name(path),
        };

        match self.try_scan_file(path, &name) {
            Ok(result) => result,
            Err(e) => self.failed(&name, &e, started),
        }
    }

    /// Like `scan_file`, but hands read failures back to the caller.
    ///
    /// The file is streamed, so at most the leading text window is held in
    /// memory whatever the file's size.
    pub fn try_scan_file(&self, path: &Path, declared_name: &str) -> Result<ScanResult, ScanError> {
        let started = Instant::now();
        let file = open_regular_file(path)?;
        let mut digest = self.digest();
        digest.read_from(file)?;
        let result = self.run_checks(&digest, declared_name, started);
        log_outcome(declared_name, &result);
        Ok(result)
    }

    pub fn scan_reader<R: Read>(&self, reader: R, declared_name: &str) -> ScanResult {
        let started = Instant::now();
        let mut digest = self.digest();
        match digest.read_from(reader) {
            Ok(()) => {
                let result = self.run_checks(&digest, declared_name, started);
                log_outcome(declared_name, &result);
                result
            }
            Err(e) => self.failed(declared_name, &ScanError::Io(e), started),
        }
    }

    pub fn failed(&self, declared_name: &str, err: &ScanError, started: Instant) -> ScanResult {
        error!(file = %declared_name, error = %err, "File scan failed");
        ScanResult::failed(err, started)
    }

    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        self.allowed.contains(&normalize_extension(ext))
    }

    pub fn is_file_size_allowed(&self, size: u64) -> bool {
        self.settings.is_file_size_allowed(size)
    }

    pub fn sanitize_file_name(&self, name: &str) -> String {
        sanitize_file_name(name)
    }

    fn digest(&self) -> ContentDigest {
        ContentDigest::new(self.head_limit, EMBEDDED_EXECUTABLE_MARKER)
    }

    fn run_checks(
        &self,
        digest: &ContentDigest,
        declared_name: &str,
        started: Instant,
    ) -> ScanResult {
        let mut threats = Vec::new();
        let size = digest.len();
        let head = digest.head();
        let ext = extension_of(declared_name);

        if !self.settings.is_file_size_allowed(size) {
            threats.push(format!(
                "File size exceeds maximum allowed size of {}MB",
                self.settings.max_file_size_mb()
            ));
        }

        self.check_extension(ext.as_deref(), &mut threats);

        let checksum = digest.checksum();

        let text = Analyzer::text_window(head, self.settings.text_window_bytes);
        self.check_content(digest, &text, &mut threats);
        self.check_mime(head, ext.as_deref(), &mut threats);
        self.check_executable_signatures(head, &mut threats);
        self.check_urls(&text, &mut threats);

        for threat in &threats {
            debug!(file = %declared_name, threat = %threat, "Threat recorded");
        }

        let file_type = ext
            .as_deref()
            .and_then(|e| self.categories.get(e).copied())
            .unwrap_or_default();

        ScanResult::new(file_type, size, checksum, threats, started)
    }

    fn check_extension(&self, ext: Option<&str>, threats: &mut Vec<String>) {
        match ext {
            Some(ext) => {
                if self.blocked.contains(ext) {
                    threats.push(format!("Dangerous file extension detected: {}", ext));
                }
                if !self.allowed.contains(ext) {
                    threats.push(format!("Unsupported file extension: {}", ext));
                }
            }
            None => threats.push("Unsupported file extension: (none)".to_string()),
        }
    }

    fn check_content(&self, digest: &ContentDigest, text: &str, threats: &mut Vec<String>) {
        for pattern in &self.patterns {
            if pattern.regex.is_match(text) {
                threats.push(format!("Malicious pattern detected: {}", pattern.name));
            }
        }

        if digest.contains_marker() {
            threats.push("Embedded executable detected (MZ header)".to_string());
        }

        let entropy = digest.entropy();
        if entropy > self.settings.entropy_threshold {
            threats.push(format!(
                "High entropy detected ({:.2}) - file may be packed or encrypted",
                entropy
            ));
        }
    }

    fn check_mime(&self, bytes: &[u8], ext: Option<&str>, threats: &mut Vec<String>) {
        let Some(detected) = Analyzer::detect_signature(bytes, &self.settings.mime_signatures)
        else {
            return;
        };
        let Some(ext) = ext else {
            return;
        };
        let Some(expected) = self.expected_mime.get(ext) else {
            return;
        };

        if !expected.iter().any(|m| m.eq_ignore_ascii_case(&detected.mime_type)) {
            threats.push(format!(
                "MIME type mismatch: detected {}, expected {} for {}",
                detected.mime_type,
                expected.join(" or "),
                ext
            ));
        }
    }

    fn check_executable_signatures(&self, bytes: &[u8], threats: &mut Vec<String>) {
        for sig in &self.settings.executable_signatures {
            if sig.matches(bytes) {
                threats.push(format!("Suspicious file signature detected: {}", sig.name));
            }
        }
    }

    fn check_urls(&self, text: &str, threats: &mut Vec<String>) {
        let count = Analyzer::count_matches(&self.url_regex, text);
        if count > self.settings.max_url_count {
            threats.push(format!(
                "High number of URLs detected ({}) - possible phishing",
                count
            ));
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// File name of `path` as shown in reports and threat logs.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

fn open_regular_file(path: &Path) -> Result<File, ScanError> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(ScanError::NotAFile(path.to_path_buf()));
    }
    Ok(File::open(path)?)
}

fn log_outcome(declared_name: &str, result: &ScanResult) {
    if result.is_safe {
        info!(
            file = %declared_name,
            size = result.file_size_bytes,
            duration_ms = result.scan_details.scan_duration_ms,
            "File scan clean"
        );
    } else {
        warn!(
            file = %declared_name,
            size = result.file_size_bytes,
            threats = result.threats.len(),
            duration_ms = result.scan_details.scan_duration_ms,
            "File scan found threats"
        );
    }
}
