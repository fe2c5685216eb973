//! Built-in detection tables used by `Settings::default()`.

use std::collections::BTreeMap;

use crate::models::scan_result::FileCategory;
use crate::models::signature::{MagicSignature, PatternRule};

pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_TEXT_WINDOW_BYTES: usize = 1024 * 1024;
pub const DEFAULT_ENTROPY_THRESHOLD: f64 = 7.5;
pub const DEFAULT_MAX_URL_COUNT: usize = 10;

const ALLOWED_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".txt", ".rtf", ".jpg", ".jpeg", ".png", ".gif", ".webp", ".zip",
    ".rar",
];

const BLOCKED_EXTENSIONS: &[&str] = &[
    ".exe", ".bat", ".cmd", ".com", ".pif", ".scr", ".vbs", ".js", ".jar", ".php", ".asp",
    ".aspx",
];

const MALICIOUS_PATTERNS: &[(&str, &str)] = &[
    ("<script", r"<script"),
    ("javascript:", r"javascript:"),
    ("vbscript:", r"vbscript:"),
    ("onload=", r"onload\s*="),
    ("onerror=", r"onerror\s*="),
    ("eval(", r"eval\s*\("),
    ("document.write", r"document\.write"),
    ("window.location", r"window\.location"),
];

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const EXPECTED_MIME_TYPES: &[(&str, &[&str])] = &[
    (".pdf", &["application/pdf"]),
    (".doc", &["application/msword"]),
    (".docx", &[DOCX_MIME, "application/zip"]),
    (".txt", &["text/plain"]),
    (".rtf", &["application/rtf", "text/rtf"]),
    (".jpg", &["image/jpeg"]),
    (".jpeg", &["image/jpeg"]),
    (".png", &["image/png"]),
    (".gif", &["image/gif"]),
    (".webp", &["image/webp"]),
    (".zip", &["application/zip", "application/x-zip-compressed"]),
    (".rar", &["application/vnd.rar", "application/x-rar-compressed"]),
];

const FILE_CATEGORIES: &[(&str, FileCategory)] = &[
    (".pdf", FileCategory::Document),
    (".doc", FileCategory::Document),
    (".docx", FileCategory::Document),
    (".txt", FileCategory::Document),
    (".rtf", FileCategory::Document),
    (".jpg", FileCategory::Image),
    (".jpeg", FileCategory::Image),
    (".png", FileCategory::Image),
    (".gif", FileCategory::Image),
    (".webp", FileCategory::Image),
    (".zip", FileCategory::Archive),
    (".rar", FileCategory::Archive),
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn allowed_extensions() -> Vec<String> {
    strings(ALLOWED_EXTENSIONS)
}

pub fn blocked_extensions() -> Vec<String> {
    strings(BLOCKED_EXTENSIONS)
}

pub fn malicious_patterns() -> Vec<PatternRule> {
    MALICIOUS_PATTERNS
        .iter()
        .map(|(name, pattern)| PatternRule::new(name, pattern))
        .collect()
}

pub fn mime_signatures() -> Vec<MagicSignature> {
    vec![
        MagicSignature::new("PDF", "application/pdf", &[0x25, 0x50, 0x44, 0x46]),
        MagicSignature::new("JPEG", "image/jpeg", &[0xFF, 0xD8, 0xFF]),
        MagicSignature::new(
            "PNG",
            "image/png",
            &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
        ),
        MagicSignature::new("ZIP", "application/zip", &[0x50, 0x4B, 0x03, 0x04]),
        MagicSignature::new(
            "MS Office",
            "application/msword",
            &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1],
        ),
    ]
}

pub fn executable_signatures() -> Vec<MagicSignature> {
    vec![
        MagicSignature::new("PE executable", "application/x-msdownload", &[0x4D, 0x5A]),
        MagicSignature::new("ELF executable", "application/x-executable", &[0x7F, 0x45, 0x4C, 0x46]),
        MagicSignature::new("Mach-O executable", "application/x-mach-binary", &[0xFE, 0xED, 0xFA, 0xCE]),
    ]
}

pub fn expected_mime_types() -> BTreeMap<String, Vec<String>> {
    EXPECTED_MIME_TYPES
        .iter()
        .map(|(ext, mimes)| (ext.to_string(), strings(mimes)))
        .collect()
}

pub fn file_categories() -> BTreeMap<String, FileCategory> {
    FILE_CATEGORIES
        .iter()
        .map(|(ext, category)| (ext.to_string(), *category))
        .collect()
}
