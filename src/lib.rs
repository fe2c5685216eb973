//! Heuristic security scanning for user-uploaded files.

pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod models;

pub use crate::config::settings::Settings;
pub use crate::core::batch::BatchScanner;
pub use crate::core::filename::sanitize_file_name;
pub use crate::core::scanner::FileScanner;
pub use crate::error::{ConfigError, ScanError};
pub use crate::models::scan_result::{AuditRecord, FileCategory, ScanDetails, ScanResult, ENGINE_VERSION};
