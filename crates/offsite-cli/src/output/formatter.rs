//! Output formatter trait for CLI results.

use anyhow::Result;
use offsite_core::ArchiveReport;
use serde::Serialize;
use std::path::Path;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Show the key fingerprint (and optionally the authorized_keys line)
    /// before any connection is attempted
    fn format_key_info(&self, fingerprint: &str, authorized_key: Option<&str>) -> Result<()>;

    /// Format archive build result
    fn format_archive_result(&self, archive_path: &Path, report: &ArchiveReport) -> Result<()>;

    /// Format upload result
    fn format_transfer_result(&self, bytes_written: u64, host: &str, remote_dir: &str)
    -> Result<()>;

    /// Format success message
    fn format_success(&self, message: &str);

    /// Format warning message
    #[allow(dead_code)]
    fn format_warning(&self, message: &str);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    #[allow(dead_code)]
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }
}
