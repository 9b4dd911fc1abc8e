//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use offsite_core::ArchiveReport;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_key_info(&self, fingerprint: &str, authorized_key: Option<&str>) -> Result<()> {
        #[derive(Serialize)]
        struct KeyOutput {
            fingerprint_sha256: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            authorized_key: Option<String>,
        }

        let data = KeyOutput {
            fingerprint_sha256: fingerprint.to_string(),
            authorized_key: authorized_key.map(ToString::to_string),
        };

        let output = JsonOutput::success("key", data);
        Self::output(&output)
    }

    fn format_archive_result(&self, archive_path: &Path, report: &ArchiveReport) -> Result<()> {
        #[derive(Serialize)]
        struct ArchiveOutput {
            archive_path: String,
            files_added: usize,
            directories_added: usize,
            symlinks_added: usize,
            specials_added: usize,
            bytes_read: u64,
            bytes_compressed: u64,
            compression_ratio: f64,
            duration_ms: u128,
        }

        let data = ArchiveOutput {
            archive_path: archive_path.display().to_string(),
            files_added: report.files_added,
            directories_added: report.directories_added,
            symlinks_added: report.symlinks_added,
            specials_added: report.specials_added,
            bytes_read: report.bytes_read,
            bytes_compressed: report.bytes_compressed,
            compression_ratio: report.compression_ratio(),
            duration_ms: report.duration.as_millis(),
        };

        let output = JsonOutput::success("archive", data);
        Self::output(&output)
    }

    fn format_transfer_result(
        &self,
        bytes_written: u64,
        host: &str,
        remote_dir: &str,
    ) -> Result<()> {
        #[derive(Serialize)]
        struct TransferOutput {
            bytes_written: u64,
            host: String,
            remote_dir: String,
        }

        let data = TransferOutput {
            bytes_written,
            host: host.to_string(),
            remote_dir: remote_dir.to_string(),
        };

        let output = JsonOutput::success("upload", data);
        Self::output(&output)
    }

    fn format_success(&self, message: &str) {
        #[derive(Serialize)]
        struct SuccessData {
            message: String,
        }

        let output = JsonOutput::success(
            "status",
            SuccessData {
                message: message.to_string(),
            },
        );
        let _ = Self::output(&output);
    }

    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData {
            message: String,
        }

        let output = JsonOutput::success(
            "warning",
            WarningData {
                message: message.to_string(),
            },
        );
        let _ = Self::output(&output);
    }
}
