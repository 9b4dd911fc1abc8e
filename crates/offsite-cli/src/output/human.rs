//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use anyhow::Result;
use console::Term;
use console::style;
use offsite_core::ArchiveReport;
use std::path::Path;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn checkmark(&self) -> String {
        if self.use_colors {
            style("✓").green().bold().to_string()
        } else {
            "✓".to_string()
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_key_info(&self, fingerprint: &str, authorized_key: Option<&str>) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let _ = self
            .term
            .write_line(&format!("Key fingerprint (SHA-256): {fingerprint}"));
        if let Some(line) = authorized_key {
            let _ = self
                .term
                .write_line("Public key to authorize on the remote server:");
            let _ = self.term.write_line(&format!("  {line}"));
        }
        Ok(())
    }

    fn format_archive_result(&self, archive_path: &Path, report: &ArchiveReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let _ = self.term.write_line(&format!(
            "{} Archive created: {}",
            self.checkmark(),
            archive_path.display()
        ));
        let _ = self
            .term
            .write_line(&format!("  Files: {}", report.files_added));
        let _ = self
            .term
            .write_line(&format!("  Directories: {}", report.directories_added));
        let _ = self.term.write_line(&format!(
            "  Archive size: {}",
            Self::format_size(report.bytes_compressed)
        ));

        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Symlinks: {}", report.symlinks_added));
            let _ = self.term.write_line(&format!(
                "  Content read: {}",
                Self::format_size(report.bytes_read)
            ));
            let _ = self
                .term
                .write_line(&format!("  Duration: {:?}", report.duration));
        }

        Ok(())
    }

    fn format_transfer_result(
        &self,
        bytes_written: u64,
        host: &str,
        remote_dir: &str,
    ) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let _ = self.term.write_line(&format!(
            "{} Uploaded {} to {host}:{remote_dir}",
            self.checkmark(),
            Self::format_size(bytes_written)
        ));
        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Bytes written: {bytes_written}"));
        }
        Ok(())
    }

    fn format_success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let _ = self
            .term
            .write_line(&format!("{} {message}", self.checkmark()));
    }

    fn format_warning(&self, message: &str) {
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("!").yellow().bold()));
        } else {
            let _ = self.term.write_line(&format!("! {message}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(HumanFormatter::format_size(512), "512 B");
        assert_eq!(HumanFormatter::format_size(2048), "2.0 KB");
        assert_eq!(HumanFormatter::format_size(10 * 1024 * 1024), "10.0 MB");
        assert_eq!(
            HumanFormatter::format_size(3 * 1024 * 1024 * 1024),
            "3.0 GB"
        );
    }
}
