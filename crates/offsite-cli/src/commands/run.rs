//! Full backup pipeline: archive, upload, remove the local copy.

use crate::cli::RunArgs;
use crate::error::convert_backup_error;
use crate::error::with_cli_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use offsite_core::BackupConfig;
use offsite_core::BackupError;
use offsite_core::archive::ArchiveRequest;
use offsite_core::archive::build_archive;
use offsite_core::keys;
use offsite_core::transfer::upload_archive;
use std::fs;
use std::path::PathBuf;

pub fn execute(args: &RunArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let config = with_cli_context(BackupConfig::load(&args.config))?;

    let key = with_cli_context(keys::load_signing_key(config.key_path.as_deref()))?;
    // The fingerprint goes out before dialing so a failed authentication can
    // be checked against the server's authorized_keys.
    let authorized = keys::authorized_key_line(&key).ok();
    formatter.format_key_info(&keys::key_fingerprint(&key), authorized.as_deref())?;

    let request = ArchiveRequest {
        source_dir: PathBuf::from(&config.local_dir),
        dest_dir: config.staging_dir(),
        name_prefix: config.file_prefix.clone(),
    };
    let outcome = with_cli_context(build_archive(&request))?;
    formatter.format_archive_result(&outcome.archive_path, &outcome.report)?;

    let target = config.transfer_target();
    let written = with_cli_context(upload_archive(&outcome.archive_path, &target, &key))?;
    formatter.format_transfer_result(written, &target.host, &target.remote_dir)?;

    if args.keep_local {
        formatter.format_success(&format!(
            "Backup completed; local archive kept at {}",
            outcome.archive_path.display()
        ));
        return Ok(());
    }

    fs::remove_file(&outcome.archive_path).map_err(|e| {
        convert_backup_error(BackupError::Cleanup {
            path: outcome.archive_path.clone(),
            source: e,
        })
    })?;
    formatter.format_success("Backup completed successfully");

    Ok(())
}
