//! Error conversion utilities for CLI.
//!
//! Converts offsite-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use offsite_core::BackupError;

/// Converts `BackupError` to a user-friendly anyhow error with context
pub fn convert_backup_error(err: BackupError) -> anyhow::Error {
    match err {
        BackupError::DialTimeout { addr, timeout } => {
            anyhow!(
                "Connection to {addr} timed out after {}s\n\
                 HINT: check the address and that the SSH port is reachable from this host.",
                timeout.as_secs()
            )
        }
        BackupError::Dial { addr, reason } => {
            anyhow!(
                "SSH connection to {addr} failed: {reason}\n\
                 HINT: ensure the key fingerprint printed above is in the remote user's \
                 ~/.ssh/authorized_keys."
            )
        }
        BackupError::Auth { user, addr } => {
            anyhow!(
                "SSH authentication failed for {user}@{addr}\n\
                 HINT: ensure the key fingerprint printed above is in the remote user's \
                 ~/.ssh/authorized_keys."
            )
        }
        BackupError::SourceMissing { path } => {
            anyhow!("Backup source does not exist: {}", path.display())
        }
        BackupError::Upload {
            path,
            written,
            reason,
        } => {
            anyhow!(
                "Upload to {path} failed after {written} bytes: {reason}\n\
                 The partially written remote file was left in place."
            )
        }
        BackupError::Cleanup { path, source } => {
            anyhow!(
                "The remote copy succeeded, but the local archive {} could not be removed: {source}\n\
                 Local disk space was not reclaimed; delete the file manually.",
                path.display()
            )
        }
        BackupError::Key { reason } => {
            anyhow!(
                "SSH key error: {reason}\n\
                 HINT: set key_path in the configuration to point at a usable private key."
            )
        }
        _ => anyhow::Error::from(err),
    }
}

/// Adds the CLI conversion to a core result.
pub fn with_cli_context<T>(result: Result<T, BackupError>) -> anyhow::Result<T> {
    result.map_err(convert_backup_error)
}
