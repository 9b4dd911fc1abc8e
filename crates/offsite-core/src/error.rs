//! Error types for the backup pipeline.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using `BackupError`.
pub type Result<T> = std::result::Result<T, BackupError>;

/// Errors that can occur while building or delivering a backup archive.
#[derive(Error, Debug)]
pub enum BackupError {
    /// Configuration is missing a required field or cannot be read/parsed.
    #[error("configuration error: {reason}")]
    Config {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// Backup source does not exist at request time.
    #[error("source does not exist: {path}")]
    SourceMissing {
        /// The missing path.
        path: PathBuf,
    },

    /// No usable SSH signing key could be loaded.
    #[error("SSH key error: {reason}")]
    Key {
        /// Why the key could not be loaded.
        reason: String,
    },

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection attempt produced no response within the timeout bound.
    #[error("connection to {addr} timed out after {timeout:?}")]
    DialTimeout {
        /// Remote address that was dialed.
        addr: String,
        /// The timeout bound that elapsed.
        timeout: Duration,
    },

    /// The connection could not be established for a reason other than a
    /// timeout.
    #[error("SSH connection to {addr} failed: {reason}")]
    Dial {
        /// Remote address that was dialed.
        addr: String,
        /// Underlying cause.
        reason: String,
    },

    /// The server rejected public-key authentication.
    #[error("SSH public-key authentication failed for {user}@{addr}")]
    Auth {
        /// Username presented to the server.
        user: String,
        /// Remote address.
        addr: String,
    },

    /// A remote directory could not be created.
    #[error("creating remote directory {path}: {reason}")]
    RemoteMkdir {
        /// Remote directory path.
        path: String,
        /// Underlying cause.
        reason: String,
    },

    /// The remote destination file could not be created.
    #[error("creating remote file {path}: {reason}")]
    RemoteCreate {
        /// Remote file path.
        path: String,
        /// Underlying cause.
        reason: String,
    },

    /// The byte copy stopped partway; already-written remote bytes are left
    /// in place.
    #[error("uploading to {path} failed after {written} bytes: {reason}")]
    Upload {
        /// Remote file path.
        path: String,
        /// Bytes written before the failure.
        written: u64,
        /// Underlying cause.
        reason: String,
    },

    /// The local archive could not be removed after a successful transfer.
    /// The remote copy exists; local disk space was not reclaimed.
    #[error("remote copy succeeded, but removing local archive {path} failed: {source}")]
    Cleanup {
        /// Local archive path that was left behind.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: std::io::Error,
    },
}

impl BackupError {
    /// Returns `true` if this error occurred during the network transfer
    /// phase.
    #[must_use]
    pub const fn is_transfer_error(&self) -> bool {
        matches!(
            self,
            Self::DialTimeout { .. }
                | Self::Dial { .. }
                | Self::Auth { .. }
                | Self::RemoteMkdir { .. }
                | Self::RemoteCreate { .. }
                | Self::Upload { .. }
        )
    }

    /// Returns `true` when the failure is plausibly a credential problem:
    /// the operator should check that the printed fingerprint is authorized
    /// on the remote side.
    #[must_use]
    pub const fn is_auth_related(&self) -> bool {
        matches!(self, Self::Dial { .. } | Self::Auth { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = BackupError::Config {
            reason: "missing required field: server_addr".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "configuration error: missing required field: server_addr"
        );
    }

    #[test]
    fn test_source_missing_display() {
        let err = BackupError::SourceMissing {
            path: PathBuf::from("/data/www"),
        };
        assert!(err.to_string().contains("/data/www"));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_dial_timeout_distinct_from_dial() {
        let timeout = BackupError::DialTimeout {
            addr: "203.0.113.9:22".to_string(),
            timeout: Duration::from_secs(15),
        };
        let dial = BackupError::Dial {
            addr: "203.0.113.9:22".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(timeout.to_string().contains("timed out"));
        assert!(!dial.to_string().contains("timed out"));
        assert!(dial.to_string().contains("connection refused"));
    }

    #[test]
    fn test_upload_error_reports_written_bytes() {
        let err = BackupError::Upload {
            path: "/backups/www_20240305.tar.gz".to_string(),
            written: 4096,
            reason: "connection reset".to_string(),
        };
        assert!(err.to_string().contains("4096"));
        assert!(err.to_string().contains("/backups/www_20240305.tar.gz"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BackupError = io_err.into();
        assert!(matches!(err, BackupError::Io(_)));
    }

    #[test]
    fn test_is_transfer_error() {
        let err = BackupError::RemoteMkdir {
            path: "/backups".to_string(),
            reason: "permission denied".to_string(),
        };
        assert!(err.is_transfer_error());

        let err = BackupError::SourceMissing {
            path: PathBuf::from("/data"),
        };
        assert!(!err.is_transfer_error());

        let err = BackupError::Cleanup {
            path: PathBuf::from("/tmp/a.tar.gz"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!err.is_transfer_error());
    }

    #[test]
    fn test_is_auth_related() {
        let err = BackupError::Auth {
            user: "backup".to_string(),
            addr: "203.0.113.9:22".to_string(),
        };
        assert!(err.is_auth_related());

        let err = BackupError::DialTimeout {
            addr: "203.0.113.9:22".to_string(),
            timeout: Duration::from_secs(15),
        };
        assert!(!err.is_auth_related());
    }

    #[test]
    fn test_cleanup_error_names_both_outcomes() {
        let err = BackupError::Cleanup {
            path: PathBuf::from("/tmp/www_20240305.tar.gz"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let display = err.to_string();
        assert!(display.contains("remote copy succeeded"));
        assert!(display.contains("/tmp/www_20240305.tar.gz"));
    }
}
