//! Backup job configuration loading and validation.
//!
//! The configuration is a JSON file. Five fields are required and must be
//! non-empty; the remaining fields tune the transport and may be omitted.

use crate::BackupError;
use crate::Result;
use crate::transfer::DEFAULT_CONNECT_TIMEOUT;
use crate::transfer::DEFAULT_PORT;
use crate::transfer::HostKeyPolicy;
use crate::transfer::TransferTarget;
use serde::Deserialize;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one backup job.
///
/// # Examples
///
/// ```
/// use offsite_core::BackupConfig;
///
/// let config: BackupConfig = serde_json::from_str(
///     r#"{
///         "server_addr": "203.0.113.9",
///         "username": "backup",
///         "local_dir": "/var/www",
///         "remote_dir": "/backups/www",
///         "file_prefix": "www"
///     }"#,
/// )
/// .unwrap();
/// assert_eq!(config.port, 22);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct BackupConfig {
    /// Remote server receiving the archive (hostname or IP address).
    #[serde(default)]
    pub server_addr: String,

    /// SSH username on the remote server.
    #[serde(default)]
    pub username: String,

    /// Local directory tree to back up.
    #[serde(default)]
    pub local_dir: String,

    /// Remote directory the archive is uploaded into; created if absent.
    #[serde(default)]
    pub remote_dir: String,

    /// Archive filename prefix (`<prefix>_<YYYYMMDD>.tar.gz`).
    #[serde(default)]
    pub file_prefix: String,

    /// Directory where the archive is staged before upload.
    /// Defaults to the OS temporary directory.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    /// SSH port on the remote server.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the SSH private key. When unset, the standard `~/.ssh`
    /// locations are probed.
    #[serde(default)]
    pub key_path: Option<PathBuf>,

    /// known_hosts file backing the `trust-on-first-use` and `pinned`
    /// policies. Defaults to `~/.ssh/known_hosts`.
    #[serde(default)]
    pub known_hosts_path: Option<PathBuf>,

    /// How the remote host's identity is verified.
    #[serde(default)]
    pub host_key_policy: HostKeyPolicy,

    /// Bound on connection establishment, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}

impl BackupConfig {
    /// Loads and validates the configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Config`] when the file cannot be read or
    /// parsed, or when a required field is missing or empty.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| BackupError::Config {
            reason: format!("reading {}: {e}", path.display()),
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|e| BackupError::Config {
            reason: format!("parsing {}: {e}", path.display()),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every required field is present and non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Config`] naming the first missing field.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("server_addr", &self.server_addr),
            ("username", &self.username),
            ("local_dir", &self.local_dir),
            ("remote_dir", &self.remote_dir),
            ("file_prefix", &self.file_prefix),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(BackupError::Config {
                    reason: format!("missing required field: {field}"),
                });
            }
        }
        Ok(())
    }

    /// Directory the archive is written to before upload.
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Connection-establishment timeout bound.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Builds the transfer destination from the transport fields.
    #[must_use]
    pub fn transfer_target(&self) -> TransferTarget {
        TransferTarget {
            host: self.server_addr.clone(),
            port: self.port,
            username: self.username.clone(),
            remote_dir: self.remote_dir.clone(),
            host_key_policy: self.host_key_policy,
            known_hosts_path: self.known_hosts_path.clone(),
            connect_timeout: self.connect_timeout(),
        }
    }
}
