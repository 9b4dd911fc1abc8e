//! Authenticated SFTP delivery of the archive to the remote host.
//!
//! One upload owns one SSH session and one SFTP sub-channel for its whole
//! duration. Failures are classified so the operator can act without
//! re-running in a debug mode: timeout vs. dial vs. authentication vs.
//! remote directory/file creation vs. the byte copy itself. Partially
//! written remote bytes are left in place on copy failure.

mod runtime;

use crate::BackupError;
use crate::Result;
use runtime::ASYNC_RUNTIME;
use russh::client;
use russh::keys::PrivateKey;
use russh::keys::PrivateKeyWithHashAlg;
use russh::keys::known_hosts::known_host_keys_path;
use russh::keys::known_hosts::learn_known_hosts_path;
use russh::keys::ssh_key;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::OpenFlags;
use russh_sftp::protocol::StatusCode;
use serde::Deserialize;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;

/// Standard SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Default bound on connection establishment.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Copy buffer size for the upload stream.
const COPY_BUF_SIZE: usize = 64 * 1024;

/// How the remote host's identity is verified during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyPolicy {
    /// Accept whatever key the server presents. This matches the tool's
    /// historical behavior and is vulnerable to interception; prefer
    /// `trust-on-first-use` where the first connection can be trusted.
    #[default]
    InsecureAcceptAll,

    /// Accept and record an unknown host key, reject a changed one.
    TrustOnFirstUse,

    /// Only accept host keys already present in the known-hosts file.
    Pinned,
}

/// Where and how to deliver the archive.
#[derive(Debug, Clone)]
pub struct TransferTarget {
    /// Remote host name or address.
    pub host: String,

    /// SSH port.
    pub port: u16,

    /// Remote username.
    pub username: String,

    /// Remote directory receiving the file; created if absent.
    pub remote_dir: String,

    /// Host identity verification policy.
    pub host_key_policy: HostKeyPolicy,

    /// known_hosts file backing the `trust-on-first-use` and `pinned`
    /// policies. Defaults to `~/.ssh/known_hosts`.
    pub known_hosts_path: Option<PathBuf>,

    /// Bound on connection establishment.
    pub connect_timeout: Duration,
}

impl TransferTarget {
    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Uploads `local_file` into `target.remote_dir`, returning the number of
/// bytes written.
///
/// The remote file is named after the local file's base name and is
/// created/truncated before the copy. The remote directory chain is created
/// when absent (idempotent). Resources are released most-recently-acquired
/// first on every exit path.
///
/// # Errors
///
/// Classified per failure site: [`BackupError::SourceMissing`],
/// [`BackupError::DialTimeout`], [`BackupError::Dial`],
/// [`BackupError::Auth`], [`BackupError::RemoteMkdir`],
/// [`BackupError::RemoteCreate`], [`BackupError::Upload`].
pub fn upload_archive(
    local_file: &Path,
    target: &TransferTarget,
    key: &PrivateKey,
) -> Result<u64> {
    if !local_file.is_file() {
        return Err(BackupError::SourceMissing {
            path: local_file.to_path_buf(),
        });
    }
    let file_name = local_file
        .file_name()
        .ok_or_else(|| {
            BackupError::Io(std::io::Error::other(format!(
                "cannot determine filename for {}",
                local_file.display()
            )))
        })?
        .to_string_lossy()
        .into_owned();
    let remote_path = join_remote(&target.remote_dir, &file_name);

    ASYNC_RUNTIME.block_on(upload(local_file, &remote_path, target, key))
}

async fn upload(
    local_file: &Path,
    remote_path: &str,
    target: &TransferTarget,
    key: &PrivateKey,
) -> Result<u64> {
    let addr = target.addr();
    let config = Arc::new(client::Config::default());
    let handler = ClientHandler {
        policy: target.host_key_policy,
        host: target.host.clone(),
        port: target.port,
        known_hosts_path: resolve_known_hosts_path(target.known_hosts_path.as_deref())?,
    };

    tracing::info!(%addr, user = %target.username, "connecting");
    let mut session = tokio::time::timeout(
        target.connect_timeout,
        client::connect(config, (target.host.as_str(), target.port), handler),
    )
    .await
    .map_err(|_| BackupError::DialTimeout {
        addr: addr.clone(),
        timeout: target.connect_timeout,
    })?
    .map_err(|e| BackupError::Dial {
        addr: addr.clone(),
        reason: e.to_string(),
    })?;

    let hash_alg = session
        .best_supported_rsa_hash()
        .await
        .map_err(|e| BackupError::Dial {
            addr: addr.clone(),
            reason: format!("negotiating hash algorithm: {e}"),
        })?
        .flatten();

    let auth = session
        .authenticate_publickey(
            target.username.as_str(),
            PrivateKeyWithHashAlg::new(Arc::new(key.clone()), hash_alg),
        )
        .await
        .map_err(|e| BackupError::Dial {
            addr: addr.clone(),
            reason: format!("authenticating: {e}"),
        })?;
    if !auth.success() {
        return Err(BackupError::Auth {
            user: target.username.clone(),
            addr,
        });
    }

    let channel = session
        .channel_open_session()
        .await
        .map_err(|e| BackupError::Dial {
            addr: addr.clone(),
            reason: format!("opening channel: {e}"),
        })?;
    channel
        .request_subsystem(true, "sftp")
        .await
        .map_err(|e| BackupError::Dial {
            addr: addr.clone(),
            reason: format!("requesting sftp subsystem: {e}"),
        })?;
    let sftp = SftpSession::new(channel.into_stream())
        .await
        .map_err(|e| BackupError::Dial {
            addr: addr.clone(),
            reason: format!("initializing sftp session: {e}"),
        })?;

    ensure_remote_dir(&sftp, &target.remote_dir).await?;

    let written = copy_to_remote(&sftp, local_file, remote_path).await?;
    tracing::info!(%addr, remote_path, written, "upload complete");

    let _ = session
        .disconnect(russh::Disconnect::ByApplication, "backup complete", "en")
        .await;

    Ok(written)
}

/// Creates the remote directory chain component by component. Succeeds when
/// the directories already exist.
async fn ensure_remote_dir(sftp: &SftpSession, path: &str) -> Result<()> {
    let mut current = String::new();
    for component in path.split('/') {
        if component.is_empty() {
            current.push('/');
            continue;
        }
        if current.is_empty() || current == "/" {
            current = format!("{current}{component}");
        } else {
            current = format!("{current}/{component}");
        }
        match sftp.create_dir(current.as_str()).await {
            Ok(()) => {}
            Err(e) => match &e {
                russh_sftp::client::error::Error::Status(s)
                    if s.status_code == StatusCode::Failure =>
                {
                    // Likely already exists; verify with metadata.
                    if let Err(meta_err) = sftp.metadata(current.as_str()).await {
                        return Err(BackupError::RemoteMkdir {
                            path: current,
                            reason: meta_err.to_string(),
                        });
                    }
                }
                _ => {
                    return Err(BackupError::RemoteMkdir {
                        path: current,
                        reason: e.to_string(),
                    });
                }
            },
        }
    }
    Ok(())
}

/// Streams the local file's bytes into a freshly created remote file.
async fn copy_to_remote(sftp: &SftpSession, local_file: &Path, remote_path: &str) -> Result<u64> {
    let mut local = tokio::fs::File::open(local_file)
        .await
        .map_err(BackupError::Io)?;
    let mut remote = sftp
        .open_with_flags(
            remote_path,
            OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE,
        )
        .await
        .map_err(|e| BackupError::RemoteCreate {
            path: remote_path.to_string(),
            reason: e.to_string(),
        })?;

    let upload_err = |written: u64| {
        let path = remote_path.to_string();
        move |e: std::io::Error| BackupError::Upload {
            path,
            written,
            reason: e.to_string(),
        }
    };

    let mut written: u64 = 0;
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    loop {
        let n = local.read(&mut buf).await.map_err(BackupError::Io)?;
        if n == 0 {
            break;
        }
        remote
            .write_all(&buf[..n])
            .await
            .map_err(upload_err(written))?;
        written += n as u64;
    }
    remote.flush().await.map_err(upload_err(written))?;
    remote.shutdown().await.map_err(upload_err(written))?;

    Ok(written)
}

/// SSH client handler enforcing the configured host-key policy.
struct ClientHandler {
    policy: HostKeyPolicy,
    host: String,
    port: u16,
    known_hosts_path: PathBuf,
}

impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match self.policy {
            HostKeyPolicy::InsecureAcceptAll => {
                tracing::warn!(
                    host = %self.host,
                    port = self.port,
                    "accepting unverified host key (insecure-accept-all)"
                );
                Ok(true)
            }
            HostKeyPolicy::TrustOnFirstUse => {
                match verify_host_key(
                    &self.host,
                    self.port,
                    &self.known_hosts_path,
                    server_public_key,
                    true,
                ) {
                    Ok(HostKeyState::Matched) => Ok(true),
                    Ok(HostKeyState::Learned) => {
                        tracing::warn!(
                            host = %self.host,
                            port = self.port,
                            known_hosts = %self.known_hosts_path.display(),
                            "learned new SSH host key"
                        );
                        Ok(true)
                    }
                    Ok(HostKeyState::Unknown) => Ok(false),
                    Err(e) => {
                        tracing::error!(
                            host = %self.host,
                            port = self.port,
                            "SSH host key verification failed: {e}"
                        );
                        Err(e)
                    }
                }
            }
            HostKeyPolicy::Pinned => {
                match verify_host_key(
                    &self.host,
                    self.port,
                    &self.known_hosts_path,
                    server_public_key,
                    false,
                ) {
                    Ok(HostKeyState::Matched) => Ok(true),
                    Ok(HostKeyState::Learned | HostKeyState::Unknown) => {
                        tracing::error!(
                            host = %self.host,
                            port = self.port,
                            known_hosts = %self.known_hosts_path.display(),
                            "host key not pinned in known-hosts file"
                        );
                        Ok(false)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    async fn auth_banner(
        &mut self,
        banner: &str,
        _session: &mut client::Session,
    ) -> std::result::Result<(), Self::Error> {
        // Surface whatever the server wants the operator to see.
        tracing::info!(host = %self.host, "server banner: {}", banner.trim_end());
        Ok(())
    }
}

/// Outcome of host key verification against the known-hosts file.
enum HostKeyState {
    Matched,
    Learned,
    Unknown,
}

fn verify_host_key(
    host: &str,
    port: u16,
    known_hosts_path: &Path,
    server_public_key: &ssh_key::PublicKey,
    learn: bool,
) -> std::result::Result<HostKeyState, russh::Error> {
    ensure_known_hosts_file(known_hosts_path).map_err(russh::Error::IO)?;

    let known = known_host_keys_path(host, port, known_hosts_path)?;
    if known
        .iter()
        .any(|(_, existing_key)| existing_key == server_public_key)
    {
        return Ok(HostKeyState::Matched);
    }

    if known.is_empty() {
        if learn {
            learn_known_hosts_path(host, port, server_public_key, known_hosts_path)?;
            return Ok(HostKeyState::Learned);
        }
        return Ok(HostKeyState::Unknown);
    }

    Err(russh::Error::KeyChanged { line: known[0].0 })
}

fn ensure_known_hosts_file(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if path.exists() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;

        match std::fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .mode(0o600)
            .open(path)
        {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e),
        }
    }

    #[cfg(not(unix))]
    {
        match std::fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(path)
        {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn resolve_known_hosts_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let home = dirs::home_dir().ok_or_else(|| BackupError::Key {
        reason: "cannot determine home directory for known_hosts".to_string(),
    })?;
    Ok(home.join(".ssh").join("known_hosts"))
}

/// Joins the remote directory and file name with forward slashes.
fn join_remote(dir: &str, file_name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        format!("/{file_name}")
    } else {
        format!("{dir}/{file_name}")
    }
}
