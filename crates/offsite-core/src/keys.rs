//! SSH signing-key loading and fingerprinting.
//!
//! The key location is an injected configuration value. When no explicit
//! path is given, the standard `~/.ssh` key files are probed in order.

use crate::BackupError;
use crate::Result;
use russh::keys::PrivateKey;
use russh::keys::load_secret_key;
use russh::keys::ssh_key::HashAlg;
use std::fmt::Write as _;
use std::path::Path;
use std::path::PathBuf;

/// Key file names probed under `~/.ssh` when no explicit path is configured.
const DEFAULT_KEY_CANDIDATES: [&str; 3] = ["id_ed25519", "id_rsa", "id_ecdsa"];

/// Loads the SSH private key used to authenticate uploads.
///
/// Tries `explicit` first when given; otherwise probes the default `~/.ssh`
/// candidates. The key material is never written or modified.
///
/// # Errors
///
/// Returns [`BackupError::Key`] when the explicit key cannot be parsed or
/// when no usable key is found in the default locations.
pub fn load_signing_key(explicit: Option<&Path>) -> Result<PrivateKey> {
    if let Some(path) = explicit {
        let path = expand_tilde(path);
        return load_secret_key(&path, None).map_err(|e| BackupError::Key {
            reason: format!("loading {}: {e}", path.display()),
        });
    }

    let home = dirs::home_dir().ok_or_else(|| BackupError::Key {
        reason: "cannot determine home directory".to_string(),
    })?;
    for name in &DEFAULT_KEY_CANDIDATES {
        let path = home.join(".ssh").join(name);
        if path.exists() {
            match load_secret_key(&path, None) {
                Ok(key) => return Ok(key),
                Err(e) => {
                    tracing::debug!("skipping {}: {e}", path.display());
                }
            }
        }
    }

    Err(BackupError::Key {
        reason: "no SSH private key found; set key_path in the config or place a key in ~/.ssh/"
            .to_string(),
    })
}

/// Short, human-verifiable fingerprint of the key's public component.
///
/// SHA-256 over the public key's wire encoding, rendered as lowercase hex.
/// Printed before dialing so a failed authentication can be checked against
/// the server's authorized keys.
#[must_use]
pub fn key_fingerprint(key: &PrivateKey) -> String {
    let fingerprint = key.public_key().fingerprint(HashAlg::Sha256);
    to_hex(fingerprint.as_bytes())
}

/// The `authorized_keys` line the operator must install on the remote server.
///
/// # Errors
///
/// Returns [`BackupError::Key`] when the public component cannot be encoded.
pub fn authorized_key_line(key: &PrivateKey) -> Result<String> {
    key.public_key()
        .to_openssh()
        .map_err(|e| BackupError::Key {
            reason: format!("encoding public key: {e}"),
        })
}

/// Expands a leading `~` to the user's home directory.
fn expand_tilde(raw: &Path) -> PathBuf {
    let Some(s) = raw.to_str() else {
        return raw.to_path_buf();
    };
    if s == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = s.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    raw.to_path_buf()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(
        String::with_capacity(bytes.len() * 2),
        |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        },
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use russh::keys::ssh_key::private::Ed25519Keypair;
    use russh::keys::ssh_key::private::KeypairData;

    fn test_key() -> PrivateKey {
        let seed = [7u8; 32];
        let keypair = Ed25519Keypair::from_seed(&seed);
        PrivateKey::new(KeypairData::Ed25519(keypair), "test").unwrap()
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let key = test_key();
        let fingerprint = key_fingerprint(&key);
        // SHA-256 digest rendered as hex: 64 lowercase hex characters.
        assert_eq!(fingerprint.len(), 64);
        assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!fingerprint.chars().any(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let key = test_key();
        assert_eq!(key_fingerprint(&key), key_fingerprint(&key));
    }

    #[test]
    fn test_fingerprints_differ_per_key() {
        let a = test_key();
        let keypair = Ed25519Keypair::from_seed(&[9u8; 32]);
        let b = PrivateKey::new(KeypairData::Ed25519(keypair), "other").unwrap();
        assert_ne!(key_fingerprint(&a), key_fingerprint(&b));
    }

    #[test]
    fn test_authorized_key_line_format() {
        let key = test_key();
        let line = authorized_key_line(&key).unwrap();
        assert!(line.starts_with("ssh-ed25519 "));
    }

    #[test]
    fn test_load_missing_explicit_key() {
        let err = load_signing_key(Some(Path::new("/nonexistent/id_ed25519"))).unwrap_err();
        assert!(matches!(err, BackupError::Key { .. }));
        assert!(err.to_string().contains("/nonexistent/id_ed25519"));
    }

    #[test]
    fn test_load_roundtrip_through_openssh_file() {
        use russh::keys::ssh_key::LineEnding;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("id_ed25519");
        let key = test_key();
        std::fs::write(&path, key.to_openssh(LineEnding::LF).unwrap().as_bytes()).unwrap();

        let loaded = load_signing_key(Some(&path)).unwrap();
        assert_eq!(key_fingerprint(&loaded), key_fingerprint(&key));
    }

    #[test]
    fn test_expand_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_tilde(Path::new("~")), home);
        assert_eq!(
            expand_tilde(Path::new("~/.ssh/id_ed25519")),
            home.join(".ssh/id_ed25519")
        );
        assert_eq!(
            expand_tilde(Path::new("/etc/offsite/key")),
            PathBuf::from("/etc/offsite/key")
        );
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[0x00, 0xff, 0x0a]), "00ff0a");
        assert_eq!(to_hex(&[]), "");
    }
}
