//! Unattended directory backup: tar+gzip archive creation and SSH/SFTP
//! delivery.
//!
//! `offsite-core` packages a local directory tree into a compressed archive
//! and uploads it to a remote host over an authenticated SSH session. Archive
//! creation is all-or-nothing: a failed build leaves no file behind. Transfer
//! failures are classified so the operator can act on them (timeout vs. dial
//! vs. authentication vs. remote-side failures).
//!
//! # Examples
//!
//! ```no_run
//! use offsite_core::archive::ArchiveRequest;
//! use offsite_core::archive::build_archive;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let request = ArchiveRequest {
//!     source_dir: "/var/www".into(),
//!     dest_dir: std::env::temp_dir(),
//!     name_prefix: "www".to_string(),
//! };
//! let outcome = build_archive(&request)?;
//! println!("archive at {}", outcome.archive_path.display());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod archive;
pub mod config;
pub mod error;
pub mod keys;
pub mod transfer;

// Re-export main API types
pub use archive::ArchiveOutcome;
pub use archive::ArchiveReport;
pub use archive::ArchiveRequest;
pub use archive::build_archive;
pub use config::BackupConfig;
pub use error::BackupError;
pub use error::Result;
pub use keys::key_fingerprint;
pub use keys::load_signing_key;
pub use transfer::HostKeyPolicy;
pub use transfer::TransferTarget;
pub use transfer::upload_archive;
