//! Tokio runtime bridging the async SSH stack into the blocking pipeline.

use std::sync::LazyLock;

/// Runtime used by the SSH/SFTP client to bridge into synchronous call
/// sites. Created lazily on first use; the pipeline runs one connection at a
/// time, so two workers are plenty.
#[allow(clippy::expect_used)]
pub(crate) static ASYNC_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime for blocking layer")
});
