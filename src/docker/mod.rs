//! Docker daemon integration layer.
//!
//! Everything that talks to the container daemon lives here:
//!
//! - [`api`]: the abstract daemon capability (list/pull/create/attach/start/
//!   remove) the rest of the crate is written against
//! - [`client`]: bollard-backed production implementation with connection
//!   fallback and health checking
//! - [`image`]: local image availability checks and best-effort concurrent
//!   pulls
//! - [`runner`]: the one-shot container run pipeline

pub mod api;
mod client;
mod image;
mod runner;

pub use api::{ContainerApi, ContainerSpec, ImageSummary, OutputFrame, OutputStream, StartOutcome};
pub use client::DockerClient;
pub use image::{DEFAULT_TAG, ImagePuller, ensure_tagged};
pub use runner::ContainerRunner;

use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Docker layer errors.
#[derive(Debug, thiserror::Error)]
pub enum DockerError {
    /// Docker daemon API error
    #[error("Docker API error: {0}")]
    Api(#[from] bollard::errors::Error),

    /// Scheme configuration error
    #[error("Scheme configuration error: {0}")]
    Scheme(#[from] crate::config::SchemeError),

    /// The daemon reported the container as already running on start
    #[error("Container already started: {0}")]
    AlreadyStarted(String),

    /// The operation was cancelled before completion
    #[error("Operation cancelled")]
    Cancelled,

    /// Output copy task failure
    #[error("Output stream error: {0}")]
    Stream(String),

    /// General error
    #[error("Docker error: {0}")]
    Other(String),
}

/// Result type for docker layer operations.
pub type Result<T> = std::result::Result<T, DockerError>;

/// Run a daemon call under the cancellation signal.
///
/// Dropping the in-flight future aborts the underlying request. Mandatory
/// cleanup calls must not go through this guard.
pub(crate) async fn run_cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        () = cancel.cancelled() => Err(DockerError::Cancelled),
        result = fut => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_cancellable_passes_through_results() {
        let cancel = CancellationToken::new();
        let value = run_cancellable(&cancel, async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn run_cancellable_aborts_pending_work() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<()> =
            run_cancellable(&cancel, futures::future::pending::<Result<()>>()).await;
        assert!(matches!(result, Err(DockerError::Cancelled)));
    }
}
