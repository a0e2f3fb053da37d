//! One-shot container run pipeline.
//!
//! A run is one linear pass: resolve the scheme, make sure the image is
//! present, create the container, attach to its combined output, start it,
//! split the stream into stdout/stderr, and force-remove the container no
//! matter how the run ended. Only stdout text goes back to the caller;
//! stderr lines are logged as diagnostics.

use super::api::{ContainerApi, ContainerSpec, OutputFrame, OutputStream, StartOutcome};
use super::image::ImagePuller;
use super::{DockerError, Result, run_cancellable};
use crate::config::SchemeStore;
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Runs scheme-configured one-shot containers and captures their output.
pub struct ContainerRunner {
    api: Arc<dyn ContainerApi>,
    puller: ImagePuller,
    schemes: SchemeStore,
}

impl ContainerRunner {
    /// Create a runner over a daemon capability and a loaded scheme store.
    pub fn new(api: Arc<dyn ContainerApi>, schemes: SchemeStore) -> Self {
        let puller = ImagePuller::new(Arc::clone(&api));
        Self {
            api,
            puller,
            schemes,
        }
    }

    /// The scheme store this runner resolves against.
    pub fn schemes(&self) -> &SchemeStore {
        &self.schemes
    }

    /// The image puller backing this runner.
    pub fn puller(&self) -> &ImagePuller {
        &self.puller
    }

    /// Run the scheme's command against `target` in a throwaway container
    /// and return the captured stdout text.
    ///
    /// The container is force-removed on every exit path once it exists,
    /// including errors and cancellation. An empty creation id short-circuits
    /// to an empty result without any removal, since nothing was created.
    /// Non-empty stderr lines are logged as errors and not returned; empty
    /// lines on either stream are dropped.
    ///
    /// # Errors
    ///
    /// Returns a scheme error for an unknown scheme or unreadable config, a
    /// daemon error for failed create/attach/remove calls, and
    /// [`DockerError::AlreadyStarted`] if the daemon reports the container
    /// as already running. Pull failures never fail the run.
    pub async fn run_with_output(
        &self,
        scheme_id: &str,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let image = self.schemes.resolve(scheme_id)?.image.clone();
        let cmd = self.schemes.render_command(scheme_id, target)?;

        // Best-effort pull: if the image is still missing afterwards, the
        // create call below fails with a clear daemon error.
        if !self.puller.exists(&image, cancel).await? {
            warn!(image = %image, "image not found locally, downloading");
            self.puller
                .pull_all(std::slice::from_ref(&image), cancel)
                .await;
        }

        let spec = ContainerSpec::one_shot(image, cmd);
        let id = run_cancellable(cancel, self.api.create_container(&spec)).await?;
        if id.is_empty() {
            error!("daemon returned an empty container id");
            return Ok(String::new());
        }
        debug!(container = %id, "container created");

        // The container exists from here on: remove it whatever happens next.
        let captured = self.attach_start_capture(&id, cancel).await;

        if let Err(e) = self.api.remove_container(&id).await {
            warn!(container = %id, "failed to remove container: {e}");
        }

        let (stdout, stderr) = captured?;

        for line in stderr.lines().filter(|line| !line.is_empty()) {
            error!(container = %id, "{line}");
        }

        let mut buffer = String::new();
        for line in stdout.lines().filter(|line| !line.is_empty()) {
            buffer.push_str(line);
            buffer.push('\n');
        }
        Ok(buffer)
    }

    /// Attach, start, and drain the container's combined output.
    ///
    /// Attaching happens strictly before the start call; output written
    /// between process start and a later attach would be lost otherwise.
    async fn attach_start_capture(
        &self,
        container_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(String, String)> {
        let stream = run_cancellable(cancel, self.api.attach_container(container_id)).await?;
        let copy = tokio::spawn(copy_output(stream, cancel.clone()));

        match run_cancellable(cancel, self.api.start_container(container_id)).await {
            Ok(StartOutcome::Started) => {}
            Ok(StartOutcome::AlreadyRunning) => {
                copy.abort();
                return Err(DockerError::AlreadyStarted(container_id.to_string()));
            }
            Err(e) => {
                copy.abort();
                return Err(e);
            }
        }

        let (stdout, stderr) = copy
            .await
            .map_err(|e| DockerError::Stream(format!("output copy task failed: {e}")))?;

        if cancel.is_cancelled() {
            return Err(DockerError::Cancelled);
        }

        Ok((
            String::from_utf8_lossy(&stdout).into_owned(),
            String::from_utf8_lossy(&stderr).into_owned(),
        ))
    }
}

/// Copy the combined stream into separate stdout/stderr sinks until it ends
/// or the run is cancelled.
async fn copy_output(mut stream: OutputStream, cancel: CancellationToken) -> (Vec<u8>, Vec<u8>) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            frame = stream.next() => match frame {
                Some(Ok(OutputFrame::Stdout(chunk))) => stdout.extend_from_slice(&chunk),
                Some(Ok(OutputFrame::Stderr(chunk))) => stderr.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    warn!("container output stream error: {e}");
                    break;
                }
                None => break,
            }
        }
    }
    (stdout, stderr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn frames(items: Vec<Result<OutputFrame>>) -> OutputStream {
        stream::iter(items).boxed()
    }

    #[tokio::test]
    async fn copy_splits_streams_into_sinks() {
        let stream = frames(vec![
            Ok(OutputFrame::Stdout(b"out1\n".to_vec())),
            Ok(OutputFrame::Stderr(b"err1\n".to_vec())),
            Ok(OutputFrame::Stdout(b"out2\n".to_vec())),
        ]);

        let (stdout, stderr) = copy_output(stream, CancellationToken::new()).await;
        assert_eq!(stdout, b"out1\nout2\n");
        assert_eq!(stderr, b"err1\n");
    }

    #[tokio::test]
    async fn copy_stops_at_stream_error() {
        let stream = frames(vec![
            Ok(OutputFrame::Stdout(b"kept\n".to_vec())),
            Err(DockerError::Other("connection reset".to_string())),
            Ok(OutputFrame::Stdout(b"dropped\n".to_vec())),
        ]);

        let (stdout, stderr) = copy_output(stream, CancellationToken::new()).await;
        assert_eq!(stdout, b"kept\n");
        assert!(stderr.is_empty());
    }

    #[tokio::test]
    async fn copy_honors_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (stdout, _) = copy_output(stream::pending().boxed(), cancel).await;
        assert!(stdout.is_empty());
    }
}
