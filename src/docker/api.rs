//! Abstract daemon capability.
//!
//! The run pipeline is written against [`ContainerApi`] rather than a
//! concrete client, so tests can substitute a recording implementation.
//! [`crate::docker::DockerClient`] is the production implementation.

use super::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// A chunk of container output, already attributed to one of the two
/// standard streams by the daemon's multiplexing framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFrame {
    /// Bytes written to the container's stdout
    Stdout(Vec<u8>),
    /// Bytes written to the container's stderr
    Stderr(Vec<u8>),
}

/// Live combined output stream of an attached container. Ends when the
/// container's output closes.
pub type OutputStream = BoxStream<'static, Result<OutputFrame>>;

/// Result of a container start request.
///
/// "Already running" is a first-class outcome rather than an error from the
/// transport, so callers can treat it as fatal without unwinding past their
/// cleanup obligations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The container transitioned to running
    Started,
    /// The daemon reported the container was already running
    AlreadyRunning,
}

/// Summary of a locally present image.
#[derive(Debug, Clone)]
pub struct ImageSummary {
    /// Image ID
    pub id: String,
    /// Repository tags
    pub repo_tags: Vec<String>,
}

/// Creation request for a one-shot container.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    /// Image reference to run
    pub image: String,
    /// Launch command tokens
    pub cmd: Vec<String>,
    /// Attach stdin on creation
    pub attach_stdin: bool,
    /// Attach stdout on creation
    pub attach_stdout: bool,
    /// Attach stderr on creation
    pub attach_stderr: bool,
    /// Whether the daemon should treat the command as already escaped
    pub args_escaped: bool,
}

impl ContainerSpec {
    /// Spec for a run-to-completion container whose stdout is captured.
    /// Stderr still arrives over the combined attach stream.
    pub fn one_shot(image: impl Into<String>, cmd: Vec<String>) -> Self {
        Self {
            image: image.into(),
            cmd,
            attach_stdin: false,
            attach_stdout: true,
            attach_stderr: false,
            args_escaped: false,
        }
    }
}

/// The small daemon operation set the run pipeline needs.
#[async_trait]
pub trait ContainerApi: Send + Sync {
    /// List locally present images whose reference matches `reference`
    /// exactly.
    async fn list_images(&self, reference: &str) -> Result<Vec<ImageSummary>>;

    /// Pull an image. `reference` must already carry its tag or digest;
    /// progress is consumed internally as diagnostics.
    async fn pull_image(&self, reference: &str) -> Result<()>;

    /// Create a container, returning the daemon-assigned id.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String>;

    /// Open the combined output stream of a container. Must be called
    /// before [`ContainerApi::start_container`] to observe early output.
    async fn attach_container(&self, container_id: &str) -> Result<OutputStream>;

    /// Start a created container.
    async fn start_container(&self, container_id: &str) -> Result<StartOutcome>;

    /// Force-remove a container regardless of its state.
    async fn remove_container(&self, container_id: &str) -> Result<()>;
}
