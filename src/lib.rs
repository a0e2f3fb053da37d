//! # dockprobe
//!
//! Runs one-shot diagnostic containers from declarative command schemes and
//! captures their output.
//!
//! A *scheme* pairs a container image with a command template; a runtime
//! *target* (typically a host address) is substituted into the template. The
//! runner makes sure the image is available locally, runs the command in a
//! throwaway container, returns the captured stdout text, and removes the
//! container afterward regardless of outcome.
//!
//! ## Architecture Overview
//!
//! - **[`config`]**: the scheme store, loaded once from a YAML mapping of
//!   `scheme -> {image, arguments}`
//! - **[`docker`]**: daemon capability trait, bollard-backed client, image
//!   availability/pulling, and the run pipeline
//! - **[`output`]**: standalone deflate/zip packaging helpers for captured
//!   text
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dockprobe::{ContainerRunner, DockerClient, SchemeStore};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schemes = SchemeStore::load(None)?;
//!     let client = DockerClient::new().await?;
//!     let runner = ContainerRunner::new(Arc::new(client), schemes);
//!
//!     let cancel = CancellationToken::new();
//!     let output = runner.run_with_output("ping", "10.0.0.1", &cancel).await?;
//!     println!("{output}");
//!     Ok(())
//! }
//! ```

/// Scheme configuration store.
pub mod config;

/// Docker daemon integration: client, image handling, and the run pipeline.
pub mod docker;

/// Captured-output packaging helpers.
pub mod output;

pub use config::{Scheme, SchemeError, SchemeStore};
pub use docker::{
    ContainerApi, ContainerRunner, ContainerSpec, DockerClient, DockerError, ImagePuller,
    ImageSummary, OutputFrame, StartOutcome,
};
pub use output::{PackError, compress, decompress, zip_pack, zip_unpack};
