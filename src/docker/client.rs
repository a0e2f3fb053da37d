//! Bollard-backed daemon client.
//!
//! Production implementation of [`ContainerApi`] with automatic connection
//! handling: Docker local defaults first, Podman sockets as fallback, and a
//! ping check before the client is handed out.

use super::api::{ContainerApi, ContainerSpec, ImageSummary, OutputFrame, OutputStream, StartOutcome};
use super::{DockerError, Result};
use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    AttachContainerOptions, AttachContainerResults, Config, CreateContainerOptions, LogOutput,
    RemoveContainerOptions, StartContainerOptions,
};
use bollard::image::{CreateImageOptions, ListImagesOptions};
use futures::stream::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Docker/Podman API client.
#[derive(Clone)]
pub struct DockerClient {
    docker: Arc<Docker>,
}

impl DockerClient {
    /// Connect to the container runtime and verify the connection.
    ///
    /// # Errors
    ///
    /// Returns error if neither Docker nor Podman are reachable.
    pub async fn new() -> Result<Self> {
        let docker = Self::connect()?;

        let client = Self {
            docker: Arc::new(docker),
        };
        client.ping().await?;

        Ok(client)
    }

    /// Wrap an already-connected bollard handle.
    pub fn from_docker(docker: Docker) -> Self {
        Self {
            docker: Arc::new(docker),
        }
    }

    /// Connect to Docker or Podman.
    ///
    /// Tries local defaults (Unix socket / named pipe / DOCKER_HOST) first,
    /// then the rootless and system Podman sockets on Unix.
    fn connect() -> Result<Docker> {
        debug!("Attempting to connect to container runtime...");

        match Docker::connect_with_local_defaults() {
            Ok(docker) => {
                info!("Connected to container runtime via local defaults");
                return Ok(docker);
            }
            Err(e) => {
                debug!("Local defaults failed: {}", e);
            }
        }

        #[cfg(unix)]
        {
            if let Ok(home) = std::env::var("HOME") {
                let podman_socket = format!("unix://{}/run/podman/podman.sock", home);
                debug!("Trying Podman socket: {}", podman_socket);

                match Docker::connect_with_socket(&podman_socket, 120, bollard::API_DEFAULT_VERSION)
                {
                    Ok(docker) => {
                        info!("Connected to Podman via rootless socket");
                        return Ok(docker);
                    }
                    Err(e) => {
                        debug!("Podman rootless socket failed: {}", e);
                    }
                }
            }

            let system_socket = "unix:///run/podman/podman.sock";
            debug!("Trying system Podman socket: {}", system_socket);

            match Docker::connect_with_socket(system_socket, 120, bollard::API_DEFAULT_VERSION) {
                Ok(docker) => {
                    info!("Connected to Podman via system socket");
                    return Ok(docker);
                }
                Err(e) => {
                    debug!("Podman system socket failed: {}", e);
                }
            }
        }

        Err(DockerError::Other(
            "Failed to connect to Docker or Podman. Please ensure Docker or Podman is installed and running.".to_string()
        ))
    }

    /// Ping the container runtime to verify connectivity.
    ///
    /// # Errors
    ///
    /// Returns error if ping fails.
    pub async fn ping(&self) -> Result<()> {
        let _ = self
            .docker
            .ping()
            .await
            .map_err(|e| DockerError::Other(format!("Failed to ping container runtime: {}", e)))?;
        debug!("Container runtime ping successful");
        Ok(())
    }

    /// Direct access to the underlying bollard client.
    pub fn docker(&self) -> &Docker {
        &self.docker
    }
}

#[async_trait]
impl ContainerApi for DockerClient {
    async fn list_images(&self, reference: &str) -> Result<Vec<ImageSummary>> {
        let mut filters = HashMap::new();
        filters.insert("reference".to_string(), vec![reference.to_string()]);

        let images = self
            .docker
            .list_images(Some(ListImagesOptions::<String> {
                filters,
                ..Default::default()
            }))
            .await?;

        Ok(images
            .into_iter()
            .map(|img| ImageSummary {
                id: img.id,
                repo_tags: img.repo_tags,
            })
            .collect())
    }

    async fn pull_image(&self, reference: &str) -> Result<()> {
        let mut stream = self.docker.create_image(
            Some(CreateImageOptions {
                from_image: reference,
                ..Default::default()
            }),
            None,
            None,
        );

        while let Some(result) = stream.next().await {
            let progress = result?;
            if let Some(error) = progress.error {
                return Err(DockerError::Other(format!("Pull failed: {}", error)));
            }
            if let Some(status) = progress.status {
                debug!(
                    "Pull {}: {}",
                    progress.id.as_deref().unwrap_or(reference),
                    status
                );
            }
        }

        info!("Successfully pulled image: {}", reference);
        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        let config = Config {
            image: Some(spec.image.clone()),
            cmd: Some(spec.cmd.clone()),
            attach_stdin: Some(spec.attach_stdin),
            attach_stdout: Some(spec.attach_stdout),
            attach_stderr: Some(spec.attach_stderr),
            args_escaped: Some(spec.args_escaped),
            ..Default::default()
        };

        let response = self
            .docker
            .create_container(None::<CreateContainerOptions<String>>, config)
            .await?;

        for warning in &response.warnings {
            warn!("Container create warning: {}", warning);
        }

        Ok(response.id)
    }

    async fn attach_container(&self, container_id: &str) -> Result<OutputStream> {
        let options = AttachContainerOptions::<String> {
            stdin: Some(false),
            stdout: Some(true),
            stderr: Some(true),
            stream: Some(true),
            logs: Some(false),
            ..Default::default()
        };

        let AttachContainerResults { output, .. } = self
            .docker
            .attach_container(container_id, Some(options))
            .await?;

        let frames = output
            .filter_map(|item| async move {
                match item {
                    Ok(LogOutput::StdOut { message }) | Ok(LogOutput::Console { message }) => {
                        Some(Ok(OutputFrame::Stdout(message.to_vec())))
                    }
                    Ok(LogOutput::StdErr { message }) => {
                        Some(Ok(OutputFrame::Stderr(message.to_vec())))
                    }
                    Ok(LogOutput::StdIn { .. }) => None,
                    Err(e) => Some(Err(DockerError::Api(e))),
                }
            })
            .boxed();

        Ok(frames)
    }

    async fn start_container(&self, container_id: &str) -> Result<StartOutcome> {
        match self
            .docker
            .start_container(container_id, None::<StartContainerOptions<String>>)
            .await
        {
            Ok(()) => Ok(StartOutcome::Started),
            // 304 Not Modified: the container is already running.
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 304, ..
            }) => Ok(StartOutcome::AlreadyRunning),
            Err(e) => Err(DockerError::Api(e)),
        }
    }

    async fn remove_container(&self, container_id: &str) -> Result<()> {
        debug!("Removing container: {}", container_id);

        self.docker
            .remove_container(
                container_id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await?;

        info!("Removed container: {}", container_id);
        Ok(())
    }
}
