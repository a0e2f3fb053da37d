//! Image availability checks and best-effort pulls.

use super::api::ContainerApi;
use super::{Result, run_cancellable};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Tag appended to references that carry neither a tag nor a digest.
pub const DEFAULT_TAG: &str = "latest";

/// Make the pull tag explicit: references already carrying a tag or digest
/// pass through verbatim, bare names get `:latest`.
pub fn ensure_tagged(reference: &str) -> String {
    if reference.contains('@') {
        // A digest pins the exact image; no tag applies.
        return reference.to_string();
    }
    let name_start = reference.rfind('/').map_or(0, |i| i + 1);
    if reference[name_start..].contains(':') {
        reference.to_string()
    } else {
        format!("{reference}:{DEFAULT_TAG}")
    }
}

/// Checks for and fetches images through a [`ContainerApi`].
#[derive(Clone)]
pub struct ImagePuller {
    api: Arc<dyn ContainerApi>,
}

impl ImagePuller {
    /// Create a puller over a daemon capability.
    pub fn new(api: Arc<dyn ContainerApi>) -> Self {
        Self { api }
    }

    /// Whether an image matching `reference` exactly is present locally.
    ///
    /// Each call is a fresh daemon round-trip; nothing is cached.
    ///
    /// # Errors
    ///
    /// Returns error if the daemon image list query fails or the operation
    /// is cancelled.
    pub async fn exists(&self, reference: &str, cancel: &CancellationToken) -> Result<bool> {
        let images = run_cancellable(cancel, self.api.list_images(reference)).await?;
        Ok(!images.is_empty())
    }

    /// Pull every reference concurrently, best effort.
    ///
    /// Each image is fetched in its own task; a failed pull is logged and
    /// does not affect its siblings. Returns once every attempt has finished
    /// or been cancelled.
    pub async fn pull_all(&self, references: &[String], cancel: &CancellationToken) {
        let handles: Vec<_> = references
            .iter()
            .map(|reference| {
                let api = Arc::clone(&self.api);
                let cancel = cancel.clone();
                let reference = ensure_tagged(reference);
                tokio::spawn(async move {
                    debug!(image = %reference, "pulling image");
                    match run_cancellable(&cancel, api.pull_image(&reference)).await {
                        Ok(()) => info!(image = %reference, "image pulled"),
                        Err(e) => error!(image = %reference, "failed to pull image: {e}"),
                    }
                })
            })
            .collect();

        for handle in futures::future::join_all(handles).await {
            if handle.is_err() {
                error!("image pull task aborted");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_gets_default_tag() {
        assert_eq!(ensure_tagged("busybox"), "busybox:latest");
        assert_eq!(ensure_tagged("quay.io/ns/tool"), "quay.io/ns/tool:latest");
    }

    #[test]
    fn tagged_reference_passes_through() {
        assert_eq!(ensure_tagged("busybox:1.36"), "busybox:1.36");
    }

    #[test]
    fn digest_reference_passes_through() {
        let pinned = "busybox@sha256:3fbc632167424a6d997e74f52b878d7cc478225cffac6bc977eedfe51c7f4e79";
        assert_eq!(ensure_tagged(pinned), pinned);
    }

    #[test]
    fn registry_port_is_not_a_tag() {
        assert_eq!(
            ensure_tagged("registry.example.com:5000/tool"),
            "registry.example.com:5000/tool:latest"
        );
        assert_eq!(
            ensure_tagged("registry.example.com:5000/tool:2.1"),
            "registry.example.com:5000/tool:2.1"
        );
    }
}
