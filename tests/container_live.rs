//! Live daemon integration tests.
//!
//! These run against a real Docker/Podman daemon and are skipped if none is
//! available or SKIP_CONTAINER_TESTS=1.

use dockprobe::{ContainerRunner, DockerClient, ImagePuller, SchemeStore};
use serial_test::serial;
use std::sync::Arc;
use test_tag::tag;
use tokio_util::sync::CancellationToken;

const TEST_IMAGE: &str = "busybox:latest";

/// Check if container tests should run.
fn should_run_container_tests() -> bool {
    if let Ok(value) = std::env::var("SKIP_CONTAINER_TESTS") {
        if value == "1" || value.eq_ignore_ascii_case("true") {
            return false;
        }
    }

    std::process::Command::new("docker")
        .arg("info")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
        || std::process::Command::new("podman")
            .arg("info")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
}

fn echo_schemes() -> SchemeStore {
    SchemeStore::from_yaml(&format!(
        "echo:\n  image: \"{TEST_IMAGE}\"\n  arguments: \"echo probe {{host}}\"\n"
    ))
    .expect("scheme store parses")
}

#[tokio::test]
#[serial]
#[tag(integration, container)]
async fn pull_then_exists_round_trip() {
    if !should_run_container_tests() {
        eprintln!("Skipping container tests (no daemon or SKIP_CONTAINER_TESTS=1)");
        return;
    }

    let client = DockerClient::new().await.expect("daemon connection");
    let puller = ImagePuller::new(Arc::new(client));
    let cancel = CancellationToken::new();

    puller.pull_all(&[TEST_IMAGE.to_string()], &cancel).await;

    let present = puller
        .exists(TEST_IMAGE, &cancel)
        .await
        .expect("image list query");
    assert!(present, "{TEST_IMAGE} should be present after pull");

    let absent = puller
        .exists("dockprobe-test/never-pushed:0.0.0", &cancel)
        .await
        .expect("image list query");
    assert!(!absent, "unknown reference must not match");
}

#[tokio::test]
#[serial]
#[tag(integration, container, slow)]
async fn run_with_output_captures_stdout_and_cleans_up() {
    if !should_run_container_tests() {
        eprintln!("Skipping container tests");
        return;
    }

    let client = DockerClient::new().await.expect("daemon connection");
    let runner = ContainerRunner::new(Arc::new(client), echo_schemes());
    let cancel = CancellationToken::new();

    let output = runner
        .run_with_output("echo", "10.0.0.1", &cancel)
        .await
        .expect("one-shot run");

    assert_eq!(output, "probe 10.0.0.1\n");
}

#[tokio::test]
#[serial]
#[tag(integration, container, slow)]
async fn repeated_runs_are_equivalent() {
    if !should_run_container_tests() {
        eprintln!("Skipping container tests");
        return;
    }

    let client = DockerClient::new().await.expect("daemon connection");
    let runner = ContainerRunner::new(Arc::new(client), echo_schemes());
    let cancel = CancellationToken::new();

    let first = runner
        .run_with_output("echo", "example.org", &cancel)
        .await
        .expect("first run");
    let second = runner
        .run_with_output("echo", "example.org", &cancel)
        .await
        .expect("second run");

    assert_eq!(first, second, "a stateless command is reproducible");
}
