use clap::{Parser, Subcommand};
use dockprobe::{ContainerRunner, DockerClient, ImagePuller, SchemeStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "dockprobe", version, about = "Run one-shot diagnostic containers from command schemes")]
struct Cli {
    /// Path to the scheme config file (default: ./service-config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a scheme against a target and print the captured output
    Run {
        /// Scheme id from the config file
        scheme: String,
        /// Target substituted into the scheme's {host} placeholder
        target: String,
        /// Also write the output as a zip archive to this path
        #[arg(long)]
        zip: Option<PathBuf>,
    },
    /// Pull images concurrently, best effort
    Pull {
        /// Image references; bare names get :latest
        images: Vec<String>,
    },
    /// Check whether an image is present locally
    Exists {
        /// Exact image reference to look for
        image: String,
    },
    /// List configured scheme ids
    Schemes,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dockprobe=info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Ctrl-C cancels the in-flight operation; mandatory container cleanup
    // still runs.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        let _ = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, cancelling");
                cancel.cancel();
            }
        });
    }

    match cli.command {
        Command::Run {
            scheme,
            target,
            zip,
        } => {
            let schemes = SchemeStore::load(cli.config.as_deref())?;
            let client = DockerClient::new().await?;
            let runner = ContainerRunner::new(Arc::new(client), schemes);

            let output = runner.run_with_output(&scheme, &target, &cancel).await?;
            print!("{output}");

            if let Some(path) = zip {
                let packed = dockprobe::zip_pack(&output)?;
                std::fs::write(&path, packed)?;
                debug!("wrote zipped output to {}", path.display());
            }
        }
        Command::Pull { images } => {
            let client = DockerClient::new().await?;
            let puller = ImagePuller::new(Arc::new(client));
            puller.pull_all(&images, &cancel).await;
        }
        Command::Exists { image } => {
            let client = DockerClient::new().await?;
            let puller = ImagePuller::new(Arc::new(client));
            let present = puller.exists(&image, &cancel).await?;
            println!("{present}");
        }
        Command::Schemes => {
            let schemes = SchemeStore::load(cli.config.as_deref())?;
            let mut ids: Vec<_> = schemes.scheme_ids().collect();
            ids.sort_unstable();
            for id in ids {
                println!("{id}");
            }
        }
    }

    Ok(())
}
