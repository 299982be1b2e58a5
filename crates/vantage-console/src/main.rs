//! vantage-console — the Vantage web console server.
//!
//! Single binary that assembles the console: destination-type catalog,
//! Kubernetes resource store, REST API, and the embedded web app.
//! Every startup step is fatal on failure; the listener only starts
//! accepting connections once all of them have succeeded.
//!
//! # Usage
//!
//! ```text
//! vantage-console --address 0.0.0.0 --port 3000 --namespace vantage-system
//! ```

mod version;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use vantage_api::{ApiState, build_router};
use vantage_store::{DestinationCatalog, KubeStore};

#[derive(Parser)]
#[command(name = "vantage-console", about = "Vantage web console server")]
struct Cli {
    /// Print version information and exit.
    #[arg(long)]
    version: bool,

    /// Address to listen on.
    #[arg(long, default_value = "localhost")]
    address: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,

    /// Path to a kubeconfig file; inferred when omitted.
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Namespace the control plane is installed in.
    #[arg(long, default_value = "vantage-system")]
    namespace: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Version printing does no network or store work.
    if cli.version {
        println!("{}", version::info());
        return Ok(());
    }

    let default_filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    // ── Fatal startup sequence ─────────────────────────────────

    let catalog =
        DestinationCatalog::load().context("loading destination-type catalog")?;
    info!(types = catalog.list().len(), "destination-type catalog loaded");

    let store = KubeStore::connect(cli.kubeconfig.as_deref())
        .await
        .context("connecting to the cluster")?;
    info!("resource store connected");

    let state = ApiState {
        store: Arc::new(store),
        catalog: Arc::new(catalog),
        namespace: cli.namespace.clone(),
    };
    let router = build_router(state);

    let addr = format!("{}:{}", cli.address, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!(namespace = %cli.namespace, "console available at http://{addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C handler");
            info!("shutdown signal received");
        })
        .await?;

    info!("console stopped");
    Ok(())
}
