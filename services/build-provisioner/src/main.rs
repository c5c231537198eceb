pub mod cli;
pub mod config;
pub mod error;
pub mod services;

use std::path::PathBuf;

use build_core::workload::WorkloadSpecBuilder;
use clap::Parser;
use factory::factories::{kubernetes::Kubernetes, observability::Observability};
use tracing::{error, info};

use crate::{
    cli::Cli,
    config::Config,
    error::AppError,
    services::{
        object_store::KubernetesStore, provisioner::Provisioner, reconciler::WorkloadHandle,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    // These are baked at COMPILE time
    let cargo_manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let cargo_crate_name = env!("CARGO_CRATE_NAME");
    let cargo_pkg_version = env!("CARGO_PKG_VERSION");

    // Load service-specific .env
    dotenvy::from_path(cargo_manifest_dir.join(".env")).ok();
    // Load workspace root .env as fallback
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => Config::init(path.clone(), true).await?,
        None => Config::init(cargo_manifest_dir.join("config.json"), false).await?,
    };

    let _guard = Observability::init(cargo_crate_name, cargo_pkg_version, &cfg.observability)
        .await
        .map_err(AppError::from)?;

    match run(&cli, cfg).await {
        Ok(handle) => {
            info!(
                kind = %handle.kind,
                ns = %handle.namespace,
                name = %handle.name,
                uid = ?handle.uid,
                "🎉 Build workload submitted"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "❌ Provisioning failed");
            Err(e.into())
        }
    }
}

async fn run(cli: &Cli, cfg: Config) -> Result<WorkloadHandle, AppError> {
    let request = cli.build_request();
    let kubernetes = Kubernetes::new(cli).await?;

    let deletion_timeout = cfg.deletion_timeout();
    let provisioner = Provisioner::new(
        WorkloadSpecBuilder::new(cfg.builder),
        KubernetesStore::new(kubernetes.client),
    )
    .with_deletion_timeout(deletion_timeout);

    provisioner.provision(&request).await
}
