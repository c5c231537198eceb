use std::path::PathBuf;

use kube::{
    Client, Config,
    config::{KubeConfigOptions, Kubeconfig},
};
use tracing::info;

use crate::factories::kubernetes::{Kubernetes, error::KubernetesError};

pub trait KubernetesConfig {
    fn k8s_in_cluster(&self) -> bool;
    fn k8s_config_path(&self) -> Option<PathBuf>;
}

/// Where the client credentials come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Service account token mounted into the pod.
    InCluster,
    Kubeconfig(PathBuf),
    /// `KUBECONFIG`, then `~/.kube/config`, then the in-cluster environment.
    Inferred,
}

impl ConfigSource {
    /// The in-cluster flag wins over an explicit kubeconfig path.
    pub fn resolve<T: KubernetesConfig>(config: &T) -> Self {
        if config.k8s_in_cluster() {
            return Self::InCluster;
        }

        match config.k8s_config_path() {
            Some(path) => Self::Kubeconfig(path),
            None => Self::Inferred,
        }
    }

    async fn load(&self) -> Result<Config, KubernetesError> {
        let kube_config = match self {
            Self::InCluster => Config::incluster()?,
            Self::Kubeconfig(path) => {
                let kubeconfig = Kubeconfig::read_from(path)?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
            }
            Self::Inferred => Config::infer().await?,
        };

        Ok(kube_config)
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InCluster => write!(f, "in-cluster"),
            Self::Kubeconfig(path) => write!(f, "kubeconfig {}", path.display()),
            Self::Inferred => write!(f, "inferred"),
        }
    }
}

impl Kubernetes {
    pub async fn new<T: KubernetesConfig>(config: &T) -> Result<Self, KubernetesError> {
        let source = ConfigSource::resolve(config);
        let kube_config = source.load().await?;

        info!(
            source = %source,
            cluster_url = %kube_config.cluster_url,
            default_ns = %kube_config.default_namespace,
            "✅ Kubernetes client configured"
        );

        let client = Client::try_from(kube_config)?;

        Ok(Self { client })
    }
}
