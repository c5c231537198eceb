use std::path::PathBuf;

use build_core::models::{BuildMode, BuildRequest, DEFAULT_NAMESPACE};
use clap::{Parser, ValueEnum};
use factory::factories::kubernetes::implementation::KubernetesConfig;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Bare pod, runs the build once
    OneShot,
    /// Single-replica deployment around the same pod template
    Managed,
}

impl From<Mode> for BuildMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::OneShot => BuildMode::OneShot,
            Mode::Managed => BuildMode::Managed,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "build-provisioner")]
#[command(author, version, about = "Provision rootless kaniko image builds on Kubernetes")]
pub struct Cli {
    /// Path to the kubeconfig file (defaults to KUBECONFIG or ~/.kube/config)
    #[arg(short = 'c', long)]
    pub kubeconfig: Option<PathBuf>,

    /// Use the pod's service account instead of a kubeconfig
    #[arg(long, conflicts_with = "kubeconfig")]
    pub in_cluster: bool,

    /// Namespace the build workload lives in
    #[arg(short = 'n', long, default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Git repository holding the project
    #[arg(long)]
    pub repo: String,

    /// Project name, used as workload name and directory
    #[arg(short = 'p', long)]
    pub project: String,

    /// Destination image, e.g. registry.example.com/team/app
    #[arg(short = 'r', long)]
    pub registry: String,

    #[arg(long, value_enum, default_value_t = Mode::OneShot)]
    pub mode: Mode,

    /// Service config file (JSON)
    #[arg(long, env = "CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn build_request(&self) -> BuildRequest {
        BuildRequest::new(&self.repo, &self.project, &self.registry)
            .with_namespace(&self.namespace)
            .with_mode(self.mode.into())
    }
}

impl KubernetesConfig for Cli {
    fn k8s_in_cluster(&self) -> bool {
        self.in_cluster
    }

    fn k8s_config_path(&self) -> Option<PathBuf> {
        self.kubeconfig.clone()
    }
}
