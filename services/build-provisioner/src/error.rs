use build_core::error::BuildError;
use factory::factories::{
    kubernetes::error::KubernetesError, observability::error::ObservabilityError,
};
use thiserror::Error;

use crate::services::reconciler::ReconcileError;

#[derive(Error, Debug)]
pub enum AppError {
    // Rejected before anything reaches the cluster
    #[error("{0}")]
    BuildError(#[from] BuildError),

    #[error("Config error, {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Kubernetes client error, {0}")]
    KubernetesError(#[from] KubernetesError),

    #[error("Observability error, {0}")]
    ObservabilityError(#[from] ObservabilityError),

    #[error("{0}")]
    ReconcileError(#[from] ReconcileError),
}
