use std::time::Duration;

use build_core::workload::{WorkloadKind, WorkloadSpec};
use kube::{
    Client,
    api::{ObjectMeta, PropagationPolicy},
};
use thiserror::Error;

pub mod implementations;
#[cfg(test)]
pub mod memory;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: WorkloadKind, name: String },

    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: WorkloadKind, name: String },

    #[error("API rejected request ({code}): {message}")]
    Rejected { code: u16, message: String },

    #[error("{kind} '{name}' still terminating after {seconds}s")]
    DeletionTimeout {
        kind: WorkloadKind,
        name: String,
        seconds: u64,
    },

    #[error("Kube error, {0}")]
    KubeError(#[from] kube::Error),

    #[error("Wait error, {0}")]
    WaitError(#[from] kube::runtime::wait::Error),
}

/// What the API server did with a delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deletion {
    /// The object is no longer stored.
    Gone,
    /// The object is still stored, draining its grace period or finalizers.
    Terminating { uid: String },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Maps API statuses onto the outcomes the reconciler distinguishes.
    pub fn from_kube(kind: WorkloadKind, name: &str, err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ae) if ae.code == 404 => Self::NotFound {
                kind,
                name: name.to_string(),
            },
            kube::Error::Api(ae) if ae.code == 409 => Self::AlreadyExists {
                kind,
                name: name.to_string(),
            },
            kube::Error::Api(ae) => Self::Rejected {
                code: ae.code,
                message: ae.message.clone(),
            },
            other => Self::KubeError(other),
        }
    }
}

/// Named workload objects within a namespace, as the control plane exposes them.
pub trait ObjectStore {
    async fn get(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
    ) -> Result<ObjectMeta, StoreError>;

    async fn delete(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
        propagation: Option<PropagationPolicy>,
    ) -> Result<Deletion, StoreError>;

    /// Resolves once the object with `uid` is gone, or fails after `timeout`.
    async fn await_deleted(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
        uid: &str,
        timeout: Duration,
    ) -> Result<(), StoreError>;

    async fn create(
        &self,
        namespace: &str,
        workload: &WorkloadSpec,
    ) -> Result<ObjectMeta, StoreError>;
}

#[derive(Clone)]
pub struct KubernetesStore {
    pub client: Client,
}
