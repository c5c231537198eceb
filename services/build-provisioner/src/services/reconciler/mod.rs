use std::time::Duration;

use build_core::workload::WorkloadKind;
use thiserror::Error;

use crate::services::object_store::StoreError;

pub mod implementations;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStage {
    Lookup,
    Delete,
    Create,
}

impl std::fmt::Display for ReconcileStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lookup => write!(f, "lookup"),
            Self::Delete => write!(f, "delete"),
            Self::Create => write!(f, "create"),
        }
    }
}

#[derive(Error, Debug)]
#[error("Reconcile {stage} failed: {source}")]
pub struct ReconcileError {
    pub stage: ReconcileStage,
    #[source]
    pub source: StoreError,
}

impl ReconcileError {
    pub fn new(stage: ReconcileStage, source: StoreError) -> Self {
        Self { stage, source }
    }
}

/// The workload left behind by a successful reconcile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadHandle {
    pub kind: WorkloadKind,
    pub namespace: String,
    pub name: String,
    pub uid: Option<String>,
}

/// How long a terminating predecessor may hold its name before reconcile gives up.
pub const DEFAULT_DELETION_TIMEOUT: Duration = Duration::from_secs(60);

/// Replaces workloads by name: delete whatever is there, wait for it to go, then create.
pub struct Reconciler<S> {
    pub store: S,
    pub deletion_timeout: Duration,
}
