use std::time::Duration;

use build_core::{models::BuildRequest, workload::WorkloadSpecBuilder};
use tracing::info;

use crate::{
    error::AppError,
    services::{
        object_store::ObjectStore,
        reconciler::{Reconciler, WorkloadHandle},
    },
};

pub struct Provisioner<S> {
    pub builder: WorkloadSpecBuilder,
    pub reconciler: Reconciler<S>,
}

impl<S: ObjectStore> Provisioner<S> {
    pub fn new(builder: WorkloadSpecBuilder, store: S) -> Self {
        Self {
            builder,
            reconciler: Reconciler::new(store),
        }
    }

    pub fn with_deletion_timeout(mut self, timeout: Duration) -> Self {
        self.reconciler = self.reconciler.with_deletion_timeout(timeout);
        self
    }

    /// Builds the workload for `request` and replaces whatever holds its name.
    /// The request mode picks the shape, which in turn picks the replace path.
    #[tracing::instrument(
        name = "provisioner.provision",
        skip_all,
        fields(project = %request.project_name, ns = %request.namespace, mode = %request.mode),
        err
    )]
    pub async fn provision(&self, request: &BuildRequest) -> Result<WorkloadHandle, AppError> {
        let workload = self.builder.build(request)?;

        info!(
            source = %request.source_repo_url,
            destination = %request.registry_address,
            "🚀 Provisioning {} build",
            workload.kind()
        );

        let handle = self.reconciler.reconcile(&workload).await?;

        Ok(handle)
    }
}
