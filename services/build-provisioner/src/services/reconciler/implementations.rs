use std::time::Duration;

use build_core::workload::{WorkloadKind, WorkloadSpec};
use kube::api::PropagationPolicy;
use tracing::{error, info, warn};

use crate::services::{
    object_store::{Deletion, ObjectStore},
    reconciler::{
        DEFAULT_DELETION_TIMEOUT, ReconcileError, ReconcileStage, Reconciler, WorkloadHandle,
    },
};

impl<S: ObjectStore> Reconciler<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            deletion_timeout: DEFAULT_DELETION_TIMEOUT,
        }
    }

    pub fn with_deletion_timeout(mut self, timeout: Duration) -> Self {
        self.deletion_timeout = timeout;
        self
    }

    #[tracing::instrument(
        name = "reconciler.reconcile",
        skip_all,
        fields(kind = %workload.kind(), ns = %workload.namespace(), name = %workload.name()),
        err
    )]
    pub async fn reconcile(&self, workload: &WorkloadSpec) -> Result<WorkloadHandle, ReconcileError> {
        let ns = workload.namespace();
        let name = workload.name();

        match workload.kind() {
            WorkloadKind::Pod => self.remove_pod(ns, name).await?,
            WorkloadKind::Deployment => self.remove_deployment(ns, name).await?,
        }

        let created = self.store.create(ns, workload).await.map_err(|e| {
            error!(ns = %ns, name = %name, error = %e, "🚨 Failed to create workload");
            ReconcileError::new(ReconcileStage::Create, e)
        })?;

        let handle = WorkloadHandle {
            kind: workload.kind(),
            namespace: created.namespace.unwrap_or_else(|| ns.to_string()),
            name: created.name.unwrap_or_else(|| name.to_string()),
            uid: created.uid,
        };

        info!(ns = %handle.namespace, name = %handle.name, "✅ Created {}", handle.kind);

        Ok(handle)
    }

    /// Pods carry nothing worth comparing, so any pod holding the name is stale.
    async fn remove_pod(&self, ns: &str, name: &str) -> Result<(), ReconcileError> {
        match self.store.delete(WorkloadKind::Pod, ns, name, None).await {
            Ok(deletion) => {
                info!(ns = %ns, name = %name, "🗑️ Deleted previous pod");
                self.settle(WorkloadKind::Pod, ns, name, deletion).await
            }
            Err(e) if e.is_not_found() => {
                info!(ns = %ns, name = %name, "No previous pod to delete");
                Ok(())
            }
            Err(e) => {
                error!(ns = %ns, name = %name, error = %e, "🚨 Failed to delete pod");
                Err(ReconcileError::new(ReconcileStage::Delete, e))
            }
        }
    }

    async fn remove_deployment(&self, ns: &str, name: &str) -> Result<(), ReconcileError> {
        let existing = match self.store.get(WorkloadKind::Deployment, ns, name).await {
            Ok(meta) => meta,
            Err(e) if e.is_not_found() => {
                info!(ns = %ns, name = %name, "No previous deployment found");
                return Ok(());
            }
            Err(e) => {
                error!(ns = %ns, name = %name, error = %e, "🚨 Failed to look up deployment");
                return Err(ReconcileError::new(ReconcileStage::Lookup, e));
            }
        };

        if existing.name.as_deref() != Some(name) {
            warn!(
                ns = %ns,
                name = %name,
                found = ?existing.name,
                "⚠️ Lookup returned a different deployment, skipping delete"
            );
            return Ok(());
        }

        // Dependents of the old template are left to the garbage collector
        match self
            .store
            .delete(
                WorkloadKind::Deployment,
                ns,
                name,
                Some(PropagationPolicy::Background),
            )
            .await
        {
            Ok(deletion) => {
                info!(ns = %ns, name = %name, "🗑️ Deleted previous deployment");
                self.settle(WorkloadKind::Deployment, ns, name, deletion).await
            }
            Err(e) if e.is_not_found() => {
                info!(ns = %ns, name = %name, "Deployment vanished before delete");
                Ok(())
            }
            Err(e) => {
                error!(ns = %ns, name = %name, error = %e, "🚨 Failed to delete deployment");
                Err(ReconcileError::new(ReconcileStage::Delete, e))
            }
        }
    }

    /// A terminating object still owns its name, so create has to wait it out.
    async fn settle(
        &self,
        kind: WorkloadKind,
        ns: &str,
        name: &str,
        deletion: Deletion,
    ) -> Result<(), ReconcileError> {
        let Deletion::Terminating { uid } = deletion else {
            return Ok(());
        };

        info!(ns = %ns, name = %name, uid = %uid, "⏳ Waiting for previous {kind} to terminate");

        match self
            .store
            .await_deleted(kind, ns, name, &uid, self.deletion_timeout)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => {
                error!(ns = %ns, name = %name, error = %e, "🚨 Previous {kind} did not terminate");
                Err(ReconcileError::new(ReconcileStage::Delete, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use build_core::{
        models::{BuildMode, BuildRequest},
        workload::WorkloadSpecBuilder,
    };

    use super::*;
    use crate::services::object_store::{
        StoreError,
        memory::{Call, Fault, MemoryStore},
    };

    fn workload(mode: BuildMode) -> WorkloadSpec {
        let request = BuildRequest::new(
            "https://example.com/app.git",
            "app",
            "registry.example.com/team/app",
        )
        .with_mode(mode);

        WorkloadSpecBuilder::default().build(&request).unwrap()
    }

    #[tokio::test]
    async fn test_one_shot_fresh_namespace() {
        let reconciler = Reconciler::new(MemoryStore::default());

        let handle = reconciler.reconcile(&workload(BuildMode::OneShot)).await.unwrap();

        assert_eq!(handle.name, "app");
        assert_eq!(handle.namespace, "default");
        assert_eq!(handle.kind, WorkloadKind::Pod);
        assert_eq!(
            reconciler.store.calls(),
            vec![
                Call::Delete(WorkloadKind::Pod, "app".to_string(), false),
                Call::Create(WorkloadKind::Pod, "app".to_string()),
            ]
        );
        assert_eq!(reconciler.store.count(), 1);
    }

    #[tokio::test]
    async fn test_one_shot_twice_leaves_one_pod() {
        let reconciler = Reconciler::new(MemoryStore::default());
        let spec = workload(BuildMode::OneShot);

        let first = reconciler.reconcile(&spec).await.unwrap();
        assert_eq!(reconciler.store.count(), 1);

        let second = reconciler.reconcile(&spec).await.unwrap();
        assert_eq!(reconciler.store.count(), 1);

        assert_ne!(first.uid, second.uid);
        let live = reconciler
            .store
            .live(WorkloadKind::Pod, "default", "app")
            .unwrap();
        assert_eq!(live.uid, second.uid);
    }

    #[tokio::test]
    async fn test_one_shot_replaces_stale_pod_without_lookup() {
        let store = MemoryStore::default();
        store.seed(WorkloadKind::Pod, "default", "app");
        let reconciler = Reconciler::new(store);

        reconciler.reconcile(&workload(BuildMode::OneShot)).await.unwrap();

        assert!(
            !reconciler
                .store
                .calls()
                .iter()
                .any(|call| matches!(call, Call::Get(..)))
        );
        let live = reconciler
            .store
            .live(WorkloadKind::Pod, "default", "app")
            .unwrap();
        assert_ne!(live.uid.as_deref(), Some("seeded"));
    }

    #[tokio::test]
    async fn test_managed_deletes_existing_in_background() {
        let store = MemoryStore::default();
        store.seed(WorkloadKind::Deployment, "default", "app");
        let reconciler = Reconciler::new(store);

        let handle = reconciler.reconcile(&workload(BuildMode::Managed)).await.unwrap();

        assert_eq!(handle.kind, WorkloadKind::Deployment);
        assert_eq!(
            reconciler.store.calls(),
            vec![
                Call::Get(WorkloadKind::Deployment, "app".to_string()),
                Call::Delete(WorkloadKind::Deployment, "app".to_string(), true),
                Call::Create(WorkloadKind::Deployment, "app".to_string()),
            ]
        );
        assert_eq!(reconciler.store.count(), 1);
    }

    #[tokio::test]
    async fn test_managed_fresh_namespace_skips_delete() {
        let reconciler = Reconciler::new(MemoryStore::default());

        reconciler.reconcile(&workload(BuildMode::Managed)).await.unwrap();

        assert_eq!(
            reconciler.store.calls(),
            vec![
                Call::Get(WorkloadKind::Deployment, "app".to_string()),
                Call::Create(WorkloadKind::Deployment, "app".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_lookup_failure_is_fatal() {
        let store = MemoryStore::default().failing_get(Fault::Rejected(500));
        let reconciler = Reconciler::new(store);

        let err = reconciler
            .reconcile(&workload(BuildMode::Managed))
            .await
            .unwrap_err();

        assert_eq!(err.stage, ReconcileStage::Lookup);
        assert!(matches!(err.source, StoreError::Rejected { code: 500, .. }));
        assert_eq!(reconciler.store.count(), 0);
    }

    #[tokio::test]
    async fn test_delete_failure_is_fatal() {
        let store = MemoryStore::default().failing_delete(Fault::Rejected(403));
        let reconciler = Reconciler::new(store);

        let err = reconciler
            .reconcile(&workload(BuildMode::OneShot))
            .await
            .unwrap_err();

        assert_eq!(err.stage, ReconcileStage::Delete);
        assert!(
            !reconciler
                .store
                .calls()
                .iter()
                .any(|call| matches!(call, Call::Create(..)))
        );
    }

    #[tokio::test]
    async fn test_one_shot_twice_waits_for_terminating_pod() {
        let reconciler = Reconciler::new(MemoryStore::default().graceful());
        let spec = workload(BuildMode::OneShot);

        let first = reconciler.reconcile(&spec).await.unwrap();
        let second = reconciler.reconcile(&spec).await.unwrap();

        assert_ne!(first.uid, second.uid);
        assert_eq!(reconciler.store.count(), 1);
        assert_eq!(
            reconciler.store.calls(),
            vec![
                Call::Delete(WorkloadKind::Pod, "app".to_string(), false),
                Call::Create(WorkloadKind::Pod, "app".to_string()),
                Call::Delete(WorkloadKind::Pod, "app".to_string(), false),
                Call::AwaitDeleted(WorkloadKind::Pod, "app".to_string()),
                Call::Create(WorkloadKind::Pod, "app".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_managed_waits_for_terminating_deployment() {
        let store = MemoryStore::default().graceful();
        store.seed(WorkloadKind::Deployment, "default", "app");
        let reconciler = Reconciler::new(store);

        let handle = reconciler.reconcile(&workload(BuildMode::Managed)).await.unwrap();

        assert_eq!(
            reconciler.store.calls(),
            vec![
                Call::Get(WorkloadKind::Deployment, "app".to_string()),
                Call::Delete(WorkloadKind::Deployment, "app".to_string(), true),
                Call::AwaitDeleted(WorkloadKind::Deployment, "app".to_string()),
                Call::Create(WorkloadKind::Deployment, "app".to_string()),
            ]
        );
        let live = reconciler
            .store
            .live(WorkloadKind::Deployment, "default", "app")
            .unwrap();
        assert_eq!(live.uid, handle.uid);
    }

    #[tokio::test]
    async fn test_termination_timeout_is_a_delete_failure() {
        let store = MemoryStore::default()
            .graceful()
            .failing_wait(Fault::Timeout);
        store.seed(WorkloadKind::Pod, "default", "app");
        let reconciler =
            Reconciler::new(store).with_deletion_timeout(Duration::from_millis(10));

        let err = reconciler
            .reconcile(&workload(BuildMode::OneShot))
            .await
            .unwrap_err();

        assert_eq!(err.stage, ReconcileStage::Delete);
        assert!(matches!(err.source, StoreError::DeletionTimeout { .. }));
        assert!(
            !reconciler
                .store
                .calls()
                .iter()
                .any(|call| matches!(call, Call::Create(..)))
        );
    }

    #[tokio::test]
    async fn test_managed_deployment_vanishing_before_delete() {
        let store = MemoryStore::default().failing_delete(Fault::NotFound);
        store.seed(WorkloadKind::Deployment, "default", "app");
        let reconciler = Reconciler::new(store);

        let handle = reconciler.reconcile(&workload(BuildMode::Managed)).await.unwrap();

        assert_eq!(handle.kind, WorkloadKind::Deployment);
        assert_eq!(
            reconciler.store.calls(),
            vec![
                Call::Get(WorkloadKind::Deployment, "app".to_string()),
                Call::Delete(WorkloadKind::Deployment, "app".to_string(), true),
                Call::Create(WorkloadKind::Deployment, "app".to_string()),
            ]
        );
        assert_eq!(reconciler.store.count(), 1);
    }

    #[tokio::test]
    async fn test_managed_delete_failure_is_fatal() {
        let store = MemoryStore::default().failing_delete(Fault::Rejected(403));
        store.seed(WorkloadKind::Deployment, "default", "app");
        let reconciler = Reconciler::new(store);

        let err = reconciler
            .reconcile(&workload(BuildMode::Managed))
            .await
            .unwrap_err();

        assert_eq!(err.stage, ReconcileStage::Delete);
        assert!(matches!(err.source, StoreError::Rejected { code: 403, .. }));
        assert!(
            !reconciler
                .store
                .calls()
                .iter()
                .any(|call| matches!(call, Call::Create(..)))
        );
        let live = reconciler
            .store
            .live(WorkloadKind::Deployment, "default", "app")
            .unwrap();
        assert_eq!(live.uid.as_deref(), Some("seeded"));
    }

    #[tokio::test]
    async fn test_create_conflict_is_fatal() {
        let store = MemoryStore::default().failing_create(Fault::AlreadyExists);
        let reconciler = Reconciler::new(store);

        let err = reconciler
            .reconcile(&workload(BuildMode::OneShot))
            .await
            .unwrap_err();

        assert_eq!(err.stage, ReconcileStage::Create);
        assert!(matches!(err.source, StoreError::AlreadyExists { .. }));
    }
}
