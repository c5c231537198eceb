use std::time::Duration;

use build_core::workload::{WorkloadKind, WorkloadSpec};
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Pod};
use kube::{
    Api, Client,
    api::{DeleteParams, ObjectMeta, PostParams, PropagationPolicy},
    runtime::wait::{await_condition, conditions},
};
use tracing::debug;

use crate::services::object_store::{Deletion, KubernetesStore, ObjectStore, StoreError};

impl KubernetesStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

impl ObjectStore for KubernetesStore {
    async fn get(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
    ) -> Result<ObjectMeta, StoreError> {
        debug!(kind = %kind, ns = %namespace, name = %name, "🔎 Looking up workload");

        let result = match kind {
            WorkloadKind::Pod => self.pods(namespace).get(name).await.map(|pod| pod.metadata),
            WorkloadKind::Deployment => self
                .deployments(namespace)
                .get(name)
                .await
                .map(|deployment| deployment.metadata),
        };

        result.map_err(|e| StoreError::from_kube(kind, name, e))
    }

    async fn delete(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
        propagation: Option<PropagationPolicy>,
    ) -> Result<Deletion, StoreError> {
        debug!(kind = %kind, ns = %namespace, name = %name, "🗑️ Deleting workload");

        let dp = DeleteParams {
            propagation_policy: propagation,
            ..Default::default()
        };

        // Left is the object still being torn down, Right is a Status for an immediate delete
        let result = match kind {
            WorkloadKind::Pod => self
                .pods(namespace)
                .delete(name, &dp)
                .await
                .map(|res| res.left().and_then(|pod| pod.metadata.uid)),
            WorkloadKind::Deployment => self
                .deployments(namespace)
                .delete(name, &dp)
                .await
                .map(|res| res.left().and_then(|deployment| deployment.metadata.uid)),
        };

        match result {
            Ok(Some(uid)) => Ok(Deletion::Terminating { uid }),
            Ok(None) => Ok(Deletion::Gone),
            Err(e) => Err(StoreError::from_kube(kind, name, e)),
        }
    }

    async fn await_deleted(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
        uid: &str,
        timeout: Duration,
    ) -> Result<(), StoreError> {
        debug!(kind = %kind, ns = %namespace, name = %name, uid = %uid, "⏳ Waiting for deletion");

        let waited = match kind {
            WorkloadKind::Pod => {
                let cond = await_condition(self.pods(namespace), name, conditions::is_deleted(uid));
                tokio::time::timeout(timeout, cond).await.map(|res| res.map(|_| ()))
            }
            WorkloadKind::Deployment => {
                let cond = await_condition(
                    self.deployments(namespace),
                    name,
                    conditions::is_deleted(uid),
                );
                tokio::time::timeout(timeout, cond).await.map(|res| res.map(|_| ()))
            }
        };

        match waited {
            Ok(res) => res.map_err(StoreError::from),
            Err(_) => Err(StoreError::DeletionTimeout {
                kind,
                name: name.to_string(),
                seconds: timeout.as_secs(),
            }),
        }
    }

    async fn create(
        &self,
        namespace: &str,
        workload: &WorkloadSpec,
    ) -> Result<ObjectMeta, StoreError> {
        debug!(kind = %workload.kind(), ns = %namespace, name = %workload.name(), "📦 Creating workload");

        let pp = PostParams::default();

        let result = match workload {
            WorkloadSpec::Pod(pod) => self
                .pods(namespace)
                .create(&pp, pod)
                .await
                .map(|pod| pod.metadata),
            WorkloadSpec::Deployment(deployment) => self
                .deployments(namespace)
                .create(&pp, deployment)
                .await
                .map(|deployment| deployment.metadata),
        };

        result.map_err(|e| StoreError::from_kube(workload.kind(), workload.name(), e))
    }
}
