use std::collections::BTreeMap;

use k8s_openapi::{
    api::{
        apps::v1::{Deployment, DeploymentSpec},
        core::v1::{
            Container, EmptyDirVolumeSource, Pod, PodSpec, PodTemplateSpec, SecretVolumeSource,
            Toleration, Volume, VolumeMount,
        },
    },
    apimachinery::pkg::apis::meta::v1::LabelSelector,
};
use kube::api::ObjectMeta;
use tracing::debug;

use crate::{
    configs::BuilderConfig,
    error::BuildError,
    formatters::derive_cache_address,
    models::{BuildMode, BuildRequest},
};

pub const WORKDIR_VOLUME: &str = "workdir";
pub const INIT_CONTAINER_NAME: &str = "init-repo";
pub const BUILD_CONTAINER_NAME: &str = "kaniko";

const RESTART_NEVER: &str = "Never";
// apps/v1 rejects any other policy inside a Deployment template
const RESTART_ALWAYS: &str = "Always";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkloadKind {
    Pod,
    Deployment,
}

impl std::fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pod => write!(f, "Pod"),
            Self::Deployment => write!(f, "Deployment"),
        }
    }
}

/// The cluster object a build request turns into.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkloadSpec {
    Pod(Pod),
    Deployment(Deployment),
}

impl WorkloadSpec {
    pub fn kind(&self) -> WorkloadKind {
        match self {
            Self::Pod(_) => WorkloadKind::Pod,
            Self::Deployment(_) => WorkloadKind::Deployment,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::Pod(pod) => &pod.metadata,
            Self::Deployment(deployment) => &deployment.metadata,
        }
    }

    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.metadata().namespace.as_deref().unwrap_or_default()
    }

    /// Pod spec of the bare Pod, or of the Deployment's template.
    #[cfg(test)]
    pub fn pod_spec(&self) -> Option<&PodSpec> {
        match self {
            Self::Pod(pod) => pod.spec.as_ref(),
            Self::Deployment(deployment) => deployment
                .spec
                .as_ref()
                .and_then(|spec| spec.template.spec.as_ref()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorkloadSpecBuilder {
    cfg: BuilderConfig,
}

impl WorkloadSpecBuilder {
    pub fn new(cfg: BuilderConfig) -> Self {
        Self { cfg }
    }

    /// Translates a request into a Pod, or into a single-replica Deployment around
    /// the same template when the request is `Managed`. No I/O happens here.
    pub fn build(&self, request: &BuildRequest) -> Result<WorkloadSpec, BuildError> {
        Self::validate(request)?;

        let cache_address = derive_cache_address(&request.registry_address)?;
        let labels = self.labels();

        debug!(
            project = %request.project_name,
            namespace = %request.namespace,
            mode = %request.mode,
            cache_address = %cache_address,
            "🧱 Building workload spec"
        );

        let workload = match request.mode {
            BuildMode::OneShot => WorkloadSpec::Pod(Pod {
                metadata: self.metadata(request, &labels),
                spec: Some(self.pod_spec(request, &cache_address, RESTART_NEVER)),
                ..Default::default()
            }),
            BuildMode::Managed => {
                // DeploymentSpec:
                //      replicas: Option<i32>
                //      selector: LabelSelector
                //      template: PodTemplateSpec
                let deployment_spec = DeploymentSpec {
                    replicas: Some(1),
                    selector: LabelSelector {
                        match_labels: Some(labels.clone()),
                        ..Default::default()
                    },
                    template: PodTemplateSpec {
                        metadata: Some(ObjectMeta {
                            labels: Some(labels.clone()),
                            ..Default::default()
                        }),
                        spec: Some(self.pod_spec(request, &cache_address, RESTART_ALWAYS)),
                    },
                    ..Default::default()
                };

                WorkloadSpec::Deployment(Deployment {
                    metadata: self.metadata(request, &labels),
                    spec: Some(deployment_spec),
                    ..Default::default()
                })
            }
        };

        Ok(workload)
    }

    fn validate(request: &BuildRequest) -> Result<(), BuildError> {
        let required = [
            ("project name", &request.project_name),
            ("source repository url", &request.source_repo_url),
            ("registry address", &request.registry_address),
            ("namespace", &request.namespace),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(BuildError::InvalidBuildRequest(format!(
                    "{} must not be empty",
                    field
                )));
            }
        }

        Ok(())
    }

    fn labels(&self) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), self.cfg.app_label.clone());
        labels
    }

    fn metadata(&self, request: &BuildRequest, labels: &BTreeMap<String, String>) -> ObjectMeta {
        ObjectMeta {
            name: Some(request.project_name.clone()),
            namespace: Some(request.namespace.clone()),
            labels: Some(labels.clone()),
            ..Default::default()
        }
    }

    fn pod_spec(&self, request: &BuildRequest, cache_address: &str, restart_policy: &str) -> PodSpec {
        let mut node_selector = BTreeMap::new();
        node_selector.insert(
            self.cfg.node_pool_key.clone(),
            self.cfg.node_pool_value.clone(),
        );

        // Lets the pod land on nodes tainted for build work
        let toleration = Toleration {
            key: Some(self.cfg.node_pool_key.clone()),
            operator: Some("Equal".to_string()),
            value: Some(self.cfg.node_pool_value.clone()),
            effect: Some("NoSchedule".to_string()),
            ..Default::default()
        };

        PodSpec {
            init_containers: Some(vec![self.init_container(request)]),
            containers: vec![self.build_container(request, cache_address)],
            node_selector: Some(node_selector),
            tolerations: Some(vec![toleration]),
            restart_policy: Some(restart_policy.to_string()),
            volumes: Some(self.volumes()),
            ..Default::default()
        }
    }

    fn init_container(&self, request: &BuildRequest) -> Container {
        let target = format!("{}/{}", self.cfg.git_root, request.project_name);

        Container {
            name: INIT_CONTAINER_NAME.to_string(),
            image: Some(self.cfg.git_image.clone()),
            image_pull_policy: Some(self.cfg.image_pull_policy.clone()),
            command: Some(vec![
                "git".to_string(),
                "clone".to_string(),
                request.source_repo_url.clone(),
                target,
            ]),
            working_dir: Some(self.cfg.git_root.clone()),
            volume_mounts: Some(vec![VolumeMount {
                name: WORKDIR_VOLUME.to_string(),
                mount_path: self.cfg.git_root.clone(),
                ..Default::default()
            }]),
            ..Default::default()
        }
    }

    fn build_container(&self, request: &BuildRequest, cache_address: &str) -> Container {
        Container {
            name: BUILD_CONTAINER_NAME.to_string(),
            image: Some(self.cfg.kaniko_image.clone()),
            image_pull_policy: Some(self.cfg.image_pull_policy.clone()),
            args: Some(self.kaniko_args(request, cache_address)),
            volume_mounts: Some(vec![
                VolumeMount {
                    name: WORKDIR_VOLUME.to_string(),
                    mount_path: self.cfg.workspace_root.clone(),
                    ..Default::default()
                },
                VolumeMount {
                    name: self.cfg.registry_secret.clone(),
                    mount_path: self.cfg.docker_config_path.clone(),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        }
    }

    fn kaniko_args(&self, request: &BuildRequest, cache_address: &str) -> Vec<String> {
        let context = format!("{}/{}", self.cfg.workspace_root, request.project_name);

        vec![
            format!("--dockerfile={}/Dockerfile", context),
            format!("--context=dir://{}", context),
            format!("--destination={}", request.registry_address),
            "--cache=true".to_string(),
            format!("--cache-repo={}", cache_address),
            "--cleanup".to_string(),
        ]
    }

    fn volumes(&self) -> Vec<Volume> {
        vec![
            Volume {
                name: self.cfg.registry_secret.clone(),
                secret: Some(SecretVolumeSource {
                    secret_name: Some(self.cfg.registry_secret.clone()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            Volume {
                name: WORKDIR_VOLUME.to_string(),
                empty_dir: Some(EmptyDirVolumeSource::default()),
                ..Default::default()
            },
        ]
    }
}
