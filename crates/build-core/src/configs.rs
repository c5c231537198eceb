use serde::Deserialize;

/// Cluster-facing knobs of the build workload. Every field has a default, so an
/// empty `builder` section (or none at all) yields the stock kaniko layout.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BuilderConfig {
    #[serde(default = "app_label_default")]
    pub app_label: String,
    #[serde(default = "git_image_default")]
    pub git_image: String,
    #[serde(default = "kaniko_image_default")]
    pub kaniko_image: String,
    #[serde(default = "image_pull_policy_default")]
    pub image_pull_policy: String,
    #[serde(default = "registry_secret_default")]
    pub registry_secret: String,
    #[serde(default = "docker_config_path_default")]
    pub docker_config_path: String,
    #[serde(default = "git_root_default")]
    pub git_root: String,
    #[serde(default = "workspace_root_default")]
    pub workspace_root: String,
    #[serde(default = "node_pool_key_default")]
    pub node_pool_key: String,
    #[serde(default = "node_pool_value_default")]
    pub node_pool_value: String,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            app_label: app_label_default(),
            git_image: git_image_default(),
            kaniko_image: kaniko_image_default(),
            image_pull_policy: image_pull_policy_default(),
            registry_secret: registry_secret_default(),
            docker_config_path: docker_config_path_default(),
            git_root: git_root_default(),
            workspace_root: workspace_root_default(),
            node_pool_key: node_pool_key_default(),
            node_pool_value: node_pool_value_default(),
        }
    }
}

fn app_label_default() -> String {
    String::from("kaniko")
}

fn git_image_default() -> String {
    String::from("alpine/git")
}

fn kaniko_image_default() -> String {
    String::from("gcr.io/kaniko-project/executor:debug")
}

fn image_pull_policy_default() -> String {
    String::from("IfNotPresent")
}

fn registry_secret_default() -> String {
    String::from("kaniko-secret")
}

fn docker_config_path_default() -> String {
    String::from("/kaniko/.docker/")
}

fn git_root_default() -> String {
    String::from("/git")
}

fn workspace_root_default() -> String {
    String::from("/workspace")
}

fn node_pool_key_default() -> String {
    String::from("kaniko")
}

fn node_pool_value_default() -> String {
    String::from("enabled")
}
