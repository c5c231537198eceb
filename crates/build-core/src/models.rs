// ---------------------------------------------
// ENUMS
// ---------------------------------------------

/// How the build workload is wrapped on the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// A bare Pod that runs the build exactly once.
    #[default]
    OneShot,
    /// A Deployment with a single replica supervising the same pod template.
    Managed,
}

impl std::fmt::Display for BuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OneShot => write!(f, "one_shot"),
            Self::Managed => write!(f, "managed"),
        }
    }
}

// ---------------------------------------------
// MODELS
// ---------------------------------------------

pub const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub source_repo_url: String,
    pub project_name: String,
    pub namespace: String,
    pub registry_address: String,
    pub mode: BuildMode,
}

impl BuildRequest {
    pub fn new(
        source_repo_url: impl Into<String>,
        project_name: impl Into<String>,
        registry_address: impl Into<String>,
    ) -> Self {
        Self {
            source_repo_url: source_repo_url.into(),
            project_name: project_name.into(),
            namespace: String::from(DEFAULT_NAMESPACE),
            registry_address: registry_address.into(),
            mode: BuildMode::default(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }
}
