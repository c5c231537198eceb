use std::{path::PathBuf, time::Duration};

use build_core::configs::BuilderConfig;
use config::{ConfigBuilder, ConfigError, Environment, File, Map, builder::AsyncState};
use factory::factories::observability::ObservabilityConfig;
use serde::Deserialize;

fn deletion_timeout_seconds_default() -> u64 {
    60
}

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub builder: BuilderConfig,
    #[serde(default = "deletion_timeout_seconds_default")]
    pub deletion_timeout_seconds: u64,
}

impl Config {
    /// `required` is false for the bundled default path, so a missing file falls
    /// back to defaults plus `PROVISIONER__*` environment overrides.
    pub async fn init(path: PathBuf, required: bool) -> Result<Self, ConfigError> {
        Self::load(path, required, None).await
    }

    /// `env` replaces the process environment as the override source when given.
    async fn load(
        path: PathBuf,
        required: bool,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let cfg = ConfigBuilder::<AsyncState>::default()
            .add_source(File::from(path).required(required))
            .add_source(
                Environment::with_prefix("PROVISIONER")
                    .separator("__")
                    .source(env),
            )
            .build()
            .await?;

        cfg.try_deserialize()
    }

    pub fn deletion_timeout(&self) -> Duration {
        Duration::from_secs(self.deletion_timeout_seconds)
    }
}
