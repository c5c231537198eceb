use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Invalid build request: {0}")]
    InvalidBuildRequest(String),
    #[error("Invalid registry address '{0}'")]
    InvalidRegistryAddress(String),
}
