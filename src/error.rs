use thiserror::Error;

#[derive(Error, Debug)]
pub enum DagLensError {
    #[error("Failed to parse workflow: {0}")]
    Parse(String),

    #[error("Normalization contract violated: {0}")]
    Contract(String),

    #[error("Unsupported CI platform: {0}")]
    UnsupportedPlatform(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DagLensError>;
