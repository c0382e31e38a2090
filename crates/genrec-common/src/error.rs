use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenrecError {
    #[error("Invalid sex value: {0:?} (expected M, F, ANY or null)")]
    InvalidSex(String),

    #[error("Invalid pathogenicity: {0:?}")]
    InvalidPathogenicity(String),

    #[error("Invalid override value: {0:?} (expected include or exclude)")]
    InvalidOverride(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GenrecError>;
