use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("road network configuration error: {0}")]
    Config(String),

    #[error("road network configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ManagerResult<T> = Result<T, ManagerError>;
