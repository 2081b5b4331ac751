//! Error types for system bootstrap

use cry_extension::RegistryError;
use thiserror::Error;

/// System bootstrap errors
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("Unknown module: {0}")]
    UnknownModule(String),

    #[error("Engine module class '{class}' not found after loading '{module}'")]
    EngineClassNotFound { module: String, class: String },

    #[error("Engine module '{class}' from '{module}' failed to initialize")]
    EngineModuleInitFailed { module: String, class: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result type for system operations
pub type SystemResult<T> = Result<T, SystemError>;
