//! Error types for the extension registry

use std::fmt;
use thiserror::Error;

use crate::factory::FactoryInfo;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Which identity two factories fought over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionKind {
    /// Same class name
    Name,
    /// Same class id
    ClassId,
}

impl fmt::Display for CollisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionKind::Name => write!(f, "class name"),
            CollisionKind::ClassId => write!(f, "class id"),
        }
    }
}

/// Errors raised by the factory registry
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// Two distinct factories claim the same name or class id.
    ///
    /// This is a broken build, not a runtime condition. Callers at the module
    /// boundary are expected to terminate the process after reporting it.
    #[error("Factory {kind} collision: incoming {incoming} conflicts with registered {existing}")]
    IdentityCollision {
        kind: CollisionKind,
        existing: FactoryInfo,
        incoming: FactoryInfo,
    },
}

impl RegistryError {
    /// Whether the error must not be recovered from
    pub fn is_fatal(&self) -> bool {
        matches!(self, RegistryError::IdentityCollision { .. })
    }

    /// Create an identity collision error
    pub fn collision(kind: CollisionKind, existing: FactoryInfo, incoming: FactoryInfo) -> Self {
        RegistryError::IdentityCollision {
            kind,
            existing,
            incoming,
        }
    }
}

/// Text could not be parsed as a GUID
#[derive(Debug, Clone, Error)]
#[error("Invalid GUID text '{text}': {source}")]
pub struct GuidParseError {
    pub text: String,
    #[source]
    pub source: uuid::Error,
}
