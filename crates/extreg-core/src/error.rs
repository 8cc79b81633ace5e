//! Unified error types for the module registry.
//!
//! Every failure the registry can report is fatal at this layer: nothing is
//! retried internally, and the embedding process decides whether to abort.

use std::fmt;
use thiserror::Error;

/// Error kind categorization used across the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The same module name was registered twice.
    DuplicateRegistration,
    /// A module file could not be opened, linked, or is missing an accessor.
    Load,
    /// A module was built against an incompatible host ABI.
    AbiVersionMismatch,
    /// Dependency resolution reached a fixpoint with modules left over.
    CyclicDependency,
    /// A persisted profile names a module absent from the catalog.
    UnknownModule,
    /// A lifecycle phase ran without its required registry state.
    InvalidState,
    /// A module hook reported a failure.
    Hook,
    /// A persistence frame was truncated or oversized.
    Serialization,
    /// A configuration error occurred.
    Configuration,
    /// A stream I/O error occurred.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateRegistration => write!(f, "DUPLICATE_REGISTRATION"),
            Self::Load => write!(f, "LOAD"),
            Self::AbiVersionMismatch => write!(f, "ABI_VERSION_MISMATCH"),
            Self::CyclicDependency => write!(f, "CYCLIC_DEPENDENCY"),
            Self::UnknownModule => write!(f, "UNKNOWN_MODULE"),
            Self::InvalidState => write!(f, "INVALID_STATE"),
            Self::Hook => write!(f, "HOOK"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Io => write!(f, "IO"),
        }
    }
}

/// The unified registry error.
///
/// Module hooks, the loader, the resolver and the persistence codec all
/// report through this type so a single fatal error reaches the embedder.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct RegistryError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable, possibly multi-line, diagnostic.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RegistryError {
    /// Create a new registry error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new registry error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a duplicate-registration error for `name`.
    pub fn duplicate_registration(name: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateRegistration,
            format!("Module '{name}' is already registered"),
        )
    }

    /// Create a load error.
    pub fn load(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Load, message)
    }

    /// Create an ABI mismatch error.
    pub fn abi_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AbiVersionMismatch, message)
    }

    /// Create a cyclic dependency error.
    pub fn cyclic_dependency(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CyclicDependency, message)
    }

    /// Create an unknown-module error for `name`.
    pub fn unknown_module(name: &str) -> Self {
        Self::new(
            ErrorKind::UnknownModule,
            format!("Persisted profile references unknown module '{name}'"),
        )
    }

    /// Create an invalid-state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, message)
    }

    /// Create a hook failure error.
    pub fn hook(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Hook, message)
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Io, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for RegistryError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = RegistryError::duplicate_registration("json");
        assert_eq!(err.kind, ErrorKind::DuplicateRegistration);
        assert_eq!(
            err.to_string(),
            "DUPLICATE_REGISTRATION: Module 'json' is already registered"
        );
    }

    #[test]
    fn test_io_error_conversion_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let err: RegistryError = io.into();
        assert_eq!(err.kind, ErrorKind::Io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
