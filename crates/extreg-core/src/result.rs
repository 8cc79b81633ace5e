//! Convenience result type alias for extreg.

use crate::error::RegistryError;

/// A specialized `Result` type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
