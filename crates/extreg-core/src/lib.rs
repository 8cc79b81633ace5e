//! # extreg-core
//!
//! Core crate for the extreg module registry. Contains the unified error
//! type and the configuration schemas consumed by the registry and the host.
//!
//! This crate has **no** internal dependencies on other extreg crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::{ErrorKind, RegistryError};
pub use result::RegistryResult;
