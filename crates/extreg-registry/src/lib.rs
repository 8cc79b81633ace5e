//! # extreg-registry
//!
//! Registry for pluggable native modules. Provides:
//!
//! - A name-keyed module catalog populated by self-registration
//! - Dependency resolution with cycle diagnostics
//! - Lifecycle orchestration (load, init, shutdown, thread and request phases)
//! - Dynamic loading of ABI-versioned native modules via `libloading`
//! - Framing of opaque per-module profile payloads

pub mod catalog;
pub mod descriptor;
pub mod ffi;
pub mod lifecycle;
pub mod loader;
pub mod persistence;
pub mod resolver;
pub mod system;

pub use catalog::Catalog;
pub use descriptor::{Module, ModuleDescriptor};
pub use lifecycle::{Registry, RegistryState, WorkerPhases};
pub use loader::{DynamicLoader, LibraryOpener, ModuleLibrary};
pub use system::SystemState;
