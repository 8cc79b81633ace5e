//! # extreg-sdk
//!
//! SDK for developing native extreg modules.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use extreg_sdk::prelude::*;
//!
//! #[derive(Debug, Default)]
//! struct Zlib;
//!
//! impl Module for Zlib {
//!     fn name(&self) -> &str { "zlib" }
//!     fn dependencies(&self) -> Vec<String> { vec!["std".to_string()] }
//! }
//!
//! extreg_sdk::declare_module!(Zlib::default());
//! ```
//!
//! Build the crate as a `cdylib` and list the resulting file under
//! `extensions` or `dynamic_extensions` in the host configuration.
//!
//! ## Logging
//!
//! A module library links its own copy of `tracing`, with its own global
//! dispatcher. Events a dynamically loaded module emits through
//! [`tracing`] are not seen by the host's subscriber; they are dropped
//! unless the module installs a subscriber of its own. Modules linked
//! statically into the host (the `rlib` build) share the host's dispatcher.

pub mod macros;

pub use extreg_registry::ffi::abi;
/// Logging facade. See the crate-level notes on dispatchers in loaded modules.
pub use tracing;

/// Prelude for convenient imports.
pub mod prelude {
    pub use extreg_core::error::{ErrorKind, RegistryError};
    pub use extreg_core::result::RegistryResult;
    pub use extreg_registry::descriptor::Module;
    pub use extreg_registry::system::SystemState;
    pub use serde_json::Value;
}
