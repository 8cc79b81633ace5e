//! Module trait and the descriptor the catalog stores for each module.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use extreg_core::result::RegistryResult;

use crate::system::SystemState;

/// Trait that every module, built-in or dynamically loaded, implements.
///
/// All hooks default to no-ops so a module only overrides the phases it
/// cares about. Hooks take `&self`: thread and request hooks may run
/// concurrently from many worker threads, so a module guards its own state.
pub trait Module: Send + Sync + std::fmt::Debug {
    /// Unique module name.
    fn name(&self) -> &str;

    /// Module version string.
    fn version(&self) -> &str {
        "0.0.0"
    }

    /// Names of modules that must precede this one in every phase.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether the module is enabled.
    fn enabled(&self) -> bool {
        true
    }

    /// Called once during the load phase with this module's settings.
    fn on_load(&self, _settings: &serde_json::Value) -> RegistryResult<()> {
        Ok(())
    }

    /// Called once during process initialization.
    ///
    /// `system` reports the runtime as not fully initialized while this runs.
    fn on_init(&self, _system: &SystemState) -> RegistryResult<()> {
        Ok(())
    }

    /// Called once when initializing for a CLI client instead of a server.
    fn on_cli_init(&self) -> RegistryResult<()> {
        Ok(())
    }

    /// Called once at process shutdown, in reverse dependency order.
    fn on_shutdown(&self) {}

    /// Called once on each worker thread after it starts.
    fn on_thread_start(&self) {}

    /// Called once on each worker thread before it exits.
    fn on_thread_stop(&self) {}

    /// Called before each unit of work.
    fn on_request_start(&self) {}

    /// Called after each unit of work.
    fn on_request_stop(&self) {}

    /// Returns the opaque profile payload to persist. Empty means nothing.
    fn serialize_profile(&self) -> Vec<u8> {
        Vec::new()
    }

    /// Restores a payload previously produced by `serialize_profile`.
    fn deserialize_profile(&self, _payload: Vec<u8>) -> RegistryResult<()> {
        Ok(())
    }
}

/// The registry's record of one module.
///
/// Identity, dependencies and the enabled flag are captured once from the
/// module when the descriptor is built and never change afterwards.
#[derive(Debug)]
pub struct ModuleDescriptor {
    /// Unique module name.
    name: String,
    /// Modules that must precede this one.
    dependencies: BTreeSet<String>,
    /// Whether the module is enabled.
    enabled: bool,
    /// File the module was loaded from, for dynamically loaded modules.
    origin: Option<PathBuf>,
    /// The module implementation.
    module: Box<dyn Module>,
}

impl ModuleDescriptor {
    /// Builds a descriptor for a module.
    pub fn new(module: Box<dyn Module>) -> Self {
        Self {
            name: module.name().to_string(),
            dependencies: module.dependencies().into_iter().collect(),
            enabled: module.enabled(),
            origin: None,
            module,
        }
    }

    /// Records the file the module was loaded from.
    pub fn with_origin(mut self, path: impl Into<PathBuf>) -> Self {
        self.origin = Some(path.into());
        self
    }

    /// Module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of modules that must precede this one.
    pub fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }

    /// Whether the module is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// File the module was loaded from, if it was loaded dynamically.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// The module implementation.
    pub fn module(&self) -> &dyn Module {
        self.module.as_ref()
    }

    /// Current profile payload; empty when the module has nothing to persist.
    pub fn profile_payload(&self) -> Vec<u8> {
        self.module.serialize_profile()
    }
}
