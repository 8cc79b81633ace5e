//! Module catalog: name-keyed descriptors in registration order.
//!
//! The catalog is populated during the single-threaded bootstrap window and
//! is not internally synchronized. Name lookups are case-insensitive; each
//! descriptor keeps the spelling it registered with.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::info;

use extreg_core::error::RegistryError;
use extreg_core::result::RegistryResult;

use crate::descriptor::ModuleDescriptor;

/// Normalized catalog key for a module name.
pub(crate) fn catalog_key(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Registry of all known modules.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Normalized name → descriptor, in registration order.
    modules: IndexMap<String, Arc<ModuleDescriptor>>,
}

impl Catalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor.
    ///
    /// Fails with a duplicate-registration error if the name is taken.
    pub fn register(&mut self, descriptor: ModuleDescriptor) -> RegistryResult<Arc<ModuleDescriptor>> {
        let key = catalog_key(descriptor.name());
        if self.modules.contains_key(&key) {
            return Err(RegistryError::duplicate_registration(descriptor.name()));
        }

        info!(
            module = %descriptor.name(),
            version = %descriptor.module().version(),
            enabled = descriptor.is_enabled(),
            origin = ?descriptor.origin(),
            "Registering module"
        );

        let descriptor = Arc::new(descriptor);
        self.modules.insert(key, Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Looks up a module by name.
    ///
    /// With `enabled_only`, a disabled module is reported as absent.
    pub fn lookup(&self, name: &str, enabled_only: bool) -> Option<&Arc<ModuleDescriptor>> {
        self.modules
            .get(&catalog_key(name))
            .filter(|descriptor| !enabled_only || descriptor.is_enabled())
    }

    /// Checks whether a module is registered.
    pub fn contains(&self, name: &str, enabled_only: bool) -> bool {
        self.lookup(name, enabled_only).is_some()
    }

    /// Lists module names in registration order.
    pub fn list_names(&self, enabled_only: bool) -> Vec<String> {
        self.modules
            .values()
            .filter(|descriptor| !enabled_only || descriptor.is_enabled())
            .map(|descriptor| descriptor.name().to_string())
            .collect()
    }

    /// Iterates descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ModuleDescriptor>> {
        self.modules.values()
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Drops every descriptor. Only shutdown clears the catalog.
    pub(crate) fn clear(&mut self) {
        self.modules.clear();
    }
}
