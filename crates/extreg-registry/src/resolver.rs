//! Dependency resolver: linearizes the catalog so every module follows all
//! of its dependencies.
//!
//! Modules without dependencies are placed first. The remaining modules are
//! resolved by repeatedly scanning the pending list from the top and taking
//! the first one whose dependencies are all placed, until nothing is pending
//! or a full scan makes no progress. Worst case is quadratic in the number of
//! modules, which stays small.

use std::collections::{BTreeSet, HashSet};
use std::fmt::Write as _;
use std::sync::Arc;

use tracing::debug;

use extreg_core::config::extensions::TieBreak;
use extreg_core::error::RegistryError;
use extreg_core::result::RegistryResult;

use crate::catalog::{Catalog, catalog_key};
use crate::descriptor::ModuleDescriptor;

/// Computes a dependency-consistent order over every module in the catalog.
///
/// Modules that become resolvable together are ordered by `tie_break`.
/// Fails with a cyclic-dependency error listing every module that could not
/// be placed, including those only blocked by a cycle elsewhere, together
/// with the dependency names each is still missing.
pub fn resolve(catalog: &Catalog, tie_break: TieBreak) -> RegistryResult<Vec<Arc<ModuleDescriptor>>> {
    let mut candidates: Vec<&Arc<ModuleDescriptor>> = catalog.iter().collect();
    if tie_break == TieBreak::Name {
        candidates.sort_by(|a, b| a.name().cmp(b.name()));
    }

    let mut ordered = Vec::with_capacity(candidates.len());
    let mut resolved: HashSet<String> = HashSet::with_capacity(candidates.len());
    let mut pending: Vec<(&Arc<ModuleDescriptor>, BTreeSet<String>)> = Vec::new();

    for descriptor in candidates {
        if descriptor.dependencies().is_empty() {
            resolved.insert(catalog_key(descriptor.name()));
            ordered.push(Arc::clone(descriptor));
        } else {
            pending.push((descriptor, descriptor.dependencies().clone()));
        }
    }

    while let Some(index) = pending.iter().position(|(_, deps)| {
        deps.iter().all(|dep| resolved.contains(&catalog_key(dep)))
    }) {
        let (descriptor, _) = pending.remove(index);
        resolved.insert(catalog_key(descriptor.name()));
        ordered.push(Arc::clone(descriptor));
    }

    if !pending.is_empty() {
        let mut message = String::from("Unable to resolve dependencies for module(s):");
        for (descriptor, deps) in &pending {
            let missing: Vec<&str> = deps
                .iter()
                .filter(|dep| !resolved.contains(&catalog_key(dep)))
                .map(String::as_str)
                .collect();
            let _ = write!(message, "\n  {} (missing: {})", descriptor.name(), missing.join(", "));
        }
        return Err(RegistryError::cyclic_dependency(message));
    }

    debug!(
        order = ?ordered.iter().map(|d| d.name()).collect::<Vec<_>>(),
        "Resolved module order"
    );

    Ok(ordered)
}
