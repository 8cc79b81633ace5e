//! Property tests for dependency resolution over generated catalogs.

use std::collections::HashMap;

use proptest::prelude::*;

use extreg_core::config::extensions::TieBreak;
use extreg_registry::resolver::resolve;
use extreg_registry::{Catalog, Module, ModuleDescriptor};

#[derive(Debug)]
struct Node {
    name: String,
    deps: Vec<String>,
}

impl Module for Node {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<String> {
        self.deps.clone()
    }
}

/// Generates an acyclic graph: module `i` may only depend on modules `< i`.
/// `order` scrambles registration order.
fn acyclic_graph() -> impl Strategy<Value = (Vec<Vec<usize>>, Vec<usize>)> {
    (1usize..24).prop_flat_map(|n| {
        let deps = (0..n)
            .map(|i| proptest::collection::vec(0..i.max(1), 0..=i.min(4)))
            .collect::<Vec<_>>();
        let order = Just((0..n).collect::<Vec<usize>>()).prop_shuffle();
        (deps, order)
    })
}

fn build_catalog(deps: &[Vec<usize>], order: &[usize]) -> Catalog {
    let mut catalog = Catalog::new();
    for &i in order {
        let node_deps = deps[i]
            .iter()
            .filter(|&&d| d < i)
            .map(|d| format!("m{d}"))
            .collect();
        catalog
            .register(ModuleDescriptor::new(Box::new(Node {
                name: format!("m{i}"),
                deps: node_deps,
            })))
            .unwrap();
    }
    catalog
}

proptest! {
    #[test]
    fn every_module_follows_its_dependencies((deps, order) in acyclic_graph(), by_name in any::<bool>()) {
        let catalog = build_catalog(&deps, &order);
        let tie_break = if by_name { TieBreak::Name } else { TieBreak::Registration };

        let resolved = resolve(&catalog, tie_break).unwrap();
        prop_assert_eq!(resolved.len(), catalog.len());

        let position: HashMap<&str, usize> = resolved
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name(), i))
            .collect();
        prop_assert_eq!(position.len(), catalog.len());

        for (i, descriptor) in resolved.iter().enumerate() {
            for dep in descriptor.dependencies() {
                prop_assert!(position[dep.as_str()] < i);
            }
        }
    }

    #[test]
    fn name_tie_break_is_independent_of_registration_order((deps, order) in acyclic_graph()) {
        let shuffled = build_catalog(&deps, &order);
        let sequential: Vec<usize> = (0..deps.len()).collect();
        let baseline = build_catalog(&deps, &sequential);

        let a: Vec<String> = resolve(&shuffled, TieBreak::Name).unwrap().iter().map(|d| d.name().to_string()).collect();
        let b: Vec<String> = resolve(&baseline, TieBreak::Name).unwrap().iter().map(|d| d.name().to_string()).collect();
        prop_assert_eq!(a, b);
    }
}
