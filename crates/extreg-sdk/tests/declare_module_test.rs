//! Exercises the exported accessors generated by `declare_module!`.

use extreg_sdk::abi::{BuildInfo, ModuleHandle};
use extreg_sdk::prelude::*;

#[derive(Debug)]
struct Probe {
    label: &'static str,
}

impl Module for Probe {
    fn name(&self) -> &str {
        self.label
    }

    fn dependencies(&self) -> Vec<String> {
        vec!["std".to_string()]
    }
}

extreg_sdk::declare_module!(Probe { label: "probe" });

#[test]
fn test_build_info_accessor_reports_host_abi() {
    assert_eq!(extreg_build_info(), BuildInfo::host());
}

#[test]
fn test_module_accessor_transfers_ownership() {
    let raw = extreg_get_module();
    assert!(!raw.is_null());

    // SAFETY: produced by `Box::into_raw` in the generated accessor.
    let handle: Box<ModuleHandle> = unsafe { Box::from_raw(raw) };
    let module = handle.into_module();
    assert_eq!(module.name(), "probe");
    assert_eq!(module.dependencies(), vec!["std"]);
}

#[test]
fn test_setting_macro_falls_back_to_default() {
    let settings = serde_json::json!({ "start": 7, "label": "x" });
    assert_eq!(extreg_sdk::setting!(settings, "start", as_u64, 0), 7);
    assert_eq!(extreg_sdk::setting!(settings, "label", as_u64, 3), 3);
    assert_eq!(extreg_sdk::setting!(settings, "missing", as_str, "none"), "none");
}
