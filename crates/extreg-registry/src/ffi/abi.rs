//! FFI ABI definitions for native modules.
//!
//! A native module exports exactly two accessors:
//!
//! ```c
//! BuildInfo extreg_build_info();
//! ModuleHandle* extreg_get_module();
//! ```
//!
//! The host calls `extreg_build_info` first and only calls
//! `extreg_get_module` when both version fields match its own.

use crate::descriptor::Module;

/// DSO API version. Bumped whenever the module ABI changes.
pub const DSO_VERSION: i64 = 20260301;

/// Host major version.
pub const VERSION_MAJOR: i64 = 0;

/// Host minor version.
pub const VERSION_MINOR: i64 = 1;

/// Branch identifier: major and minor packed as `major << 16 | minor << 8`.
pub const BRANCH_ID: i64 = (VERSION_MAJOR << 16) | (VERSION_MINOR << 8);

/// Exported name of the build-info accessor.
pub const BUILD_INFO_SYMBOL: &[u8] = b"extreg_build_info\0";

/// Exported name of the module accessor.
pub const GET_MODULE_SYMBOL: &[u8] = b"extreg_get_module\0";

/// Fixed-layout build information a module was compiled with.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    /// DSO API version.
    pub dso_version: i64,
    /// Packed major/minor branch identifier.
    pub branch_id: i64,
}

impl BuildInfo {
    /// Build information of this host.
    pub const fn host() -> Self {
        Self {
            dso_version: DSO_VERSION,
            branch_id: BRANCH_ID,
        }
    }

    /// Major version encoded in `branch_id`.
    pub fn major(&self) -> i64 {
        self.branch_id >> 16
    }

    /// Minor version encoded in `branch_id`.
    pub fn minor(&self) -> i64 {
        (self.branch_id >> 8) & 0xFF
    }
}

/// Owned handle to a module, passed from the module to the host as a thin
/// pointer.
#[derive(Debug)]
pub struct ModuleHandle {
    module: Box<dyn Module>,
}

impl ModuleHandle {
    /// Wraps a module.
    pub fn new(module: Box<dyn Module>) -> Self {
        Self { module }
    }

    /// Unwraps the module.
    pub fn into_module(self) -> Box<dyn Module> {
        self.module
    }
}

/// Signature of the exported build-info accessor.
pub type BuildInfoFn = unsafe extern "C" fn() -> BuildInfo;

/// Signature of the exported module accessor.
///
/// Returns a `Box<ModuleHandle>` leaked with `Box::into_raw`; ownership moves
/// to the host.
pub type GetModuleFn = unsafe extern "C" fn() -> *mut ModuleHandle;
