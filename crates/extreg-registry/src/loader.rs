//! Dynamic module loader.
//!
//! Opening a library and looking up its accessors is behind the
//! [`LibraryOpener`] seam; the `libloading` implementation is feature-gated.
//! The loader itself validates the build information and hands back a
//! descriptor ready for registration. No module code runs before both
//! version fields have been checked.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use extreg_core::config::extensions::ExtensionConfig;
use extreg_core::error::RegistryError;
use extreg_core::result::RegistryResult;

use crate::descriptor::{Module, ModuleDescriptor};
use crate::ffi::abi::BuildInfo;

/// An opened module library whose accessors have been located.
pub trait ModuleLibrary: Send {
    /// Reads the build information the module was compiled with.
    fn build_info(&self) -> BuildInfo;

    /// Obtains the module. Only called once the build info is accepted.
    fn into_module(self: Box<Self>) -> RegistryResult<Box<dyn Module>>;
}

/// Opens module files.
///
/// Fails with a load error when the file cannot be opened or linked, or
/// when either accessor is missing.
pub trait LibraryOpener: Send + std::fmt::Debug {
    /// Opens the library at `path`.
    fn open(&mut self, path: &Path) -> RegistryResult<Box<dyn ModuleLibrary>>;
}

/// Loads module files and validates them against the host ABI.
#[derive(Debug)]
pub struct DynamicLoader {
    /// Library opener.
    opener: Box<dyn LibraryOpener>,
    /// Build information modules must match.
    expected: BuildInfo,
    /// Paths loaded so far.
    loaded: BTreeSet<PathBuf>,
}

impl DynamicLoader {
    /// Creates a loader using the given opener.
    pub fn new(opener: Box<dyn LibraryOpener>) -> Self {
        Self {
            opener,
            expected: BuildInfo::host(),
            loaded: BTreeSet::new(),
        }
    }

    /// Creates a loader backed by the platform dynamic linker.
    pub fn native() -> Self {
        Self::new(Box::new(native::NativeOpener::default()))
    }

    /// Loads one module file and returns its descriptor with the origin set.
    pub fn load(&mut self, path: &Path) -> RegistryResult<ModuleDescriptor> {
        let library = self.opener.open(path)?;
        check_build_info(path, &library.build_info(), &self.expected)?;

        let module = library.into_module()?;
        info!(
            path = %path.display(),
            module = %module.name(),
            version = %module.version(),
            "Dynamic module loaded"
        );

        self.loaded.insert(path.to_path_buf());
        Ok(ModuleDescriptor::new(module).with_origin(path))
    }

    /// Paths loaded so far.
    pub fn loaded_paths(&self) -> &BTreeSet<PathBuf> {
        &self.loaded
    }

    /// Whether `path` was already loaded.
    pub fn has_loaded(&self, path: &Path) -> bool {
        self.loaded.contains(path)
    }
}

impl Default for DynamicLoader {
    fn default() -> Self {
        Self::native()
    }
}

/// Validates a module's build information against the host's.
fn check_build_info(path: &Path, info: &BuildInfo, expected: &BuildInfo) -> RegistryResult<()> {
    if info.dso_version != expected.dso_version {
        return Err(RegistryError::abi_mismatch(format!(
            "{} was built with an incompatible DSO API. Expected {}, got {}",
            path.display(),
            expected.dso_version,
            info.dso_version
        )));
    }

    if info.major() != expected.major() || info.minor() != expected.minor() {
        return Err(RegistryError::abi_mismatch(format!(
            "{} was built for extreg {}.{}, and cannot be loaded with extreg {}.{}",
            path.display(),
            info.major(),
            info.minor(),
            expected.major(),
            expected.minor()
        )));
    }

    Ok(())
}

/// Collects the effective module paths named by the configuration.
///
/// Entries from `extensions` resolve against `extension_dir` and are skipped
/// when relative with no directory configured; entries from
/// `dynamic_extensions` resolve against `dynamic_extension_path`. Empty
/// entries are ignored. The result is de-duplicated, so a path named by both
/// sources is loaded once.
pub fn collect_module_paths(config: &ExtensionConfig) -> BTreeSet<PathBuf> {
    let mut paths = BTreeSet::new();

    for entry in config.extensions.iter().filter(|e| !e.is_empty()) {
        let path = Path::new(entry);
        if path.is_absolute() {
            paths.insert(path.to_path_buf());
        } else if config.extension_dir.is_empty() {
            debug!(entry = %entry, "Skipping relative module path without extension_dir");
        } else {
            paths.insert(Path::new(&config.extension_dir).join(path));
        }
    }

    for entry in config.dynamic_extensions.iter().filter(|e| !e.is_empty()) {
        let path = Path::new(entry);
        if path.is_absolute() {
            paths.insert(path.to_path_buf());
        } else {
            paths.insert(Path::new(&config.dynamic_extension_path).join(path));
        }
    }

    paths
}

/// Library opener backed by `libloading`.
#[cfg(feature = "dynamic")]
pub mod native {
    use std::path::Path;

    use extreg_core::error::{ErrorKind, RegistryError};
    use extreg_core::result::RegistryResult;

    use super::{LibraryOpener, ModuleLibrary};
    use crate::descriptor::Module;
    use crate::ffi::abi::{BUILD_INFO_SYMBOL, BuildInfo, BuildInfoFn, GET_MODULE_SYMBOL, GetModuleFn};

    /// Opens shared libraries (.so / .dll / .dylib) with the platform linker.
    #[derive(Debug, Default)]
    pub struct NativeOpener;

    impl LibraryOpener for NativeOpener {
        fn open(&mut self, path: &Path) -> RegistryResult<Box<dyn ModuleLibrary>> {
            // SAFETY: loading a module runs its library initializers; only
            // trusted module files may be configured.
            let library = unsafe { libloading::Library::new(path) }.map_err(|e| {
                RegistryError::with_source(
                    ErrorKind::Load,
                    format!("Could not open module {}: {}", path.display(), e),
                    e,
                )
            })?;

            // SAFETY: the symbol types are fixed by the module ABI.
            let build_info: BuildInfoFn = unsafe { library.get::<BuildInfoFn>(BUILD_INFO_SYMBOL) }
                .map(|symbol| *symbol)
                .map_err(|e| missing_symbol(path, "extreg_build_info", e))?;
            let get_module: GetModuleFn = unsafe { library.get::<GetModuleFn>(GET_MODULE_SYMBOL) }
                .map(|symbol| *symbol)
                .map_err(|e| missing_symbol(path, "extreg_get_module", e))?;

            Ok(Box::new(NativeLibrary {
                library,
                build_info,
                get_module,
            }))
        }
    }

    fn missing_symbol(path: &Path, symbol: &str, err: libloading::Error) -> RegistryError {
        RegistryError::with_source(
            ErrorKind::Load,
            format!(
                "Could not load module {}: {}() symbol not defined ({})",
                path.display(),
                symbol,
                err
            ),
            err,
        )
    }

    /// A linked module library and its two accessors.
    struct NativeLibrary {
        library: libloading::Library,
        build_info: BuildInfoFn,
        get_module: GetModuleFn,
    }

    impl ModuleLibrary for NativeLibrary {
        fn build_info(&self) -> BuildInfo {
            // SAFETY: the accessor was resolved from `self.library`, which is
            // still loaded.
            unsafe { (self.build_info)() }
        }

        fn into_module(self: Box<Self>) -> RegistryResult<Box<dyn Module>> {
            // SAFETY: as above; the accessor transfers ownership of a boxed handle.
            let raw = unsafe { (self.get_module)() };
            if raw.is_null() {
                return Err(RegistryError::load("extreg_get_module() returned a null module handle"));
            }

            // Modules are never unloaded: the module's code must stay mapped
            // for as long as the descriptor lives.
            std::mem::forget(self.library);

            // SAFETY: produced by `Box::into_raw` in the module's accessor.
            let handle = unsafe { Box::from_raw(raw) };
            Ok(handle.into_module())
        }
    }
}

/// Stub opener when the `dynamic` feature is disabled.
#[cfg(not(feature = "dynamic"))]
pub mod native {
    use std::path::Path;

    use extreg_core::error::RegistryError;
    use extreg_core::result::RegistryResult;

    use super::{LibraryOpener, ModuleLibrary};

    /// Rejects every file: this build cannot load native code.
    #[derive(Debug, Default)]
    pub struct NativeOpener;

    impl LibraryOpener for NativeOpener {
        fn open(&mut self, path: &Path) -> RegistryResult<Box<dyn ModuleLibrary>> {
            Err(RegistryError::load(format!(
                "Could not open module {}: dynamic loading is not supported by this build",
                path.display()
            )))
        }
    }
}
