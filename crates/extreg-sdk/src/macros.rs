//! Export macros for native modules.

/// Exports the two accessors the host looks up in a module library.
///
/// `extreg_build_info` reports the ABI the module was compiled against;
/// `extreg_get_module` constructs the module from `$ctor` and hands it to
/// the host. The host only calls the second accessor after the first one
/// matched its own versions.
///
/// # Example
/// ```rust,ignore
/// extreg_sdk::declare_module!(RequestCounter::new());
/// ```
#[macro_export]
macro_rules! declare_module {
    ($ctor:expr) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn extreg_build_info() -> $crate::abi::BuildInfo {
            $crate::abi::BuildInfo::host()
        }

        #[unsafe(no_mangle)]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn extreg_get_module() -> *mut $crate::abi::ModuleHandle {
            let module: ::std::boxed::Box<dyn $crate::prelude::Module> =
                ::std::boxed::Box::new($ctor);
            ::std::boxed::Box::into_raw(::std::boxed::Box::new(
                $crate::abi::ModuleHandle::new(module),
            ))
        }
    };
}

/// Reads a typed setting from a module's settings object, falling back to
/// `$default` when the key is missing or has the wrong type.
///
/// # Example
/// ```rust,ignore
/// let start = setting!(settings, "start", as_u64, 0);
/// ```
#[macro_export]
macro_rules! setting {
    ($settings:expr, $key:expr, $as:ident, $default:expr) => {
        $settings
            .get($key)
            .and_then(|value| value.$as())
            .unwrap_or($default)
    };
}
