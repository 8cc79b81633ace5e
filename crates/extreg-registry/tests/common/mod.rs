//! Shared test helpers for registry integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use extreg_core::error::RegistryError;
use extreg_core::result::RegistryResult;
use extreg_registry::ffi::abi::BuildInfo;
use extreg_registry::{LibraryOpener, Module, ModuleLibrary, SystemState};

/// Ordered log of hook invocations, shared by every module in a test.
pub type Journal = Arc<Mutex<Vec<String>>>;

/// Creates an empty journal.
pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

/// Module names recorded for `phase`, in invocation order.
pub fn calls(journal: &Journal, phase: &str) -> Vec<String> {
    let prefix = format!("{phase}:");
    journal
        .lock()
        .unwrap()
        .iter()
        .filter_map(|entry| entry.strip_prefix(&prefix).map(str::to_string))
        .collect()
}

/// Module that records every hook into a journal.
#[derive(Debug)]
pub struct RecordingModule {
    name: String,
    deps: Vec<String>,
    enabled: bool,
    fail_init: bool,
    reject_profile: bool,
    journal: Journal,
    profile: Mutex<Vec<u8>>,
}

impl RecordingModule {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            deps: Vec::new(),
            enabled: true,
            fail_init: false,
            reject_profile: false,
            journal: Arc::clone(journal),
            profile: Mutex::new(Vec::new()),
        }
    }

    pub fn depends_on(mut self, deps: &[&str]) -> Self {
        self.deps = deps.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn rejecting_profile(mut self) -> Self {
        self.reject_profile = true;
        self
    }

    pub fn with_profile(self, bytes: &[u8]) -> Self {
        *self.profile.lock().unwrap() = bytes.to_vec();
        self
    }

    pub fn boxed(self) -> Box<dyn Module> {
        Box::new(self)
    }

    fn record(&self, phase: &str) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{phase}:{}", self.name));
    }
}

impl Module for RecordingModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<String> {
        self.deps.clone()
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn on_load(&self, settings: &serde_json::Value) -> RegistryResult<()> {
        self.record("load");
        if let Some(tag) = settings.get("tag").and_then(|t| t.as_str()) {
            self.record(&format!("setting-{tag}"));
        }
        Ok(())
    }

    fn on_init(&self, system: &SystemState) -> RegistryResult<()> {
        self.record("init");
        self.record(&format!("ready-{}", system.is_initialized()));
        if self.fail_init {
            return Err(RegistryError::hook("init refused"));
        }
        Ok(())
    }

    fn on_cli_init(&self) -> RegistryResult<()> {
        self.record("cli_init");
        Ok(())
    }

    fn on_shutdown(&self) {
        self.record("shutdown");
    }

    fn on_thread_start(&self) {
        self.record("thread_start");
    }

    fn on_thread_stop(&self) {
        self.record("thread_stop");
    }

    fn on_request_start(&self) {
        self.record("request_start");
    }

    fn on_request_stop(&self) {
        self.record("request_stop");
    }

    fn serialize_profile(&self) -> Vec<u8> {
        self.profile.lock().unwrap().clone()
    }

    fn deserialize_profile(&self, payload: Vec<u8>) -> RegistryResult<()> {
        if self.reject_profile {
            return Err(RegistryError::serialization("unsupported profile format"));
        }
        *self.profile.lock().unwrap() = payload;
        Ok(())
    }
}

type ModuleFactory = Arc<dyn Fn() -> Box<dyn Module> + Send + Sync>;

/// What a fake library file exports.
#[derive(Clone)]
pub struct FakeLibrary {
    pub build_info: BuildInfo,
    pub exports_build_info: bool,
    pub factory: Option<ModuleFactory>,
}

impl FakeLibrary {
    /// A well-formed library exporting `factory`'s module.
    pub fn exporting(factory: impl Fn() -> Box<dyn Module> + Send + Sync + 'static) -> Self {
        Self {
            build_info: BuildInfo::host(),
            exports_build_info: true,
            factory: Some(Arc::new(factory)),
        }
    }

    pub fn with_build_info(mut self, build_info: BuildInfo) -> Self {
        self.build_info = build_info;
        self
    }

    pub fn without_module_accessor(mut self) -> Self {
        self.factory = None;
        self
    }

    pub fn without_build_info_accessor(mut self) -> Self {
        self.exports_build_info = false;
        self
    }
}

/// In-memory library opener keyed by path.
#[derive(Clone, Default)]
pub struct FakeOpener {
    files: HashMap<PathBuf, FakeLibrary>,
    /// Number of times a module accessor ran.
    pub module_calls: Arc<AtomicUsize>,
    /// Paths passed to `open`, in order.
    pub opened: Arc<Mutex<Vec<PathBuf>>>,
}

impl std::fmt::Debug for FakeOpener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeOpener")
            .field("files", &self.files.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FakeOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, library: FakeLibrary) -> Self {
        self.files.insert(PathBuf::from(path), library);
        self
    }
}

impl LibraryOpener for FakeOpener {
    fn open(&mut self, path: &Path) -> RegistryResult<Box<dyn ModuleLibrary>> {
        self.opened.lock().unwrap().push(path.to_path_buf());

        let library = self.files.get(path).cloned().ok_or_else(|| {
            RegistryError::load(format!(
                "Could not open module {}: cannot open shared object file: No such file or directory",
                path.display()
            ))
        })?;

        if !library.exports_build_info {
            return Err(RegistryError::load(format!(
                "Could not load module {}: extreg_build_info() symbol not defined (undefined symbol)",
                path.display()
            )));
        }

        let factory = library.factory.clone().ok_or_else(|| {
            RegistryError::load(format!(
                "Could not load module {}: extreg_get_module() symbol not defined (undefined symbol)",
                path.display()
            ))
        })?;

        Ok(Box::new(FakeHandle {
            build_info: library.build_info,
            factory,
            module_calls: Arc::clone(&self.module_calls),
        }))
    }
}

struct FakeHandle {
    build_info: BuildInfo,
    factory: ModuleFactory,
    module_calls: Arc<AtomicUsize>,
}

impl ModuleLibrary for FakeHandle {
    fn build_info(&self) -> BuildInfo {
        self.build_info
    }

    fn into_module(self: Box<Self>) -> RegistryResult<Box<dyn Module>> {
        self.module_calls.fetch_add(1, Ordering::SeqCst);
        Ok((self.factory)())
    }
}
