//! Lifecycle orchestrator: drives every registered module through the load,
//! init, shutdown, thread and request phases in dependency order.
//!
//! Forward phases (load, init, thread start, request start) run in resolved
//! order; their counterparts (shutdown, thread stop, request stop) run in
//! reverse. Registration, resolution and the load/init/shutdown phases run on
//! a single coordinating thread. Thread and request phases run on worker
//! threads through [`WorkerPhases`].

use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use extreg_core::config::extensions::{ExtensionConfig, TieBreak};
use extreg_core::error::{ErrorKind, RegistryError};
use extreg_core::result::RegistryResult;

use crate::catalog::Catalog;
use crate::descriptor::{Module, ModuleDescriptor};
use crate::loader::{DynamicLoader, collect_module_paths};
use crate::persistence;
use crate::resolver;
use crate::system::SystemState;

/// Registry state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    /// No valid resolved order exists.
    Unsorted,
    /// A resolved order exists; modules are not yet initialized.
    Sorted,
    /// Modules have run their init (or CLI init) hooks.
    Initialized,
}

/// The module registry context.
///
/// Owns the catalog, the resolved order and the state flags. Construct one
/// per process and drive it from the coordinating thread.
#[derive(Debug)]
pub struct Registry {
    /// Registered modules.
    catalog: Catalog,
    /// Resolved order; empty unless sorted.
    ordered: Arc<[Arc<ModuleDescriptor>]>,
    /// Current state.
    state: RegistryState,
    /// Ordering policy among simultaneously resolvable modules.
    tie_break: TieBreak,
    /// Runtime-wide initialization marker.
    system: Arc<SystemState>,
    /// Native module loader.
    loader: DynamicLoader,
}

impl Registry {
    /// Creates an empty registry using the native loader.
    pub fn new(system: Arc<SystemState>) -> Self {
        Self {
            catalog: Catalog::new(),
            ordered: Arc::from(Vec::new()),
            state: RegistryState::Unsorted,
            tie_break: TieBreak::default(),
            system,
            loader: DynamicLoader::native(),
        }
    }

    /// Replaces the module loader.
    pub fn with_loader(mut self, loader: DynamicLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Sets the resolver tie-break policy.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Current state.
    pub fn state(&self) -> RegistryState {
        self.state
    }

    /// Whether modules have been initialized.
    pub fn is_initialized(&self) -> bool {
        self.state == RegistryState::Initialized
    }

    /// Runtime-wide initialization marker.
    pub fn system(&self) -> &Arc<SystemState> {
        &self.system
    }

    /// The module catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The module loader.
    pub fn loader(&self) -> &DynamicLoader {
        &self.loader
    }

    // ── Registration ────────────────────────────────────────────

    /// Registers a module. This is the self-registration entrypoint.
    pub fn register(&mut self, module: Box<dyn Module>) -> RegistryResult<()> {
        self.register_descriptor(ModuleDescriptor::new(module))
    }

    /// Registers a prepared descriptor.
    ///
    /// A registration after resolution invalidates the order, so the next
    /// phase re-resolves. Registration after init is rejected.
    pub fn register_descriptor(&mut self, descriptor: ModuleDescriptor) -> RegistryResult<()> {
        if self.state == RegistryState::Initialized {
            return Err(RegistryError::invalid_state(format!(
                "Cannot register module '{}' after modules were initialized",
                descriptor.name()
            )));
        }

        self.catalog.register(descriptor)?;

        if self.state == RegistryState::Sorted {
            self.ordered = Arc::from(Vec::new());
            self.state = RegistryState::Unsorted;
        }
        Ok(())
    }

    /// Looks up a module by name.
    pub fn lookup(&self, name: &str, enabled_only: bool) -> Option<&Arc<ModuleDescriptor>> {
        self.catalog.lookup(name, enabled_only)
    }

    /// Checks whether a module is registered.
    pub fn is_loaded(&self, name: &str, enabled_only: bool) -> bool {
        self.catalog.contains(name, enabled_only)
    }

    /// Lists module names in registration order.
    pub fn list_names(&self, enabled_only: bool) -> Vec<String> {
        self.catalog.list_names(enabled_only)
    }

    /// Module names in resolved order; empty unless sorted.
    pub fn ordered_names(&self) -> Vec<String> {
        self.ordered.iter().map(|d| d.name().to_string()).collect()
    }

    // ── Loading ─────────────────────────────────────────────────

    /// Loads one native module file and registers the module it exports.
    ///
    /// Returns `false` without touching the file when this path was already
    /// loaded.
    pub fn load_path(&mut self, path: &Path) -> RegistryResult<bool> {
        if self.loader.has_loaded(path) {
            debug!(path = %path.display(), "Module file already loaded, skipping");
            return Ok(false);
        }

        let descriptor = self.loader.load(path)?;
        self.register_descriptor(descriptor)?;
        Ok(true)
    }

    /// Load phase.
    ///
    /// Loads every module file the configuration names that is not loaded
    /// yet, resolves when anything new was loaded or no order exists yet,
    /// then runs every module's load hook in resolved order with its
    /// settings.
    pub fn module_load(&mut self, config: &ExtensionConfig) -> RegistryResult<()> {
        let mut loaded = 0usize;
        for path in &collect_module_paths(config) {
            if self.load_path(path)? {
                loaded += 1;
            }
        }

        if loaded > 0 || self.state == RegistryState::Unsorted {
            self.resolve()?;
        }

        let ordered = Arc::clone(&self.ordered);
        for descriptor in ordered.iter() {
            let settings = config.settings_for(descriptor.name());
            descriptor
                .module()
                .on_load(&settings)
                .map_err(|e| hook_failure(descriptor, "load", e))?;
        }

        info!(modules = ordered.len(), loaded, "Module load phase complete");
        Ok(())
    }

    // ── Resolution ──────────────────────────────────────────────

    /// Resolves the dependency order over the whole catalog.
    ///
    /// On failure the registry is left unsorted.
    pub fn resolve(&mut self) -> RegistryResult<()> {
        match resolver::resolve(&self.catalog, self.tie_break) {
            Ok(order) => {
                self.ordered = Arc::from(order);
                if self.state == RegistryState::Unsorted {
                    self.state = RegistryState::Sorted;
                }
                info!(modules = self.ordered.len(), "Module dependencies resolved");
                Ok(())
            }
            Err(e) => {
                self.ordered = Arc::from(Vec::new());
                self.state = RegistryState::Unsorted;
                Err(e)
            }
        }
    }

    // ── Process phases ──────────────────────────────────────────

    /// Init phase: runs every init hook in resolved order.
    ///
    /// The runtime reads as not fully initialized while hooks run; the
    /// previous value is restored whether or not a hook fails.
    pub fn init(&mut self) -> RegistryResult<()> {
        let ordered = self.require_sorted("init")?;
        {
            let _bootstrap = self.system.enter_bootstrap();
            for descriptor in ordered.iter() {
                descriptor
                    .module()
                    .on_init(&self.system)
                    .map_err(|e| hook_failure(descriptor, "init", e))?;
            }
        }

        self.state = RegistryState::Initialized;
        info!(modules = ordered.len(), "Modules initialized");
        Ok(())
    }

    /// CLI init phase: runs every CLI init hook in resolved order.
    pub fn cli_init(&mut self) -> RegistryResult<()> {
        let ordered = self.require_sorted("cli_init")?;
        for descriptor in ordered.iter() {
            descriptor
                .module()
                .on_cli_init()
                .map_err(|e| hook_failure(descriptor, "cli_init", e))?;
        }

        self.state = RegistryState::Initialized;
        info!(modules = ordered.len(), "Modules initialized for CLI client");
        Ok(())
    }

    /// Shutdown phase: runs every shutdown hook in reverse resolved order,
    /// then clears the catalog and the order and returns to unsorted.
    ///
    /// An unsorted registry is resolved first so modules registered after the
    /// last resolve still shut down. When that resolve fails, hooks run in
    /// reverse registration order instead.
    ///
    /// Worker threads must be stopped and joined before calling this.
    pub fn shutdown(&mut self) {
        let ordered: Vec<Arc<ModuleDescriptor>> = if self.state == RegistryState::Unsorted {
            match resolver::resolve(&self.catalog, self.tie_break) {
                Ok(order) => order,
                Err(e) => {
                    warn!(
                        error = %e,
                        "Shutting down an unresolvable registry in reverse registration order"
                    );
                    self.catalog.iter().cloned().collect()
                }
            }
        } else {
            self.ordered.to_vec()
        };

        for descriptor in ordered.iter().rev() {
            descriptor.module().on_shutdown();
        }

        let modules = self.catalog.len();
        self.catalog.clear();
        self.ordered = Arc::from(Vec::new());
        self.state = RegistryState::Unsorted;
        info!(modules, "Modules shut down");
    }

    // ── Worker phases ───────────────────────────────────────────

    /// Returns the worker-phase runner for the current order.
    pub fn worker(&self) -> RegistryResult<WorkerPhases> {
        let ordered = self.require_sorted("worker phases")?;
        Ok(WorkerPhases { ordered })
    }

    /// Thread start phase for the calling thread.
    ///
    /// Resolves first when no order exists yet, since a worker thread may
    /// start before the load phase has run.
    pub fn thread_start(&mut self) -> RegistryResult<()> {
        if self.state == RegistryState::Unsorted {
            self.resolve()?;
        }
        self.worker()?.thread_start();
        Ok(())
    }

    /// Thread stop phase for the calling thread.
    pub fn thread_stop(&self) -> RegistryResult<()> {
        self.worker()?.thread_stop();
        Ok(())
    }

    /// Request start phase.
    pub fn request_start(&self) -> RegistryResult<()> {
        self.worker()?.request_start();
        Ok(())
    }

    /// Request stop phase.
    pub fn request_stop(&self) -> RegistryResult<()> {
        self.worker()?.request_stop();
        Ok(())
    }

    // ── Profile persistence ─────────────────────────────────────

    /// Writes every module's non-empty profile payload.
    pub fn serialize_profiles<W: Write>(&self, writer: &mut W) -> RegistryResult<usize> {
        persistence::serialize(&self.catalog, writer)
    }

    /// Restores persisted profile payloads into their modules.
    pub fn deserialize_profiles<R: Read>(&self, reader: &mut R) -> RegistryResult<usize> {
        persistence::deserialize(&self.catalog, reader)
    }

    fn require_sorted(&self, phase: &str) -> RegistryResult<Arc<[Arc<ModuleDescriptor>]>> {
        if self.state == RegistryState::Unsorted {
            return Err(RegistryError::invalid_state(format!(
                "Phase '{phase}' requires resolved module dependencies"
            )));
        }
        Ok(Arc::clone(&self.ordered))
    }
}

fn hook_failure(descriptor: &ModuleDescriptor, phase: &str, err: RegistryError) -> RegistryError {
    RegistryError::with_source(
        ErrorKind::Hook,
        format!("Module '{}' failed during {phase}: {}", descriptor.name(), err.message),
        err,
    )
}

/// Runs thread and request phases over a snapshot of the resolved order.
///
/// Cheap to clone and shareable across worker threads. Hooks are invoked
/// without cross-thread synchronization; each module guards its own
/// per-thread state.
#[derive(Debug, Clone)]
pub struct WorkerPhases {
    ordered: Arc<[Arc<ModuleDescriptor>]>,
}

impl WorkerPhases {
    /// Runs every thread start hook in resolved order.
    pub fn thread_start(&self) {
        for descriptor in self.ordered.iter() {
            descriptor.module().on_thread_start();
        }
    }

    /// Runs every thread stop hook in reverse order.
    pub fn thread_stop(&self) {
        for descriptor in self.ordered.iter().rev() {
            descriptor.module().on_thread_stop();
        }
    }

    /// Runs every request start hook in resolved order.
    pub fn request_start(&self) {
        for descriptor in self.ordered.iter() {
            descriptor.module().on_request_start();
        }
    }

    /// Runs every request stop hook in reverse order.
    pub fn request_stop(&self) {
        for descriptor in self.ordered.iter().rev() {
            descriptor.module().on_request_stop();
        }
    }

    /// Number of modules covered.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Whether no modules are covered.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
