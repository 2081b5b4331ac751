//! Extension modules - units of classes loaded and unloaded together
//!
//! A module stands in for a dynamically loaded library: loading it hands its
//! factory list to the registry, unloading it takes them back out. The loader
//! is the boundary where a registry identity collision stops being a value
//! and becomes process termination.

use std::collections::BTreeMap;
use std::fmt;

use cry_extension::{CryFactoryRegistry, FactoryRef, RegistryError};
use parking_lot::RwLock;

use crate::error::{SystemError, SystemResult};

/// A named batch of factories
#[derive(Clone)]
pub struct ExtensionModule {
    name: String,
    factories: Vec<FactoryRef>,
}

impl ExtensionModule {
    /// Create an empty module
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            factories: Vec::new(),
        }
    }

    /// Add a factory
    pub fn with_factory(mut self, factory: FactoryRef) -> Self {
        self.factories.push(factory);
        self
    }

    /// Add several factories
    pub fn with_factories(mut self, factories: &[FactoryRef]) -> Self {
        self.factories.extend_from_slice(factories);
        self
    }

    /// Module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Factories in declaration order
    pub fn factories(&self) -> &[FactoryRef] {
        &self.factories
    }
}

impl fmt::Debug for ExtensionModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionModule")
            .field("name", &self.name)
            .field(
                "factories",
                &self.factories.iter().map(|f| f.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Modules available to load, keyed by name
#[derive(Debug, Default, Clone)]
pub struct ModuleCatalog {
    modules: BTreeMap<String, ExtensionModule>,
}

impl ModuleCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module, returning the one it replaced
    pub fn add(&mut self, module: ExtensionModule) -> Option<ExtensionModule> {
        self.modules.insert(module.name.clone(), module)
    }

    /// Builder form of [`add`](Self::add)
    pub fn with(mut self, module: ExtensionModule) -> Self {
        self.add(module);
        self
    }

    /// Find a module by name
    pub fn get(&self, name: &str) -> Option<&ExtensionModule> {
        self.modules.get(name)
    }

    /// Check if a module is available
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Module names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Number of modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Load state of one module
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleStatus {
    /// Not loaded (never loaded, or unloaded)
    Unloaded,
    /// Factories registered
    Loaded,
    /// Registration was rejected
    Failed,
}

/// What the loader does with an identity collision
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Log both factories and abort the process
    #[default]
    Abort,
    /// Log and return the error; for tests and tools
    Report,
}

#[derive(Default)]
struct LoaderState {
    status: BTreeMap<String, ModuleStatus>,
    /// Loaded modules in load order
    loaded: Vec<ExtensionModule>,
}

/// Feeds module factory batches to a registry
pub struct ModuleLoader<'r> {
    registry: &'r CryFactoryRegistry,
    policy: CollisionPolicy,
    state: RwLock<LoaderState>,
}

impl ModuleLoader<'static> {
    /// Loader over the process-wide registry
    pub fn global() -> Self {
        Self::new(CryFactoryRegistry::global())
    }
}

impl<'r> ModuleLoader<'r> {
    /// Create a loader that aborts on identity collisions
    pub fn new(registry: &'r CryFactoryRegistry) -> Self {
        Self::with_policy(registry, CollisionPolicy::Abort)
    }

    /// Create a loader with an explicit collision policy
    pub fn with_policy(registry: &'r CryFactoryRegistry, policy: CollisionPolicy) -> Self {
        Self {
            registry,
            policy,
            state: RwLock::new(LoaderState::default()),
        }
    }

    /// The registry modules are loaded into
    pub fn registry(&self) -> &'r CryFactoryRegistry {
        self.registry
    }

    /// Active collision policy
    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Register a module's factories. Loading a loaded module does nothing.
    pub fn load(&self, module: &ExtensionModule) -> SystemResult<()> {
        let mut state = self.state.write();
        if state.status.get(module.name()) == Some(&ModuleStatus::Loaded) {
            log::debug!("Module '{}' is already loaded", module.name());
            return Ok(());
        }

        match self.registry.register_factories(module.factories()) {
            Ok(()) => {
                state.status.insert(module.name.clone(), ModuleStatus::Loaded);
                state.loaded.push(module.clone());
                log::info!(
                    "Loaded module '{}' ({} classes)",
                    module.name(),
                    module.factories().len()
                );
                Ok(())
            }
            Err(e) => {
                state.status.insert(module.name.clone(), ModuleStatus::Failed);
                Err(self.escalate(module.name(), e))
            }
        }
    }

    /// Unregister a module's factories. Returns `false` if it was not loaded.
    pub fn unload(&self, name: &str) -> bool {
        let mut state = self.state.write();
        let Some(pos) = state.loaded.iter().position(|m| m.name() == name) else {
            log::debug!("Module '{}' is not loaded", name);
            return false;
        };

        let module = state.loaded.remove(pos);
        self.registry.unregister_factories(module.factories());
        state.status.insert(module.name, ModuleStatus::Unloaded);
        log::info!("Unloaded module '{}'", name);
        true
    }

    /// Unload everything, most recently loaded first
    pub fn unload_all(&self) {
        let names: Vec<String> = self
            .state
            .read()
            .loaded
            .iter()
            .rev()
            .map(|m| m.name().to_string())
            .collect();
        for name in names {
            self.unload(&name);
        }
    }

    /// Check if a module is loaded
    pub fn is_loaded(&self, name: &str) -> bool {
        self.status(name) == ModuleStatus::Loaded
    }

    /// Load state of a module
    pub fn status(&self, name: &str) -> ModuleStatus {
        self.state
            .read()
            .status
            .get(name)
            .copied()
            .unwrap_or(ModuleStatus::Unloaded)
    }

    /// Loaded module names in load order
    pub fn loaded_modules(&self) -> Vec<String> {
        self.state
            .read()
            .loaded
            .iter()
            .map(|m| m.name().to_string())
            .collect()
    }

    fn escalate(&self, module: &str, error: RegistryError) -> SystemError {
        log::error!("Loading module '{}' failed: {}", module, error);
        if error.is_fatal() && self.policy == CollisionPolicy::Abort {
            log::error!("Class identity collision is unrecoverable; aborting");
            log::logger().flush();
            std::process::abort();
        }
        SystemError::Registry(error)
    }
}

impl fmt::Debug for ModuleLoader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("policy", &self.policy)
            .field("loaded", &self.loaded_modules())
            .finish()
    }
}
