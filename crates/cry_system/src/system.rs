//! System bootstrap
//!
//! Brings up logging, loads the configured modules into the registry and
//! initializes the engine modules they provide.

use std::collections::BTreeMap;
use std::sync::Arc;

use cry_extension::{
    cry_interface, interface_cast_arc, CryClassId, CryFactoryRegistry, CryInterface, CryUnknown, FactoryRef,
};
use parking_lot::RwLock;

use crate::config::SystemConfig;
use crate::error::{SystemError, SystemResult};
use crate::module::{ModuleCatalog, ModuleLoader};

/// Initialize logging with `level` as the default filter.
///
/// `RUST_LOG` still takes precedence. Later calls are ignored.
pub fn init_logging(level: &str) {
    let result = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .try_init();
    if result.is_ok() {
        log::debug!("Logging initialized at '{}'", level);
    }
}

/// A subsystem shipped as a module and started by the system
pub trait IEngineModule: CryUnknown {
    /// Display name
    fn name(&self) -> &str;

    /// Grouping used in diagnostics
    fn category(&self) -> &str {
        "CryEngine"
    }

    /// Start the subsystem. Returns `false` on failure.
    fn initialize(&self, config: &SystemConfig) -> bool;
}
cry_interface!(IEngineModule, 0xB8C7_1A5E_3F20_4D6B, 0x9A04_6E1D_27C3_58F1);

/// The running system: configuration, loaded modules and started engine modules
pub struct System<'r> {
    config: SystemConfig,
    catalog: ModuleCatalog,
    loader: ModuleLoader<'r>,
    engine_modules: RwLock<BTreeMap<String, Arc<dyn IEngineModule>>>,
}

impl System<'static> {
    /// Initialize against the process-wide registry
    pub fn init_global(config: SystemConfig, catalog: ModuleCatalog) -> SystemResult<Self> {
        Self::init(config, catalog, ModuleLoader::global())
    }
}

impl<'r> System<'r> {
    /// Initialize logging, then load every active module from the config in order
    pub fn init(
        config: SystemConfig,
        catalog: ModuleCatalog,
        loader: ModuleLoader<'r>,
    ) -> SystemResult<Self> {
        config.validate()?;
        init_logging(&config.system.log_level);

        let system = Self {
            config,
            catalog,
            loader,
            engine_modules: RwLock::new(BTreeMap::new()),
        };

        let entries: Vec<_> = system.config.active_modules().cloned().collect();
        for entry in &entries {
            match (&entry.engine_class, entry.engine_class_id) {
                (Some(class), _) => system.load_engine_module(&entry.name, class)?,
                (None, Some(class_id)) => system.load_engine_module_by_id(&entry.name, class_id)?,
                (None, None) => system.load_module(&entry.name)?,
            }
        }
        if system.config.system.minimal {
            log::info!("Minimal system: optional modules skipped");
        }

        log::info!(
            "System initialized: {} modules, {} classes",
            system.loader.loaded_modules().len(),
            system.registry().len()
        );
        Ok(system)
    }

    /// Load a module from the catalog
    pub fn load_module(&self, name: &str) -> SystemResult<()> {
        let module = self
            .catalog
            .get(name)
            .ok_or_else(|| SystemError::UnknownModule(name.to_string()))?;
        self.loader.load(module)
    }

    /// Load a module, create its engine module class and initialize it
    pub fn load_engine_module(&self, module: &str, class_name: &str) -> SystemResult<()> {
        self.load_module(module)?;

        let factory = self.registry().get_factory(class_name).ok_or_else(|| {
            SystemError::EngineClassNotFound {
                module: module.to_string(),
                class: class_name.to_string(),
            }
        })?;
        self.start_engine_module(module, factory)
    }

    /// Same as [`load_engine_module`](Self::load_engine_module), with the class picked by id.
    ///
    /// The started module is keyed by its factory's class name.
    pub fn load_engine_module_by_id(&self, module: &str, class_id: CryClassId) -> SystemResult<()> {
        self.load_module(module)?;

        let factory = self.registry().get_factory_by_id(class_id).ok_or_else(|| {
            SystemError::EngineClassNotFound {
                module: module.to_string(),
                class: class_id.to_string(),
            }
        })?;
        self.start_engine_module(module, factory)
    }

    fn start_engine_module(&self, module: &str, factory: FactoryRef) -> SystemResult<()> {
        let class_name = factory.name();
        let instance = factory.create_class_instance();
        let engine = interface_cast_arc::<dyn IEngineModule, dyn CryUnknown>(&instance).ok_or_else(|| {
            SystemError::EngineClassNotFound {
                module: module.to_string(),
                class: class_name.to_string(),
            }
        })?;

        if !engine.initialize(&self.config) {
            log::error!("Initializing {} failed", module);
            return Err(SystemError::EngineModuleInitFailed {
                module: module.to_string(),
                class: class_name.to_string(),
            });
        }

        log::info!("Initializing {} done ({})", module, engine.name());
        self.engine_modules
            .write()
            .insert(class_name.to_string(), engine);
        Ok(())
    }

    /// Drop the engine module instance, remove its factory, then unload the module.
    ///
    /// Returns whether the module itself was unloaded.
    pub fn unload_engine_module(&self, module: &str, class_name: &str) -> bool {
        self.engine_modules.write().remove(class_name);

        let registry = self.registry();
        if let Some(factory) = registry.get_factory(class_name) {
            registry.unregister_factory(factory);
        }

        log::info!("Unloading {}...", module);
        self.loader.unload(module)
    }

    /// A started engine module by class name
    pub fn engine_module(&self, class_name: &str) -> Option<Arc<dyn IEngineModule>> {
        self.engine_modules.read().get(class_name).cloned()
    }

    /// Class names of the started engine modules
    pub fn engine_module_names(&self) -> Vec<String> {
        self.engine_modules.read().keys().cloned().collect()
    }

    /// The single registered implementation of `I`, if exactly one exists
    pub fn create_for_interface<I: CryInterface + ?Sized>(&self) -> Option<Arc<I>> {
        self.registry().create_class_instance_for_interface::<I>()
    }

    /// Release engine modules and unload all modules
    pub fn shutdown(&self) {
        self.engine_modules.write().clear();
        self.loader.unload_all();
        log::info!("System shut down");
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    pub fn loader(&self) -> &ModuleLoader<'r> {
        &self.loader
    }

    pub fn registry(&self) -> &'r CryFactoryRegistry {
        self.loader.registry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModuleEntry;
    use crate::module::ExtensionModule;

    #[test]
    fn test_init_logging_twice() {
        init_logging("debug");
        init_logging("warn");
        log::info!("still logging");
    }

    #[test]
    fn test_init_empty() {
        let registry = CryFactoryRegistry::new();
        let system = System::init(
            SystemConfig::default(),
            ModuleCatalog::new(),
            ModuleLoader::new(&registry),
        )
        .unwrap();

        assert!(system.loader().loaded_modules().is_empty());
        assert!(system.engine_module_names().is_empty());
    }

    #[test]
    fn test_unknown_module() {
        let registry = CryFactoryRegistry::new();
        let mut config = SystemConfig::default();
        config.modules.push(ModuleEntry::new("Missing"));

        let err = System::init(config, ModuleCatalog::new(), ModuleLoader::new(&registry))
            .err()
            .unwrap();
        assert!(matches!(err, SystemError::UnknownModule(ref name) if name == "Missing"));
    }

    #[test]
    fn test_missing_engine_class() {
        let registry = CryFactoryRegistry::new();
        let mut config = SystemConfig::default();
        config
            .modules
            .push(ModuleEntry::new("Empty").with_engine_class("EngineModule_Empty"));
        let catalog = ModuleCatalog::new().with(ExtensionModule::new("Empty"));

        let err = System::init(config, catalog, ModuleLoader::new(&registry))
            .err()
            .unwrap();
        assert!(matches!(err, SystemError::EngineClassNotFound { .. }));
    }

    #[test]
    fn test_missing_engine_class_id() {
        let registry = CryFactoryRegistry::new();
        let mut config = SystemConfig::default();
        let class_id = CryClassId::new(0xE0, 0x1);
        config
            .modules
            .push(ModuleEntry::new("Empty").with_engine_class_id(class_id));
        let catalog = ModuleCatalog::new().with(ExtensionModule::new("Empty"));

        let err = System::init(config, catalog, ModuleLoader::new(&registry))
            .err()
            .unwrap();
        match err {
            SystemError::EngineClassNotFound { module, class } => {
                assert_eq!(module, "Empty");
                assert_eq!(class, class_id.to_string());
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
