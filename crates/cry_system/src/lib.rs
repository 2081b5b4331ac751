//! # cry_system - System Bootstrap
//!
//! The boundary around the extension registry:
//! - **Modules**: Named factory batches loaded into and unloaded from the registry
//! - **Engine modules**: Classes created by name and initialized at startup
//! - **Configuration**: TOML system config listing the modules to load
//! - **Logging**: `env_logger` setup behind the `log` facade
//!
//! Identity collisions reported by the registry abort the process here,
//! unless the loader was built with [`CollisionPolicy::Report`].

pub mod config;
pub mod error;
pub mod module;
pub mod system;

pub use config::*;
pub use error::*;
pub use module::*;
pub use system::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{load_config, parse_config, ModuleEntry, SystemConfig};
    pub use crate::error::{SystemError, SystemResult};
    pub use crate::module::{CollisionPolicy, ExtensionModule, ModuleCatalog, ModuleLoader, ModuleStatus};
    pub use crate::system::{init_logging, IEngineModule, System};
}
