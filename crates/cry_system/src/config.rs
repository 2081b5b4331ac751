//! System configuration - TOML to SystemConfig conversion
//!
//! # Config Format
//!
//! ```toml
//! [system]
//! log_level = "debug"
//! minimal = false
//!
//! [[modules]]
//! name = "CryFont"
//! engine_class = "EngineModule_CryFont"
//!
//! [[modules]]
//! name = "CryPerfHUD"
//! optional = true
//!
//! [[modules]]
//! name = "CryAudio"
//! engine_class_id = "{A3E1C2D4-0000-4000-8000-000000000001}"
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use cry_extension::CryClassId;
use log::LevelFilter;
use serde::Deserialize;

use crate::error::{SystemError, SystemResult};

/// The `[system]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SystemSection {
    /// Default log filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Skip optional modules
    pub minimal: bool,
}

impl Default for SystemSection {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            minimal: false,
        }
    }
}

/// One `[[modules]]` entry, loaded in file order
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModuleEntry {
    /// Module name in the catalog
    pub name: String,
    /// Class to create and initialize as an engine module once loaded
    #[serde(default)]
    pub engine_class: Option<String>,
    /// Engine module class picked by class id instead of by name
    #[serde(default)]
    pub engine_class_id: Option<CryClassId>,
    /// Skipped in minimal mode
    #[serde(default)]
    pub optional: bool,
}

impl ModuleEntry {
    /// A plain module entry
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            engine_class: None,
            engine_class_id: None,
            optional: false,
        }
    }

    /// Set the engine module class
    pub fn with_engine_class(mut self, class: &str) -> Self {
        self.engine_class = Some(class.to_string());
        self
    }

    /// Set the engine module class by id
    pub fn with_engine_class_id(mut self, class_id: CryClassId) -> Self {
        self.engine_class_id = Some(class_id);
        self
    }

    /// Mark as optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub system: SystemSection,
    pub modules: Vec<ModuleEntry>,
}

impl SystemConfig {
    /// Parsed log level
    pub fn level_filter(&self) -> SystemResult<LevelFilter> {
        self.system
            .log_level
            .parse()
            .map_err(|_| SystemError::Validation(format!("unknown log level '{}'", self.system.log_level)))
    }

    /// Check the config for values serde cannot reject on its own
    pub fn validate(&self) -> SystemResult<()> {
        self.level_filter()?;

        let mut seen = BTreeSet::new();
        for entry in &self.modules {
            if entry.name.is_empty() {
                return Err(SystemError::Validation("module with empty name".to_string()));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(SystemError::Validation(format!(
                    "module '{}' listed twice",
                    entry.name
                )));
            }
            if entry.engine_class.as_deref() == Some("") {
                return Err(SystemError::Validation(format!(
                    "module '{}' has an empty engine_class",
                    entry.name
                )));
            }
            if entry.engine_class.is_some() && entry.engine_class_id.is_some() {
                return Err(SystemError::Validation(format!(
                    "module '{}' sets both engine_class and engine_class_id",
                    entry.name
                )));
            }
            if entry.engine_class_id.is_some_and(|id| id.is_null()) {
                return Err(SystemError::Validation(format!(
                    "module '{}' has a null engine_class_id",
                    entry.name
                )));
            }
        }
        Ok(())
    }

    /// Modules to load, honoring minimal mode
    pub fn active_modules(&self) -> impl Iterator<Item = &ModuleEntry> {
        let minimal = self.system.minimal;
        self.modules.iter().filter(move |m| !(minimal && m.optional))
    }
}

/// Parse a config from TOML string
pub fn parse_config(content: &str) -> SystemResult<SystemConfig> {
    let config: SystemConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load and parse a config from a file
pub fn load_config(path: impl AsRef<Path>) -> SystemResult<SystemConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}
