//! # cry_extension - Extension Factory Registry
//!
//! Runtime object model for engine extensions:
//! - **Factories**: Every instantiable class is described by a static factory
//!   carrying its name, class id and supported interfaces
//! - **Registry**: A process-wide, thread-safe directory of factories with
//!   lookup by name, class id and interface, plus change observers
//! - **Interface casts**: Safe navigation between interface views of one
//!   object, including diamond-shaped interface hierarchies and aggregates
//!
//! ## Declaring a class
//!
//! ```
//! use cry_extension::prelude::*;
//! use cry_extension::{cry_class, cry_interface};
//!
//! pub trait IGreeter: CryUnknown {
//!     fn greet(&self) -> String;
//! }
//! cry_interface!(IGreeter, 0x7A31_0000_0000_0001, 0x0000_0000_0000_0001);
//!
//! #[derive(Default)]
//! struct Greeter;
//!
//! impl IGreeter for Greeter {
//!     fn greet(&self) -> String {
//!         "hello".to_string()
//!     }
//! }
//!
//! cry_class! {
//!     static GREETER_FACTORY: Greeter =
//!         ClassFactory::new("Greeter", CryGuid::new(0x7A31_0000_0000_0002, 1));
//!     interfaces: [IGreeter];
//! }
//!
//! let registry = CryFactoryRegistry::new();
//! registry.register_factory(&GREETER_FACTORY).unwrap();
//!
//! let greeter = registry.create_class_instance_as::<dyn IGreeter>("Greeter").unwrap();
//! assert_eq!(greeter.greet(), "hello");
//! ```

pub mod guid;
pub mod error;
pub mod interface;
pub mod unknown;
pub mod factory;
pub mod cast;
pub mod composite;
pub mod registry;
pub mod create;

pub use guid::*;
pub use error::*;
pub use interface::*;
pub use unknown::*;
pub use factory::*;
pub use cast::*;
pub use composite::*;
pub use registry::*;
pub use create::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::guid::{CryClassId, CryGuid, CryInterfaceId};
    pub use crate::error::{RegistryError, Result};
    pub use crate::interface::{CryInterface, InterfaceMap};
    pub use crate::unknown::{CryClass, CryUnknown, CryUnknownPtr, CRY_UNKNOWN_IID};
    pub use crate::factory::{ClassFactory, CryFactory, FactoryRef};
    pub use crate::cast::{
        composite_query, composite_query_as, interface_cast, interface_cast_arc,
        interface_cast_mut, is_same_class_instance, supports_interface,
    };
    pub use crate::composite::CompositeMap;
    pub use crate::registry::{CallbackRef, CryFactoryRegistry, CryFactoryRegistryCallback};
    pub use crate::create::*;
}
