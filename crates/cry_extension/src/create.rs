//! Instance creation against the process-wide registry

use std::sync::Arc;

use crate::guid::CryClassId;
use crate::interface::CryInterface;
use crate::registry::CryFactoryRegistry;
use crate::unknown::{CryUnknown, CryUnknownPtr};

/// Create an instance of the class registered under `name`
pub fn cry_create_class_instance(name: &str) -> Option<CryUnknownPtr> {
    CryFactoryRegistry::global().create_class_instance(name)
}

/// Create an instance of the class registered under `class_id`
pub fn cry_create_class_instance_by_id(class_id: CryClassId) -> Option<CryUnknownPtr> {
    CryFactoryRegistry::global().create_class_instance_by_id(class_id)
}

/// Create an instance by name, viewed as interface `I`
pub fn cry_create_class_instance_as<I: CryInterface + ?Sized>(name: &str) -> Option<Arc<I>> {
    CryFactoryRegistry::global().create_class_instance_as::<I>(name)
}

/// Create the single registered implementation of interface `I`
pub fn cry_create_class_instance_for_interface<I: CryInterface + ?Sized>() -> Option<Arc<I>> {
    CryFactoryRegistry::global().create_class_instance_for_interface::<I>()
}

/// Create a new instance of the same class as `instance`, through its factory
pub fn cry_recreate<U: CryUnknown + ?Sized>(instance: &U) -> CryUnknownPtr {
    instance.factory().create_class_instance()
}
