//! Interface casts between views of the same object
//!
//! All casts dispatch through the object's [`InterfaceMap`], so they work
//! from any entry view (concrete type, `dyn CryUnknown`, or any interface
//! trait object) and always land on the same underlying instance.
//!
//! Shared views only produce shared views:
//!
//! ```compile_fail
//! use cry_extension::{interface_cast_mut, CryUnknown};
//!
//! fn promote(view: &dyn CryUnknown) {
//!     let _ = interface_cast_mut::<dyn CryUnknown, _>(view);
//! }
//! ```
//!
//! [`InterfaceMap`]: crate::InterfaceMap

use std::any::Any;
use std::sync::Arc;

use crate::guid::CryInterfaceId;
use crate::interface::CryInterface;
use crate::unknown::{AsAny, CryUnknown, CryUnknownPtr};

/// View `obj` as interface `I`, or `None` if unsupported
pub fn interface_cast<'a, I, U>(obj: &'a U) -> Option<&'a I>
where
    I: CryInterface + ?Sized,
    U: CryUnknown + ?Sized,
{
    let casters = obj.interface_map().casters::<I>()?;
    (casters.by_ref)(obj.as_any())
}

/// Exclusive view of `obj` as interface `I`, or `None` if unsupported
pub fn interface_cast_mut<'a, I, U>(obj: &'a mut U) -> Option<&'a mut I>
where
    I: CryInterface + ?Sized,
    U: CryUnknown + ?Sized,
{
    let casters = obj.interface_map().casters::<I>()?;
    (casters.by_mut)(obj.as_any_mut())
}

/// Shared-ownership view of `obj` as interface `I`, or `None` if unsupported
pub fn interface_cast_arc<I, U>(obj: &Arc<U>) -> Option<Arc<I>>
where
    I: CryInterface + ?Sized,
    U: CryUnknown + ?Sized,
{
    let casters = obj.interface_map().casters::<I>()?;
    (casters.by_arc)(<U as AsAny>::into_any(Arc::clone(obj)))
}

/// Check if `obj` supports the interface with id `iid`
pub fn supports_interface<U: CryUnknown + ?Sized>(obj: &U, iid: CryInterfaceId) -> bool {
    obj.query_interface(iid).is_some()
}

/// Check if two views resolve to the same underlying instance
///
/// Identity is the address together with the concrete type, so a part stored
/// at offset zero of its owner is not mistaken for the owner.
pub fn is_same_class_instance<A, B>(a: &A, b: &B) -> bool
where
    A: CryUnknown + ?Sized,
    B: CryUnknown + ?Sized,
{
    let (a, b) = (a.as_any(), b.as_any());
    std::ptr::addr_eq(a as *const dyn Any, b as *const dyn Any) && a.type_id() == b.type_id()
}

/// Named sub-object of an aggregate
pub fn composite_query<U: CryUnknown + ?Sized>(obj: &U, name: &str) -> Option<CryUnknownPtr> {
    obj.query_composite(name)
}

/// Named sub-object of an aggregate, viewed as interface `I`
pub fn composite_query_as<I, U>(obj: &U, name: &str) -> Option<Arc<I>>
where
    I: CryInterface + ?Sized,
    U: CryUnknown + ?Sized,
{
    interface_cast_arc::<I, dyn CryUnknown>(&obj.query_composite(name)?)
}
