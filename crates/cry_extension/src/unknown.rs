//! The base capability every registry-managed instance implements

use std::any::Any;
use std::sync::Arc;

use crate::factory::FactoryRef;
use crate::guid::{CryGuid, CryInterfaceId};
use crate::interface::{CryInterface, InterfaceMap};

/// Interface id of [`CryUnknown`]
pub const CRY_UNKNOWN_IID: CryInterfaceId = CryGuid::new(0x1000_0000_1000_1000, 0x1000_1000_0000_0000);

/// Shared reference to any instance
pub type CryUnknownPtr = Arc<dyn CryUnknown>;

/// Erasure helpers reachable through any interface view
pub trait AsAny: Any + Send + Sync {
    /// Get as Any reference (for downcasting)
    fn as_any(&self) -> &dyn Any;

    /// Get as mutable Any reference (for downcasting)
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Convert a shared reference into an erased one
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// The universal base capability
///
/// Every interface trait extends this one, so any interface view can be
/// queried for any other interface of the same object.
pub trait CryUnknown: AsAny + 'static {
    /// The factory that created this instance
    fn factory(&self) -> FactoryRef;

    /// The interfaces this instance supports
    fn interface_map(&self) -> &'static InterfaceMap;

    /// A named sub-object, for aggregates
    fn query_composite(&self, name: &str) -> Option<CryUnknownPtr> {
        let _ = name;
        None
    }

    /// Untyped view of this instance if it supports `iid`
    fn query_interface(&self, iid: CryInterfaceId) -> Option<&dyn Any> {
        if self.interface_map().contains(iid) {
            Some(self.as_any())
        } else {
            None
        }
    }
}

impl CryInterface for dyn CryUnknown {
    const IID: CryInterfaceId = CRY_UNKNOWN_IID;
    const NAME: &'static str = "ICryUnknown";
}

/// Static side of a concrete class: its interface table and factory
///
/// Implemented by [`cry_class!`](crate::cry_class).
pub trait CryClass: CryUnknown + Default {
    /// Interface table shared by all instances
    fn class_interface_map() -> &'static InterfaceMap;

    /// The factory declared for the class
    fn class_factory() -> FactoryRef;
}

/// Declare a concrete class: its static factory and the interfaces it implements
///
/// The type must implement `Default` (used by the factory) and every listed
/// interface trait. An optional `composite:` names a
/// [`CompositeMap`](crate::CompositeMap) field that answers composite queries.
///
/// ```ignore
/// #[derive(Default)]
/// struct Foobar;
/// impl IFoobar for Foobar { fn foo(&self) -> i32 { 42 } }
///
/// cry_class! {
///     pub static FOOBAR_FACTORY: Foobar = ClassFactory::new("Foobar", CryGuid::new(1, 1));
///     interfaces: [IFoobar];
/// }
/// ```
#[macro_export]
macro_rules! cry_class {
    (
        $vis:vis static $factory:ident : $ty:ty = $ctor:expr;
        interfaces: [$($iface:ident),* $(,)?];
        $(composite: $field:ident;)?
    ) => {
        $vis static $factory: $crate::ClassFactory<$ty> = $ctor;

        $(
            impl $crate::CastTo<dyn $iface + 'static> for $ty {
                fn cast_ref(&self) -> &(dyn $iface + 'static) {
                    self
                }

                fn cast_mut(&mut self) -> &mut (dyn $iface + 'static) {
                    self
                }

                fn cast_arc(
                    self: ::std::sync::Arc<Self>,
                ) -> ::std::sync::Arc<dyn $iface + 'static> {
                    self
                }
            }
        )*

        impl $crate::CryClass for $ty {
            fn class_interface_map() -> &'static $crate::InterfaceMap {
                static MAP: ::std::sync::OnceLock<$crate::InterfaceMap> =
                    ::std::sync::OnceLock::new();
                MAP.get_or_init(|| {
                    $crate::InterfaceMap::builder::<$ty>()
                        $(.with::<dyn $iface + 'static>())*
                        .build()
                })
            }

            fn class_factory() -> $crate::FactoryRef {
                &$factory
            }
        }

        impl $crate::CryUnknown for $ty {
            fn factory(&self) -> $crate::FactoryRef {
                <$ty as $crate::CryClass>::class_factory()
            }

            fn interface_map(&self) -> &'static $crate::InterfaceMap {
                <$ty as $crate::CryClass>::class_interface_map()
            }

            $(
                fn query_composite(&self, name: &str) -> ::core::option::Option<$crate::CryUnknownPtr> {
                    self.$field.query(name)
                }
            )?
        }
    };
}
