//! Interface declarations and per-class interface tables
//!
//! Every interface is a trait extending [`CryUnknown`]. Its identity is
//! attached to the trait object type with [`CryInterface`] (see
//! [`cry_interface!`](crate::cry_interface)). A class lists the interfaces it
//! implements, and that list becomes an [`InterfaceMap`]: a sorted table
//! from interface id to type-erased casters, which is what the generic cast
//! functions dispatch through.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::guid::CryInterfaceId;
use crate::unknown::CryUnknown;

/// Identity of an interface, implemented for `dyn Trait`
pub trait CryInterface: 'static {
    /// The interface id
    const IID: CryInterfaceId;
    /// Human-readable interface name
    const NAME: &'static str;
}

/// Coercion of a concrete class to one of its interface views
///
/// Implemented by [`cry_class!`](crate::cry_class) for every listed
/// interface; the blanket impl covers the base capability.
pub trait CastTo<I: ?Sized + 'static> {
    /// Shared view
    fn cast_ref(&self) -> &I;
    /// Exclusive view
    fn cast_mut(&mut self) -> &mut I;
    /// Shared-ownership view
    fn cast_arc(self: Arc<Self>) -> Arc<I>;
}

impl<T: CryUnknown> CastTo<dyn CryUnknown> for T {
    fn cast_ref(&self) -> &(dyn CryUnknown + 'static) {
        self
    }

    fn cast_mut(&mut self) -> &mut (dyn CryUnknown + 'static) {
        self
    }

    fn cast_arc(self: Arc<Self>) -> Arc<dyn CryUnknown> {
        self
    }
}

type RefCaster<I> = for<'a> fn(&'a (dyn Any + 'static)) -> Option<&'a I>;
type MutCaster<I> = for<'a> fn(&'a mut (dyn Any + 'static)) -> Option<&'a mut I>;
type ArcCaster<I> = fn(Arc<dyn Any + Send + Sync>) -> Option<Arc<I>>;

/// Casters from an erased object to interface `I`
pub struct Casters<I: ?Sized + 'static> {
    pub(crate) by_ref: RefCaster<I>,
    pub(crate) by_mut: MutCaster<I>,
    pub(crate) by_arc: ArcCaster<I>,
}

impl<I: ?Sized + 'static> Casters<I> {
    fn of<T>() -> Self
    where
        T: CastTo<I> + Any + Send + Sync,
    {
        Self {
            by_ref: erased_ref::<T, I>,
            by_mut: erased_mut::<T, I>,
            by_arc: erased_arc::<T, I>,
        }
    }
}

fn erased_ref<T, I>(any: &dyn Any) -> Option<&I>
where
    T: CastTo<I> + Any,
    I: ?Sized + 'static,
{
    any.downcast_ref::<T>().map(<T as CastTo<I>>::cast_ref)
}

fn erased_mut<T, I>(any: &mut dyn Any) -> Option<&mut I>
where
    T: CastTo<I> + Any,
    I: ?Sized + 'static,
{
    any.downcast_mut::<T>().map(<T as CastTo<I>>::cast_mut)
}

fn erased_arc<T, I>(any: Arc<dyn Any + Send + Sync>) -> Option<Arc<I>>
where
    T: CastTo<I> + Any + Send + Sync,
    I: ?Sized + 'static,
{
    any.downcast::<T>().ok().map(<T as CastTo<I>>::cast_arc)
}

/// One row of an interface table
struct InterfaceEntry {
    iid: CryInterfaceId,
    name: &'static str,
    /// Holds a `Casters<I>` for the interface this row describes
    casters: Box<dyn Any + Send + Sync>,
}

/// Sorted table of the interfaces one class supports
pub struct InterfaceMap {
    /// Sorted, parallel to `entries`
    ids: Vec<CryInterfaceId>,
    entries: Vec<InterfaceEntry>,
}

impl InterfaceMap {
    /// Start a table for class `T`. The base capability is always included.
    pub fn builder<T: CryUnknown>() -> InterfaceMapBuilder<T> {
        InterfaceMapBuilder {
            entries: Vec::new(),
            _marker: PhantomData,
        }
        .with::<dyn CryUnknown>()
    }

    /// Check if the interface is supported
    pub fn contains(&self, iid: CryInterfaceId) -> bool {
        self.ids.binary_search(&iid).is_ok()
    }

    /// Supported interface ids, sorted ascending
    pub fn ids(&self) -> &[CryInterfaceId] {
        &self.ids
    }

    /// Names of the supported interfaces, in id order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.name)
    }

    /// Number of supported interfaces
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if empty (never true for a built table)
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Casters for interface `I`, if the class supports it
    pub fn casters<I: CryInterface + ?Sized>(&self) -> Option<&Casters<I>> {
        let index = self.ids.binary_search(&I::IID).ok()?;
        self.entries[index].casters.downcast_ref::<Casters<I>>()
    }
}

impl fmt::Debug for InterfaceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|e| (e.name, e.iid)))
            .finish()
    }
}

/// Builder for an [`InterfaceMap`]
pub struct InterfaceMapBuilder<T> {
    entries: Vec<InterfaceEntry>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: CryUnknown> InterfaceMapBuilder<T> {
    /// Add interface `I`
    pub fn with<I>(mut self) -> Self
    where
        I: CryInterface + ?Sized,
        T: CastTo<I>,
    {
        self.entries.push(InterfaceEntry {
            iid: I::IID,
            name: I::NAME,
            casters: Box::new(Casters::<I>::of::<T>()),
        });
        self
    }

    /// Finish the table
    pub fn build(mut self) -> InterfaceMap {
        self.entries.sort_by_key(|e| e.iid);
        self.entries.dedup_by(|later, earlier| {
            let duplicate = later.iid == earlier.iid;
            if duplicate {
                log::warn!(
                    "Interfaces '{}' and '{}' share id {}; keeping '{}'",
                    earlier.name,
                    later.name,
                    later.iid,
                    earlier.name
                );
            }
            duplicate
        });

        InterfaceMap {
            ids: self.entries.iter().map(|e| e.iid).collect(),
            entries: self.entries,
        }
    }
}

/// Declare the identity of an interface trait
///
/// ```ignore
/// pub trait IFoobar: CryUnknown {
///     fn foo(&self) -> i32;
/// }
/// cry_interface!(IFoobar, 0x2C5B_4D3E_8A77_4F12, 0x9E01_0C3B_55D2_7A10);
/// ```
#[macro_export]
macro_rules! cry_interface {
    ($iface:ident, $hi:expr, $lo:expr $(,)?) => {
        impl $crate::CryInterface for dyn $iface {
            const IID: $crate::CryInterfaceId = $crate::CryGuid::new($hi, $lo);
            const NAME: &'static str = stringify!($iface);
        }
    };
}
