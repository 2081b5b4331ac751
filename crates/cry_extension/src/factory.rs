//! Class factories
//!
//! A factory describes one instantiable class: its name, class id, the
//! interfaces it supports, and how to create an instance. Factories live for
//! the whole process (usually as `static` items declared with [`cry_class!`])
//! and are only ever referenced by the registry, never owned by it.
//!
//! [`cry_class!`]: crate::cry_class

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::guid::{CryClassId, CryInterfaceId};
use crate::unknown::{CryClass, CryUnknownPtr};

/// A registered descriptor for one instantiable class
pub trait CryFactory: Send + Sync + 'static {
    /// Unique, case-sensitive class name
    fn name(&self) -> &'static str;

    /// Unique class id
    fn class_id(&self) -> CryClassId;

    /// Interface ids supported by instances, sorted ascending
    fn class_interfaces(&self) -> &[CryInterfaceId];

    /// Check if instances support the given interface
    fn class_supports(&self, iid: CryInterfaceId) -> bool {
        self.class_interfaces().contains(&iid)
    }

    /// Whether every creation returns the same instance
    fn is_singleton(&self) -> bool {
        false
    }

    /// Create (or, for singletons, fetch) an instance
    fn create_class_instance(&self) -> CryUnknownPtr;
}

/// Reference to a process-lifetime factory. Identity is the address.
pub type FactoryRef = &'static dyn CryFactory;

/// Address of a factory, used as its identity
#[inline]
pub fn factory_addr(factory: FactoryRef) -> usize {
    factory as *const dyn CryFactory as *const () as usize
}

/// Check if two references point at the same factory
#[inline]
pub fn same_factory(a: FactoryRef, b: FactoryRef) -> bool {
    std::ptr::addr_eq(a as *const dyn CryFactory, b as *const dyn CryFactory)
}

/// Printable identification of a factory for diagnostics
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactoryInfo {
    pub name: String,
    pub class_id: CryClassId,
    pub address: usize,
}

impl FactoryInfo {
    /// Snapshot a factory's identity
    pub fn of(factory: FactoryRef) -> Self {
        Self {
            name: factory.name().to_string(),
            class_id: factory.class_id(),
            address: factory_addr(factory),
        }
    }
}

impl fmt::Display for FactoryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' {} @{:#x}", self.name, self.class_id, self.address)
    }
}

/// Factory for a class declared with [`cry_class!`](crate::cry_class)
///
/// Constructible in `const` context so it can be a `static`.
pub struct ClassFactory<T> {
    name: &'static str,
    class_id: CryClassId,
    singleton: bool,
    /// Cached instance for singleton factories
    instance: Mutex<Option<Arc<T>>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ClassFactory<T> {
    /// A factory that creates a fresh instance on every call
    pub const fn new(name: &'static str, class_id: CryClassId) -> Self {
        Self {
            name,
            class_id,
            singleton: false,
            instance: parking_lot::const_mutex(None),
            _marker: PhantomData,
        }
    }

    /// A factory that creates its instance once and hands it out afterwards
    ///
    /// `T::default()` runs without the slot lock held, so concurrent first
    /// calls may each construct an instance; only the first one stored is
    /// ever handed out. A `Default` impl that creates an instance from this
    /// same factory recurses without bound.
    pub const fn singleton(name: &'static str, class_id: CryClassId) -> Self {
        Self {
            name,
            class_id,
            singleton: true,
            instance: parking_lot::const_mutex(None),
            _marker: PhantomData,
        }
    }
}

impl<T: CryClass> CryFactory for ClassFactory<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn class_id(&self) -> CryClassId {
        self.class_id
    }

    fn class_interfaces(&self) -> &[CryInterfaceId] {
        T::class_interface_map().ids()
    }

    fn is_singleton(&self) -> bool {
        self.singleton
    }

    fn create_class_instance(&self) -> CryUnknownPtr {
        if !self.singleton {
            return Arc::new(T::default());
        }

        if let Some(instance) = self.instance.lock().as_ref() {
            return Arc::clone(instance) as CryUnknownPtr;
        }

        // Built unlocked; a thread that loses the race drops its instance
        log::debug!("Creating singleton instance of '{}'", self.name);
        let fresh = Arc::new(T::default());
        let mut slot = self.instance.lock();
        Arc::clone(slot.get_or_insert(fresh)) as CryUnknownPtr
    }
}

impl<T> fmt::Debug for ClassFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassFactory")
            .field("name", &self.name)
            .field("class_id", &self.class_id)
            .field("singleton", &self.singleton)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    use crate::cry_class;
    use crate::guid::CryGuid;

    static BUILT: AtomicUsize = AtomicUsize::new(0);
    static DROPPED: AtomicUsize = AtomicUsize::new(0);

    struct Heavy;

    impl Default for Heavy {
        fn default() -> Self {
            BUILT.fetch_add(1, Ordering::SeqCst);
            thread::yield_now();
            Heavy
        }
    }

    impl Drop for Heavy {
        fn drop(&mut self) {
            DROPPED.fetch_add(1, Ordering::SeqCst);
        }
    }

    cry_class! {
        static HEAVY_FACTORY: Heavy = ClassFactory::singleton("Heavy", CryGuid::new(0x6000, 0x1));
        interfaces: [];
    }

    #[derive(Default)]
    struct Plain;

    cry_class! {
        static PLAIN_FACTORY: Plain = ClassFactory::new("Plain", CryGuid::new(0x6000, 0x2));
        interfaces: [];
    }

    #[test]
    fn test_plain_factory_creates_fresh_instances() {
        let a = PLAIN_FACTORY.create_class_instance();
        let b = PLAIN_FACTORY.create_class_instance();
        assert!(!PLAIN_FACTORY.is_singleton());
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(PLAIN_FACTORY.class_interfaces(), HEAVY_FACTORY.class_interfaces());
    }

    #[test]
    fn test_concurrent_singleton_creation_hands_out_one_instance() {
        const THREADS: usize = 8;
        let barrier = Barrier::new(THREADS);

        let instances: Vec<CryUnknownPtr> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        HEAVY_FACTORY.create_class_instance()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let first = Arc::as_ptr(&instances[0]);
        for instance in &instances {
            assert!(std::ptr::addr_eq(Arc::as_ptr(instance), first));
        }
        assert!(std::ptr::addr_eq(
            Arc::as_ptr(&HEAVY_FACTORY.create_class_instance()),
            first
        ));

        // Only the cached instance outlives the race
        drop(instances);
        let built = BUILT.load(Ordering::SeqCst);
        assert!(built >= 1);
        assert_eq!(built - DROPPED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_factory_info_display() {
        let info = FactoryInfo::of(&PLAIN_FACTORY);
        assert_eq!(info.name, "Plain");
        assert!(info.to_string().starts_with("'Plain' {00000000-0000-6000-0000-000000000002} @0x"));
    }
}
