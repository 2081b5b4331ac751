//! Factory registry
//!
//! Process-wide directory from class name, class id and interface id to the
//! registered [`CryFactory`]. Three sorted indices are kept over the same set
//! of factories:
//!
//! - by name (byte-wise string order, unique)
//! - by class id (unique)
//! - by interface id, tie-broken by factory address (one row per supported
//!   interface, so one interface id maps to many factories)
//!
//! Reads take a shared lock and run concurrently. Registration, unregistration
//! and callback changes take the exclusive lock for the index mutation, then
//! downgrade it atomically to a shared lock while observers are notified, so
//! observers always see a quiescent, fully updated registry and no writer can
//! slip in between a mutation and its notifications.

use std::fmt;
use std::ops::Range;
use std::sync::{Arc, OnceLock};

use parking_lot::{RwLock, RwLockWriteGuard};

use crate::cast::interface_cast_arc;
use crate::error::{CollisionKind, RegistryError, Result};
use crate::factory::{factory_addr, same_factory, FactoryInfo, FactoryRef};
use crate::guid::{CryClassId, CryInterfaceId};
use crate::interface::CryInterface;
use crate::unknown::{CryUnknown, CryUnknownPtr, CRY_UNKNOWN_IID};

/// Observer of factory registration changes
///
/// Notifications are delivered while the registry holds a shared lock:
/// observers may call the registry's lookup functions but must not register
/// or unregister anything from inside a notification.
pub trait CryFactoryRegistryCallback: Send + Sync {
    /// A factory became available
    fn on_factory_registered(&self, factory: FactoryRef);

    /// A factory was removed
    fn on_factory_unregistered(&self, factory: FactoryRef);
}

/// Shared handle to a registry observer. Identity is the allocation.
pub type CallbackRef = Arc<dyn CryFactoryRegistryCallback>;

/// The lock-protected state
#[derive(Default)]
struct RegistryIndex {
    by_name: Vec<(&'static str, FactoryRef)>,
    by_class_id: Vec<(CryClassId, FactoryRef)>,
    by_interface: Vec<(CryInterfaceId, FactoryRef)>,
    callbacks: Vec<CallbackRef>,
}

impl RegistryIndex {
    fn find_by_name(&self, name: &str) -> std::result::Result<usize, usize> {
        self.by_name.binary_search_by(|(n, _)| (*n).cmp(name))
    }

    fn find_by_class_id(&self, class_id: CryClassId) -> std::result::Result<usize, usize> {
        self.by_class_id.binary_search_by_key(&class_id, |(c, _)| *c)
    }

    fn find_interface_row(&self, iid: CryInterfaceId, factory: FactoryRef) -> Option<usize> {
        let key = (iid, factory_addr(factory));
        self.by_interface
            .binary_search_by_key(&key, |(i, f)| (*i, factory_addr(*f)))
            .ok()
    }

    /// Contiguous rows for `iid`, ignoring the address tie-break
    fn interface_range(&self, iid: CryInterfaceId) -> Range<usize> {
        let start = self.by_interface.partition_point(|(i, _)| *i < iid);
        let end = self.by_interface.partition_point(|(i, _)| *i <= iid);
        start..end
    }

    /// Check a batch against the registry and itself without touching anything.
    /// Returns the factories that actually need inserting.
    fn validate(&self, batch: &[FactoryRef]) -> Result<Vec<FactoryRef>> {
        let mut accepted: Vec<FactoryRef> = Vec::with_capacity(batch.len());

        for &incoming in batch {
            if let Ok(pos) = self.find_by_name(incoming.name()) {
                let existing = self.by_name[pos].1;
                if same_factory(existing, incoming) {
                    log::debug!("Factory '{}' is already registered", incoming.name());
                    continue;
                }
                return Err(collision(CollisionKind::Name, existing, incoming));
            }

            if let Ok(pos) = self.find_by_class_id(incoming.class_id()) {
                let existing = self.by_class_id[pos].1;
                return Err(collision(CollisionKind::ClassId, existing, incoming));
            }

            if let Some(&earlier) = accepted.iter().find(|f| f.name() == incoming.name()) {
                if same_factory(earlier, incoming) {
                    continue;
                }
                return Err(collision(CollisionKind::Name, earlier, incoming));
            }

            if let Some(&earlier) = accepted.iter().find(|f| f.class_id() == incoming.class_id()) {
                return Err(collision(CollisionKind::ClassId, earlier, incoming));
            }

            accepted.push(incoming);
        }

        Ok(accepted)
    }

    /// Insert an already validated batch into all three indices
    fn insert(&mut self, accepted: &[FactoryRef]) {
        for &factory in accepted {
            let pos = self.find_by_name(factory.name()).unwrap_or_else(|p| p);
            self.by_name.insert(pos, (factory.name(), factory));

            let pos = self.find_by_class_id(factory.class_id()).unwrap_or_else(|p| p);
            self.by_class_id.insert(pos, (factory.class_id(), factory));

            self.by_interface
                .extend(distinct_interfaces(factory).into_iter().map(|iid| (iid, factory)));
        }

        // One sort for the whole batch instead of N sorted insertions
        self.by_interface
            .sort_unstable_by_key(|(iid, f)| (*iid, factory_addr(*f)));
    }

    /// Remove every row belonging to `factory`. Returns whether anything was removed.
    fn remove(&mut self, factory: FactoryRef) -> bool {
        let mut removed = false;

        if let Ok(pos) = self.find_by_name(factory.name()) {
            if same_factory(self.by_name[pos].1, factory) {
                self.by_name.remove(pos);
                removed = true;
            }
        }

        if let Ok(pos) = self.find_by_class_id(factory.class_id()) {
            if same_factory(self.by_class_id[pos].1, factory) {
                self.by_class_id.remove(pos);
                removed = true;
            }
        }

        for iid in distinct_interfaces(factory) {
            if let Some(pos) = self.find_interface_row(iid, factory) {
                self.by_interface.remove(pos);
                removed = true;
            }
        }

        removed
    }

    fn check(&self) -> std::result::Result<(), String> {
        if let Some(w) = self.by_name.windows(2).find(|w| w[0].0 >= w[1].0) {
            return Err(format!("name index out of order at '{}' / '{}'", w[0].0, w[1].0));
        }
        if let Some(w) = self.by_class_id.windows(2).find(|w| w[0].0 >= w[1].0) {
            return Err(format!("class id index out of order at {} / {}", w[0].0, w[1].0));
        }
        if let Some(w) = self
            .by_interface
            .windows(2)
            .find(|w| (w[0].0, factory_addr(w[0].1)) >= (w[1].0, factory_addr(w[1].1)))
        {
            return Err(format!("interface index out of order at {} / {}", w[0].0, w[1].0));
        }
        if self.by_name.len() != self.by_class_id.len() {
            return Err(format!(
                "name index has {} rows, class id index has {}",
                self.by_name.len(),
                self.by_class_id.len()
            ));
        }

        let mut interface_rows = 0;
        for &(name, factory) in &self.by_name {
            match self.find_by_class_id(factory.class_id()) {
                Ok(pos) if same_factory(self.by_class_id[pos].1, factory) => {}
                _ => return Err(format!("'{}' missing from class id index", name)),
            }
            let interfaces = distinct_interfaces(factory);
            for &iid in &interfaces {
                if self.find_interface_row(iid, factory).is_none() {
                    return Err(format!("'{}' missing from interface index for {}", name, iid));
                }
            }
            interface_rows += interfaces.len();
        }
        if interface_rows != self.by_interface.len() {
            return Err(format!(
                "interface index has {} rows, expected {}",
                self.by_interface.len(),
                interface_rows
            ));
        }

        Ok(())
    }
}

/// A factory's interface ids as a sorted set
fn distinct_interfaces(factory: FactoryRef) -> Vec<CryInterfaceId> {
    let mut ids = factory.class_interfaces().to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn collision(kind: CollisionKind, existing: FactoryRef, incoming: FactoryRef) -> RegistryError {
    RegistryError::collision(kind, FactoryInfo::of(existing), FactoryInfo::of(incoming))
}

/// Central registry for class factories
pub struct CryFactoryRegistry {
    index: RwLock<RegistryIndex>,
}

static GLOBAL_REGISTRY: OnceLock<CryFactoryRegistry> = OnceLock::new();

impl CryFactoryRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            index: RwLock::new(RegistryIndex::default()),
        }
    }

    /// The process-wide registry, created on first access
    pub fn global() -> &'static CryFactoryRegistry {
        GLOBAL_REGISTRY.get_or_init(CryFactoryRegistry::new)
    }

    // ========== Lookup ==========

    /// Find a factory by exact, case-sensitive name
    pub fn get_factory(&self, name: &str) -> Option<FactoryRef> {
        if name.is_empty() {
            return None;
        }
        let index = self.index.read_recursive();
        index.find_by_name(name).ok().map(|pos| index.by_name[pos].1)
    }

    /// Find a factory by class id
    pub fn get_factory_by_id(&self, class_id: CryClassId) -> Option<FactoryRef> {
        let index = self.index.read_recursive();
        index
            .find_by_class_id(class_id)
            .ok()
            .map(|pos| index.by_class_id[pos].1)
    }

    /// Copy the factories supporting `iid` into `out`, up to its length.
    ///
    /// Always returns the total number of matching factories, so an empty
    /// buffer can be used to ask for the count alone. Order is stable for a
    /// given registry state and nothing else should be assumed about it.
    pub fn iterate_factories(&self, iid: CryInterfaceId, out: &mut [Option<FactoryRef>]) -> usize {
        let index = self.index.read_recursive();
        let range = index.interface_range(iid);
        let count = range.len();
        for (slot, &(_, factory)) in out.iter_mut().zip(&index.by_interface[range]) {
            *slot = Some(factory);
        }
        count
    }

    /// All factories supporting `iid`
    pub fn factories_for_interface(&self, iid: CryInterfaceId) -> Vec<FactoryRef> {
        let index = self.index.read_recursive();
        let range = index.interface_range(iid);
        index.by_interface[range].iter().map(|&(_, f)| f).collect()
    }

    /// All registered factories, in name order
    pub fn factories(&self) -> Vec<FactoryRef> {
        self.index
            .read_recursive()
            .by_name
            .iter()
            .map(|&(_, f)| f)
            .collect()
    }

    /// Number of registered factories
    pub fn len(&self) -> usize {
        self.index.read_recursive().by_name.len()
    }

    /// Check if no factory is registered
    pub fn is_empty(&self) -> bool {
        self.index.read_recursive().by_name.is_empty()
    }

    // ========== Callbacks ==========

    /// Subscribe an observer.
    ///
    /// The observer is immediately told about every factory already
    /// registered, then about every later change. Returns `false` (and
    /// changes nothing) if the observer is already subscribed.
    pub fn register_callback(&self, callback: CallbackRef) -> bool {
        let mut index = self.index.write();
        if index.callbacks.iter().any(|c| same_callback(c, &callback)) {
            log::warn!("Factory registry callback is already registered");
            return false;
        }
        index.callbacks.push(Arc::clone(&callback));

        let index = RwLockWriteGuard::downgrade(index);
        let range = index.interface_range(CRY_UNKNOWN_IID);
        for &(_, factory) in &index.by_interface[range] {
            callback.on_factory_registered(factory);
        }
        true
    }

    /// Unsubscribe an observer. Returns `false` if it was not subscribed.
    pub fn unregister_callback(&self, callback: &CallbackRef) -> bool {
        let mut index = self.index.write();
        match index.callbacks.iter().position(|c| same_callback(c, callback)) {
            Some(pos) => {
                index.callbacks.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Number of subscribed observers
    pub fn callback_count(&self) -> usize {
        self.index.read_recursive().callbacks.len()
    }

    // ========== Registration ==========

    /// Register a batch of factories, all or nothing.
    ///
    /// A factory already registered at the same address is skipped. A
    /// different factory claiming a registered name or class id (or one
    /// claimed earlier in the same batch) is an identity collision: nothing
    /// from the batch is registered and [`RegistryError::IdentityCollision`]
    /// is returned. That error is fatal by contract; see
    /// [`RegistryError::is_fatal`].
    pub fn register_factories(&self, batch: &[FactoryRef]) -> Result<()> {
        let mut index = self.index.write();

        let accepted = match index.validate(batch) {
            Ok(accepted) => accepted,
            Err(e) => {
                log::error!("{}", e);
                return Err(e);
            }
        };
        if accepted.is_empty() {
            return Ok(());
        }

        index.insert(&accepted);

        let index = RwLockWriteGuard::downgrade(index);
        for &factory in &accepted {
            log::debug!("Registered factory {}", FactoryInfo::of(factory));
            for callback in &index.callbacks {
                callback.on_factory_registered(factory);
            }
        }
        Ok(())
    }

    /// Register a single factory
    pub fn register_factory(&self, factory: FactoryRef) -> Result<()> {
        self.register_factories(&[factory])
    }

    /// Remove a batch of factories. Factories that are not registered are skipped.
    pub fn unregister_factories(&self, batch: &[FactoryRef]) {
        let mut index = self.index.write();

        let removed: Vec<FactoryRef> = batch
            .iter()
            .copied()
            .filter(|&factory| index.remove(factory))
            .collect();
        if removed.is_empty() {
            return;
        }

        let index = RwLockWriteGuard::downgrade(index);
        for &factory in &removed {
            log::debug!("Unregistered factory {}", FactoryInfo::of(factory));
            for callback in &index.callbacks {
                callback.on_factory_unregistered(factory);
            }
        }
    }

    /// Remove a single factory
    pub fn unregister_factory(&self, factory: FactoryRef) {
        self.unregister_factories(&[factory]);
    }

    /// Verify ordering and cross-index consistency
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        self.index.read_recursive().check()
    }

    // ========== Instance Creation ==========

    /// Create an instance of the class registered under `name`
    pub fn create_class_instance(&self, name: &str) -> Option<CryUnknownPtr> {
        let factory = self.get_factory(name)?;
        Some(factory.create_class_instance())
    }

    /// Create an instance of the class registered under `class_id`
    pub fn create_class_instance_by_id(&self, class_id: CryClassId) -> Option<CryUnknownPtr> {
        let factory = self.get_factory_by_id(class_id)?;
        Some(factory.create_class_instance())
    }

    /// Create an instance by name and view it as interface `I`
    pub fn create_class_instance_as<I: CryInterface + ?Sized>(&self, name: &str) -> Option<Arc<I>> {
        interface_cast_arc::<I, dyn CryUnknown>(&self.create_class_instance(name)?)
    }

    /// Create an instance by class id and view it as interface `I`
    pub fn create_class_instance_by_id_as<I: CryInterface + ?Sized>(
        &self,
        class_id: CryClassId,
    ) -> Option<Arc<I>> {
        interface_cast_arc::<I, dyn CryUnknown>(&self.create_class_instance_by_id(class_id)?)
    }

    /// Create the one implementation of interface `I`.
    ///
    /// Fails when no factory, or more than one, supports `I`.
    pub fn create_class_instance_for_interface<I: CryInterface + ?Sized>(&self) -> Option<Arc<I>> {
        let mut slot = [None];
        let count = self.iterate_factories(I::IID, &mut slot);
        if count != 1 {
            if count > 1 {
                log::warn!(
                    "{} factories implement {}; refusing to pick one",
                    count,
                    I::NAME
                );
            }
            return None;
        }
        let instance = slot[0]?.create_class_instance();
        interface_cast_arc::<I, dyn CryUnknown>(&instance)
    }
}

impl Default for CryFactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CryFactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index = self.index.read_recursive();
        f.debug_struct("CryFactoryRegistry")
            .field("factories", &index.by_name.len())
            .field("interface_rows", &index.by_interface.len())
            .field("callbacks", &index.callbacks.len())
            .finish()
    }
}

fn same_callback(a: &CallbackRef, b: &CallbackRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{ClassFactory, CryFactory};
    use crate::guid::CryGuid;
    use crate::{cry_class, cry_interface};
    use parking_lot::Mutex;

    trait IPing: CryUnknown {
        fn ping(&self) -> u32;
    }
    cry_interface!(IPing, 0x5000, 0x1);

    #[derive(Default)]
    struct Ping;

    impl IPing for Ping {
        fn ping(&self) -> u32 {
            7
        }
    }

    cry_class! {
        static PING_FACTORY: Ping = ClassFactory::new("Ping", CryGuid::new(0x5000, 0x100));
        interfaces: [IPing];
    }

    /// Hand-made factory so tests control names and ids freely
    struct TestFactory {
        name: &'static str,
        class_id: CryClassId,
        interfaces: Vec<CryInterfaceId>,
    }

    impl CryFactory for TestFactory {
        fn name(&self) -> &'static str {
            self.name
        }

        fn class_id(&self) -> CryClassId {
            self.class_id
        }

        fn class_interfaces(&self) -> &[CryInterfaceId] {
            &self.interfaces
        }

        fn create_class_instance(&self) -> CryUnknownPtr {
            PING_FACTORY.create_class_instance()
        }
    }

    fn leak(name: &'static str, hi: u64, lo: u64, extra: &[CryInterfaceId]) -> FactoryRef {
        let mut interfaces = vec![CRY_UNKNOWN_IID];
        interfaces.extend_from_slice(extra);
        interfaces.sort();
        Box::leak(Box::new(TestFactory {
            name,
            class_id: CryGuid::new(hi, lo),
            interfaces,
        }))
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(bool, &'static str)>>,
    }

    impl CryFactoryRegistryCallback for Recorder {
        fn on_factory_registered(&self, factory: FactoryRef) {
            self.events.lock().push((true, factory.name()));
        }

        fn on_factory_unregistered(&self, factory: FactoryRef) {
            self.events.lock().push((false, factory.name()));
        }
    }

    const IID_A: CryInterfaceId = CryGuid::new(0xA, 0);
    const IID_B: CryInterfaceId = CryGuid::new(0xB, 0);

    #[test]
    fn test_registry_creation() {
        let registry = CryFactoryRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.callback_count(), 0);
        assert!(registry.get_factory("Ping").is_none());
        assert!(registry.check_invariants().is_ok());
    }

    #[test]
    fn test_lookup_by_name_and_id() {
        let registry = CryFactoryRegistry::new();
        let f = leak("Lookup", 1, 2, &[IID_A]);
        registry.register_factory(f).unwrap();

        assert!(same_factory(registry.get_factory("Lookup").unwrap(), f));
        assert!(same_factory(registry.get_factory_by_id(CryGuid::new(1, 2)).unwrap(), f));
        assert!(registry.get_factory("lookup").is_none());
        assert!(registry.get_factory("").is_none());
        assert!(registry.get_factory_by_id(CryGuid::new(2, 1)).is_none());
    }

    #[test]
    fn test_iterate_reports_true_count() {
        let registry = CryFactoryRegistry::new();
        let batch = [
            leak("IterOne", 10, 1, &[IID_A]),
            leak("IterTwo", 10, 2, &[IID_A, IID_B]),
            leak("IterThree", 10, 3, &[IID_B]),
        ];
        registry.register_factories(&batch).unwrap();

        assert_eq!(registry.iterate_factories(IID_A, &mut []), 2);

        let mut one = [None];
        assert_eq!(registry.iterate_factories(IID_B, &mut one), 2);
        assert!(one[0].is_some());

        let mut many = [None; 8];
        assert_eq!(registry.iterate_factories(CRY_UNKNOWN_IID, &mut many), 3);
        assert_eq!(many.iter().filter(|f| f.is_some()).count(), 3);

        assert_eq!(registry.iterate_factories(CryGuid::new(0xDEAD, 0), &mut many), 0);
    }

    #[test]
    fn test_same_factory_twice_is_noop() {
        let registry = CryFactoryRegistry::new();
        let recorder = Arc::new(Recorder::default());
        registry.register_callback(recorder.clone());

        let f = leak("Twice", 3, 3, &[]);
        registry.register_factories(&[f, f]).unwrap();
        registry.register_factory(f).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(recorder.events.lock().len(), 1);
        assert!(registry.check_invariants().is_ok());
    }

    #[test]
    fn test_collision_leaves_registry_untouched() {
        let registry = CryFactoryRegistry::new();
        let a = leak("CollideA", 4, 4, &[IID_A]);
        registry.register_factory(a).unwrap();

        let fresh = leak("CollideFresh", 4, 5, &[]);
        let same_id = leak("CollideB", 4, 4, &[IID_B]);
        let err = registry.register_factories(&[fresh, same_id]).unwrap_err();

        assert!(err.is_fatal());
        match err {
            RegistryError::IdentityCollision { kind, existing, incoming } => {
                assert_eq!(kind, CollisionKind::ClassId);
                assert_eq!(existing.name, "CollideA");
                assert_eq!(incoming.name, "CollideB");
            }
        }
        assert_eq!(registry.len(), 1);
        assert!(registry.get_factory("CollideFresh").is_none());
        assert_eq!(registry.iterate_factories(IID_B, &mut []), 0);
    }

    #[test]
    fn test_collision_within_batch() {
        let registry = CryFactoryRegistry::new();
        let first = leak("Dup", 6, 1, &[]);
        let second = leak("Dup", 6, 2, &[]);
        let err = registry.register_factories(&[first, second]).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::IdentityCollision { kind: CollisionKind::Name, .. }
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_callback_catch_up_and_order() {
        let registry = CryFactoryRegistry::new();
        registry
            .register_factories(&[leak("CatchOne", 7, 1, &[]), leak("CatchTwo", 7, 2, &[])])
            .unwrap();

        let recorder = Arc::new(Recorder::default());
        let callback: CallbackRef = recorder.clone();
        assert!(registry.register_callback(callback.clone()));
        assert!(!registry.register_callback(callback.clone()));
        assert_eq!(recorder.events.lock().len(), 2);

        let later = leak("CatchLater", 7, 3, &[]);
        registry.register_factory(later).unwrap();
        registry.unregister_factory(later);

        let events = recorder.events.lock().clone();
        assert_eq!(&events[2..], &[(true, "CatchLater"), (false, "CatchLater")]);

        assert!(registry.unregister_callback(&callback));
        assert!(!registry.unregister_callback(&callback));
        assert_eq!(registry.callback_count(), 0);
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let registry = CryFactoryRegistry::new();
        let recorder = Arc::new(Recorder::default());
        registry.register_callback(recorder.clone());

        let known = leak("Known", 8, 1, &[IID_A]);
        registry.register_factory(known).unwrap();
        recorder.events.lock().clear();

        // Same name, different factory: must not evict the registered one
        let impostor = leak("Known", 8, 2, &[IID_A]);
        registry.unregister_factory(impostor);
        registry.unregister_factory(leak("Never", 8, 3, &[]));

        assert!(recorder.events.lock().is_empty());
        assert_eq!(registry.len(), 1);
        assert!(same_factory(registry.get_factory("Known").unwrap(), known));
        assert!(registry.check_invariants().is_ok());
    }

    #[test]
    fn test_callback_may_read_registry() {
        struct Reader {
            registry: Arc<CryFactoryRegistry>,
            seen: Mutex<Vec<bool>>,
        }

        impl CryFactoryRegistryCallback for Reader {
            fn on_factory_registered(&self, factory: FactoryRef) {
                let found = self.registry.get_factory(factory.name()).is_some();
                self.seen.lock().push(found);
            }

            fn on_factory_unregistered(&self, factory: FactoryRef) {
                let found = self.registry.get_factory(factory.name()).is_some();
                self.seen.lock().push(found);
            }
        }

        let registry = Arc::new(CryFactoryRegistry::new());
        let reader = Arc::new(Reader {
            registry: Arc::clone(&registry),
            seen: Mutex::new(Vec::new()),
        });
        registry.register_callback(reader.clone());

        let f = leak("Visible", 9, 1, &[]);
        registry.register_factory(f).unwrap();
        registry.unregister_factory(f);

        assert_eq!(*reader.seen.lock(), vec![true, false]);
    }

    #[test]
    fn test_create_for_interface_needs_exactly_one() {
        let registry = CryFactoryRegistry::new();
        assert!(registry.create_class_instance_for_interface::<dyn IPing>().is_none());

        registry.register_factory(&PING_FACTORY).unwrap();
        let ping = registry
            .create_class_instance_for_interface::<dyn IPing>()
            .unwrap();
        assert_eq!(ping.ping(), 7);

        registry
            .register_factory(leak("PingTwin", 0x5000, 0x200, &[<dyn IPing>::IID]))
            .unwrap();
        assert!(registry.create_class_instance_for_interface::<dyn IPing>().is_none());
    }

    #[test]
    fn test_create_by_name_and_id() {
        let registry = CryFactoryRegistry::new();
        registry.register_factory(&PING_FACTORY).unwrap();

        let by_name = registry.create_class_instance_as::<dyn IPing>("Ping").unwrap();
        assert_eq!(by_name.ping(), 7);

        let by_id = registry
            .create_class_instance_by_id(CryGuid::new(0x5000, 0x100))
            .unwrap();
        assert!(same_factory(by_id.factory(), &PING_FACTORY));

        assert!(registry.create_class_instance("Missing").is_none());
        assert!(registry
            .create_class_instance_by_id_as::<dyn IPing>(CryGuid::new(1, 1))
            .is_none());
    }

    #[test]
    fn test_repeated_interface_ids_give_one_row() {
        let registry = CryFactoryRegistry::new();
        let f = leak("Repeats", 11, 1, &[IID_A, IID_A, CRY_UNKNOWN_IID]);
        assert_eq!(f.class_interfaces().len(), 4);

        registry.register_factory(f).unwrap();
        assert_eq!(registry.iterate_factories(IID_A, &mut []), 1);
        assert_eq!(registry.iterate_factories(CRY_UNKNOWN_IID, &mut []), 1);
        assert_eq!(registry.check_invariants(), Ok(()));

        registry.unregister_factory(f);
        assert_eq!(registry.iterate_factories(IID_A, &mut []), 0);
        assert_eq!(registry.check_invariants(), Ok(()));
    }

    #[test]
    fn test_callbacks_notified_in_registration_order() {
        struct Tagged {
            tag: &'static str,
            log: Arc<Mutex<Vec<(&'static str, bool, &'static str)>>>,
        }

        impl CryFactoryRegistryCallback for Tagged {
            fn on_factory_registered(&self, factory: FactoryRef) {
                self.log.lock().push((self.tag, true, factory.name()));
            }

            fn on_factory_unregistered(&self, factory: FactoryRef) {
                self.log.lock().push((self.tag, false, factory.name()));
            }
        }

        let registry = CryFactoryRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            registry.register_callback(Arc::new(Tagged {
                tag,
                log: Arc::clone(&log),
            }));
        }

        let one = leak("OrderOne", 12, 1, &[]);
        let two = leak("OrderTwo", 12, 2, &[]);
        registry.register_factories(&[one, two]).unwrap();
        registry.unregister_factories(&[two]);

        assert_eq!(
            *log.lock(),
            vec![
                ("first", true, "OrderOne"),
                ("second", true, "OrderOne"),
                ("third", true, "OrderOne"),
                ("first", true, "OrderTwo"),
                ("second", true, "OrderTwo"),
                ("third", true, "OrderTwo"),
                ("first", false, "OrderTwo"),
                ("second", false, "OrderTwo"),
                ("third", false, "OrderTwo"),
            ]
        );
    }
}
