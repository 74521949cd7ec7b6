//! Per-host-instance component storage.
//!
//! A [`ComponentContainer`] is built once by [`FactoryRegistry::build`] and
//! owned by its host instance for the host's whole lifetime. Storage is a
//! dense slot array indexed by each key's registration index, so `get` and
//! `has` are array loads on the hot per-tick path. A parallel list of
//! populated keys, in build order, drives every dispatch (`tick`, load,
//! unload, copy, save) so visit order is identical on every pass.
//!
//! All operations touch only the container's own slots and its components'
//! state; the container never reaches back into registry state after
//! construction.
//!
//! [`FactoryRegistry::build`]: crate::factory::FactoryRegistry::build

use std::collections::BTreeMap;
use std::fmt;

use tracing::warn;

use tether_component::{Component, ComponentId, ComponentKey, PersistError, SyncError, UntypedKey};

/// Persisted component records for one container, keyed by registered name.
///
/// The persistence collaborator nests this map under the host's own record.
/// `BTreeMap` keeps record order deterministic.
pub type SavedComponents = BTreeMap<ComponentId, Vec<u8>>;

/// Sparse per-host component store with O(1) typed access.
///
/// Once built, the set of populated slots never shrinks: components may be
/// mutated (or replaced wholesale by [`copy_into`](Self::copy_into) on a
/// copy target) but never removed.
pub struct ComponentContainer {
    /// Dense slot array indexed by key index. Unpopulated slots are `None`.
    slots: Vec<Option<Box<dyn Component>>>,
    /// Populated keys in build order; the stable dispatch order.
    order: Vec<UntypedKey>,
}

impl ComponentContainer {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            order: Vec::new(),
        }
    }

    /// Store `component` under `key`, growing the slot array as needed.
    /// Populating a fresh slot appends the key to the dispatch order;
    /// storing over an occupied slot (the copy path) keeps its position.
    pub(crate) fn insert(&mut self, key: UntypedKey, component: Box<dyn Component>) {
        let index = key.index();
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        if self.slots[index].is_none() {
            self.order.push(key);
        }
        self.slots[index] = Some(component);
    }

    /// Returns `true` if a component is attached under `key`.
    ///
    /// Consistent with [`get`](Self::get): `has(k)` iff `get(k).is_some()`.
    #[must_use]
    pub fn has(&self, key: impl Into<UntypedKey>) -> bool {
        let index = key.into().index();
        matches!(self.slots.get(index), Some(Some(_)))
    }

    /// The component attached under `key`, or `None` if no factory for the
    /// key matched this host at construction time. Absence is an expected,
    /// common case — never an error.
    #[must_use]
    pub fn get<C: Component>(&self, key: ComponentKey<C>) -> Option<&C> {
        self.slots
            .get(key.index())?
            .as_deref()
            .and_then(|c| c.as_any().downcast_ref())
    }

    /// Mutable access to the component attached under `key`.
    #[must_use]
    pub fn get_mut<C: Component>(&mut self, key: ComponentKey<C>) -> Option<&mut C> {
        self.slots
            .get_mut(key.index())?
            .as_deref_mut()
            .and_then(|c| c.as_any_mut().downcast_mut())
    }

    /// Populated keys, in build order.
    pub fn keys(&self) -> impl Iterator<Item = UntypedKey> + '_ {
        self.order.iter().copied()
    }

    /// Number of attached components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no component is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Tick every component declaring the tickable capability, in build
    /// order. Ordering matters: components may read state written by
    /// earlier ticks in the same pass.
    pub fn tick(&mut self) {
        for key in &self.order {
            if let Some(component) = self.slots[key.index()].as_deref_mut()
                && let Some(tickable) = component.as_tickable()
            {
                tickable.tick();
            }
        }
    }

    /// Notify load-aware components that the host instance was loaded.
    /// The host collaborator calls this at most once per container.
    pub fn on_load(&mut self) {
        for key in &self.order {
            if let Some(component) = self.slots[key.index()].as_deref_mut()
                && let Some(aware) = component.as_load_aware()
            {
                aware.on_load();
            }
        }
    }

    /// Notify load-aware components that the host instance was unloaded.
    pub fn on_unload(&mut self) {
        for key in &self.order {
            if let Some(component) = self.slots[key.index()].as_deref_mut()
                && let Some(aware) = component.as_load_aware()
            {
                aware.on_unload();
            }
        }
    }

    /// Copy every copyable component into the corresponding slot of
    /// `target`, for host kinds that support duplication.
    ///
    /// Slots whose component does not declare the copyable capability are
    /// left untouched in the target. Silent omission is the deliberate
    /// policy here: an undefined deep copy of arbitrary state would be
    /// worse.
    pub fn copy_into(&self, target: &mut ComponentContainer) {
        for key in &self.order {
            if let Some(component) = self.slots[key.index()].as_deref()
                && let Some(copyable) = component.as_copyable()
            {
                target.insert(*key, copyable.copy_component());
            }
        }
    }

    /// Collect persisted records from every component declaring the
    /// persistent capability, keyed by registered name.
    ///
    /// # Errors
    ///
    /// Propagates the first [`PersistError`] from a component's
    /// `save_state`.
    pub fn save(&self) -> Result<SavedComponents, PersistError> {
        let mut records = SavedComponents::new();
        for key in &self.order {
            if let Some(component) = self.slots[key.index()].as_deref()
                && let Some(persistent) = component.as_persistent()
            {
                records.insert(key.id().clone(), persistent.save_state()?);
            }
        }
        Ok(records)
    }

    /// Restore component state from persisted records.
    ///
    /// Records naming a component this container does not hold — for
    /// example after the owning extension was removed — are skipped with a
    /// warning, matching the append-only registry model: old data must
    /// never make a world unloadable.
    ///
    /// # Errors
    ///
    /// Propagates the first [`PersistError`] from a component's
    /// `load_state`.
    pub fn load(&mut self, records: &SavedComponents) -> Result<(), PersistError> {
        for (id, bytes) in records {
            let Some(key) = self.order.iter().find(|key| key.id() == id).copied() else {
                warn!(component = %id, "skipping persisted record for unattached component");
                continue;
            };
            if let Some(component) = self.slots[key.index()].as_deref_mut() {
                match component.as_persistent_mut() {
                    Some(persistent) => persistent.load_state(bytes)?,
                    None => {
                        warn!(component = %id, "skipping persisted record for non-persistent component");
                    }
                }
            }
        }
        Ok(())
    }

    /// Drain replication payloads from every synced component whose dirty
    /// mark is set. Payload order is build order. Marks are cleared only
    /// once every payload has encoded, so a failed drain leaves all pending
    /// updates in place for the next attempt.
    ///
    /// # Errors
    ///
    /// Propagates the first [`SyncError`] from a component's `write_state`.
    pub fn drain_updates(&mut self) -> Result<Vec<(UntypedKey, Vec<u8>)>, SyncError> {
        let mut updates = Vec::new();
        for key in &self.order {
            if let Some(component) = self.slots[key.index()].as_deref()
                && let Some(synced) = component.as_synced()
                && synced.dirty().is_marked()
            {
                let mut payload = Vec::new();
                synced.write_state(&mut payload)?;
                updates.push((*key, payload));
            }
        }
        for (key, _) in &updates {
            if let Some(component) = self.slots[key.index()].as_deref()
                && let Some(synced) = component.as_synced()
            {
                synced.dirty().take();
            }
        }
        Ok(updates)
    }

    /// Apply one replicated payload to the component registered under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnknownComponent`] if no such component is
    /// attached, [`SyncError::NotSynced`] if it does not declare the synced
    /// capability, or the component's own decode error.
    pub fn apply_update(&mut self, id: &ComponentId, payload: &[u8]) -> Result<(), SyncError> {
        let key = self
            .order
            .iter()
            .find(|key| key.id() == id)
            .copied()
            .ok_or_else(|| SyncError::UnknownComponent(id.clone()))?;
        // Keys in `order` always point at populated slots.
        match self.slots[key.index()]
            .as_deref_mut()
            .and_then(|component| component.as_synced_mut())
        {
            Some(synced) => synced.read_state(payload),
            None => Err(SyncError::NotSynced(id.clone())),
        }
    }
}

impl fmt::Debug for ComponentContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for key in &self.order {
            set.entry(&format_args!("{}", key.id()));
        }
        set.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::{Arc, Mutex};

    use tether_component::{
        ComponentId, ComponentRegistry, Copyable, DirtyMark, Persistent, Synced, Tickable,
    };

    use crate::factory::{FactoryRegistry, Target};

    use super::*;

    struct Host;

    /// Tick-counting component used across most tests. Persistent and
    /// copyable; marks itself dirty on every tick.
    struct Counter {
        value: u64,
        dirty: DirtyMark,
    }

    impl Counter {
        fn new() -> Self {
            Self {
                value: 0,
                dirty: DirtyMark::new(),
            }
        }
    }

    impl Tickable for Counter {
        fn tick(&mut self) {
            self.value += 1;
            self.dirty.mark();
        }
    }

    impl Persistent for Counter {
        fn save_state(&self) -> Result<Vec<u8>, PersistError> {
            Ok(rmp_serde::to_vec(&self.value)?)
        }

        fn load_state(&mut self, bytes: &[u8]) -> Result<(), PersistError> {
            self.value = rmp_serde::from_slice(bytes)?;
            Ok(())
        }
    }

    impl Synced for Counter {
        fn dirty(&self) -> &DirtyMark {
            &self.dirty
        }

        fn write_state(&self, sink: &mut Vec<u8>) -> Result<(), SyncError> {
            sink.extend_from_slice(&rmp_serde::to_vec(&self.value)?);
            Ok(())
        }

        fn read_state(&mut self, source: &[u8]) -> Result<(), SyncError> {
            self.value = rmp_serde::from_slice(source)?;
            Ok(())
        }
    }

    impl Copyable for Counter {
        fn copy_component(&self) -> Box<dyn Component> {
            Box::new(Self {
                value: self.value,
                dirty: DirtyMark::new(),
            })
        }
    }

    impl Component for Counter {
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
        fn as_tickable(&mut self) -> Option<&mut dyn Tickable> {
            Some(self)
        }
        fn as_persistent(&self) -> Option<&dyn Persistent> {
            Some(self)
        }
        fn as_persistent_mut(&mut self) -> Option<&mut dyn Persistent> {
            Some(self)
        }
        fn as_synced(&self) -> Option<&dyn Synced> {
            Some(self)
        }
        fn as_synced_mut(&mut self) -> Option<&mut dyn Synced> {
            Some(self)
        }
        fn as_copyable(&self) -> Option<&dyn Copyable> {
            Some(self)
        }
    }

    /// Records its label into a shared log on every tick; not copyable.
    struct Tracer {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Tickable for Tracer {
        fn tick(&mut self) {
            self.log.lock().unwrap().push(self.label);
        }
    }

    impl Component for Tracer {
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
        fn as_tickable(&mut self) -> Option<&mut dyn Tickable> {
            Some(self)
        }
    }

    /// Synced component whose `write_state` fails while the shared flag is
    /// set, standing in for state that temporarily cannot encode.
    struct Flaky {
        broken: Arc<Mutex<bool>>,
        dirty: DirtyMark,
    }

    struct Unencodable;

    impl serde::Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("state not encodable"))
        }
    }

    impl Synced for Flaky {
        fn dirty(&self) -> &DirtyMark {
            &self.dirty
        }

        fn write_state(&self, sink: &mut Vec<u8>) -> Result<(), SyncError> {
            if *self.broken.lock().unwrap() {
                rmp_serde::to_vec(&Unencodable)?;
            }
            sink.extend_from_slice(&rmp_serde::to_vec(&0u8)?);
            Ok(())
        }

        fn read_state(&mut self, _source: &[u8]) -> Result<(), SyncError> {
            Ok(())
        }
    }

    impl Component for Flaky {
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
        fn as_synced(&self) -> Option<&dyn Synced> {
            Some(self)
        }
        fn as_synced_mut(&mut self) -> Option<&mut dyn Synced> {
            Some(self)
        }
    }

    fn id(s: &str) -> ComponentId {
        s.parse().unwrap()
    }

    fn registry() -> &'static ComponentRegistry {
        Box::leak(Box::new(ComponentRegistry::new()))
    }

    fn counter_container() -> (ComponentKey<Counter>, ComponentContainer) {
        let keys = registry();
        let key = keys.get_or_register::<Counter>(id("mod:counter")).unwrap();
        let mut factories = FactoryRegistry::<Host>::new("test");
        factories
            .register(key, Target::Wildcard, |_| Counter::new())
            .unwrap();
        factories.seal();
        (key, factories.build(&Host).unwrap())
    }

    #[test]
    fn test_has_matches_get() {
        let keys = registry();
        let key = keys.get_or_register::<Counter>(id("mod:counter")).unwrap();
        let absent = keys.get_or_register::<Tracer>(id("mod:absent")).unwrap();

        let mut factories = FactoryRegistry::<Host>::new("test");
        factories
            .register(key, Target::Wildcard, |_| Counter::new())
            .unwrap();
        factories.seal();
        let container = factories.build(&Host).unwrap();

        assert_eq!(container.has(key), container.get(key).is_some());
        assert_eq!(container.has(absent), container.get(absent).is_some());
        assert!(container.has(key));
        assert!(!container.has(absent));
    }

    #[test]
    fn test_get_mut_mutates_in_place() {
        let (key, mut container) = counter_container();
        container.get_mut(key).unwrap().value = 7;
        assert_eq!(container.get(key).unwrap().value, 7);
    }

    #[test]
    fn test_tick_order_is_stable() {
        let keys = registry();
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = keys.get_or_register::<Tracer>(id("mod:first")).unwrap();
        let second = keys.get_or_register::<Tracer>(id("mod:second")).unwrap();

        let mut factories = FactoryRegistry::<Host>::new("test");
        let log_a = Arc::clone(&log);
        factories
            .register(first, Target::Wildcard, move |_| Tracer {
                label: "first",
                log: Arc::clone(&log_a),
            })
            .unwrap();
        let log_b = Arc::clone(&log);
        factories
            .register(second, Target::Wildcard, move |_| Tracer {
                label: "second",
                log: Arc::clone(&log_b),
            })
            .unwrap();
        factories.seal();

        let mut container = factories.build(&Host).unwrap();
        container.tick();
        container.tick();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first", "second", "first", "second"]
        );
    }

    #[test]
    fn test_tick_five_then_save_encodes_five() {
        // End-to-end: a tickable, persistent counter starts at 0, ticks
        // five times, and its persisted record encodes 5.
        let (key, mut container) = counter_container();
        for _ in 0..5 {
            container.tick();
        }
        let records = container.save().unwrap();
        let bytes = records.get(key.id()).unwrap();
        let value: u64 = rmp_serde::from_slice(bytes).unwrap();
        assert_eq!(value, 5);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let (key, mut container) = counter_container();
        container.get_mut(key).unwrap().value = 42;
        let records = container.save().unwrap();

        let (_, mut restored) = counter_container();
        restored.load(&records).unwrap();
        assert_eq!(restored.get(key).unwrap().value, 42);
    }

    #[test]
    fn test_load_skips_unknown_record() {
        let (key, mut container) = counter_container();
        let mut records = SavedComponents::new();
        records.insert(id("gone:component"), rmp_serde::to_vec(&1u64).unwrap());
        records.insert(key.id().clone(), rmp_serde::to_vec(&3u64).unwrap());

        container.load(&records).unwrap();
        assert_eq!(container.get(key).unwrap().value, 3);
    }

    #[test]
    fn test_copy_into_copies_copyable_slots_only() {
        let keys = registry();
        let counter = keys.get_or_register::<Counter>(id("mod:counter")).unwrap();
        let tracer = keys.get_or_register::<Tracer>(id("mod:tracer")).unwrap();

        let mut factories = FactoryRegistry::<Host>::new("test");
        factories
            .register(counter, Target::Wildcard, |_| Counter::new())
            .unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        factories
            .register(tracer, Target::filter(|_: &Host| true), move |_| Tracer {
                label: "t",
                log: Arc::clone(&log),
            })
            .unwrap();
        factories.seal();

        let mut source = factories.build(&Host).unwrap();
        source.get_mut(counter).unwrap().value = 9;

        // Fresh target built for the duplicated host, then overwritten by
        // the copy pass. Only the copyable counter carries state over.
        let mut empty_factories = FactoryRegistry::<Host>::new("test");
        empty_factories.seal();
        let mut target = empty_factories.build(&Host).unwrap();
        source.copy_into(&mut target);

        assert_eq!(target.get(counter).unwrap().value, 9);
        assert!(!target.has(tracer));

        // The copy is a distinct instance.
        source.get_mut(counter).unwrap().value = 1;
        assert_eq!(target.get(counter).unwrap().value, 9);
    }

    #[test]
    fn test_drain_updates_clears_dirty_marks() {
        let (key, mut container) = counter_container();

        // Nothing dirty yet.
        assert!(container.drain_updates().unwrap().is_empty());

        container.tick();
        let updates = container.drain_updates().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0.id(), key.id());
        let value: u64 = rmp_serde::from_slice(&updates[0].1).unwrap();
        assert_eq!(value, 1);

        // Drained; nothing dirty until the next mutation.
        assert!(container.drain_updates().unwrap().is_empty());
    }

    #[test]
    fn test_failed_drain_keeps_pending_updates() {
        let keys = registry();
        let counter = keys.get_or_register::<Counter>(id("mod:counter")).unwrap();
        let flaky = keys.get_or_register::<Flaky>(id("mod:flaky")).unwrap();
        let broken = Arc::new(Mutex::new(true));

        let mut factories = FactoryRegistry::<Host>::new("test");
        factories
            .register(counter, Target::Wildcard, |_| Counter::new())
            .unwrap();
        let flag = Arc::clone(&broken);
        factories
            .register(flaky, Target::Wildcard, move |_| Flaky {
                broken: Arc::clone(&flag),
                dirty: DirtyMark::new(),
            })
            .unwrap();
        factories.seal();
        let mut container = factories.build(&Host).unwrap();

        container.tick();
        container.get(flaky).unwrap().dirty.mark();

        // The flaky component refuses to encode; no mark may be consumed.
        assert!(container.drain_updates().is_err());
        assert!(container.get(counter).unwrap().dirty.is_marked());
        assert!(container.get(flaky).unwrap().dirty.is_marked());

        // Once it can encode again, the retry carries both pending updates.
        *broken.lock().unwrap() = false;
        let updates = container.drain_updates().unwrap();
        assert_eq!(updates.len(), 2);
        assert!(container.drain_updates().unwrap().is_empty());
    }

    #[test]
    fn test_apply_update_unknown_component() {
        let (_, mut container) = counter_container();
        let err = container
            .apply_update(&id("gone:component"), &[])
            .unwrap_err();
        assert!(matches!(err, SyncError::UnknownComponent(_)));
    }

    #[test]
    fn test_apply_update_roundtrip() {
        let (key, mut sender) = counter_container();
        let (_, mut receiver) = counter_container();

        sender.get_mut(key).unwrap().value = 13;
        sender.get(key).unwrap().dirty.mark();
        let updates = sender.drain_updates().unwrap();
        for (update_key, payload) in &updates {
            receiver.apply_update(update_key.id(), payload).unwrap();
        }
        assert_eq!(receiver.get(key).unwrap().value, 13);
    }

    #[test]
    fn test_keys_and_debug_list_populated_slots() {
        let (key, container) = counter_container();
        let listed: Vec<_> = container.keys().collect();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), key.id());
        assert_eq!(container.len(), 1);
        assert!(!container.is_empty());
        assert!(format!("{container:?}").contains("mod:counter"));
    }
}
