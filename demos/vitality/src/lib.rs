//! Demo extension for the tether attachment system.
//!
//! Declares a `vitality:vita` life-force component and a `vitality:age`
//! tick counter, and attaches them to two demo host kinds: creatures and
//! item stacks. Undead creatures get a larger vita pool through a filtered
//! factory that takes precedence over the wildcard one, and only the
//! `vitality_stick` item carries vita at all.

use std::any::Any;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use tether_component::{
    Component, ComponentKey, Copyable, DirtyMark, LoadAware, PersistError, Persistent, SyncError,
    Synced, Tickable, global,
};
use tether_container::{ComponentInitializer, FactoryError, FactoryRegistry, Target};

/// A demo host: a living (or unliving) creature.
pub struct Creature {
    /// Display name.
    pub name: String,
    /// Undead creatures carry more vita.
    pub undead: bool,
}

/// A demo host: a stack of items.
pub struct ItemStack {
    /// Item identifier, e.g. `"vitality_stick"`.
    pub item: String,
    /// Stack size.
    pub count: u32,
}

/// A pool of life force, clamped to a maximum.
///
/// Persistent, replicated, and copied when its host is duplicated.
#[derive(Debug, Serialize, Deserialize)]
pub struct Vita {
    amount: u32,
    max: u32,
    #[serde(skip)]
    dirty: DirtyMark,
}

impl Vita {
    /// Create a full pool of the given capacity.
    #[must_use]
    pub fn full(max: u32) -> Self {
        Self {
            amount: max,
            max,
            dirty: DirtyMark::new(),
        }
    }

    /// Current amount.
    #[must_use]
    pub fn amount(&self) -> u32 {
        self.amount
    }

    /// Pool capacity.
    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Set the amount, clamped to capacity, and mark for replication.
    pub fn set_amount(&mut self, amount: u32) {
        self.amount = amount.min(self.max);
        self.dirty.mark();
    }

    /// Drain up to `requested` vita, returning how much was taken.
    pub fn drain(&mut self, requested: u32) -> u32 {
        let taken = requested.min(self.amount);
        if taken > 0 {
            self.amount -= taken;
            self.dirty.mark();
        }
        taken
    }
}

impl Persistent for Vita {
    fn save_state(&self) -> Result<Vec<u8>, PersistError> {
        Ok(rmp_serde::to_vec(self)?)
    }

    fn load_state(&mut self, bytes: &[u8]) -> Result<(), PersistError> {
        let state: Vita = rmp_serde::from_slice(bytes)?;
        self.amount = state.amount;
        self.max = state.max;
        Ok(())
    }
}

impl Synced for Vita {
    fn dirty(&self) -> &DirtyMark {
        &self.dirty
    }

    fn write_state(&self, sink: &mut Vec<u8>) -> Result<(), SyncError> {
        sink.extend_from_slice(&rmp_serde::to_vec(self)?);
        Ok(())
    }

    fn read_state(&mut self, source: &[u8]) -> Result<(), SyncError> {
        let state: Vita = rmp_serde::from_slice(source)?;
        self.amount = state.amount;
        self.max = state.max;
        Ok(())
    }
}

impl Copyable for Vita {
    fn copy_component(&self) -> Box<dyn Component> {
        Box::new(Self {
            amount: self.amount,
            max: self.max,
            dirty: DirtyMark::new(),
        })
    }
}

impl Component for Vita {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
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

/// Tick counter tracking how long its host has existed and whether it is
/// currently loaded.
#[derive(Debug, Default)]
pub struct Age {
    ticks: u64,
    loaded: bool,
}

impl Age {
    /// Ticks since the host was created.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Whether the host is currently loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

impl Tickable for Age {
    fn tick(&mut self) {
        self.ticks += 1;
    }
}

impl LoadAware for Age {
    fn on_load(&mut self) {
        self.loaded = true;
    }

    fn on_unload(&mut self) {
        self.loaded = false;
    }
}

impl Component for Age {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn as_tickable(&mut self) -> Option<&mut dyn Tickable> {
        Some(self)
    }
    fn as_load_aware(&mut self) -> Option<&mut dyn LoadAware> {
        Some(self)
    }
}

/// The `vitality:vita` key, registered in the global registry on first use.
pub fn vita_key() -> ComponentKey<Vita> {
    static KEY: OnceLock<ComponentKey<Vita>> = OnceLock::new();
    *KEY.get_or_init(|| {
        global()
            .get_or_register::<Vita>("vitality:vita".parse().expect("valid id"))
            .expect("vita key conflicts with another registration")
    })
}

/// The `vitality:age` key, registered in the global registry on first use.
pub fn age_key() -> ComponentKey<Age> {
    static KEY: OnceLock<ComponentKey<Age>> = OnceLock::new();
    *KEY.get_or_init(|| {
        global()
            .get_or_register::<Age>("vitality:age".parse().expect("valid id"))
            .expect("age key conflicts with another registration")
    })
}

/// Vita pool for ordinary creatures.
pub const CREATURE_VITA: u32 = 20;
/// Vita pool for undead creatures.
pub const UNDEAD_VITA: u32 = 40;
/// Vita pool held by a vitality stick.
pub const STICK_VITA: u32 = 10;

/// The extension's registration entrypoint, one impl per host kind.
pub struct VitalityInit;

impl ComponentInitializer<Creature> for VitalityInit {
    fn register_components(
        &self,
        registry: &mut FactoryRegistry<Creature>,
    ) -> Result<(), FactoryError> {
        // Every creature ages and has vita; the filtered undead factory
        // takes precedence over the wildcard one.
        registry.register(age_key(), Target::Wildcard, |_| Age::default())?;
        registry.register(vita_key(), Target::Wildcard, |_| Vita::full(CREATURE_VITA))?;
        registry.register(vita_key(), Target::filter(|c: &Creature| c.undead), |_| {
            Vita::full(UNDEAD_VITA)
        })
    }
}

impl ComponentInitializer<ItemStack> for VitalityInit {
    fn register_components(
        &self,
        registry: &mut FactoryRegistry<ItemStack>,
    ) -> Result<(), FactoryError> {
        registry.register(
            vita_key(),
            Target::filter(|s: &ItemStack| s.item == "vitality_stick"),
            |_| Vita::full(STICK_VITA),
        )
    }
}
