//! The process-wide component key registry.
//!
//! Extensions call [`ComponentRegistry::get_or_register`] during startup to
//! declare or look up keys by name. Registration is idempotent: re-requesting
//! a name with the same component type returns the identical key; requesting
//! it with a different type is a [`RegistryError::RegistrationConflict`],
//! surfaced at load time rather than swallowed.
//!
//! The registry is append-only. Keys are never removed, which guarantees
//! that slot indices used as array offsets in every live container stay
//! valid for the process lifetime. Registration is the cold path: a single
//! mutex guards both the name map and the index-ordered vector so the two
//! stay consistent, and hot per-tick code never touches the registry at all.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

use tracing::debug;

use crate::component::Component;
use crate::error::RegistryError;
use crate::id::ComponentId;
use crate::key::{ComponentKey, KeyData, UntypedKey};

#[derive(Debug, Default)]
struct RegistryInner {
    by_name: HashMap<ComponentId, &'static KeyData>,
    by_index: Vec<&'static KeyData>,
}

/// Append-only table of namespaced name → [`ComponentKey`].
///
/// Usually accessed through [`global`]; tests construct their own instances
/// to get isolated index spaces.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    inner: Mutex<RegistryInner>,
}

impl ComponentRegistry {
    /// Create a new, empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the key registered under `id`, or register a new one with the
    /// next free slot index.
    ///
    /// Idempotent: calling twice with the same `id` and `C` returns the
    /// identical key both times.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::RegistrationConflict`] if `id` is already
    /// registered with a different component type.
    pub fn get_or_register<C: Component>(
        &self,
        id: ComponentId,
    ) -> Result<ComponentKey<C>, RegistryError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(&existing) = inner.by_name.get(&id) {
            if existing.type_id != TypeId::of::<C>() {
                return Err(RegistryError::RegistrationConflict {
                    id,
                    existing: existing.type_name,
                    requested: std::any::type_name::<C>(),
                });
            }
            return Ok(ComponentKey::from_data(existing));
        }

        let index = inner.by_index.len() as u32;
        let data: &'static KeyData = Box::leak(Box::new(KeyData {
            id: id.clone(),
            index,
            type_id: TypeId::of::<C>(),
            type_name: std::any::type_name::<C>(),
        }));
        inner.by_name.insert(id, data);
        inner.by_index.push(data);

        debug!(id = %data.id, index, component_type = data.type_name, "registered component key");
        Ok(ComponentKey::from_data(data))
    }

    /// Pure lookup of the key registered under `id`, if any.
    #[must_use]
    pub fn get(&self, id: &ComponentId) -> Option<UntypedKey> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.by_name.get(id).map(|&data| UntypedKey::from_data(data))
    }

    /// Snapshot of every registered key, in slot index order.
    ///
    /// Used by diagnostics and bulk serialisation logic; not a hot path.
    #[must_use]
    pub fn keys(&self) -> Vec<UntypedKey> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .by_index
            .iter()
            .map(|&data| UntypedKey::from_data(data))
            .collect()
    }

    /// Number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.by_index.len()
    }

    /// Returns `true` if no key has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The process-wide registry singleton.
///
/// Initialised on first use; populated during the static registration phase
/// before any host instance is constructed. Late registration by
/// dynamically loaded extensions is tolerated but is the slow path.
#[must_use]
pub fn global() -> &'static ComponentRegistry {
    static GLOBAL: OnceLock<ComponentRegistry> = OnceLock::new();
    GLOBAL.get_or_init(ComponentRegistry::new)
}
