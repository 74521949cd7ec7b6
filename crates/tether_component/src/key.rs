//! Typed and type-erased component keys.
//!
//! A key is the globally unique identity of one component kind: its
//! namespaced [`ComponentId`], the Rust type registered for it, and a dense
//! slot index assigned at registration time. Slot indices are contiguous
//! from 0 and never reused, so containers can store components in a flat
//! array instead of a hash map.
//!
//! Key data is interned with `'static` lifetime — the registry never removes
//! a key, so every key is a `Copy` handle valid for the process lifetime.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::component::Component;
use crate::id::ComponentId;

/// Interned per-key data. One allocation per registered key, leaked by the
/// registry so handles are `&'static`.
#[derive(Debug)]
pub(crate) struct KeyData {
    pub(crate) id: ComponentId,
    pub(crate) index: u32,
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
}

/// A typed key for one component kind.
///
/// `C` is the component type declared at registration; containers use it to
/// hand back `&C` / `&mut C` without any caller-side casting. Two keys are
/// equal iff their [`ComponentId`]s are equal.
pub struct ComponentKey<C: Component> {
    data: &'static KeyData,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Component> ComponentKey<C> {
    pub(crate) fn from_data(data: &'static KeyData) -> Self {
        Self {
            data,
            _marker: PhantomData,
        }
    }

    /// The namespaced name this key was registered under.
    #[must_use]
    pub fn id(&self) -> &'static ComponentId {
        &self.data.id
    }

    /// The dense slot index used for container storage.
    #[must_use]
    pub fn index(&self) -> usize {
        self.data.index as usize
    }

    /// This key without its type parameter.
    #[must_use]
    pub fn untyped(&self) -> UntypedKey {
        UntypedKey { data: self.data }
    }
}

impl<C: Component> Clone for ComponentKey<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Component> Copy for ComponentKey<C> {}

impl<C: Component> PartialEq for ComponentKey<C> {
    fn eq(&self, other: &Self) -> bool {
        self.data.id == other.data.id
    }
}

impl<C: Component> Eq for ComponentKey<C> {}

impl<C: Component> Hash for ComponentKey<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.id.hash(state);
    }
}

impl<C: Component> fmt::Debug for ComponentKey<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentKey")
            .field("id", &self.data.id)
            .field("index", &self.data.index)
            .field("type", &self.data.type_name)
            .finish()
    }
}

impl<C: Component> fmt::Display for ComponentKey<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.data.id, f)
    }
}

/// A type-erased component key, used for registry iteration, container
/// bookkeeping, and naming persisted records.
#[derive(Clone, Copy)]
pub struct UntypedKey {
    data: &'static KeyData,
}

impl UntypedKey {
    pub(crate) fn from_data(data: &'static KeyData) -> Self {
        Self { data }
    }

    /// The namespaced name this key was registered under.
    #[must_use]
    pub fn id(&self) -> &'static ComponentId {
        &self.data.id
    }

    /// The dense slot index used for container storage.
    #[must_use]
    pub fn index(&self) -> usize {
        self.data.index as usize
    }

    /// The name of the Rust type registered for this key.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.data.type_name
    }

    /// Recover the typed key, if `C` is the type this key was registered
    /// with.
    #[must_use]
    pub fn downcast<C: Component>(&self) -> Option<ComponentKey<C>> {
        (self.data.type_id == TypeId::of::<C>()).then(|| ComponentKey::from_data(self.data))
    }
}

impl<C: Component> From<ComponentKey<C>> for UntypedKey {
    fn from(key: ComponentKey<C>) -> Self {
        key.untyped()
    }
}

impl PartialEq for UntypedKey {
    fn eq(&self, other: &Self) -> bool {
        self.data.id == other.data.id
    }
}

impl Eq for UntypedKey {}

impl Hash for UntypedKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.id.hash(state);
    }
}

impl fmt::Debug for UntypedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UntypedKey")
            .field("id", &self.data.id)
            .field("index", &self.data.index)
            .field("type", &self.data.type_name)
            .finish()
    }
}

impl fmt::Display for UntypedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.data.id, f)
    }
}
