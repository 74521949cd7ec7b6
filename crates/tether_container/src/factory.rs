//! Per-host-kind factory registration and container construction.
//!
//! Each host kind (entity, item, chunk, world, …) owns one
//! [`FactoryRegistry`] over its host type `H`. Extensions register factories
//! against it during the registration window; once the window closes the
//! registry is sealed and every container for that kind is built from the
//! same frozen factory set, which makes container layout deterministic for
//! the process lifetime.

use std::fmt;

use tracing::{debug, info};

use tether_component::{Component, ComponentKey, UntypedKey};

use crate::container::ComponentContainer;
use crate::error::FactoryError;

/// Target selection for one factory: which host instances of the kind
/// receive the component.
pub enum Target<H: ?Sized> {
    /// Every host instance of this kind.
    Wildcard,
    /// Only host instances matching the predicate.
    Filter(Box<dyn Fn(&H) -> bool + Send + Sync>),
}

impl<H: ?Sized> Target<H> {
    /// A target matching hosts for which `predicate` returns `true`.
    #[must_use]
    pub fn filter(predicate: impl Fn(&H) -> bool + Send + Sync + 'static) -> Self {
        Self::Filter(Box::new(predicate))
    }

    fn matches(&self, host: &H) -> bool {
        match self {
            Self::Wildcard => true,
            Self::Filter(predicate) => predicate(host),
        }
    }

    /// Precedence rank when several factories for the same key match one
    /// host: a filtered target beats a wildcard; ties go to the
    /// first-registered entry.
    fn specificity(&self) -> u8 {
        match self {
            Self::Wildcard => 0,
            Self::Filter(_) => 1,
        }
    }
}

impl<H: ?Sized> fmt::Debug for Target<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wildcard => f.write_str("Wildcard"),
            Self::Filter(_) => f.write_str("Filter(..)"),
        }
    }
}

type BoxedFactory<H> = Box<dyn Fn(&H) -> anyhow::Result<Box<dyn Component>> + Send + Sync>;

struct FactoryEntry<H: ?Sized> {
    key: UntypedKey,
    target: Target<H>,
    factory: BoxedFactory<H>,
}

/// Ordered factory registrations for one host kind.
///
/// Registration order is significant: it fixes the container build order,
/// and therefore the dispatch order of `tick` and lifecycle hooks, for every
/// container of this kind.
pub struct FactoryRegistry<H: ?Sized> {
    entries: Vec<FactoryEntry<H>>,
    kind: &'static str,
    sealed: bool,
}

impl<H: ?Sized> FactoryRegistry<H> {
    /// Create an open registry for the host kind named `kind` (used only in
    /// log output, e.g. `"entity"`).
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self {
            entries: Vec::new(),
            kind,
            sealed: false,
        }
    }

    /// Register an infallible factory producing component `C` for hosts
    /// matching `target`.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::LateRegistration`] if the registry is sealed.
    pub fn register<C, F>(
        &mut self,
        key: ComponentKey<C>,
        target: Target<H>,
        factory: F,
    ) -> Result<(), FactoryError>
    where
        C: Component,
        F: Fn(&H) -> C + Send + Sync + 'static,
    {
        self.register_fallible(key, target, move |host| Ok(factory(host)))
    }

    /// Register a factory that may fail. A failure during
    /// [`build`](Self::build) aborts that container's construction.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::LateRegistration`] if the registry is sealed.
    pub fn register_fallible<C, F>(
        &mut self,
        key: ComponentKey<C>,
        target: Target<H>,
        factory: F,
    ) -> Result<(), FactoryError>
    where
        C: Component,
        F: Fn(&H) -> anyhow::Result<C> + Send + Sync + 'static,
    {
        if self.sealed {
            return Err(FactoryError::LateRegistration { key: key.id() });
        }
        debug!(kind = self.kind, key = %key, ?target, "registered component factory");
        self.entries.push(FactoryEntry {
            key: key.untyped(),
            target,
            factory: Box::new(move |host| factory(host).map(|c| Box::new(c) as Box<dyn Component>)),
        });
        Ok(())
    }

    /// Close the registration window. One-way: there is no unseal.
    pub fn seal(&mut self) {
        if !self.sealed {
            self.sealed = true;
            info!(
                kind = self.kind,
                factories = self.entries.len(),
                "factory registry sealed"
            );
        }
    }

    /// Returns `true` once the registration window has closed.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Number of registered factory entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no factory has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the component container for one host instance.
    ///
    /// For every distinct key, the most specific matching factory (see
    /// [`Target`]) runs exactly once, in registration order. Keys with no
    /// matching factory are simply absent from the container.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::UnsealedBuild`] if called before [`seal`]
    /// (containers must all see the complete factory set), or
    /// [`FactoryError::FactoryFailure`] if any selected factory fails — the
    /// container is discarded, never returned partially initialised.
    ///
    /// [`seal`]: Self::seal
    pub fn build(&self, host: &H) -> Result<ComponentContainer, FactoryError> {
        if !self.sealed {
            return Err(FactoryError::UnsealedBuild);
        }

        // Resolve the winning entry per key. Containers hold a handful of
        // components, so a linear scan beats a map here.
        let mut selected: Vec<(UntypedKey, usize, u8)> = Vec::new();
        for (pos, entry) in self.entries.iter().enumerate() {
            if !entry.target.matches(host) {
                continue;
            }
            let specificity = entry.target.specificity();
            match selected.iter_mut().find(|(key, _, _)| *key == entry.key) {
                Some((_, winner, best)) => {
                    if specificity > *best {
                        *winner = pos;
                        *best = specificity;
                    }
                }
                None => selected.push((entry.key, pos, specificity)),
            }
        }

        let mut container = ComponentContainer::new();
        for &(key, pos, _) in &selected {
            let component = (self.entries[pos].factory)(host)
                .map_err(|source| FactoryError::FactoryFailure { key: key.id(), source })?;
            container.insert(key, component);
        }
        Ok(container)
    }
}

impl<H: ?Sized> fmt::Debug for FactoryRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("kind", &self.kind)
            .field("entries", &self.entries.len())
            .field("sealed", &self.sealed)
            .finish()
    }
}
