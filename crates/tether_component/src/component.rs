//! The [`Component`] trait and its optional capability traits.
//!
//! A component is an arbitrary typed value attached to a host instance. The
//! base trait only demands type-erased access; everything else — ticking,
//! persistence, replication, lifecycle awareness, copying — is an optional
//! capability a component opts into by overriding the matching `as_*` probe
//! to return itself. Containers probe each instance through these methods
//! when dispatching, so a component pays only for the capabilities it
//! declares.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{PersistError, SyncError};

/// A typed piece of optional state attachable to a host instance.
///
/// An instance belongs to exactly one container for its entire lifetime and
/// must not be shared across containers.
///
/// Implementations provide the two `as_any` accessors (always `self`) and
/// override the capability probes for the traits they implement:
///
/// ```
/// use tether_component::{Component, Tickable};
/// use std::any::Any;
///
/// struct Counter(u64);
///
/// impl Tickable for Counter {
///     fn tick(&mut self) {
///         self.0 += 1;
///     }
/// }
///
/// impl Component for Counter {
///     fn as_any(&self) -> &dyn Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn Any { self }
///     fn as_tickable(&mut self) -> Option<&mut dyn Tickable> { Some(self) }
/// }
/// ```
pub trait Component: 'static {
    /// Type-erased access, for downcasting to the concrete component type.
    fn as_any(&self) -> &dyn Any;

    /// Mutable type-erased access.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Probe for the [`Tickable`] capability.
    fn as_tickable(&mut self) -> Option<&mut dyn Tickable> {
        None
    }

    /// Probe for the [`Persistent`] capability.
    fn as_persistent(&self) -> Option<&dyn Persistent> {
        None
    }

    /// Mutable probe for the [`Persistent`] capability.
    fn as_persistent_mut(&mut self) -> Option<&mut dyn Persistent> {
        None
    }

    /// Probe for the [`Synced`] capability.
    fn as_synced(&self) -> Option<&dyn Synced> {
        None
    }

    /// Mutable probe for the [`Synced`] capability.
    fn as_synced_mut(&mut self) -> Option<&mut dyn Synced> {
        None
    }

    /// Probe for the [`LoadAware`] capability.
    fn as_load_aware(&mut self) -> Option<&mut dyn LoadAware> {
        None
    }

    /// Probe for the [`Copyable`] capability.
    fn as_copyable(&self) -> Option<&dyn Copyable> {
        None
    }
}

/// Capability: the component is ticked once per simulation step.
///
/// Containers dispatch ticks in build order, which is a stable function of
/// factory registration order.
pub trait Tickable {
    /// Advance this component by one simulation step.
    fn tick(&mut self);
}

/// Capability: the component's state is written to and restored from a
/// persisted record.
///
/// Records are opaque bytes; MessagePack via `rmp-serde` is the convention
/// throughout the workspace. The persistence collaborator stores each record
/// keyed by the component's registered [`ComponentId`](crate::ComponentId),
/// nested under the host's own record.
pub trait Persistent {
    /// Serialise this component's state.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Encode`] if serialisation fails.
    fn save_state(&self) -> Result<Vec<u8>, PersistError>;

    /// Restore this component's state from a previously saved record.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Decode`] if the record cannot be decoded.
    fn load_state(&mut self, bytes: &[u8]) -> Result<(), PersistError>;
}

/// Capability: the component participates in dirty-marking and wire
/// replication.
///
/// The component calls [`DirtyMark::mark`] on its own mark whenever
/// observable state changes; the container drains marked components into
/// update payloads for the external transport. The core never batches or
/// deduplicates beyond the flag itself.
pub trait Synced {
    /// The dirty mark driving replication of this component.
    fn dirty(&self) -> &DirtyMark;

    /// Write this component's replicated state into `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Encode`] if serialisation fails.
    fn write_state(&self, sink: &mut Vec<u8>) -> Result<(), SyncError>;

    /// Apply replicated state received from the authoritative side.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Decode`] if the payload cannot be decoded.
    fn read_state(&mut self, source: &[u8]) -> Result<(), SyncError>;
}

/// Capability: the component is notified when its host is loaded and
/// unloaded.
///
/// Both methods default to no-ops, so load-only and unload-only components
/// implement just the one they care about. The host collaborator guarantees
/// each is invoked at most once per container lifecycle, unload never more
/// often than load.
pub trait LoadAware {
    /// Called once when the host instance is loaded.
    fn on_load(&mut self) {}

    /// Called once when the host instance is unloaded.
    fn on_unload(&mut self) {}
}

/// Capability: the component can be copied into a fresh container when its
/// host is duplicated.
pub trait Copyable {
    /// Produce a new component instance carrying this one's state.
    fn copy_component(&self) -> Box<dyn Component>;
}

/// A one-way-per-drain dirty flag shared between a component and the sync
/// machinery.
///
/// Marking is an atomic store, so it is safe from any context — including
/// inside `tick()` — without coordination. [`take`](DirtyMark::take) clears
/// the flag and reports whether it was set.
#[derive(Debug, Clone, Default)]
pub struct DirtyMark(Arc<AtomicBool>);

impl DirtyMark {
    /// Create a new, unmarked flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag this component's state as changed.
    pub fn mark(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns `true` if the flag is currently set, without clearing it.
    #[must_use]
    pub fn is_marked(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clear the flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}
