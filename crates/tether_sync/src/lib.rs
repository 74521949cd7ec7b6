//! # tether_sync
//!
//! The replication envelope contract between component containers and the
//! external network transport. The transport owns framing, batching, and
//! delivery; this crate only defines what crosses the boundary.
//!
//! This crate provides:
//!
//! - [`envelope`] — [`ComponentUpdate`] / [`HostUpdate`] wire structs.
//! - [`codec`] — MessagePack serialisation helpers.
//! - [`collect_updates`] / [`apply_host_update`] — bridging containers to
//!   envelopes on the sending and receiving sides.

pub mod codec;
pub mod envelope;
pub mod error;

pub use codec::{decode, encode};
pub use envelope::{ComponentUpdate, HostUpdate};
pub use error::WireError;

use tether_component::SyncError;
use tether_container::ComponentContainer;

/// Drain dirty synced components from `container` into wire updates.
///
/// Returns one [`ComponentUpdate`] per component whose dirty mark was set,
/// in the container's stable dispatch order, clearing the marks. The caller
/// wraps them in a [`HostUpdate`] with whatever host address its transport
/// uses.
///
/// # Errors
///
/// Propagates the first component `write_state` failure.
pub fn collect_updates(
    container: &mut ComponentContainer,
) -> Result<Vec<ComponentUpdate>, SyncError> {
    let updates = container.drain_updates()?;
    Ok(updates
        .into_iter()
        .map(|(key, payload)| ComponentUpdate {
            component: key.id().clone(),
            payload,
        })
        .collect())
}

/// Apply a received [`HostUpdate`] to the container of the addressed host.
///
/// The transport resolves `update.host` to the container; this function
/// applies every payload in order.
///
/// # Errors
///
/// Returns [`SyncError::UnknownComponent`] or [`SyncError::NotSynced`] if an
/// update names a component the container cannot accept it for, or the
/// component's own decode error. Application stops at the first failure.
pub fn apply_host_update<A>(
    container: &mut ComponentContainer,
    update: &HostUpdate<A>,
) -> Result<(), SyncError> {
    for component_update in &update.updates {
        container.apply_update(&component_update.component, &component_update.payload)?;
    }
    Ok(())
}
