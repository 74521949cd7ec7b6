//! Component-layer error types.

use crate::id::ComponentId;

/// A string failed to parse as a [`ComponentId`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid component id {input:?}: {reason}")]
pub struct InvalidId {
    /// The rejected input.
    pub input: String,
    /// Why it was rejected.
    pub reason: &'static str,
}

/// Errors raised by the component key registry.
///
/// Both variants are programmer errors surfaced at load time; the registry
/// never swallows them.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A name was re-registered with a different component type.
    #[error("component {id} registered twice with two different types: {existing}, {requested}")]
    RegistrationConflict {
        /// The contested name.
        id: ComponentId,
        /// Type name recorded at first registration.
        existing: &'static str,
        /// Type name of the conflicting request.
        requested: &'static str,
    },

    /// A name failed validation.
    #[error(transparent)]
    InvalidId(#[from] InvalidId),
}

/// Errors from persisting or restoring component state.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Failed to encode component state to MessagePack.
    #[error("failed to encode component state: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a persisted component record.
    #[error("failed to decode component record: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Errors from the synchronisation contract.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Failed to encode replicated state.
    #[error("failed to encode sync state: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a replicated payload.
    #[error("failed to decode sync state: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// An update named a component the container does not hold.
    #[error("sync update for unattached component {0}")]
    UnknownComponent(ComponentId),

    /// An update named a component that does not declare the synced
    /// capability.
    #[error("sync update for non-synced component {0}")]
    NotSynced(ComponentId),
}
