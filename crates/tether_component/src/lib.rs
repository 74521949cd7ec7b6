//! # tether_component
//!
//! Component identity for the tether attachment system — defines what a
//! component is, how a component kind is named, and how names become typed
//! keys with stable slot indices.
//!
//! This crate provides:
//!
//! - [`ComponentId`] — namespaced `namespace:path` component names.
//! - [`ComponentKey`] / [`UntypedKey`] — typed and type-erased keys carrying
//!   a dense slot index assigned at registration time.
//! - [`ComponentRegistry`] — the process-wide, append-only name → key table.
//! - [`Component`] trait and its optional capability traits ([`Tickable`],
//!   [`Persistent`], [`Synced`], [`LoadAware`], [`Copyable`]).
//! - [`error`] — registration, persistence, and sync error types.

pub mod component;
pub mod error;
pub mod id;
pub mod key;
pub mod registry;

pub use component::{Component, Copyable, DirtyMark, LoadAware, Persistent, Synced, Tickable};
pub use error::{InvalidId, PersistError, RegistryError, SyncError};
pub use id::ComponentId;
pub use key::{ComponentKey, UntypedKey};
pub use registry::{ComponentRegistry, global};
