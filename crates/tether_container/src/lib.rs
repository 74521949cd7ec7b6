//! # tether_container
//!
//! Attachment machinery for the tether component system: the per-host-kind
//! factory registry that decides which components a host instance gets, and
//! the per-instance container that stores, looks up, ticks, copies, and
//! persists them.
//!
//! This crate provides:
//!
//! - [`FactoryRegistry`] — ordered `(key, target, factory)` entries for one
//!   host kind, sealed at the end of the registration window.
//! - [`Target`] — target selection for a factory: every host instance, or
//!   only those matching a predicate.
//! - [`ComponentContainer`] — dense slot storage with O(1) typed access and
//!   stable-order lifecycle dispatch.
//! - [`ComponentInitializer`] / [`run_registration`] — the bounded
//!   registration window extensions hook into.
//! - [`FactoryError`] — registration and construction errors.

pub mod container;
pub mod error;
pub mod factory;
pub mod init;

pub use container::{ComponentContainer, SavedComponents};
pub use error::FactoryError;
pub use factory::{FactoryRegistry, Target};
pub use init::{ComponentInitializer, run_registration};
