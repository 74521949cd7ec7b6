//! The extension registration entrypoint.
//!
//! Each loaded extension exposes one [`ComponentInitializer`] per host kind
//! it cares about. The host application invokes [`run_registration`] once
//! per factory registry during startup; every initializer runs exactly once
//! against the open registry, and the registry is sealed before the call
//! returns. Extensions must not retain the registry handle beyond the call
//! — the `&mut` borrow enforces that structurally.

use crate::error::FactoryError;
use crate::factory::FactoryRegistry;

/// Registration hook contributed by one extension for one host kind.
pub trait ComponentInitializer<H: ?Sized> {
    /// Register this extension's component factories.
    ///
    /// Called exactly once, during the registration window. The registry is
    /// guaranteed to be open for the duration of the call.
    ///
    /// # Errors
    ///
    /// Any error aborts extension loading; it is not recoverable.
    fn register_components(&self, registry: &mut FactoryRegistry<H>) -> Result<(), FactoryError>;
}

/// Run the registration window for one host kind: invoke every initializer
/// once, then seal the registry.
///
/// After this returns, the factory set for the kind is frozen and
/// [`FactoryRegistry::build`] becomes available.
///
/// # Errors
///
/// Propagates the first initializer error; the registry is left unsealed so
/// the caller can treat startup as failed.
pub fn run_registration<H: ?Sized>(
    registry: &mut FactoryRegistry<H>,
    initializers: &[&dyn ComponentInitializer<H>],
) -> Result<(), FactoryError> {
    for initializer in initializers {
        initializer.register_components(registry)?;
    }
    registry.seal();
    Ok(())
}
