//! Factory- and container-construction error types.

use tether_component::ComponentId;

/// Errors from factory registration or container construction.
///
/// Every variant is fatal for the operation that raised it; nothing here is
/// skipped or swallowed. A missing component at lookup time is *not* an
/// error — containers report absence as `None`.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    /// A factory was registered after the registry sealed its registration
    /// window. Programmer error: registration must finish before the first
    /// host instance of the kind is constructed.
    #[error("factory for {key} registered after the registry was sealed")]
    LateRegistration {
        /// Key the late factory was registered against.
        key: &'static ComponentId,
    },

    /// A container was requested before the registration window closed.
    /// Containers built mid-registration would see a partial factory set.
    #[error("container built before the factory registry was sealed")]
    UnsealedBuild,

    /// A factory failed while building a container. The whole build is
    /// aborted — a partially initialised container would violate the
    /// has/get invariant for other code.
    #[error("factory for {key} failed while building a container")]
    FactoryFailure {
        /// Key of the failing factory.
        key: &'static ComponentId,
        /// The factory's own error.
        #[source]
        source: anyhow::Error,
    },
}
