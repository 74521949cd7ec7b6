//! Wire envelope types for component replication.
//!
//! An update names a component by its registry id and carries an opaque
//! payload produced by that component's `write_state`. The exact framing on
//! the wire — and the meaning of the host address — is owned by the
//! external transport.

use serde::{Deserialize, Serialize};

use tether_component::ComponentId;

/// Replicated state for one component of one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentUpdate {
    /// Registry name of the component the payload belongs to.
    pub component: ComponentId,
    /// Opaque state bytes, as written by the component's `write_state`.
    pub payload: Vec<u8>,
}

/// All pending component updates for one host instance.
///
/// `A` is the transport's host-addressing type — an entity id, a chunk
/// position, whatever identifies the container on the receiving side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostUpdate<A> {
    /// Address of the host whose container these updates target.
    pub host: A,
    /// Component updates in the container's dispatch order.
    pub updates: Vec<ComponentUpdate>,
}
