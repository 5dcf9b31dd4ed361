//! probesrv - device-class resolution and property aggregation
//!
//! Turns raw, index-keyed responses of a tree-structured query protocol into
//! typed monitoring data:
//!
//! - [`query`]: query client contract, poll context, operator pipeline, the
//!   recursive query-tree reader and the property-group decoder
//! - [`devclass`]: device classes, tree merge and class catalogs
//! - [`communicator`]: the per-property resolution chain and the head
//!   communicator that aggregates components
//! - [`vendors`]: hand-written overrides for specific classes
//! - [`poll`]: full-device polls

pub mod communicator;
pub mod devclass;
pub mod poll;
pub mod query;
pub mod vendors;

pub use communicator::{
    ClassCommunicator, Communicator, CommunicatorNode, DeviceCommunicator, OverrideRegistry,
};
pub use devclass::{ClassCatalog, ClassOverlay, DeviceClass, MemoryCatalog};
pub use errors::{ErrorKind, ProbeError, Result};
pub use poll::{poll_device, poll_devices, DeviceSnapshot};
pub use query::{Oid, PollContext, QueryClient, QueryTree};
