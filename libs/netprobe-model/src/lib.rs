//! Model layer for netprobe
//!
//! Shared types used by the poll engine and its callers:
//! - [`Value`]: scalar read from a device, with strict conversions
//! - [`ComponentKind`]: subsystems a device class can advertise
//! - device records ([`Interface`], [`CpuComponent`], ...) that row groups decode into

pub mod component;
pub mod device;
pub mod value;

pub use component::ComponentKind;
pub use device::{
    ComponentRecord, CpuComponent, DiskComponent, DiskStorage, Fan, HardwareHealthComponent,
    Interface, MemoryComponent, PowerSupply, Properties, SapInterface, SbcAgent, SbcComponent,
    SbcRealm, ServerComponent, UpsComponent,
};
pub use value::Value;
