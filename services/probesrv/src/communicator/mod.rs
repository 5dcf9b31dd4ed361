//! Communicators: per-device property resolution
//!
//! Every monitoring property is resolved through a chain of sources:
//!
//! ```text
//! CommunicatorNode (head: timos/sas)
//!   1. ClassCommunicator   - declarative query tree of timos/sas
//!   2. override            - hand-written code registered for timos/sas
//!   3. sub ───────────────► CommunicatorNode (timos)
//!                              1. ClassCommunicator (timos)
//!                              2. override (timos)
//!                              3. sub ──► ... (generic)
//! ```
//!
//! [`chain::try_in_order`] decides from the error kind whether to stop or to
//! ask the next source. The head [`Communicator`] aggregates properties into
//! identity bundles and component records.

pub mod chain;
pub mod class;
pub mod head;
pub mod node;
pub mod registry;

use async_trait::async_trait;
use errors::{ProbeError, Result};
use netprobe_model::{DiskStorage, Fan, Interface, PowerSupply, SbcAgent, SbcRealm};

use crate::query::PollContext;

pub use chain::{try_in_order, Step};
pub use class::ClassCommunicator;
pub use head::Communicator;
pub use node::CommunicatorNode;
pub use registry::{OverrideFactory, OverrideRegistry};

fn unsupported<T>(property: &str) -> Result<T> {
    Err(ProbeError::not_implemented(format!("{} is not implemented", property)))
}

/// Source of monitoring properties for one device
///
/// Every method defaults to `NotImplemented`, so hand-written overrides only
/// implement the properties they actually provide.
#[async_trait]
pub trait DeviceCommunicator: Send + Sync {
    // ========================================================================
    // Identity
    // ========================================================================

    async fn vendor(&self, _ctx: &PollContext) -> Result<String> {
        unsupported("vendor")
    }

    async fn model(&self, _ctx: &PollContext) -> Result<String> {
        unsupported("model")
    }

    async fn model_series(&self, _ctx: &PollContext) -> Result<String> {
        unsupported("model series")
    }

    async fn serial_number(&self, _ctx: &PollContext) -> Result<String> {
        unsupported("serial number")
    }

    async fn os_version(&self, _ctx: &PollContext) -> Result<String> {
        unsupported("os version")
    }

    // ========================================================================
    // Interfaces
    // ========================================================================

    /// Interface listing, normalized once at the head of the chain
    async fn interfaces(&self, _ctx: &PollContext) -> Result<Vec<Interface>> {
        unsupported("interfaces")
    }

    /// Interface table as declared, without normalization
    async fn if_table(&self, _ctx: &PollContext) -> Result<Vec<Interface>> {
        unsupported("interface table")
    }

    async fn interface_count(&self, _ctx: &PollContext) -> Result<u64> {
        unsupported("interface count")
    }

    // ========================================================================
    // CPU & memory
    // ========================================================================

    async fn cpu_load(&self, _ctx: &PollContext) -> Result<Vec<f64>> {
        unsupported("cpu load")
    }

    async fn cpu_temperature(&self, _ctx: &PollContext) -> Result<Vec<f64>> {
        unsupported("cpu temperature")
    }

    async fn memory_usage(&self, _ctx: &PollContext) -> Result<f64> {
        unsupported("memory usage")
    }

    // ========================================================================
    // UPS
    // ========================================================================

    async fn ups_alarm_low_voltage_disconnect(&self, _ctx: &PollContext) -> Result<i64> {
        unsupported("ups alarm low voltage disconnect")
    }

    async fn ups_battery_amperage(&self, _ctx: &PollContext) -> Result<f64> {
        unsupported("ups battery amperage")
    }

    async fn ups_battery_capacity(&self, _ctx: &PollContext) -> Result<f64> {
        unsupported("ups battery capacity")
    }

    async fn ups_battery_current(&self, _ctx: &PollContext) -> Result<f64> {
        unsupported("ups battery current")
    }

    async fn ups_battery_remaining_time(&self, _ctx: &PollContext) -> Result<f64> {
        unsupported("ups battery remaining time")
    }

    async fn ups_battery_temperature(&self, _ctx: &PollContext) -> Result<f64> {
        unsupported("ups battery temperature")
    }

    async fn ups_battery_voltage(&self, _ctx: &PollContext) -> Result<f64> {
        unsupported("ups battery voltage")
    }

    async fn ups_current_load(&self, _ctx: &PollContext) -> Result<f64> {
        unsupported("ups current load")
    }

    async fn ups_mains_voltage_applied(&self, _ctx: &PollContext) -> Result<bool> {
        unsupported("ups mains voltage applied")
    }

    async fn ups_rectifier_current(&self, _ctx: &PollContext) -> Result<f64> {
        unsupported("ups rectifier current")
    }

    async fn ups_system_voltage(&self, _ctx: &PollContext) -> Result<f64> {
        unsupported("ups system voltage")
    }

    // ========================================================================
    // SBC
    // ========================================================================

    async fn sbc_agents(&self, _ctx: &PollContext) -> Result<Vec<SbcAgent>> {
        unsupported("sbc agents")
    }

    async fn sbc_realms(&self, _ctx: &PollContext) -> Result<Vec<SbcRealm>> {
        unsupported("sbc realms")
    }

    async fn sbc_global_call_per_second(&self, _ctx: &PollContext) -> Result<i64> {
        unsupported("sbc global call per second")
    }

    async fn sbc_global_concurrent_sessions(&self, _ctx: &PollContext) -> Result<i64> {
        unsupported("sbc global concurrent sessions")
    }

    async fn sbc_active_local_contacts(&self, _ctx: &PollContext) -> Result<i64> {
        unsupported("sbc active local contacts")
    }

    async fn sbc_transcoding_capacity(&self, _ctx: &PollContext) -> Result<i64> {
        unsupported("sbc transcoding capacity")
    }

    async fn sbc_license_capacity(&self, _ctx: &PollContext) -> Result<i64> {
        unsupported("sbc license capacity")
    }

    async fn sbc_system_redundancy(&self, _ctx: &PollContext) -> Result<i64> {
        unsupported("sbc system redundancy")
    }

    async fn sbc_system_health_score(&self, _ctx: &PollContext) -> Result<i64> {
        unsupported("sbc system health score")
    }

    // ========================================================================
    // Server, disk, hardware health
    // ========================================================================

    async fn server_procs(&self, _ctx: &PollContext) -> Result<i64> {
        unsupported("server procs")
    }

    async fn server_users(&self, _ctx: &PollContext) -> Result<i64> {
        unsupported("server users")
    }

    async fn disk_storages(&self, _ctx: &PollContext) -> Result<Vec<DiskStorage>> {
        unsupported("disk storages")
    }

    async fn hardware_health_environment_monitor_state(&self, _ctx: &PollContext) -> Result<i64> {
        unsupported("hardware health environment monitor state")
    }

    async fn hardware_health_fans(&self, _ctx: &PollContext) -> Result<Vec<Fan>> {
        unsupported("hardware health fans")
    }

    async fn hardware_health_power_supply(&self, _ctx: &PollContext) -> Result<Vec<PowerSupply>> {
        unsupported("hardware health power supply")
    }
}
